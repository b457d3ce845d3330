//! Tiertagのテストモジュール群
//!
//! フィクスチャの辞書とモデル設定を使い、ベースラインタガー、ティア分類器、
//! 辞書ファイルの読み込みの動作を検証します。

mod baseline;
mod persistence;
mod tiered;

#[cfg(feature = "train")]
mod trainer;
