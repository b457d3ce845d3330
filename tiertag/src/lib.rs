//! # Tiertag
//!
//! Tiertagは、辞書を参照する多段(ティア)構成の形態素タガーの実装です。
//!
//! ## 概要
//!
//! 文法素(格、数、品詞など)はカテゴリごとにティアへ割り当てられ、スパン(文)ごとに
//! ティアを決まった順序で一つずつ復号します。各ティアの分類器は、トークンの表層形、
//! 文脈窓、辞書の候補、前段ティアの確定ラベルから作られた特徴量を受け取ります。
//!
//! ## 主な機能
//!
//! - **文法素カタログとティア分割**: 階層的な文法素をビットベクターとして扱います
//! - **形態素辞書と頻度ストア**: rkyvでシリアライズされ、メモリマップで読み込まれます
//! - **辞書のみのベースライン**: 分類器を使わない決定的なタガー
//! - **ティア分類器**: 線形連鎖モデルによる系列分類(CRFsuite形式のモデルを取り込み可能)
//! - **学習データ生成**: 実行時と同じ特徴量による学習データの出力(trainフィーチャー有効時)
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use tiertag::tagger::{BaselineOptions, DictionaryTagger, Tagger};
//! use tiertag::{GrammemeCatalog, MorphDictionary, MorphDictionaryBuilder, Token};
//!
//! let grammemes = "POST,,,\nNOUN,POST,,\nCAse,,,\nnomn,CAse,,\ngent,CAse,,";
//! let dict = "кот,NOUN,nomn\nбанка,NOUN,nomn\nбанка,NOUN,gent";
//!
//! let catalog = GrammemeCatalog::from_reader(grammemes.as_bytes())?;
//! let dict = MorphDictionaryBuilder::from_readers(&catalog, dict.as_bytes(), None::<&[u8]>)?;
//! let tagger = DictionaryTagger::new(
//!     Arc::new(catalog),
//!     Arc::new(MorphDictionary::from_inner(dict)),
//!     BaselineOptions::default().debug_grammemes(true),
//! )?;
//!
//! let tags = tagger.tag(&[Token::new(0, 6, "Кот"), Token::new(7, 17, "банка")])?;
//! let wf = tags[0].wordform().unwrap();
//! assert_eq!(wf.pos_tag(), Some("NOUN"));
//! assert_eq!(wf.grammemes(), ["NOUN", "nomn"]);
//! assert!(tags[1].wordform().is_none());
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// 文法素カタログとタグのビットベクター
pub mod catalog;

/// ティアごとの系列分類器
pub mod classifier;

/// モデルディレクトリの設定
pub mod config;

/// 形態素辞書と頻度ストア
pub mod dictionary;

/// 文書と注釈
pub mod document;

/// エラー型の定義
pub mod errors;

/// 特徴量抽出
pub mod feature;

/// タガーの実装
pub mod tagger;

/// ティア分割
pub mod tiers;

/// トークンと語形
pub mod token;

/// 内部ユーティリティ関数
pub mod utils;

/// 学習データ生成機能
///
/// `train`フィーチャーが有効な場合のみ利用可能です。
#[cfg(feature = "train")]
#[cfg_attr(docsrs, doc(cfg(feature = "train")))]
pub mod trainer;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

// Re-exports
pub use catalog::{GrammemeCatalog, TagBits};
pub use dictionary::{LoadMode, MorphDictionary, MorphDictionaryBuilder};
pub use document::Document;
pub use tagger::{DictionaryTagger, Tagger, TieredTagger};
pub use token::{Token, TokenTag, Wordform};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
