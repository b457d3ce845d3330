//! Tiertag 辞書・モデルコンパイラのメインエントリーポイント
//!
//! このモジュールは、タグ付けに必要なリソースを準備するサブコマンドを提供します。
//! 辞書のビルド、コーパスからの頻度ソース生成、ティアごとの学習データ出力、
//! CRFsuiteモデルの取り込みを一つのCLIツールにまとめています。

mod build;
mod freqgen;
mod import;
mod traindata;

use clap::Parser;
use thiserror::Error;

use crate::{
    build::BuildError, freqgen::FreqgenError, import::ImportError, traindata::TraindataError,
};

/// コマンドライン引数の構造体
#[derive(Parser, Debug)]
#[clap(name = "compile", version)]
struct Cli {
    /// 実行するサブコマンド
    #[clap(subcommand)]
    command: Command,
}

/// 利用可能なサブコマンド
#[derive(Parser, Debug)]
enum Command {
    /// 辞書ソースと頻度ソースからバイナリ辞書を構築します
    Build(build::Args),

    /// 正解コーパスから頻度ソースを生成します
    ///
    /// 語形ごとに最も頻度の高い読みを`wordform,GRAM,...`形式で出力します。
    Freqgen(freqgen::Args),

    /// 正解コーパスからティアごとの学習データを出力します
    Traindata(traindata::Args),

    /// CRFsuiteのダンプをティアモデルに変換します
    Import(import::Args),
}

/// コンパイラの実行中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum CompileError {
    /// 辞書ビルド中のエラー
    #[error(transparent)]
    BuildError(#[from] BuildError),
    /// 頻度ソース生成中のエラー
    #[error(transparent)]
    FreqgenError(#[from] FreqgenError),
    /// 学習データ出力中のエラー
    #[error(transparent)]
    TraindataError(#[from] TraindataError),
    /// モデル変換中のエラー
    #[error(transparent)]
    ImportError(#[from] ImportError),
}

fn main() -> Result<(), CompileError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => Ok(build::run(args)?),
        Command::Freqgen(args) => Ok(freqgen::run(args)?),
        Command::Traindata(args) => Ok(traindata::run(args)?),
        Command::Import(args) => Ok(import::run(args)?),
    }
}
