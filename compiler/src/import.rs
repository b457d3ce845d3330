//! CRFsuiteモデルの取り込みモジュール
//!
//! `crfsuite dump`のテキスト出力を読み込み、ティアモデル(`model.bin`)に変換します。

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;

use tiertag::classifier::crfsuite;
use tiertag::errors::TiertagError;

/// 取り込みコマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "import", about = "A program to convert a CRFsuite dump into a tier model.")]
pub struct Args {
    /// Text output of `crfsuite dump`.
    #[clap(short = 'i', long)]
    dump_in: PathBuf,

    /// File to which the tier model (model.bin) is output.
    #[clap(short = 'o', long)]
    model_out: PathBuf,
}

/// 取り込み中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 変換エラー
    #[error("Importing the model failed: {0}")]
    Tiertag(#[from] TiertagError),
}

/// 取り込みコマンドを実行する
pub fn run(args: Args) -> Result<(), ImportError> {
    println!("Reading the dump...");
    let model = crfsuite::from_dump(File::open(&args.dump_in)?)?;
    println!(
        "{} labels, {} attributes",
        model.labels().len(),
        model.num_features()
    );

    let mut wtr = BufWriter::new(File::create(&args.model_out)?);
    model.write(&mut wtr)?;
    wtr.flush()?;

    println!("Successfully wrote the model to {}", args.model_out.display());
    Ok(())
}
