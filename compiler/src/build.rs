//! 形態素辞書のビルドモジュール
//!
//! 辞書ソース(`wordform,GRAM,...`)と任意の頻度ソースから、
//! rkyv形式のバイナリ辞書を構築します。

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;

use tiertag::dictionary::{MorphDictionary, MorphDictionaryBuilder};
use tiertag::errors::TiertagError;
use tiertag::GrammemeCatalog;

/// ビルドコマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "build", about = "A program to build the morphological dictionary.")]
pub struct Args {
    /// Grammeme catalog (id,parentId,alias,description).
    #[clap(short = 'g', long)]
    grammemes: PathBuf,

    /// Dictionary source (wordform,GRAM,...).
    #[clap(short = 'd', long)]
    dict_in: PathBuf,

    /// Frequency source (wordform,GRAM,...) with the most frequent reading per wordform.
    #[clap(short = 'f', long)]
    freq_in: Option<PathBuf>,

    /// File to which the binary dictionary is output.
    #[clap(short = 'o', long)]
    dict_out: PathBuf,
}

/// ビルド処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 辞書構築エラー
    #[error("Dictionary building failed: {0}")]
    Tiertag(#[from] TiertagError),
}

/// ビルドコマンドを実行する
pub fn run(args: Args) -> Result<(), BuildError> {
    let catalog = GrammemeCatalog::from_reader(File::open(&args.grammemes)?)?;

    println!("Compiling the dictionary...");
    let freq = args.freq_in.as_ref().map(File::open).transpose()?;
    let inner = MorphDictionaryBuilder::from_readers(&catalog, File::open(&args.dict_in)?, freq)?;
    let dict = MorphDictionary::from_inner(inner);
    println!(
        "{} wordforms, {} frequency entries",
        dict.word_count(),
        dict.frequency_count()
    );

    println!("Writing the dictionary...");
    let mut wtr = BufWriter::new(File::create(&args.dict_out)?);
    dict.write(&mut wtr)?;
    wtr.flush()?;

    println!("Successfully built the dictionary to {}", args.dict_out.display());
    Ok(())
}
