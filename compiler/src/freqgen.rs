//! 頻度ソースの生成モジュール
//!
//! 正解コーパスの語形ごとに最も頻度の高い読みを数え、
//! `build`サブコマンドの頻度ソースとして出力します。

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;

use tiertag::dictionary::WordformStoreBuilder;
use tiertag::errors::TiertagError;
use tiertag::trainer::Corpus;
use tiertag::GrammemeCatalog;

/// 頻度ソース生成コマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "freqgen", about = "A program to count the most frequent readings.")]
pub struct Args {
    /// Grammeme catalog (id,parentId,alias,description).
    #[clap(short = 'g', long)]
    grammemes: PathBuf,

    /// Gold corpus (surface<TAB>GRAM,GRAM,... lines, EOS between spans).
    #[clap(short = 't', long)]
    corpus: PathBuf,

    /// Categories removed from readings before counting.
    #[clap(long, value_delimiter(','))]
    ignored: Vec<String>,

    /// File to which the frequency source is output.
    #[clap(short = 'o', long)]
    freq_out: PathBuf,
}

/// 頻度ソース生成中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum FreqgenError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 集計エラー
    #[error("Counting failed: {0}")]
    Tiertag(#[from] TiertagError),
}

/// 頻度ソース生成コマンドを実行する
pub fn run(args: Args) -> Result<(), FreqgenError> {
    let catalog = GrammemeCatalog::from_reader(File::open(&args.grammemes)?)?;
    let keep = catalog.category_mask(&args.ignored)?.complement();

    println!("Loading the corpus...");
    let corpus = Corpus::from_reader(File::open(&args.corpus)?)?;

    println!("Counting readings of {} spans...", corpus.len());
    let builder = WordformStoreBuilder::from_corpus(&corpus, &catalog, &keep)?;

    let mut wtr = BufWriter::new(File::create(&args.freq_out)?);
    builder.write_csv(&catalog, &mut wtr)?;
    wtr.flush()?;

    println!(
        "Successfully wrote {} wordforms to {}",
        builder.len(),
        args.freq_out.display()
    );
    Ok(())
}
