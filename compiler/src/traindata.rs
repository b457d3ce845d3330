//! 学習データの出力モジュール
//!
//! モデル設定と辞書から実行時と同じ特徴量パイプラインを組み立て、
//! ティアごとのCRFsuite形式の学習データを出力します。

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use tiertag::config::ModelConfig;
use tiertag::errors::TiertagError;
use tiertag::feature::FeaturePipeline;
use tiertag::trainer::{Corpus, TrainingDataWriter};
use tiertag::{GrammemeCatalog, LoadMode, MorphDictionary};

/// 学習データ出力コマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "traindata", about = "A program to write per-tier training data.")]
pub struct Args {
    /// Grammeme catalog (id,parentId,alias,description).
    #[clap(short = 'g', long)]
    grammemes: PathBuf,

    /// Compiled dictionary.
    #[clap(short = 'i', long)]
    dict_in: PathBuf,

    /// Model configuration (model.conf).
    #[clap(short = 'c', long)]
    model_conf: PathBuf,

    /// Gold corpus (surface<TAB>GRAM,GRAM,... lines, EOS between spans).
    #[clap(short = 't', long)]
    corpus: PathBuf,

    /// Directory to which one subdirectory per tier is written.
    #[clap(short = 'o', long)]
    out_dir: PathBuf,
}

/// 学習データ出力中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum TraindataError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 特徴量抽出エラー
    #[error("Writing training data failed: {0}")]
    Tiertag(#[from] TiertagError),
}

/// 学習データ出力コマンドを実行する
pub fn run(args: Args) -> Result<(), TraindataError> {
    let catalog = Arc::new(GrammemeCatalog::from_reader(File::open(&args.grammemes)?)?);
    let config = ModelConfig::from_reader(File::open(&args.model_conf)?)?;
    let partition = config.partition(&catalog)?;

    println!("Loading the dictionary...");
    let dictionary = MorphDictionary::from_path(&args.dict_in, LoadMode::Validate)?;
    dictionary.verify_catalog(&catalog)?;

    println!("Loading the corpus...");
    let corpus = Corpus::from_reader(File::open(&args.corpus)?)?;

    let pipeline = FeaturePipeline::new(
        catalog,
        Arc::new(partition),
        Arc::new(dictionary),
        config.window()?,
    );
    println!(
        "Writing training data of {} spans for {} tiers...",
        corpus.len(),
        pipeline.partition().tier_count()
    );
    TrainingDataWriter::new(pipeline).write_all(&corpus, &args.out_dir)?;

    println!("Successfully wrote training data to {}", args.out_dir.display());
    Ok(())
}
