//! ティア分類器の学習を支援するモジュール。
//!
//! 分類器そのものの学習はCRFsuiteなどの外部ツールで行います。このモジュールは
//! その入力となる学習データを、実行時と同じ特徴量パイプラインで生成します。
//!
//! # 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use tiertag::feature::{ContextWindow, FeaturePipeline};
//! use tiertag::tiers::{Tier, TierPartition};
//! use tiertag::trainer::{Corpus, TrainingDataWriter};
//! use tiertag::{GrammemeCatalog, MorphDictionary, MorphDictionaryBuilder};
//!
//! let catalog = GrammemeCatalog::from_reader("POST,,,\nNOUN,POST,,\n".as_bytes())?;
//! let partition = TierPartition::new(&catalog, vec![Tier::new("pos", ["POST"])], &[] as &[&str])?;
//! let dict = MorphDictionaryBuilder::from_readers(&catalog, "кот,NOUN\n".as_bytes(), None::<&[u8]>)?;
//! let pipeline = FeaturePipeline::new(
//!     Arc::new(catalog),
//!     Arc::new(partition),
//!     Arc::new(MorphDictionary::from_inner(dict)),
//!     ContextWindow::default(),
//! );
//!
//! let corpus = Corpus::from_reader("кот\tNOUN\nEOS\n".as_bytes())?;
//! let mut buf = vec![];
//! TrainingDataWriter::new(pipeline).write_tier(&corpus, 0, &mut buf)?;
//! assert!(String::from_utf8(buf)?.starts_with("NOUN\t"));
//! # Ok(())
//! # }
//! ```
mod corpus;
mod training_data;

pub use crate::trainer::corpus::{Corpus, Example, Word};
pub use crate::trainer::training_data::{TRAINING_FILE_NAME, TrainingDataWriter};
