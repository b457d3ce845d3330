//! テスト用ユーティリティ
//!
//! `src/tests/resources/`のフィクスチャを読み込む関数を提供します。

use std::sync::Arc;

use crate::catalog::GrammemeCatalog;
use crate::config::ModelConfig;
use crate::dictionary::{MorphDictionary, MorphDictionaryBuilder};
use crate::feature::FeaturePipeline;

pub(crate) const GRAMMEMES: &str = include_str!("tests/resources/grammemes.csv");
pub(crate) const DICT: &str = include_str!("tests/resources/dict.csv");
pub(crate) const FREQ: &str = include_str!("tests/resources/freq.csv");
pub(crate) const MODEL_CONF: &str = include_str!("tests/resources/model.conf");
#[cfg(feature = "train")]
pub(crate) const CORPUS: &str = include_str!("tests/resources/corpus.txt");

pub(crate) fn catalog() -> Arc<GrammemeCatalog> {
    Arc::new(GrammemeCatalog::from_reader(GRAMMEMES.as_bytes()).unwrap())
}

pub(crate) fn dictionary(catalog: &GrammemeCatalog, with_freq: bool) -> Arc<MorphDictionary> {
    let freq = with_freq.then_some(FREQ.as_bytes());
    let inner = MorphDictionaryBuilder::from_readers(catalog, DICT.as_bytes(), freq).unwrap();
    Arc::new(MorphDictionary::from_inner(inner))
}

pub(crate) fn config() -> ModelConfig {
    ModelConfig::from_reader(MODEL_CONF.as_bytes()).unwrap()
}

pub(crate) fn pipeline() -> FeaturePipeline {
    let catalog = catalog();
    let dictionary = dictionary(&catalog, true);
    let config = config();
    let partition = config.partition(&catalog).unwrap();
    FeaturePipeline::new(
        catalog,
        Arc::new(partition),
        dictionary,
        config.window().unwrap(),
    )
}
