use std::fs::File;

use tempfile::tempdir;

use crate::catalog::GrammemeCatalog;
use crate::classifier::{LinearChainModelBuilder, SequenceClassifier, TierModel};
use crate::dictionary::{LoadMode, MorphDictionary, MorphDictionaryBuilder, normalize};
use crate::errors::TiertagError;
use crate::feature::{Feature, FeatureSet, FeatureSource};
use crate::test_utils;

fn compiled_dictionary(catalog: &GrammemeCatalog) -> MorphDictionary {
    let inner = MorphDictionaryBuilder::from_readers(
        catalog,
        test_utils::DICT.as_bytes(),
        Some(test_utils::FREQ.as_bytes()),
    )
    .unwrap();
    MorphDictionary::from_inner(inner)
}

#[test]
fn test_dictionary_file_round_trip() {
    let catalog = test_utils::catalog();
    let dict = compiled_dictionary(&catalog);
    let dir = tempdir().unwrap();
    let path = dir.path().join("tiertag.dic");
    dict.write(File::create(&path).unwrap()).unwrap();

    for mode in [LoadMode::Validate, LoadMode::TrustCache, LoadMode::TrustCache] {
        let loaded = MorphDictionary::from_path(&path, mode).unwrap();
        loaded.verify_catalog(&catalog).unwrap();
        assert_eq!(dict.word_count(), loaded.word_count());
        assert_eq!(dict.frequency_count(), loaded.frequency_count());
        let key = normalize("Банка");
        assert_eq!(dict.lookup(&key), loaded.lookup(&key));
        assert_eq!(
            dict.pos_bits(&normalize("стёкла")),
            loaded.pos_bits(&normalize("стёкла"))
        );
    }
}

#[test]
fn test_archived_dictionary_cannot_be_written() {
    let catalog = test_utils::catalog();
    let mut buf = vec![];
    compiled_dictionary(&catalog).write(&mut buf).unwrap();
    let loaded = MorphDictionary::read(buf.as_slice()).unwrap();
    assert!(loaded.write(Vec::<u8>::new()).is_err());
}

#[test]
fn test_dictionary_against_other_catalog() {
    let catalog = test_utils::catalog();
    let mut buf = vec![];
    compiled_dictionary(&catalog).write(&mut buf).unwrap();
    let loaded = MorphDictionary::read(buf.as_slice()).unwrap();

    let other = GrammemeCatalog::from_reader("POST,,,\nNOUN,POST,,\n".as_bytes()).unwrap();
    assert!(matches!(
        loaded.verify_catalog(&other),
        Err(TiertagError::Configuration(_))
    ));
}

#[test]
fn test_missing_dictionary_file() {
    let dir = tempdir().unwrap();
    assert!(MorphDictionary::from_path(dir.path().join("none.dic"), LoadMode::Validate).is_err());
}

#[test]
fn test_tier_model_file_round_trip() {
    let mut builder = LinearChainModelBuilder::new(["NOUN", "VERB"]).unwrap();
    builder.add_state_weight("DictTag=NOUN", "NOUN", 1.0).unwrap();
    builder.add_state_weight("DictTag=VERB", "VERB", 1.0).unwrap();
    builder.set_transition("NOUN", "VERB", 0.5).unwrap();
    let model = builder.build().unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("model.bin");
    model.write(File::create(&path).unwrap()).unwrap();
    let loaded = TierModel::from_path(&path).unwrap();
    assert_eq!(2, loaded.num_labels());

    let span: Vec<FeatureSet> = ["NOUN", "VERB"]
        .iter()
        .map(|v| {
            let mut fs = FeatureSet::new();
            fs.add(
                FeatureSource::DictionaryCandidates { tier: 0 },
                [Feature::new("DictTag", *v)],
            );
            fs
        })
        .collect();
    assert_eq!(model.classify(&span).unwrap(), loaded.classify(&span).unwrap());
    assert_eq!(vec!["NOUN", "VERB"], loaded.classify(&span).unwrap());
}
