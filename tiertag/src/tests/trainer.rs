use std::fs;

use tempfile::tempdir;

use crate::dictionary::WordformStoreBuilder;
use crate::test_utils;
use crate::trainer::{Corpus, TRAINING_FILE_NAME, TrainingDataWriter};

#[test]
fn test_write_all_tiers() {
    let corpus = Corpus::from_reader(test_utils::CORPUS.as_bytes()).unwrap();
    assert_eq!(2, corpus.len());

    let writer = TrainingDataWriter::new(test_utils::pipeline());
    let dir = tempdir().unwrap();
    writer.write_all(&corpus, dir.path()).unwrap();

    let pos = fs::read_to_string(dir.path().join("pos").join(TRAINING_FILE_NAME)).unwrap();
    let labels: Vec<&str> = pos
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| l.split('\t').next().unwrap())
        .collect();
    assert_eq!(
        vec!["ADJF", "NOUN", "VERB", "PREP", "NOUN", "PNCT", "NOUN", "PREP", "NOUN"],
        labels
    );
    // tier 0 is never given prior-tier features
    assert!(!pos.contains("Gram_at_"));

    let case_num =
        fs::read_to_string(dir.path().join("case-num").join(TRAINING_FILE_NAME)).unwrap();
    let first = case_num.lines().next().unwrap();
    assert!(first.starts_with("nomn&sing\t"));
    assert!(first.contains("\tGram_at_0=ADJF"));
    assert!(first.contains("\tGram_at_-1=NOUN"));
    assert_eq!(2, case_num.split("\n\n").filter(|s| !s.trim().is_empty()).count());
}

#[test]
fn test_frequency_store_from_corpus() {
    let catalog = test_utils::catalog();
    let corpus = Corpus::from_reader(test_utils::CORPUS.as_bytes()).unwrap();
    let keep = catalog.category_mask(["Qual"]).unwrap().complement();
    let builder = WordformStoreBuilder::from_corpus(&corpus, &catalog, &keep).unwrap();

    let mut buf = vec![];
    builder.write_csv(&catalog, &mut buf).unwrap();
    let csv = String::from_utf8(buf).unwrap();
    assert!(csv.contains("стекла,NOUN,nomn,plur\n"));
    assert!(csv.contains("столе,NOUN,loct,sing\n"));
    assert!(csv.contains("белый,ADJF,nomn,sing\n"));
}
