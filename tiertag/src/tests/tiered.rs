use std::sync::Arc;

use crate::classifier::SequenceClassifier;
use crate::errors::Result;
use crate::feature::{FeatureSet, FeatureSource};
use crate::tagger::{Tagger, TieredTagger};
use crate::test_utils;
use crate::token::Token;

struct Fixed(Vec<&'static str>);

impl SequenceClassifier for Fixed {
    fn classify(&self, span: &[FeatureSet]) -> Result<Vec<String>> {
        assert_eq!(self.0.len(), span.len());
        Ok(self.0.iter().map(|s| s.to_string()).collect())
    }
}

fn tagger(tier0: Vec<&'static str>, tier1: Vec<&'static str>) -> TieredTagger {
    let classifiers: Vec<Arc<dyn SequenceClassifier>> =
        vec![Arc::new(Fixed(tier0)), Arc::new(Fixed(tier1))];
    TieredTagger::new(test_utils::pipeline(), classifiers, "POST").unwrap()
}

#[test]
fn test_prior_tier_features_in_next_pool() {
    let tagger = tagger(
        vec!["PREP", "ADJF", "NOUN"],
        vec!["", "loct&sing", "loct&sing"],
    );
    let mut worker = tagger.new_worker();
    worker.reset_span(["на", "белом", "столе"]);
    worker.decode().unwrap();

    let pool = worker.pool(1).unwrap();
    assert!(pool[2].contains("Gram_at_0", "NOUN"));
    assert!(pool[2].contains("Gram_at_1", "ADJF"));
    assert!(!pool[2].contains("Gram_at_2", "PREP"));
    assert!(pool[1].contains("Gram_at_-1", "NOUN"));
    assert!(pool[1].contains("Gram_at_1", "PREP"));
    assert_eq!(
        vec![FeatureSource::PriorTier { tier: 0 }],
        pool[2]
            .sources()
            .filter(|s| matches!(s, FeatureSource::PriorTier { .. }))
            .collect::<Vec<_>>()
    );

    // tier 1 sees its own dictionary projection only
    assert!(pool[2].contains("DictTag", "NOUN&loct&sing"));
    assert!(pool[2].layer(FeatureSource::DictionaryCandidates { tier: 0 }).is_none());
}

#[test]
fn test_first_tier_pool_has_no_prior_layers() {
    let tagger = tagger(vec!["NOUN"], vec!["nomn&sing"]);
    let mut worker = tagger.new_worker();
    worker.reset_span(["кот"]);
    worker.decode().unwrap();

    let pool = worker.pool(0).unwrap();
    assert_eq!(
        vec![
            FeatureSource::Token,
            FeatureSource::Context,
            FeatureSource::DictionaryCandidates { tier: 0 },
        ],
        pool[0].sources().collect::<Vec<_>>()
    );
    assert!(pool[0].contains("DictTag", "NOUN"));
}

#[test]
fn test_later_tier_output_does_not_affect_earlier_tiers() {
    let span = ["Белый", "кот", "спит"];
    let tier0 = vec!["ADJF", "NOUN", "VERB"];
    let a = tagger(tier0.clone(), vec!["nomn&sing", "nomn&sing", "sing"]);
    let b = tagger(tier0, vec!["accs&plur", "gent&sing", ""]);

    let mut wa = a.new_worker();
    wa.reset_span(span);
    wa.decode().unwrap();
    let mut wb = b.new_worker();
    wb.reset_span(span);
    wb.decode().unwrap();

    assert_eq!(wa.labels(0), wb.labels(0));
    assert_eq!(wa.pool(0), wb.pool(0));
    assert_eq!(wa.pool(1), wb.pool(1));
    assert_ne!(wa.labels(1), wb.labels(1));
}

#[test]
fn test_tag_union() {
    let tagger = tagger(vec!["ADJF", "NOUN", "PNCT"], vec!["nomn&sing", "nomn&sing", ""]);
    let span = [
        Token::new(0, 10, "Белый"),
        Token::new(11, 17, "кот"),
        Token::new(17, 18, "."),
    ];
    let tags = tagger.tag(&span).unwrap();
    assert_eq!(
        &["ADJF", "nomn", "sing"],
        tags[0].wordform().unwrap().grammemes()
    );
    assert_eq!(Some("NOUN"), tags[1].wordform().unwrap().pos_tag());
    assert_eq!(&["PNCT"], tags[2].wordform().unwrap().grammemes());
}

#[test]
fn test_conflicting_values_are_rejected() {
    let tagger = tagger(vec!["NOUN"], vec!["nomn&gent"]);
    assert!(matches!(
        tagger.tag(&[Token::new(0, 6, "кот")]),
        Err(crate::errors::TiertagError::InconsistentAnnotation(_))
    ));
}

#[test]
fn test_worker_reuse() {
    let tagger = tagger(vec!["NOUN"], vec!["nomn&sing"]);
    let mut worker = tagger.new_worker();
    for _ in 0..3 {
        worker.reset_span(["кот"]);
        assert_eq!(1, worker.num_tokens());
        worker.decode().unwrap();
        assert_eq!(1, worker.tags().unwrap().len());
    }
}
