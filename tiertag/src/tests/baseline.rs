use crate::tagger::{BaselineOptions, DictionaryTagger, Resolution, Tagger};
use crate::test_utils;
use crate::token::{DebugMark, Token, TokenTag};

fn tagger(debug: bool, with_freq: bool) -> DictionaryTagger {
    let catalog = test_utils::catalog();
    let dictionary = test_utils::dictionary(&catalog, with_freq);
    DictionaryTagger::new(
        catalog,
        dictionary,
        BaselineOptions::default()
            .debug_grammemes(debug)
            .ignored(["Qual"]),
    )
    .unwrap()
}

#[test]
fn test_unique_candidate() {
    let tagger = tagger(false, true);
    let tags = tagger.tag(&[Token::new(0, 6, "Кот")]).unwrap();
    assert_eq!(1, tags.len());
    let wf = tags[0].wordform().unwrap();
    assert_eq!(Some("NOUN"), wf.pos_tag());
    assert_eq!(&["NOUN", "nomn", "sing"], wf.grammemes());
}

#[test]
fn test_ambiguous_without_frequency_entry() {
    let token = Token::new(0, 10, "банка");

    let tags = tagger(true, true).tag(&[token.clone()]).unwrap();
    assert_eq!(vec![TokenTag::Marked(DebugMark::Ambiguous)], tags);

    let tags = tagger(false, true).tag(&[token]).unwrap();
    assert_eq!(vec![TokenTag::Untagged], tags);
}

#[test]
fn test_ignored_category_merges_candidates() {
    // the Infr reading collapses into the plain nominative one
    let tagger = tagger(false, true);
    match tagger.resolve(&Token::new(0, 10, "банка")) {
        Resolution::Ambiguous(candidates) => assert_eq!(2, candidates.len()),
        r => panic!("unexpected resolution: {r:?}"),
    }
}

#[test]
fn test_frequency_store_resolves_ambiguity() {
    let token = Token::new(0, 12, "Стекла");
    let tags = tagger(true, true).tag(&[token.clone()]).unwrap();
    assert_eq!(
        &["NOUN", "nomn", "plur"],
        tags[0].wordform().unwrap().grammemes()
    );

    let tags = tagger(true, false).tag(&[token]).unwrap();
    assert_eq!(vec![TokenTag::Marked(DebugMark::Ambiguous)], tags);
}

#[test]
fn test_not_in_dictionary() {
    let span = [Token::new(0, 6, "пёс"), Token::new(6, 7, ",")];
    assert_eq!(
        vec![TokenTag::Marked(DebugMark::NotInDictionary), TokenTag::Untagged],
        tagger(true, true).tag(&span).unwrap()
    );
    assert_eq!(
        vec![TokenTag::Untagged, TokenTag::Untagged],
        tagger(false, true).tag(&span).unwrap()
    );
}

#[test]
fn test_deterministic() {
    let span: Vec<Token> = ["Белый", "кот", "спит", "на", "столе", "банка", "стёкла", "."]
        .iter()
        .map(|w| Token::new(0, w.len(), *w))
        .collect();
    let tagger = tagger(true, true);
    let first = tagger.tag(&span).unwrap();
    for _ in 0..10 {
        assert_eq!(first, tagger.tag(&span).unwrap());
    }
    assert_eq!(first, self::tagger(true, true).tag(&span).unwrap());
}

#[test]
fn test_unknown_pos_category() {
    let catalog = test_utils::catalog();
    let dictionary = test_utils::dictionary(&catalog, false);
    assert!(
        DictionaryTagger::new(
            catalog,
            dictionary,
            BaselineOptions::default().pos_category("NOUN"),
        )
        .is_err()
    );
}
