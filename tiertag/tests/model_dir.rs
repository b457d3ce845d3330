//! モデルディレクトリからの読み込みと文書の注釈を検証するテスト
//!
//! 一時ディレクトリに辞書ファイル、`model.conf`、ティアごとの`model.bin`を書き出し、
//! 公開APIだけでタガーを組み立てます。

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tempfile::{TempDir, tempdir};

use tiertag::classifier::{LinearChainModel, LinearChainModelBuilder, MODEL_FILE_NAME};
use tiertag::config::CONFIG_FILE_NAME;
use tiertag::errors::TiertagError;
use tiertag::utils::SharedResource;
use tiertag::{
    Document, GrammemeCatalog, LoadMode, MorphDictionary, MorphDictionaryBuilder, Tagger,
    TieredTagger,
};

const GRAMMEMES: &str = "\
POST,,,
NOUN,POST,,
VERB,POST,,
PNCT,POST,,
CAse,,,
nomn,CAse,,
accs,CAse,,
";

const DICT: &str = "\
кот,NOUN,nomn
кот,NOUN,accs
рыбу,NOUN,accs
ест,VERB
";

const CONF: &str = "\
tiers = pos case
tier.pos = POST
tier.case = CAse
context.left = 1
context.right = 1
";

fn pos_model() -> LinearChainModel {
    let mut builder = LinearChainModelBuilder::new(["NOUN", "VERB", "PNCT"]).unwrap();
    builder
        .add_state_weight("DictTag=NOUN", "NOUN", 2.0)
        .unwrap()
        .add_state_weight("DictTag=VERB", "VERB", 2.0)
        .unwrap()
        .add_state_weight("class=punct", "PNCT", 3.0)
        .unwrap();
    builder.build().unwrap()
}

fn case_model() -> LinearChainModel {
    let mut builder = LinearChainModelBuilder::new(["nomn", "accs", ""]).unwrap();
    builder
        .add_state_weight("Gram_at_0=NOUN", "nomn", 1.0)
        .unwrap()
        .add_state_weight("Gram_at_1=VERB", "accs", 2.0)
        .unwrap()
        .add_state_weight("Gram_at_0=VERB", "", 3.0)
        .unwrap()
        .add_state_weight("Gram_at_0=PNCT", "", 3.0)
        .unwrap();
    builder.build().unwrap()
}

fn write_model(dir: &Path, tier: &str, model: &LinearChainModel) {
    let tier_dir = dir.join(tier);
    fs::create_dir_all(&tier_dir).unwrap();
    model
        .write(File::create(tier_dir.join(MODEL_FILE_NAME)).unwrap())
        .unwrap();
}

fn setup() -> (TempDir, Arc<GrammemeCatalog>, Arc<MorphDictionary>) {
    let dir = tempdir().unwrap();
    let catalog = GrammemeCatalog::from_reader(GRAMMEMES.as_bytes()).unwrap();
    let dict = MorphDictionaryBuilder::from_readers(&catalog, DICT.as_bytes(), None::<&[u8]>)
        .unwrap();
    let dict_path = dir.path().join("tiertag.dic");
    MorphDictionary::from_inner(dict)
        .write(File::create(&dict_path).unwrap())
        .unwrap();
    let dictionary = MorphDictionary::from_path(&dict_path, LoadMode::Validate).unwrap();

    fs::write(dir.path().join(CONFIG_FILE_NAME), CONF).unwrap();
    write_model(dir.path(), "pos", &pos_model());
    write_model(dir.path(), "case", &case_model());
    (dir, Arc::new(catalog), Arc::new(dictionary))
}

#[test]
fn test_tag_from_model_dir() {
    let (dir, catalog, dictionary) = setup();
    let tagger = TieredTagger::from_dir(dir.path(), catalog, dictionary).unwrap();

    let mut doc = Document::from_text("кот ест рыбу .\n");
    let report = doc.annotate(&tagger).unwrap();
    assert_eq!(1, report.annotated());

    let words = doc.spans()[0].words().unwrap();
    assert_eq!(4, words.len());
    assert_eq!(Some("NOUN"), words[0].pos_tag());
    assert_eq!(&["NOUN", "nomn"], words[0].grammemes());
    assert_eq!(&["VERB"], words[1].grammemes());
    assert_eq!(&["NOUN", "accs"], words[2].grammemes());
    assert_eq!(&["PNCT"], words[3].grammemes());
    assert_eq!((23, 24), (words[3].begin(), words[3].end()));
}

#[test]
fn test_missing_tier_artifact() {
    let (dir, catalog, dictionary) = setup();
    fs::remove_file(dir.path().join("case").join(MODEL_FILE_NAME)).unwrap();
    assert!(matches!(
        TieredTagger::from_dir(dir.path(), catalog, dictionary),
        Err(TiertagError::Configuration(_))
    ));
}

#[test]
fn test_missing_config() {
    let (dir, catalog, dictionary) = setup();
    fs::remove_file(dir.path().join(CONFIG_FILE_NAME)).unwrap();
    assert!(matches!(
        TieredTagger::from_dir(dir.path(), catalog, dictionary),
        Err(TiertagError::Configuration(_))
    ));
}

#[test]
fn test_parallel_annotation_with_shared_tagger() {
    static TAGGER: SharedResource<TieredTagger> = SharedResource::new();

    let (dir, catalog, dictionary) = setup();
    let tagger = TAGGER
        .get_or_try_init(|| TieredTagger::from_dir(dir.path(), catalog, dictionary))
        .unwrap();

    let text = "кот ест рыбу .\nрыбу ест кот .\n".repeat(50);
    let mut seq = Document::from_text(&text);
    let mut par = seq.clone();
    seq.annotate(tagger.as_ref()).unwrap();
    let report = par.annotate_parallel(tagger.as_ref()).unwrap();
    assert_eq!(100, report.annotated());
    assert!(report.failures().is_empty());
    assert_eq!(seq, par);

    let spans: Vec<_> = par.spans().iter().map(|s| s.tokens().to_vec()).collect();
    assert!(tagger.tag_spans(&spans).iter().all(Result::is_ok));
}
