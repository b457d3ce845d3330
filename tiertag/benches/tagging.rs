//! タグ付けのベンチマーク
//!
//! 合成した辞書と線形連鎖モデルを使い、ベースラインタガーとティア分類器タガーの
//! 速度を計測します。

use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tiertag::classifier::{LinearChainModelBuilder, SequenceClassifier};
use tiertag::feature::{ContextWindow, FeaturePipeline};
use tiertag::tagger::{BaselineOptions, DictionaryTagger, Tagger, TieredTagger};
use tiertag::tiers::{Tier, TierPartition};
use tiertag::{Document, GrammemeCatalog, MorphDictionary, MorphDictionaryBuilder};

const GRAMMEMES: &str = "\
POST,,,
NOUN,POST,,
ADJF,POST,,
VERB,POST,,
PNCT,POST,,
CAse,,,
nomn,CAse,,
accs,CAse,,
NMbr,,,
sing,NMbr,,
plur,NMbr,,
";

const DICT: &str = "\
белый,ADJF,nomn,sing
белый,ADJF,accs,sing
кот,NOUN,nomn,sing
кот,NOUN,accs,sing
коты,NOUN,nomn,plur
ест,VERB,sing
едят,VERB,plur
рыбу,NOUN,accs,sing
";

const SENTENCES: &[&str] = &[
    "белый кот ест рыбу .",
    "коты едят рыбу .",
    "кот ест белую рыбу , а коты спят .",
];

fn tiered_tagger(catalog: Arc<GrammemeCatalog>, dict: Arc<MorphDictionary>) -> TieredTagger {
    let partition = TierPartition::new(
        &catalog,
        vec![Tier::new("pos", ["POST"]), Tier::new("case-num", ["CAse", "NMbr"])],
        &[] as &[&str],
    )
    .unwrap();

    let mut pos = LinearChainModelBuilder::new(["NOUN", "ADJF", "VERB", "PNCT"]).unwrap();
    for label in ["NOUN", "ADJF", "VERB"] {
        pos.add_state_weight(&format!("DictTag={label}"), label, 1.0)
            .unwrap();
    }
    pos.add_state_weight("class=punct", "PNCT", 2.0).unwrap();
    pos.set_transition("ADJF", "NOUN", 0.5).unwrap();

    let mut case_num =
        LinearChainModelBuilder::new(["nomn&sing", "accs&sing", "nomn&plur", "sing", "plur", ""])
            .unwrap();
    case_num
        .add_state_weight("Gram_at_-1=VERB", "nomn&sing", 1.0)
        .unwrap()
        .add_state_weight("Gram_at_1=VERB", "accs&sing", 1.0)
        .unwrap()
        .add_state_weight("Gram_at_0=PNCT", "", 2.0)
        .unwrap();

    let classifiers: Vec<Arc<dyn SequenceClassifier>> = vec![
        Arc::new(pos.build().unwrap()),
        Arc::new(case_num.build().unwrap()),
    ];
    let pipeline = FeaturePipeline::new(
        catalog,
        Arc::new(partition),
        dict,
        ContextWindow::default(),
    );
    TieredTagger::new(pipeline, classifiers, "POST").unwrap()
}

fn benchmark_taggers(c: &mut Criterion) {
    let catalog = Arc::new(GrammemeCatalog::from_reader(GRAMMEMES.as_bytes()).unwrap());
    let dict = MorphDictionaryBuilder::from_readers(&catalog, DICT.as_bytes(), None::<&[u8]>)
        .unwrap();
    let dict = Arc::new(MorphDictionary::from_inner(dict));

    let text = format!("{}\n", SENTENCES.join("\n")).repeat(100);
    let doc = Document::from_text(&text);

    let baseline =
        DictionaryTagger::new(catalog.clone(), dict.clone(), BaselineOptions::default()).unwrap();
    let tiered = tiered_tagger(catalog, dict);

    let mut group = c.benchmark_group("Tagging Speed");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.warm_up_time(Duration::from_secs(3));
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    group.bench_function(BenchmarkId::new("Baseline", "Corpus"), |b| {
        b.iter(|| {
            for span in doc.spans() {
                baseline.tag(span.tokens()).unwrap();
            }
        });
    });

    group.bench_function(BenchmarkId::new("Tiered", "Corpus"), |b| {
        b.iter_with_setup(
            || tiered.new_worker(),
            |mut worker| {
                for span in doc.spans() {
                    worker.reset_span(span.tokens().iter().map(|t| t.text()));
                    worker.decode().unwrap();
                }
            },
        );
    });

    group.bench_function(BenchmarkId::new("Tiered-Parallel", "Corpus"), |b| {
        b.iter_with_setup(
            || doc.clone(),
            |mut doc| {
                doc.annotate_parallel(&tiered).unwrap();
            },
        );
    });

    group.finish();
}

criterion_group!(benches, benchmark_taggers);
criterion_main!(benches);
