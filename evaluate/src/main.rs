//! タガーの精度を評価するユーティリティ
//!
//! このバイナリは、正解コーパスに対してタガーを実行し、トークン単位の正解率と、
//! (位置, 文法素)の組に対する適合率(Precision)、再現率(Recall)、F1スコアを計算します。

use std::collections::HashSet;
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use tiertag::tagger::{BaselineOptions, DictionaryTagger, Tagger, TieredTagger};
use tiertag::trainer::Corpus;
use tiertag::{GrammemeCatalog, LoadMode, MorphDictionary, TokenTag};

use clap::Parser;

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "evaluate", about = "Evaluate the tagging accuracy")]
struct Args {
    /// Test corpus.
    #[clap(short = 't', long)]
    test_in: PathBuf,

    /// Grammeme catalog (id,parentId,alias,description).
    #[clap(short = 'g', long)]
    grammemes: PathBuf,

    /// Compiled dictionary.
    #[clap(short = 'i', long)]
    dict_in: PathBuf,

    /// Model directory. If not specified, the dictionary-only baseline is evaluated.
    #[clap(short = 'm', long)]
    model_dir: Option<PathBuf>,

    /// Categories used to determine the correctness.
    ///
    /// Specify comma-separated category ids.
    /// If empty, all categories are used.
    #[clap(long, value_delimiter(','))]
    categories: Vec<String>,
}

/// 評価対象のカテゴリに属する文法素だけを残す
fn select<'a, I>(catalog: &GrammemeCatalog, categories: &[String], grams: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    grams
        .into_iter()
        .filter(|g| {
            categories.is_empty()
                || catalog
                    .category_of(g)
                    .is_some_and(|c| categories.iter().any(|x| x == c))
        })
        .cloned()
        .collect()
}

/// 評価の集計値
#[derive(Debug, Default)]
struct Counts {
    tokens: usize,
    exact: usize,
    refs: usize,
    syss: usize,
    correct: usize,
}

/// 分母が0の場合は`None`
fn ratio(num: usize, den: usize) -> Option<f64> {
    (den != 0).then(|| num as f64 / den as f64)
}

impl Counts {
    fn add(&mut self, refs: &HashSet<String>, syss: &HashSet<String>) {
        self.tokens += 1;
        if refs == syss {
            self.exact += 1;
        }
        self.refs += refs.len();
        self.syss += syss.len();
        self.correct += refs.intersection(syss).count();
    }

    fn accuracy(&self) -> Option<f64> {
        ratio(self.exact, self.tokens)
    }

    fn precision(&self) -> Option<f64> {
        ratio(self.correct, self.syss)
    }

    fn recall(&self) -> Option<f64> {
        ratio(self.correct, self.refs)
    }

    fn f1(&self) -> Option<f64> {
        let (p, r) = (self.precision()?, self.recall()?);
        (p + r > 0.0).then(|| 2.0 * p * r / (p + r))
    }
}

fn print_score(name: &str, score: Option<f64>) {
    match score {
        Some(score) => println!("{name} = {score}"),
        None => println!("{name} = n/a"),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    eprintln!("Loading the dictionary...");
    let catalog = Arc::new(GrammemeCatalog::from_reader(File::open(&args.grammemes)?)?);
    let dictionary = Arc::new(MorphDictionary::from_path(&args.dict_in, LoadMode::Validate)?);

    let tagger: Box<dyn Tagger> = match &args.model_dir {
        Some(dir) => Box::new(TieredTagger::from_dir(dir, catalog.clone(), dictionary)?),
        None => Box::new(DictionaryTagger::new(
            catalog.clone(),
            dictionary,
            BaselineOptions::default(),
        )?),
    };

    eprintln!("Tagging...");

    let corpus = Corpus::from_reader(File::open(args.test_in)?)?;

    let mut counts = Counts::default();
    let mut num_failed = 0;
    for example in corpus.spans() {
        let tokens = example.to_tokens();
        let tags = match tagger.tag(&tokens) {
            Ok(tags) => tags,
            Err(e) => {
                eprintln!("{e}");
                num_failed += 1;
                vec![TokenTag::Untagged; tokens.len()]
            }
        };
        for (word, tag) in example.tokens().iter().zip(&tags) {
            let refs = select(&catalog, &args.categories, word.grammemes());
            let syss = match tag {
                TokenTag::Tagged(wf) => select(&catalog, &args.categories, wf.grammemes()),
                _ => HashSet::new(),
            };
            counts.add(&refs, &syss);
        }
    }

    if counts.tokens == 0 {
        eprintln!("The test corpus has no tokens.");
    }
    print_score("Accuracy", counts.accuracy());
    print_score("Precision", counts.precision());
    print_score("Recall", counts.recall());
    print_score("F1", counts.f1());
    if num_failed > 0 {
        println!("Failed spans = {num_failed}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(grams: &[&str]) -> HashSet<String> {
        grams.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn test_scores() {
        let mut counts = Counts::default();
        counts.add(&set(&["NOUN", "nomn"]), &set(&["NOUN", "nomn"]));
        counts.add(&set(&["NOUN", "gent"]), &set(&["NOUN"]));
        assert_eq!(Some(0.5), counts.accuracy());
        assert_eq!(Some(1.0), counts.precision());
        assert_eq!(Some(0.75), counts.recall());
    }

    #[test]
    fn test_empty_corpus_has_no_scores() {
        let counts = Counts::default();
        assert_eq!(None, counts.accuracy());
        assert_eq!(None, counts.precision());
        assert_eq!(None, counts.f1());
    }

    #[test]
    fn test_untagged_output_has_no_precision() {
        let mut counts = Counts::default();
        counts.add(&set(&["NOUN"]), &set(&[]));
        assert_eq!(Some(0.0), counts.accuracy());
        assert_eq!(None, counts.precision());
        assert_eq!(Some(0.0), counts.recall());
        assert_eq!(None, counts.f1());
    }
}
