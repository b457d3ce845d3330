//! 形態素タグ付けを実行するユーティリティ
//!
//! このバイナリは、標準入力から1行1スパンの空白区切りテキストを読み込み、
//! 辞書のみのベースラインまたはティア分類器でタグ付けした結果を出力します。

use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tiertag::document::Span;
use tiertag::tagger::{BaselineOptions, DictionaryTagger, Tagger, TieredTagger};
use tiertag::{GrammemeCatalog, LoadMode, MorphDictionary, TokenTag};

use clap::Parser;

/// 出力モード
#[derive(Clone, Debug)]
enum OutputMode {
    Mecab,
    Detail,
}

impl FromStr for OutputMode {
    type Err = &'static str;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "mecab" => Ok(Self::Mecab),
            "detail" => Ok(Self::Detail),
            _ => Err("Could not parse a mode"),
        }
    }
}

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "tag", about = "Predicts grammatical tags of tokenized text")]
struct Args {
    /// Grammeme catalog (id,parentId,alias,description).
    #[clap(short = 'g', long)]
    grammemes: PathBuf,

    /// Compiled dictionary.
    #[clap(short = 'i', long)]
    dict: PathBuf,

    /// Model directory holding model.conf and one subdirectory per tier.
    ///
    /// If this argument is not specified, the dictionary-only baseline is used.
    #[clap(short = 'm', long)]
    model_dir: Option<PathBuf>,

    /// Marks tokens that are not in the dictionary or remain ambiguous (baseline only).
    #[clap(short = 'd', long)]
    debug_grammemes: bool,

    /// Categories removed from dictionary candidates (baseline only).
    #[clap(long, value_delimiter(','))]
    ignored: Vec<String>,

    /// Skips validation of the dictionary once it has been validated.
    #[clap(long)]
    trust_cache: bool,

    /// Output mode. Choices are mecab and detail.
    #[clap(short = 'O', long, default_value = "mecab")]
    output_mode: OutputMode,
}

fn write_tag<W: Write>(out: &mut W, surface: &str, tag: &TokenTag, mode: &OutputMode) -> std::io::Result<()> {
    match (mode, tag) {
        (OutputMode::Mecab, TokenTag::Tagged(wf)) => {
            writeln!(out, "{surface}\t{}", wf.grammemes().join(","))
        }
        (OutputMode::Mecab, TokenTag::Marked(mark)) => writeln!(out, "{surface}\t{}", mark.grammeme()),
        (OutputMode::Mecab, TokenTag::Untagged) => writeln!(out, "{surface}\t*"),
        (OutputMode::Detail, TokenTag::Tagged(wf)) => writeln!(
            out,
            "{surface}\tpos={}\tlemma={}\tgrammemes={}",
            wf.pos_tag().unwrap_or("*"),
            wf.lemma().unwrap_or("*"),
            wf.grammemes().join(","),
        ),
        (OutputMode::Detail, TokenTag::Marked(mark)) => {
            writeln!(out, "{surface}\tpos=*\tlemma=*\tmark={}", mark.grammeme())
        }
        (OutputMode::Detail, TokenTag::Untagged) => writeln!(out, "{surface}\tpos=*\tlemma=*"),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    eprintln!("Loading the grammeme catalog...");
    let catalog = Arc::new(GrammemeCatalog::from_reader(File::open(&args.grammemes)?)?);

    eprintln!("Loading the dictionary...");
    let mode = if args.trust_cache {
        LoadMode::TrustCache
    } else {
        LoadMode::Validate
    };
    let dictionary = Arc::new(MorphDictionary::from_path(&args.dict, mode)?);

    let tagger: Box<dyn Tagger> = match &args.model_dir {
        Some(dir) => {
            eprintln!("Loading tier models...");
            Box::new(TieredTagger::from_dir(dir, catalog, dictionary)?)
        }
        None => Box::new(DictionaryTagger::new(
            catalog,
            dictionary,
            BaselineOptions::default()
                .debug_grammemes(args.debug_grammemes)
                .ignored(args.ignored.iter().cloned()),
        )?),
    };

    eprintln!("Ready to tag");

    let is_tty = atty::is(atty::Stream::Stdout);

    let out = std::io::stdout();
    let mut out = BufWriter::new(out.lock());
    for (i, line) in std::io::stdin().lock().lines().enumerate() {
        let line = line?;
        let span = Span::from_text(&line, 0);
        if span.tokens().is_empty() {
            continue;
        }
        match tagger.tag(span.tokens()) {
            Ok(tags) => {
                for (token, tag) in span.tokens().iter().zip(&tags) {
                    write_tag(&mut out, token.text(), tag, &args.output_mode)?;
                }
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                eprintln!("line {}: {e}", i + 1);
                for token in span.tokens() {
                    write_tag(&mut out, token.text(), &TokenTag::Untagged, &args.output_mode)?;
                }
            }
        }
        out.write_all(b"EOS\n")?;
        if is_tty {
            out.flush()?;
        }
    }

    Ok(())
}
