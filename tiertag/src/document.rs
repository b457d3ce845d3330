//! 文書と注釈
//!
//! [`Document`]はスパンの列で、各スパンはトークンの列です。タガーの出力は
//! スパン単位で[`WordAnnotation`]として書き戻されます。あるスパンの失敗は
//! 他のスパンの結果に影響しません。

use rayon::prelude::*;

use crate::errors::{Result, TiertagError};
use crate::tagger::Tagger;
use crate::token::{Token, TokenTag};

/// 一つの語に書き戻される注釈。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordAnnotation {
    begin: usize,
    end: usize,
    lemma: Option<String>,
    lemma_id: Option<u32>,
    pos_tag: Option<String>,
    grammemes: Vec<String>,
}

impl WordAnnotation {
    /// タガーの出力から注釈を作ります。[`TokenTag::Untagged`]には注釈を作りません。
    pub fn from_tag(token: &Token, tag: &TokenTag) -> Option<Self> {
        let (lemma, lemma_id, pos_tag, grammemes) = match tag {
            TokenTag::Tagged(wf) => (
                wf.lemma().map(str::to_string),
                wf.lemma_id(),
                wf.pos_tag().map(str::to_string),
                wf.grammemes().to_vec(),
            ),
            TokenTag::Marked(mark) => (None, None, None, vec![mark.grammeme().to_string()]),
            TokenTag::Untagged => return None,
        };
        Some(Self {
            begin: token.begin(),
            end: token.end(),
            lemma,
            lemma_id,
            pos_tag,
            grammemes,
        })
    }

    #[inline(always)]
    pub const fn begin(&self) -> usize {
        self.begin
    }

    #[inline(always)]
    pub const fn end(&self) -> usize {
        self.end
    }

    #[inline(always)]
    pub fn lemma(&self) -> Option<&str> {
        self.lemma.as_deref()
    }

    #[inline(always)]
    pub const fn lemma_id(&self) -> Option<u32> {
        self.lemma_id
    }

    #[inline(always)]
    pub fn pos_tag(&self) -> Option<&str> {
        self.pos_tag.as_deref()
    }

    #[inline(always)]
    pub fn grammemes(&self) -> &[String] {
        &self.grammemes
    }
}

/// 一括して復号されるトークンの列。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    tokens: Vec<Token>,
    words: Option<Vec<WordAnnotation>>,
}

impl Span {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            words: None,
        }
    }

    /// 空白で区切られたテキストからスパンを作成します。
    ///
    /// 各トークンの位置は`text`内のバイト位置に`offset`を加えたものです。
    pub fn from_text(text: &str, offset: usize) -> Self {
        let mut tokens = vec![];
        let mut begin = None;
        for (i, c) in text.char_indices().chain([(text.len(), ' ')]) {
            match (c.is_whitespace(), begin) {
                (true, Some(b)) => {
                    tokens.push(Token::new(offset + b, offset + i, &text[b..i]));
                    begin = None;
                }
                (false, None) => begin = Some(i),
                _ => {}
            }
        }
        Self::new(tokens)
    }

    #[inline(always)]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// 書き戻された注釈を返します。まだ注釈されていない、または失敗した場合は`None`です。
    #[inline(always)]
    pub fn words(&self) -> Option<&[WordAnnotation]> {
        self.words.as_deref()
    }

    fn commit(&mut self, tags: Vec<TokenTag>) -> Result<()> {
        if tags.len() != self.tokens.len() {
            return Err(TiertagError::inconsistent_annotation(format!(
                "{} tags for {} tokens",
                tags.len(),
                self.tokens.len()
            )));
        }
        self.words = Some(
            self.tokens
                .iter()
                .zip(&tags)
                .filter_map(|(token, tag)| WordAnnotation::from_tag(token, tag))
                .collect(),
        );
        Ok(())
    }
}

/// 注釈処理の結果。
#[derive(Debug, Default)]
pub struct AnnotationReport {
    annotated: usize,
    failures: Vec<(usize, TiertagError)>,
}

impl AnnotationReport {
    /// 注釈に成功したスパンの数を返します。
    #[inline(always)]
    pub const fn annotated(&self) -> usize {
        self.annotated
    }

    /// 失敗したスパンの位置とエラーを返します。
    #[inline(always)]
    pub fn failures(&self) -> &[(usize, TiertagError)] {
        &self.failures
    }
}

/// スパンの列からなる文書。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    spans: Vec<Span>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1行を1スパンとして、空白区切りのテキストから文書を作成します。
    ///
    /// トークンの位置は`text`全体でのバイト位置です。空行はスパンになりません。
    pub fn from_text(text: &str) -> Self {
        let mut spans = vec![];
        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            let span = Span::from_text(line, offset);
            if !span.tokens().is_empty() {
                spans.push(span);
            }
            offset += line.len();
        }
        Self { spans }
    }

    pub fn push_span(&mut self, tokens: Vec<Token>) {
        self.spans.push(Span::new(tokens));
    }

    #[inline(always)]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// すべてのスパンを順に注釈します。
    ///
    /// スパン単位の失敗は[`AnnotationReport`]に記録され、処理は続行されます。
    ///
    /// # エラー
    ///
    /// 致命的なエラー([`TiertagError::is_fatal`])が起きた場合は直ちに返します。
    pub fn annotate(&mut self, tagger: &dyn Tagger) -> Result<AnnotationReport> {
        let mut report = AnnotationReport::default();
        for (i, span) in self.spans.iter_mut().enumerate() {
            let result = tagger.tag(&span.tokens);
            Self::record(&mut report, i, span, result)?;
        }
        Ok(report)
    }

    /// スパンを`rayon`のスレッドプールで並行に注釈します。
    ///
    /// 結果は[`annotate`](Self::annotate)と同じです。
    pub fn annotate_parallel(&mut self, tagger: &dyn Tagger) -> Result<AnnotationReport> {
        let results: Vec<_> = self
            .spans
            .par_iter()
            .map(|span| tagger.tag(&span.tokens))
            .collect();
        let mut report = AnnotationReport::default();
        for (i, (span, result)) in self.spans.iter_mut().zip(results).enumerate() {
            Self::record(&mut report, i, span, result)?;
        }
        Ok(report)
    }

    fn record(
        report: &mut AnnotationReport,
        i: usize,
        span: &mut Span,
        result: Result<Vec<TokenTag>>,
    ) -> Result<()> {
        span.words = None;
        match result.and_then(|tags| span.commit(tags)) {
            Ok(()) => report.annotated += 1,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("[tiertag] span {i} is left unannotated: {e}");
                report.failures.push((i, e));
            }
        }
        Ok(())
    }
}
