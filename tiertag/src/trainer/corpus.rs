//! 正解コーパス
//!
//! 各行が`表層形\t文法素,文法素,...`で、スパンの終わりに`EOS`が置かれる形式です。

use std::io::{BufRead, BufReader, BufWriter, Read, Write};

use crate::errors::{Result, TiertagError};
use crate::token::Token;

/// 正解の文法素が付いた語。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Word {
    surface: String,
    grammemes: Vec<String>,
}

impl Word {
    /// 表層形を返します。
    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// 正解の文法素を返します。
    pub fn grammemes(&self) -> &[String] {
        &self.grammemes
    }
}

/// 正解コーパスの1スパン。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Example {
    tokens: Vec<Word>,
}

impl Example {
    /// 語のスライスを返します。
    pub fn tokens(&self) -> &[Word] {
        &self.tokens
    }

    /// 表層形の列を返します。
    pub fn surfaces(&self) -> Vec<&str> {
        self.tokens.iter().map(Word::surface).collect()
    }

    /// 表層形を空白で区切ったトークン列に変換します。
    ///
    /// 位置はスパンの先頭からのバイト位置です。
    pub fn to_tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(self.tokens.len());
        let mut begin = 0;
        for w in &self.tokens {
            let end = begin + w.surface.len();
            tokens.push(Token::new(begin, end, w.surface.as_str()));
            begin = end + 1;
        }
        tokens
    }

    /// スパンをコーパスの形式で書き込みます。
    pub fn write<W>(&self, wtr: W) -> Result<()>
    where
        W: Write,
    {
        let mut wtr = BufWriter::new(wtr);
        for word in &self.tokens {
            writeln!(&mut wtr, "{}\t{}", word.surface, word.grammemes.join(","))?;
        }
        writeln!(&mut wtr, "EOS")?;
        Ok(())
    }
}

/// 正解コーパス。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Corpus {
    spans: Vec<Example>,
}

impl Corpus {
    /// コーパスを読み込みます。
    ///
    /// 語のないスパンは読み飛ばされます。
    ///
    /// # エラー
    ///
    /// 行が`表層形\t文法素`でも`EOS`でもない場合は[`TiertagError::InvalidFormat`]を返します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let buf = BufReader::new(rdr);

        let mut spans = vec![];
        let mut tokens = vec![];
        for (i, line) in buf.lines().enumerate() {
            let line = line?;
            let mut spl = line.split('\t');
            match (spl.next(), spl.next(), spl.next()) {
                (Some("EOS"), None, None) => {
                    if !tokens.is_empty() {
                        spans.push(Example {
                            tokens: std::mem::take(&mut tokens),
                        });
                    }
                }
                (Some(surface), Some(grammemes), None) if !surface.is_empty() => {
                    tokens.push(Word {
                        surface: surface.to_string(),
                        grammemes: grammemes
                            .split(',')
                            .map(str::trim)
                            .filter(|g| !g.is_empty())
                            .map(str::to_string)
                            .collect(),
                    });
                }
                _ => {
                    return Err(TiertagError::invalid_format(
                        "rdr",
                        format!(
                            "line {}: each line must be a pair of a surface and grammemes or `EOS`",
                            i + 1
                        ),
                    ));
                }
            }
        }
        if !tokens.is_empty() {
            log::warn!("[tiertag] the last span of the corpus has no `EOS`");
            spans.push(Example { tokens });
        }

        Ok(Self { spans })
    }

    /// スパンのスライスを返します。
    pub fn spans(&self) -> &[Example] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
