//! 外部プロセスによるタガー
//!
//! 行単位で問い合わせる外部タガーを子プロセスとして起動します。
//!
//! - 要求: トークンを1行に1つずつ書き、空行で終える
//! - 応答: トークンごとに`表層形\tタグ\t見出し語`の1行を返し、空行で終える
//!
//! タグと見出し語は省略できます。見出し語`<unknown>`は見出し語なしとして扱われます。
//! プロセスのハンドルは[`Mutex`]で保護され、一回の往復の間は排他的に保持されます。

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Mutex, MutexGuard};

use crate::errors::{Result, TiertagError};
use crate::tagger::Tagger;
use crate::token::{Token, TokenTag, Wordform};

const UNKNOWN_LEMMA: &str = "<unknown>";

struct ProcessHandle {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    // set once a request or reply was cut off midway
    desynced: bool,
}

impl ProcessHandle {
    fn round_trip(&mut self, span: &[Token]) -> Result<Vec<TokenTag>> {
        if self.desynced {
            return Err(TiertagError::invalid_state(
                "tagger process is out of sync",
                "an earlier exchange was interrupted",
            ));
        }
        if let Some(token) = span
            .iter()
            .find(|t| t.text().is_empty() || t.text().contains(['\n', '\r']))
        {
            return Err(TiertagError::invalid_argument(
                "span",
                format!("token at {} cannot be sent on a single line", token.begin()),
            ));
        }

        let replies = self.exchange(span).inspect_err(|_| self.desynced = true)?;
        if replies.len() != span.len() {
            // the stream stays aligned: the terminator line has been consumed
            return Err(TiertagError::invalid_format(
                "reply",
                format!("{} replies for {} tokens", replies.len(), span.len()),
            ));
        }
        Ok(span
            .iter()
            .zip(&replies)
            .map(|(token, reply)| parse_reply(token, reply))
            .collect())
    }

    /// 要求を書き込み、終端の空行までの応答行を読み取ります。
    fn exchange(&mut self, span: &[Token]) -> Result<Vec<String>> {
        for token in span {
            writeln!(self.stdin, "{}", token.text())?;
        }
        writeln!(self.stdin)?;
        self.stdin.flush()?;

        let mut replies = Vec::with_capacity(span.len());
        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(TiertagError::invalid_state(
                    "tagger process closed its output",
                    format!("{} of {} tokens were answered", replies.len(), span.len()),
                ));
            }
            let reply = line.trim_end_matches(['\n', '\r']);
            if reply.is_empty() {
                return Ok(replies);
            }
            replies.push(reply.to_string());
        }
    }
}

fn parse_reply(token: &Token, reply: &str) -> TokenTag {
    let mut cols = reply.split('\t').skip(1);
    let tag = cols.next().filter(|s| !s.is_empty());
    let lemma = cols.next().filter(|s| !s.is_empty() && *s != UNKNOWN_LEMMA);
    match tag {
        // punctuation and special tokens get no wordform
        Some(tag) if token.can_carry_word() => {
            let wf = Wordform::from_external_tag(tag);
            TokenTag::Tagged(match lemma {
                Some(lemma) => wf.with_lemma(lemma, None),
                None => wf,
            })
        }
        _ => TokenTag::Untagged,
    }
}

/// 外部プロセスに問い合わせるタガー。
pub struct ProcessTagger {
    handle: Mutex<ProcessHandle>,
}

impl ProcessTagger {
    /// 外部タガーを起動します。
    ///
    /// # 引数
    ///
    /// * `program` - 実行ファイル
    /// * `args` - コマンドライン引数
    ///
    /// # エラー
    ///
    /// プロセスを起動できない場合は[`TiertagError::Configuration`]を返します。
    pub fn spawn<P, I, S>(program: P, args: I) -> Result<Self>
    where
        P: AsRef<OsStr>,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = program.as_ref();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TiertagError::configuration(format!(
                    "failed to start {}: {e}",
                    program.to_string_lossy()
                ))
            })?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(TiertagError::configuration("tagger process has no pipes"));
        };
        log::info!(
            "[tiertag] started tagger process {} (pid {})",
            program.to_string_lossy(),
            child.id()
        );
        Ok(Self {
            handle: Mutex::new(ProcessHandle {
                child,
                stdin,
                stdout: BufReader::new(stdout),
                desynced: false,
            }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProcessHandle>> {
        self.handle
            .lock()
            .map_err(|e| TiertagError::invalid_state("tagger process handle is poisoned", e.to_string()))
    }

    /// 文書全体のスパンを、ハンドルを保持したまま順に問い合わせます。
    ///
    /// # エラー
    ///
    /// プロセスとの通信に失敗した場合、最初の失敗で中断してエラーを返します。
    pub fn tag_document(&self, spans: &[Vec<Token>]) -> Result<Vec<Vec<TokenTag>>> {
        let mut handle = self.lock()?;
        spans.iter().map(|span| handle.round_trip(span)).collect()
    }
}

impl Tagger for ProcessTagger {
    fn tag(&self, span: &[Token]) -> Result<Vec<TokenTag>> {
        self.lock()?.round_trip(span)
    }
}

impl Drop for ProcessTagger {
    fn drop(&mut self) {
        let handle = match self.handle.get_mut() {
            Ok(handle) => handle,
            Err(poisoned) => poisoned.into_inner(),
        };
        log::info!("[tiertag] cleaning up tagger process");
        if let Err(e) = handle.child.kill() {
            log::warn!("[tiertag] failed to stop tagger process: {e}");
        }
        let _ = handle.child.wait();
    }
}
