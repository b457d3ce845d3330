//! タガー
//!
//! すべてのタガーは[`Tagger`]トレイトを実装します。
//!
//! - [`DictionaryTagger`]: 辞書と頻度ストアだけを使う決定的なベースライン
//! - [`TieredTagger`]: ティアごとの系列分類器を順に適用するタガー
//! - [`ProcessTagger`]: 外部プロセスに問い合わせるタガー
pub mod baseline;
pub mod process;
pub mod tiered;

use crate::errors::Result;
use crate::token::{Token, TokenTag};

pub use crate::tagger::baseline::{BaselineOptions, DictionaryTagger, Resolution};
pub use crate::tagger::process::ProcessTagger;
pub use crate::tagger::tiered::{TieredTagger, Worker};

/// タガーの共通インターフェース。
pub trait Tagger: Send + Sync {
    /// スパン内の各トークンにタグを付けます。
    ///
    /// 戻り値の長さは`span`と一致します。
    ///
    /// # エラー
    ///
    /// スパン単位で失敗した場合にエラーを返します。
    fn tag(&self, span: &[Token]) -> Result<Vec<TokenTag>>;

    /// 複数のスパンを順にタグ付けします。
    ///
    /// 各スパンの結果は独立しており、一つのスパンの失敗は他のスパンの結果に影響しません。
    fn tag_spans(&self, spans: &[Vec<Token>]) -> Vec<Result<Vec<TokenTag>>> {
        spans.iter().map(|span| self.tag(span)).collect()
    }
}
