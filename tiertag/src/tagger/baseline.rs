//! 辞書のみのベースラインタガー
//!
//! 分類器を使わず、トークンごとに次の手順で語形を決めます。
//!
//! 1. 表層形を正規化する
//! 2. 辞書の候補を引き、[`trim_and_merge`]を適用する
//! 3. 候補がなければ、デバッグモードでのみ`not-dict`の印を付ける
//! 4. 候補が一つなら、それを語形にする
//! 5. 候補が複数なら頻度ストアを引き、あればその読みを語形にする。
//!    なければ、デバッグモードでのみ`ambiguous`の印を付ける
//!
//! 同じ辞書と頻度ストアに対して結果は常に同じです。

use std::sync::Arc;

use crate::catalog::{DEFAULT_POS_CATEGORY, GrammemeCatalog, TagBits};
use crate::dictionary::{MorphDictionary, normalize, trim_and_merge};
use crate::errors::{Result, TiertagError};
use crate::tagger::Tagger;
use crate::token::{DebugMark, Token, TokenTag, Wordform};

/// ベースラインタガーの設定。
#[derive(Clone, Debug)]
pub struct BaselineOptions {
    debug_grammemes: bool,
    ignored: Vec<String>,
    pos_category: String,
}

impl Default for BaselineOptions {
    fn default() -> Self {
        Self {
            debug_grammemes: false,
            ignored: vec![],
            pos_category: DEFAULT_POS_CATEGORY.to_string(),
        }
    }
}

impl BaselineOptions {
    /// 辞書にない語と曖昧な語に印を付けるかどうかを設定します。
    pub const fn debug_grammemes(mut self, yes: bool) -> Self {
        self.debug_grammemes = yes;
        self
    }

    /// 候補から取り除くカテゴリを設定します。
    pub fn ignored<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored = categories.into_iter().map(Into::into).collect();
        self
    }

    /// 品詞カテゴリを設定します。
    pub fn pos_category<S>(mut self, category: S) -> Self
    where
        S: Into<String>,
    {
        self.pos_category = category.into();
        self
    }
}

/// トークン一つの辞書引きの結果。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// 語を担わないトークン
    NotAWord,
    /// 辞書に候補がない
    NotInDictionary,
    /// 候補がただ一つ
    Unique(TagBits),
    /// 候補が複数あり、頻度ストアで解消された
    Disambiguated(TagBits),
    /// 候補が複数あり、解消できない
    Ambiguous(Vec<TagBits>),
}

/// 辞書と頻度ストアだけを使うタガー。
pub struct DictionaryTagger {
    catalog: Arc<GrammemeCatalog>,
    dictionary: Arc<MorphDictionary>,
    keep: TagBits,
    debug_grammemes: bool,
    pos_category: String,
}

impl DictionaryTagger {
    /// 新しいタガーを作成します。
    ///
    /// # エラー
    ///
    /// 辞書が別のカタログで構築されている場合、または無視カテゴリや品詞カテゴリが
    /// カタログに登録されていない場合にエラーを返します。
    pub fn new(
        catalog: Arc<GrammemeCatalog>,
        dictionary: Arc<MorphDictionary>,
        options: BaselineOptions,
    ) -> Result<Self> {
        dictionary.verify_catalog(&catalog)?;
        if !catalog.is_category(&options.pos_category) {
            return Err(TiertagError::configuration(format!(
                "pos category '{}' is not a registered category",
                options.pos_category
            )));
        }
        let keep = catalog
            .category_mask(&options.ignored)
            .map_err(|e| TiertagError::configuration(e.to_string()))?
            .complement();
        Ok(Self {
            catalog,
            dictionary,
            keep,
            debug_grammemes: options.debug_grammemes,
            pos_category: options.pos_category,
        })
    }

    /// トークンの表層形を辞書で解決します。
    pub fn resolve(&self, token: &Token) -> Resolution {
        if !token.can_carry_word() {
            return Resolution::NotAWord;
        }
        let normalized = normalize(token.text());
        let mut candidates = trim_and_merge(self.dictionary.lookup(&normalized), &self.keep);
        match candidates.len() {
            0 => Resolution::NotInDictionary,
            1 => Resolution::Unique(candidates.remove(0)),
            _ => match self.dictionary.pos_bits(&normalized) {
                Some(bits) => Resolution::Disambiguated(bits.masked(&self.keep)),
                None => Resolution::Ambiguous(candidates),
            },
        }
    }

    /// 一つのトークンにタグを付けます。
    pub fn tag_token(&self, token: &Token) -> TokenTag {
        match self.resolve(token) {
            Resolution::NotAWord => TokenTag::Untagged,
            Resolution::Unique(bits) | Resolution::Disambiguated(bits) => TokenTag::Tagged(
                Wordform::from_bits(&self.catalog, &self.pos_category, &bits),
            ),
            Resolution::NotInDictionary if self.debug_grammemes => {
                TokenTag::Marked(DebugMark::NotInDictionary)
            }
            Resolution::Ambiguous(_) if self.debug_grammemes => {
                TokenTag::Marked(DebugMark::Ambiguous)
            }
            Resolution::NotInDictionary | Resolution::Ambiguous(_) => TokenTag::Untagged,
        }
    }
}

impl Tagger for DictionaryTagger {
    fn tag(&self, span: &[Token]) -> Result<Vec<TokenTag>> {
        Ok(span.iter().map(|t| self.tag_token(t)).collect())
    }
}
