//! トークンと語形
//!
//! [`Token`]は上流のトークナイザーから渡される読み取り専用のテキスト区間です。
//! [`Wordform`]はタガーが生成する文法的な読みで、トークンに付与されます。

use crate::catalog::{GrammemeCatalog, TagBits};

/// 上流から渡されるトークン。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    begin: usize,
    end: usize,
    text: String,
}

impl Token {
    /// 新しいトークンを作成します。
    ///
    /// # 引数
    ///
    /// * `begin` - 文書内の開始位置
    /// * `end` - 文書内の終了位置
    /// * `text` - トークンの表層形
    pub fn new<S>(begin: usize, end: usize, text: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            begin,
            end,
            text: text.into(),
        }
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
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 語を担いうるトークン(文字または数字を含む)であれば`true`を返します。
    pub fn can_carry_word(&self) -> bool {
        self.text.chars().any(char::is_alphanumeric)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// トークンに付与される文法的な読み。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Wordform {
    pos_tag: Option<String>,
    lemma: Option<String>,
    lemma_id: Option<u32>,
    grammemes: Vec<String>,
}

impl Wordform {
    /// タグのビットベクターから語形を作成します。
    ///
    /// 品詞カテゴリに属する文法素が品詞タグになります。文法素の列には品詞タグも含め、
    /// タグのすべての文法素が数値ID順に入ります。見出し語は設定されません。
    pub fn from_bits(catalog: &GrammemeCatalog, pos_category: &str, bits: &TagBits) -> Self {
        let grammemes: Vec<String> = catalog.grammemes_of(bits).map(str::to_string).collect();
        let pos_tag = grammemes
            .iter()
            .find(|g| catalog.category_of(g) == Some(pos_category) && g.as_str() != pos_category)
            .cloned();
        Self {
            pos_tag,
            lemma: None,
            lemma_id: None,
            grammemes,
        }
    }

    /// 外部タガーが出力したタグから語形を作成します。
    ///
    /// タグはそのまま品詞タグになり、文法素の列もタグ一つだけになります。
    pub fn from_external_tag<S>(tag: S) -> Self
    where
        S: Into<String>,
    {
        let tag = tag.into();
        Self {
            pos_tag: Some(tag.clone()),
            lemma: None,
            lemma_id: None,
            grammemes: vec![tag],
        }
    }

    #[inline(always)]
    pub fn pos_tag(&self) -> Option<&str> {
        self.pos_tag.as_deref()
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
    pub fn grammemes(&self) -> &[String] {
        &self.grammemes
    }

    /// 見出し語を設定します。
    pub fn with_lemma<S>(mut self, lemma: S, lemma_id: Option<u32>) -> Self
    where
        S: Into<String>,
    {
        self.lemma = Some(lemma.into());
        self.lemma_id = lemma_id;
        self
    }
}

/// デバッグ用の印。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DebugMark {
    /// 辞書に候補がない
    NotInDictionary,
    /// 候補が複数あり、頻度ストアでも解消できない
    Ambiguous,
}

impl DebugMark {
    /// 印として付与される文法素名を返します。
    pub const fn grammeme(&self) -> &'static str {
        match self {
            Self::NotInDictionary => "not-dict",
            Self::Ambiguous => "ambiguous",
        }
    }
}

/// 一つのトークンに対するタガーの出力。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenTag {
    /// 語形が決まった
    Tagged(Wordform),
    /// 語形は作られず、デバッグ用の印だけが付いた
    Marked(DebugMark),
    /// 何も付与されない
    Untagged,
}

impl TokenTag {
    /// 語形があれば返します。
    pub fn wordform(&self) -> Option<&Wordform> {
        match self {
            Self::Tagged(wf) => Some(wf),
            _ => None,
        }
    }
}
