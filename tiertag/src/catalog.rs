//! 文法素カタログ
//!
//! 文法カテゴリ(品詞、格、数など)とその値を登録し、ビット位置として使う
//! 数値IDを割り当てます。親を持たない文法素はカテゴリとして扱われ、
//! それ以外の文法素は根の祖先をカテゴリとして持ちます。
//!
//! カタログはプロセス全体で一度だけ読み込まれ、読み込み後は変更されません。
pub mod bits;

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Read};

use hashbrown::HashMap;

use crate::errors::{DuplicateIdError, Result, TiertagError};
use crate::feature::label::LABEL_SEPARATOR;
use crate::utils::{FromU32, parse_csv_row};

pub use crate::catalog::bits::TagBits;

/// 品詞カテゴリのデフォルトID。
pub const DEFAULT_POS_CATEGORY: &str = "POST";

/// 文法素。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grammeme {
    id: String,
    parent_id: Option<String>,
    num_id: u32,
    alias: Option<String>,
    description: Option<String>,
}

impl Grammeme {
    /// 文法素IDを返します。
    #[inline(always)]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 親文法素のIDを返します。カテゴリの場合は`None`です。
    #[inline(always)]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// 登録順に割り当てられた数値IDを返します。ビット位置として使われます。
    #[inline(always)]
    pub const fn num_id(&self) -> u32 {
        self.num_id
    }

    #[inline(always)]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[inline(always)]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// 文法素のレジストリ。
///
/// 数値IDは0から始まり、登録順に1ずつ増加します。
#[derive(Clone, Debug, Default)]
pub struct GrammemeCatalog {
    grammemes: Vec<Grammeme>,
    index: HashMap<String, u32>,
}

impl GrammemeCatalog {
    /// 空のカタログを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 文法素を登録し、次の数値IDを割り当てます。
    ///
    /// # 引数
    ///
    /// * `id` - 文法素ID
    /// * `parent_id` - 親文法素のID。カテゴリを登録する場合は`None`
    /// * `alias` - 別名
    /// * `description` - 説明
    ///
    /// # 戻り値
    ///
    /// 登録された文法素への参照。
    ///
    /// # エラー
    ///
    /// - 同じIDが既に登録されている場合は[`TiertagError::DuplicateId`]を返します。
    /// - 親が未登録の場合は[`TiertagError::InvalidArgument`]を返します。
    pub fn register_grammeme(
        &mut self,
        id: &str,
        parent_id: Option<&str>,
        alias: Option<&str>,
        description: Option<&str>,
    ) -> Result<&Grammeme> {
        if id.is_empty() {
            return Err(TiertagError::invalid_argument("id", "empty grammeme id"));
        }
        if id.contains(LABEL_SEPARATOR) {
            return Err(TiertagError::invalid_argument(
                "id",
                format!("'{id}' contains the label separator '{LABEL_SEPARATOR}'"),
            ));
        }
        if self.index.contains_key(id) {
            return Err(TiertagError::DuplicateId(DuplicateIdError { id: id.to_string() }));
        }
        if let Some(parent) = parent_id
            && !self.index.contains_key(parent)
        {
            return Err(TiertagError::invalid_argument(
                "parent_id",
                format!("parent '{parent}' of '{id}' is not registered"),
            ));
        }
        let num_id = u32::try_from(self.grammemes.len())?;
        self.grammemes.push(Grammeme {
            id: id.to_string(),
            parent_id: parent_id.map(str::to_string),
            num_id,
            alias: alias.filter(|a| !a.is_empty()).map(str::to_string),
            description: description.filter(|d| !d.is_empty()).map(str::to_string),
        });
        self.index.insert(id.to_string(), num_id);
        Ok(&self.grammemes[usize::from_u32(num_id)])
    }

    /// CSV形式の定義表からカタログを読み込みます。
    ///
    /// 各行は`id,parentId,alias,description`の形式です。`parentId`が空の行は
    /// カテゴリを表します。空行と`#`で始まる行は無視されます。
    /// 親は子より前に定義されている必要があります。
    ///
    /// # エラー
    ///
    /// 行の形式が不正な場合、IDが重複する場合、または親が未定義の場合にエラーを返します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut catalog = Self::new();
        let reader = BufReader::new(rdr);
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let cols = parse_csv_row(trimmed)?;
            let id = cols.first().map(|s| s.trim()).unwrap_or_default();
            if id.is_empty() {
                return Err(TiertagError::invalid_format(
                    "grammemes.csv",
                    format!("line {}: missing grammeme id", i + 1),
                ));
            }
            let field = |k: usize| cols.get(k).map(|s| s.trim()).filter(|s| !s.is_empty());
            catalog.register_grammeme(id, field(1), field(2), field(3))?;
        }
        log::info!(
            "[tiertag] grammeme catalog loaded: {} grammemes, {} categories",
            catalog.len(),
            catalog.categories().count()
        );
        Ok(catalog)
    }

    /// 登録された文法素の数を返します。ビットベクターの幅と一致します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.grammemes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.grammemes.is_empty()
    }

    /// IDから文法素を取得します。
    pub fn get(&self, id: &str) -> Option<&Grammeme> {
        self.index
            .get(id)
            .map(|&n| &self.grammemes[usize::from_u32(n)])
    }

    /// 数値IDから文法素を取得します。
    pub fn by_num_id(&self, num_id: u32) -> Option<&Grammeme> {
        self.grammemes.get(usize::from_u32(num_id))
    }

    /// IDに対応する数値IDを返します。
    #[inline(always)]
    pub fn num_id(&self, id: &str) -> Option<u32> {
        self.index.get(id).copied()
    }

    /// 登録順に文法素を列挙します。
    pub fn iter(&self) -> impl Iterator<Item = &Grammeme> {
        self.grammemes.iter()
    }

    /// 登録順の文法素IDの列を返します。
    ///
    /// コンパイル済み辞書が同じカタログで作られたかの検証に使われます。
    pub fn id_order(&self) -> Vec<String> {
        self.grammemes.iter().map(|g| g.id.clone()).collect()
    }

    /// 親を持たない文法素(カテゴリ)を登録順に列挙します。
    pub fn categories(&self) -> impl Iterator<Item = &Grammeme> {
        self.grammemes.iter().filter(|g| g.parent_id.is_none())
    }

    /// 指定されたIDがカテゴリであれば`true`を返します。
    pub fn is_category(&self, id: &str) -> bool {
        self.get(id).is_some_and(|g| g.parent_id.is_none())
    }

    /// 文法素の属するカテゴリ(根の祖先)のIDを返します。
    ///
    /// カテゴリ自身に対しては自身のIDを返します。
    pub fn category_of(&self, id: &str) -> Option<&str> {
        let mut cur = self.get(id)?;
        while let Some(parent) = cur.parent_id.as_deref() {
            cur = self.get(parent)?;
        }
        Some(&cur.id)
    }

    /// 空のビットベクターを返します。
    #[inline(always)]
    pub fn empty_bits(&self) -> TagBits {
        TagBits::with_width(self.len())
    }

    /// 文法素IDの列をビットベクターに変換します。
    ///
    /// # エラー
    ///
    /// 未登録の文法素が含まれる場合にエラーを返します。
    pub fn to_bits<I, S>(&self, grams: I) -> Result<TagBits>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bits = self.empty_bits();
        for g in grams {
            let g = g.as_ref();
            let n = self.num_id(g).ok_or_else(|| {
                TiertagError::invalid_argument("grams", format!("unknown grammeme '{g}'"))
            })?;
            bits.set(usize::from_u32(n));
        }
        Ok(bits)
    }

    /// ビットベクターを文法素IDの列に変換します。数値ID順に並びます。
    pub fn grammemes_of<'a>(&'a self, bits: &'a TagBits) -> impl Iterator<Item = &'a str> + 'a {
        bits.iter_ones()
            .filter_map(|i| self.grammemes.get(i).map(|g| g.id.as_str()))
    }

    /// 指定されたカテゴリに属するすべての文法素のビットを立てたマスクを返します。
    ///
    /// # エラー
    ///
    /// 未登録のIDまたはカテゴリでないIDが含まれる場合にエラーを返します。
    pub fn category_mask<I, S>(&self, categories: I) -> Result<TagBits>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut wanted = BTreeSet::new();
        for c in categories {
            let c = c.as_ref();
            if !self.is_category(c) {
                return Err(TiertagError::invalid_argument(
                    "categories",
                    format!("'{c}' is not a registered category"),
                ));
            }
            wanted.insert(c.to_string());
        }
        let mut mask = self.empty_bits();
        for g in &self.grammemes {
            if let Some(cat) = self.category_of(&g.id)
                && wanted.contains(cat)
            {
                mask.set(usize::from_u32(g.num_id));
            }
        }
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAMMEMES: &str = "\
# id,parent,alias,description
POST,,ЧР,part of speech
NOUN,POST,СУЩ,noun
VERB,POST,ГЛ,verb
CAse,,Падеж,case
nomn,CAse,им,nominative
gent,CAse,рд,genitive
gen2,gent,рд2,second genitive
";

    #[test]
    fn test_num_ids_increase_in_registration_order() {
        let catalog = GrammemeCatalog::from_reader(GRAMMEMES.as_bytes()).unwrap();
        let ids: Vec<u32> = catalog.iter().map(Grammeme::num_id).collect();
        assert_eq!((0..7).collect::<Vec<u32>>(), ids);
        assert_eq!(Some(2), catalog.num_id("VERB"));
        assert_eq!(Some("ЧР"), catalog.get("POST").unwrap().alias());
    }

    #[test]
    fn test_duplicate_id() {
        let mut catalog = GrammemeCatalog::new();
        catalog.register_grammeme("POST", None, None, None).unwrap();
        let err = catalog
            .register_grammeme("POST", None, None, None)
            .unwrap_err();
        match err {
            TiertagError::DuplicateId(e) => assert_eq!("POST", e.id()),
            e => panic!("unexpected error: {e}"),
        }
        assert_eq!(1, catalog.len());
    }

    #[test]
    fn test_separator_in_id() {
        let mut catalog = GrammemeCatalog::new();
        assert!(catalog.register_grammeme("Anum&Sgtm", None, None, None).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_unknown_parent() {
        let mut catalog = GrammemeCatalog::new();
        assert!(
            catalog
                .register_grammeme("NOUN", Some("POST"), None, None)
                .is_err()
        );
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_category_of_nested() {
        let catalog = GrammemeCatalog::from_reader(GRAMMEMES.as_bytes()).unwrap();
        assert_eq!(Some("CAse"), catalog.category_of("gen2"));
        assert_eq!(Some("POST"), catalog.category_of("POST"));
        assert_eq!(None, catalog.category_of("plur"));
        assert_eq!(
            vec!["POST", "CAse"],
            catalog.categories().map(Grammeme::id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_bits_round_trip() {
        let catalog = GrammemeCatalog::from_reader(GRAMMEMES.as_bytes()).unwrap();
        let bits = catalog.to_bits(["gent", "NOUN"]).unwrap();
        assert_eq!(
            vec!["NOUN", "gent"],
            catalog.grammemes_of(&bits).collect::<Vec<_>>()
        );
        assert!(catalog.to_bits(["plur"]).is_err());
    }

    #[test]
    fn test_category_mask() {
        let catalog = GrammemeCatalog::from_reader(GRAMMEMES.as_bytes()).unwrap();
        let mask = catalog.category_mask(["CAse"]).unwrap();
        assert_eq!(
            vec!["CAse", "nomn", "gent", "gen2"],
            catalog.grammemes_of(&mask).collect::<Vec<_>>()
        );
        assert!(catalog.category_mask(["NOUN"]).is_err());
    }
}
