//! 文法カテゴリのティア分割
//!
//! カテゴリ全体を順序付きのティアに分割します。各ティアは互いに素で、
//! モデル化しないカテゴリを除いたすべてのカテゴリを覆う必要があります。
//! 分割は読み込み時に一度だけ検証され、以降は変更されません。

use std::collections::BTreeSet;

use crate::catalog::{GrammemeCatalog, TagBits};
use crate::errors::{Result, TiertagError};

/// 一つのティア。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tier {
    id: String,
    categories: BTreeSet<String>,
}

impl Tier {
    /// 新しいティアを作成します。
    pub fn new<I, S>(id: &str, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.to_string(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    #[inline(always)]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline(always)]
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }
}

/// 検証済みのティア分割。
#[derive(Clone, Debug)]
pub struct TierPartition {
    tiers: Vec<Tier>,
    // masks[t]: bits of all grammemes owned by tier t
    masks: Vec<TagBits>,
    // projections[t]: union of masks[0..=t]
    projections: Vec<TagBits>,
    ignored: BTreeSet<String>,
    ignored_mask: TagBits,
    // categories allowed to carry at most one value, with their masks
    exclusive: Vec<(String, TagBits)>,
}

impl TierPartition {
    /// ティア分割を検証して作成します。
    ///
    /// # 引数
    ///
    /// * `catalog` - 文法素カタログ
    /// * `tiers` - 復号順に並んだティア
    /// * `ignored` - モデル化しないカテゴリ
    ///
    /// # エラー
    ///
    /// 以下の場合に[`TiertagError::Configuration`]を返します。
    /// - ティアが一つもない、またはティアIDが重複している場合
    /// - カテゴリが未登録、またはカテゴリでない文法素が指定された場合
    /// - 複数のティア(または無視カテゴリ)にカテゴリが重複している場合
    /// - 無視カテゴリを除くカテゴリ全体を覆っていない場合
    pub fn new<S>(catalog: &GrammemeCatalog, tiers: Vec<Tier>, ignored: &[S]) -> Result<Self>
    where
        S: AsRef<str>,
    {
        if tiers.is_empty() {
            return Err(TiertagError::configuration("no tiers are defined"));
        }
        let mut ids = BTreeSet::new();
        for tier in &tiers {
            if !ids.insert(tier.id.as_str()) {
                return Err(TiertagError::configuration(format!(
                    "duplicate tier id '{}'",
                    tier.id
                )));
            }
            if tier.categories.is_empty() {
                return Err(TiertagError::configuration(format!(
                    "tier '{}' owns no categories",
                    tier.id
                )));
            }
        }

        let mut ignored_set = BTreeSet::new();
        for c in ignored {
            let c = c.as_ref();
            if !catalog.is_category(c) {
                return Err(TiertagError::configuration(format!(
                    "ignored category '{c}' is not a registered category"
                )));
            }
            ignored_set.insert(c.to_string());
        }

        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for tier in &tiers {
            for c in &tier.categories {
                if !catalog.is_category(c) {
                    return Err(TiertagError::configuration(format!(
                        "tier '{}': '{c}' is not a registered category",
                        tier.id
                    )));
                }
                if ignored_set.contains(c) {
                    return Err(TiertagError::configuration(format!(
                        "tier '{}': category '{c}' is also ignored",
                        tier.id
                    )));
                }
                if !seen.insert(c.as_str()) {
                    return Err(TiertagError::configuration(format!(
                        "category '{c}' is owned by more than one tier"
                    )));
                }
            }
        }

        let missing: Vec<&str> = catalog
            .categories()
            .map(|g| g.id())
            .filter(|c| !seen.contains(c) && !ignored_set.contains(*c))
            .collect();
        if !missing.is_empty() {
            return Err(TiertagError::configuration(format!(
                "categories not covered by any tier: {}",
                missing.join(", ")
            )));
        }

        let mut masks = Vec::with_capacity(tiers.len());
        let mut projections = Vec::with_capacity(tiers.len());
        let mut acc = catalog.empty_bits();
        for tier in &tiers {
            let mask = catalog
                .category_mask(&tier.categories)
                .map_err(|e| TiertagError::configuration(e.to_string()))?;
            acc.union_with(&mask);
            projections.push(acc.clone());
            masks.push(mask);
        }
        let ignored_mask = catalog
            .category_mask(&ignored_set)
            .map_err(|e| TiertagError::configuration(e.to_string()))?;

        let mut exclusive = vec![];
        for tier in &tiers {
            for c in &tier.categories {
                let mask = catalog
                    .category_mask([c])
                    .map_err(|e| TiertagError::configuration(e.to_string()))?;
                exclusive.push((c.clone(), mask));
            }
        }

        log::info!(
            "[tiertag] tier partition: {}",
            tiers
                .iter()
                .map(|t| t.id.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Ok(Self {
            tiers,
            masks,
            projections,
            ignored: ignored_set,
            ignored_mask,
            exclusive,
        })
    }

    /// 複数の値を同時に持つことを許すカテゴリを設定します。
    ///
    /// # エラー
    ///
    /// いずれかのティアに属さないカテゴリが指定された場合にエラーを返します。
    pub fn with_multi_valued<S>(mut self, categories: &[S]) -> Result<Self>
    where
        S: AsRef<str>,
    {
        for c in categories {
            let c = c.as_ref();
            if self.tier_of_category(c).is_none() {
                return Err(TiertagError::configuration(format!(
                    "multi-valued category '{c}' is not owned by any tier"
                )));
            }
            self.exclusive.retain(|(name, _)| name != c);
        }
        Ok(self)
    }

    /// ティア数を返します。
    #[inline(always)]
    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// ティアが持つカテゴリを返します。
    ///
    /// # Panics
    ///
    /// `tier`がティア数以上の場合にパニックします。
    #[inline(always)]
    pub fn tier_categories(&self, tier: usize) -> &BTreeSet<String> {
        &self.tiers[tier].categories
    }

    #[inline(always)]
    pub fn tier_id(&self, tier: usize) -> &str {
        &self.tiers[tier].id
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// ティア`tier`に属する文法素のマスクを返します。
    #[inline(always)]
    pub fn tier_mask(&self, tier: usize) -> &TagBits {
        &self.masks[tier]
    }

    /// ティア`0..=tier`に属する文法素のマスクを返します。
    ///
    /// 辞書候補特徴量はこのマスクに射影されます。
    #[inline(always)]
    pub fn projection_mask(&self, tier: usize) -> &TagBits {
        &self.projections[tier]
    }

    /// すべてのティアが扱う文法素のマスクを返します。
    pub fn modeled_mask(&self) -> &TagBits {
        // non-empty by construction
        &self.projections[self.projections.len() - 1]
    }

    /// モデル化しないカテゴリを返します。
    pub fn ignored(&self) -> &BTreeSet<String> {
        &self.ignored
    }

    pub fn ignored_mask(&self) -> &TagBits {
        &self.ignored_mask
    }

    /// カテゴリを持つティアの位置を返します。
    pub fn tier_of_category(&self, category: &str) -> Option<usize> {
        self.tiers
            .iter()
            .position(|t| t.categories.contains(category))
    }

    /// 排他的なカテゴリが二つ以上の値を持っていないか検査します。
    ///
    /// # エラー
    ///
    /// 違反がある場合は[`TiertagError::InconsistentAnnotation`]を返します。
    pub fn check_consistent(&self, bits: &TagBits) -> Result<()> {
        for (category, mask) in &self.exclusive {
            if bits.masked(mask).count_ones() > 1 {
                return Err(TiertagError::inconsistent_annotation(format!(
                    "category '{category}' carries more than one value"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAMMEMES: &str = "\
POST,,,
NOUN,POST,,
VERB,POST,,
CAse,,,
nomn,CAse,,
gent,CAse,,
NMbr,,,
sing,NMbr,,
plur,NMbr,,
Qual,,,
Fixd,Qual,,
Infr,Qual,,
";

    fn catalog() -> GrammemeCatalog {
        GrammemeCatalog::from_reader(GRAMMEMES.as_bytes()).unwrap()
    }

    fn is_configuration_error(r: Result<TierPartition>) -> bool {
        matches!(r, Err(TiertagError::Configuration(_)))
    }

    #[test]
    fn test_partition_covers_universe() {
        let catalog = catalog();
        let partition = TierPartition::new(
            &catalog,
            vec![
                Tier::new("pos", ["POST"]),
                Tier::new("case-num", ["CAse", "NMbr"]),
            ],
            &["Qual"],
        )
        .unwrap();
        assert_eq!(2, partition.tier_count());

        let mut union = BTreeSet::new();
        for t in 0..partition.tier_count() {
            for c in partition.tier_categories(t) {
                assert!(union.insert(c.clone()), "overlap on {c}");
            }
        }
        union.extend(partition.ignored().iter().cloned());
        let universe: BTreeSet<String> = catalog.categories().map(|g| g.id().to_string()).collect();
        assert_eq!(universe, union);

        assert!(!partition.tier_mask(0).intersects(partition.tier_mask(1)));
        assert_eq!(
            vec!["POST", "NOUN", "VERB", "CAse", "nomn", "gent", "NMbr", "sing", "plur"],
            catalog
                .grammemes_of(partition.projection_mask(1))
                .collect::<Vec<_>>()
        );
        assert_eq!(Some(1), partition.tier_of_category("NMbr"));
    }

    #[test]
    fn test_overlap() {
        let catalog = catalog();
        assert!(is_configuration_error(TierPartition::new(
            &catalog,
            vec![
                Tier::new("pos", ["POST", "CAse"]),
                Tier::new("case-num", ["CAse", "NMbr"]),
            ],
            &["Qual"],
        )));
    }

    #[test]
    fn test_gap() {
        let catalog = catalog();
        assert!(is_configuration_error(TierPartition::new(
            &catalog,
            vec![Tier::new("pos", ["POST"]), Tier::new("case", ["CAse"])],
            &["Qual"],
        )));
    }

    #[test]
    fn test_non_category_and_duplicate_ids() {
        let catalog = catalog();
        assert!(is_configuration_error(TierPartition::new(
            &catalog,
            vec![Tier::new("pos", ["NOUN"])],
            &[] as &[&str],
        )));
        assert!(is_configuration_error(TierPartition::new(
            &catalog,
            vec![
                Tier::new("a", ["POST", "Qual"]),
                Tier::new("a", ["CAse", "NMbr"]),
            ],
            &[] as &[&str],
        )));
        assert!(is_configuration_error(TierPartition::new(
            &catalog,
            vec![],
            &[] as &[&str],
        )));
    }

    #[test]
    fn test_check_consistent() {
        let catalog = catalog();
        let partition = TierPartition::new(
            &catalog,
            vec![Tier::new("all", ["POST", "CAse", "NMbr", "Qual"])],
            &[] as &[&str],
        )
        .unwrap();
        let ok = catalog.to_bits(["NOUN", "nomn", "sing"]).unwrap();
        assert!(partition.check_consistent(&ok).is_ok());
        let bad = catalog.to_bits(["NOUN", "nomn", "gent"]).unwrap();
        assert!(matches!(
            partition.check_consistent(&bad),
            Err(TiertagError::InconsistentAnnotation(_))
        ));

        let partition = partition.with_multi_valued(&["Qual"]).unwrap();
        let multi = catalog.to_bits(["NOUN", "Fixd", "Infr"]).unwrap();
        assert!(partition.check_consistent(&multi).is_ok());
    }
}
