//! ティア単位の辞書候補特徴量

use crate::catalog::{GrammemeCatalog, TagBits};
use crate::feature::{Feature, label};
use crate::tiers::TierPartition;

/// 辞書候補特徴量の名前。
pub const DICTIONARY_FEATURE: &str = "DictTag";

/// 辞書に候補がないトークンの値。
pub const NOT_IN_DICTIONARY: &str = "<NONE>";

/// 射影後に文法素が残らなかった候補の値。
pub const EMPTY_PROJECTION: &str = "_";

/// ティア`tier`用の辞書候補特徴量を作ります。
///
/// 各候補をティア`0..=tier`のカテゴリに射影し、異なる射影値ごとに一つの特徴量を
/// 最初に現れた順に出力します。
///
/// # 引数
///
/// * `catalog` - 文法素カタログ
/// * `partition` - ティア分割
/// * `tier` - 対象ティア
/// * `candidates` - トークンの曖昧性クラス
pub fn dictionary_features(
    catalog: &GrammemeCatalog,
    partition: &TierPartition,
    tier: usize,
    candidates: &[TagBits],
) -> Vec<Feature> {
    if candidates.is_empty() {
        return vec![Feature::new(DICTIONARY_FEATURE, NOT_IN_DICTIONARY)];
    }
    let mask = partition.projection_mask(tier);
    let mut seen: Vec<TagBits> = vec![];
    let mut features = vec![];
    for c in candidates {
        let projected = c.masked(mask);
        if seen.contains(&projected) {
            continue;
        }
        let value = if projected.is_empty() {
            EMPTY_PROJECTION.to_string()
        } else {
            label::join(catalog.grammemes_of(&projected))
        };
        features.push(Feature::new(DICTIONARY_FEATURE, value));
        seen.push(projected);
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::tiers::Tier;

    #[test]
    fn test_projection_per_tier() {
        let catalog = GrammemeCatalog::from_reader(
            "POST,,,\nNOUN,POST,,\nCAse,,,\nnomn,CAse,,\ngent,CAse,,\n".as_bytes(),
        )
        .unwrap();
        let partition = TierPartition::new(
            &catalog,
            vec![Tier::new("pos", ["POST"]), Tier::new("case", ["CAse"])],
            &[] as &[&str],
        )
        .unwrap();
        let candidates = vec![
            catalog.to_bits(["NOUN", "nomn"]).unwrap(),
            catalog.to_bits(["NOUN", "gent"]).unwrap(),
        ];

        assert_eq!(
            vec![Feature::new(DICTIONARY_FEATURE, "NOUN")],
            dictionary_features(&catalog, &partition, 0, &candidates)
        );
        assert_eq!(
            vec![
                Feature::new(DICTIONARY_FEATURE, "NOUN&nomn"),
                Feature::new(DICTIONARY_FEATURE, "NOUN&gent"),
            ],
            dictionary_features(&catalog, &partition, 1, &candidates)
        );
        assert_eq!(
            vec![Feature::new(DICTIONARY_FEATURE, NOT_IN_DICTIONARY)],
            dictionary_features(&catalog, &partition, 1, &[])
        );
    }
}
