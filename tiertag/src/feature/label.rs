//! ティアのラベル表現
//!
//! ラベルは文法素名を区切り文字で連結した文字列です。学習データの生成と
//! 実行時のラベル解析で同じ表現を使う必要があります。

use crate::catalog::{GrammemeCatalog, TagBits};
use crate::tiers::TierPartition;

/// ラベル内の文法素の区切り文字。
pub const LABEL_SEPARATOR: char = '&';

/// 文法素名の列をラベルに連結します。
///
/// # 例
///
/// ```
/// use tiertag::feature::label;
///
/// assert_eq!("NOUN&nomn", label::join(["NOUN", "nomn"]));
/// assert_eq!("", label::join(Vec::<&str>::new()));
/// ```
pub fn join<I, S>(grams: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut label = String::new();
    for (i, g) in grams.into_iter().enumerate() {
        if i > 0 {
            label.push(LABEL_SEPARATOR);
        }
        label.push_str(g.as_ref());
    }
    label
}

/// ラベルを文法素名の列に分解します。空のラベルは空の列になります。
pub fn split(label: &str) -> Vec<&str> {
    if label.is_empty() {
        return vec![];
    }
    label.split(LABEL_SEPARATOR).collect()
}

/// タグのうちティア`tier`に属する文法素をラベルにします。
///
/// 学習データの正解ラベルの生成に使われます。
pub fn tier_label(
    catalog: &GrammemeCatalog,
    partition: &TierPartition,
    tier: usize,
    tag: &TagBits,
) -> String {
    let projected = tag.masked(partition.tier_mask(tier));
    join(catalog.grammemes_of(&projected))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::tiers::Tier;

    #[test]
    fn test_round_trip() {
        for grams in [
            vec![],
            vec!["NOUN"],
            vec!["NOUN", "nomn", "sing"],
            vec!["Sgtm", "Fixd", "Ms-f"],
        ] {
            assert_eq!(grams, split(&join(&grams)));
        }
    }

    #[test]
    fn test_tier_label() {
        let catalog = GrammemeCatalog::from_reader(
            "POST,,,\nNOUN,POST,,\nCAse,,,\nnomn,CAse,,\nNMbr,,,\nsing,NMbr,,\n".as_bytes(),
        )
        .unwrap();
        let partition = TierPartition::new(
            &catalog,
            vec![Tier::new("pos", ["POST"]), Tier::new("cn", ["CAse", "NMbr"])],
            &[] as &[&str],
        )
        .unwrap();
        let tag = catalog.to_bits(["NOUN", "nomn", "sing"]).unwrap();
        assert_eq!("NOUN", tier_label(&catalog, &partition, 0, &tag));
        assert_eq!("nomn&sing", tier_label(&catalog, &partition, 1, &tag));
    }
}
