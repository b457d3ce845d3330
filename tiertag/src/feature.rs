//! 特徴量抽出レイヤー
//!
//! 各抽出器は特徴量に出所([`FeatureSource`])を付けて[`FeatureSet`]に追加します。
//! ティアごとの特徴量プールは[`FeaturePipeline::tier_pool`]が、共通特徴量、
//! 辞書、確定済みの前段ティアのラベルから毎回新しく組み立てます。
//! そのためティア`t`の分類器が見るプールは、ティア`t`以降の出力に依存しません。
//!
//! 実行時の復号と学習データの生成は同じパイプラインを使います。
pub mod candidates;
pub mod context;
pub mod label;
pub mod prior;
pub mod token;

use std::fmt;
use std::sync::Arc;

use crate::catalog::{GrammemeCatalog, TagBits};
use crate::dictionary::{MorphDictionary, normalize, trim_and_merge};
use crate::errors::{Result, TiertagError};
use crate::feature::candidates::dictionary_features;
use crate::tiers::TierPartition;

pub use crate::feature::context::ContextWindow;

/// 名前付きの特徴量。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Feature {
    name: String,
    value: String,
}

impl Feature {
    /// 新しい特徴量を作成します。
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// 特徴量の出所。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureSource {
    /// トークン固有の表層特徴量
    Token,
    /// 文脈窓の特徴量
    Context,
    /// ティア単位の辞書候補特徴量
    DictionaryCandidates { tier: usize },
    /// 確定したティアのラベル特徴量
    PriorTier { tier: usize },
}

/// 一つのトークンの特徴量を出所ごとの層として保持します。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureSet {
    layers: Vec<(FeatureSource, Vec<Feature>)>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 出所`source`の層に特徴量を追加します。
    pub fn add<I>(&mut self, source: FeatureSource, features: I)
    where
        I: IntoIterator<Item = Feature>,
    {
        match self.layers.iter_mut().find(|(s, _)| *s == source) {
            Some((_, layer)) => layer.extend(features),
            None => self.layers.push((source, features.into_iter().collect())),
        }
    }

    /// 出所`source`の層を取り除きます。取り除いた層を返します。
    pub fn remove_source(&mut self, source: FeatureSource) -> Option<Vec<Feature>> {
        let i = self.layers.iter().position(|(s, _)| *s == source)?;
        Some(self.layers.remove(i).1)
    }

    /// 出所`source`の層を返します。
    pub fn layer(&self, source: FeatureSource) -> Option<&[Feature]> {
        self.layers
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, l)| l.as_slice())
    }

    /// 層の出所を追加順に列挙します。
    pub fn sources(&self) -> impl Iterator<Item = FeatureSource> + '_ {
        self.layers.iter().map(|(s, _)| *s)
    }

    /// すべての特徴量を層の追加順に列挙します。
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.layers.iter().flat_map(|(_, l)| l.iter())
    }

    /// 名前と値が一致する特徴量があれば`true`を返します。
    pub fn contains(&self, name: &str, value: &str) -> bool {
        self.iter().any(|f| f.name == name && f.value == value)
    }

    pub fn len(&self) -> usize {
        self.layers.iter().map(|(_, l)| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 辞書とティア分割を用いて特徴量プールを組み立てるパイプライン。
///
/// 共有リソースは`Arc`で保持され、読み取り専用です。
#[derive(Clone)]
pub struct FeaturePipeline {
    catalog: Arc<GrammemeCatalog>,
    partition: Arc<TierPartition>,
    dictionary: Arc<MorphDictionary>,
    window: ContextWindow,
}

impl FeaturePipeline {
    /// 新しいパイプラインを作成します。
    pub fn new(
        catalog: Arc<GrammemeCatalog>,
        partition: Arc<TierPartition>,
        dictionary: Arc<MorphDictionary>,
        window: ContextWindow,
    ) -> Self {
        Self {
            catalog,
            partition,
            dictionary,
            window,
        }
    }

    #[inline(always)]
    pub fn catalog(&self) -> &GrammemeCatalog {
        &self.catalog
    }

    #[inline(always)]
    pub fn partition(&self) -> &TierPartition {
        &self.partition
    }

    #[inline(always)]
    pub fn dictionary(&self) -> &MorphDictionary {
        &self.dictionary
    }

    #[inline(always)]
    pub const fn window(&self) -> &ContextWindow {
        &self.window
    }

    /// スパン内の各トークンの共通特徴量(固有特徴量と文脈窓)を計算します。
    pub fn common_features<S>(&self, span: &[S]) -> Vec<FeatureSet>
    where
        S: AsRef<str>,
    {
        let intrinsic: Vec<Vec<_>> = span
            .iter()
            .map(|t| token::intrinsic_features(t.as_ref()))
            .collect();
        (0..span.len())
            .map(|pos| {
                let mut fs = FeatureSet::new();
                fs.add(FeatureSource::Token, intrinsic[pos].iter().cloned());
                fs.add(FeatureSource::Context, self.window.extract(&intrinsic, pos));
                fs
            })
            .collect()
    }

    /// スパン内の各トークンの曖昧性クラスを辞書から求めます。
    ///
    /// 候補にはモデル化するカテゴリのマスクで[`trim_and_merge`]が適用されます。
    pub fn candidates<S>(&self, span: &[S]) -> Vec<Vec<TagBits>>
    where
        S: AsRef<str>,
    {
        let keep = self.partition.modeled_mask();
        span.iter()
            .map(|t| trim_and_merge(self.dictionary.lookup(&normalize(t.as_ref())), keep))
            .collect()
    }

    /// ティア`tier`の分類器に渡す特徴量プールを組み立てます。
    ///
    /// プールは共通特徴量、ティア`0..tier`の確定ラベルから作った層、
    /// ティア`tier`の辞書候補層からなります。前段ティアの辞書候補層は含まれません。
    ///
    /// # 引数
    ///
    /// * `common` - [`common_features`](Self::common_features)の結果
    /// * `candidates` - [`candidates`](Self::candidates)の結果
    /// * `decided` - 確定済みティアのラベル。`decided[k][pos]`はティア`k`の位置`pos`のラベル
    /// * `tier` - 対象ティア
    ///
    /// # エラー
    ///
    /// 入力の長さが揃っていない場合、または`tier`未満のティアのラベルが
    /// 揃っていない場合にエラーを返します。
    pub fn tier_pool<S>(
        &self,
        common: &[FeatureSet],
        candidates: &[Vec<TagBits>],
        decided: &[Vec<S>],
        tier: usize,
    ) -> Result<Vec<FeatureSet>>
    where
        S: AsRef<str>,
    {
        if tier >= self.partition.tier_count() {
            return Err(TiertagError::invalid_argument(
                "tier",
                format!("tier {tier} is out of range"),
            ));
        }
        if decided.len() < tier {
            return Err(TiertagError::invalid_argument(
                "decided",
                format!("tier {tier} requires labels of {tier} prior tiers"),
            ));
        }
        let n = common.len();
        if candidates.len() != n || decided[..tier].iter().any(|l| l.len() != n) {
            return Err(TiertagError::invalid_argument(
                "common",
                "span lengths of the inputs differ",
            ));
        }
        let mut pool = common.to_vec();
        for (pos, fs) in pool.iter_mut().enumerate() {
            for (k, labels) in decided[..tier].iter().enumerate() {
                fs.add(
                    FeatureSource::PriorTier { tier: k },
                    prior::prior_tier_features(labels, pos, &self.window),
                );
            }
            fs.add(
                FeatureSource::DictionaryCandidates { tier },
                dictionary_features(
                    &self.catalog,
                    &self.partition,
                    tier,
                    &candidates[pos],
                ),
            );
        }
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_set_layers() {
        let mut fs = FeatureSet::new();
        fs.add(FeatureSource::Token, [Feature::new("w", "кот")]);
        fs.add(
            FeatureSource::DictionaryCandidates { tier: 0 },
            [Feature::new("DictTag", "NOUN")],
        );
        fs.add(FeatureSource::Token, [Feature::new("suf1", "т")]);
        assert_eq!(3, fs.len());
        assert_eq!(
            vec![FeatureSource::Token, FeatureSource::DictionaryCandidates { tier: 0 }],
            fs.sources().collect::<Vec<_>>()
        );
        assert!(fs.contains("DictTag", "NOUN"));

        let removed = fs
            .remove_source(FeatureSource::DictionaryCandidates { tier: 0 })
            .unwrap();
        assert_eq!(1, removed.len());
        assert!(!fs.contains("DictTag", "NOUN"));
        assert_eq!(2, fs.layer(FeatureSource::Token).unwrap().len());
        assert!(
            fs.remove_source(FeatureSource::PriorTier { tier: 0 })
                .is_none()
        );
    }

    #[test]
    fn test_feature_display() {
        assert_eq!("Gram_at_0=NOUN", Feature::new("Gram_at_0", "NOUN").to_string());
    }
}
