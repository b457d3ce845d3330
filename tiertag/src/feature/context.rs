//! 文脈窓の特徴量

use crate::errors::{Result, TiertagError};
use crate::feature::Feature;
use crate::feature::token::CONTEXT_FEATURE_NAMES;

/// スパン外を指す近傍位置の値。
pub const OUT_OF_BOUNDS: &str = "<OOB>";

/// 左右の文脈窓の大きさ。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextWindow {
    left: usize,
    right: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self { left: 2, right: 2 }
    }
}

impl ContextWindow {
    /// 文脈窓を作成します。
    ///
    /// # エラー
    ///
    /// 左右とも0の場合は[`TiertagError::Configuration`]を返します。
    pub fn new(left: usize, right: usize) -> Result<Self> {
        if left == 0 && right == 0 {
            return Err(TiertagError::configuration(
                "left and right context sizes are both zero",
            ));
        }
        Ok(Self { left, right })
    }

    #[inline(always)]
    pub const fn left(&self) -> usize {
        self.left
    }

    #[inline(always)]
    pub const fn right(&self) -> usize {
        self.right
    }

    /// 位置`pos`の窓に含まれるスパン内の位置を返します。`pos`自身も含みます。
    pub fn range(&self, pos: usize, len: usize) -> std::ops::RangeInclusive<usize> {
        let lo = pos.saturating_sub(self.left);
        let hi = (pos + self.right).min(len.saturating_sub(1));
        lo..=hi
    }

    /// 近傍トークンの固有特徴量を相対位置付きで引き継ぎます。
    ///
    /// 特徴量名は`{名前}@{相対位置}`となり、相対位置は近傍位置から`pos`を引いた値です。
    /// スパン外の近傍位置には`w@{相対位置}=<OOB>`を一つだけ出力します。
    ///
    /// # 引数
    ///
    /// * `intrinsic` - スパン内の各トークンの固有特徴量
    /// * `pos` - 対象トークンの位置
    pub fn extract(&self, intrinsic: &[Vec<Feature>], pos: usize) -> Vec<Feature> {
        let mut features = vec![];
        let offsets = (-(self.left as isize)..0).chain(1..=self.right as isize);
        for offset in offsets {
            let q = pos as isize + offset;
            if q < 0 || q >= intrinsic.len() as isize {
                features.push(Feature::new(format!("w@{offset}"), OUT_OF_BOUNDS));
                continue;
            }
            for f in &intrinsic[q as usize] {
                if CONTEXT_FEATURE_NAMES.contains(&f.name()) {
                    features.push(Feature::new(format!("{}@{offset}", f.name()), f.value()));
                }
            }
        }
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::feature::token::intrinsic_features;

    #[test]
    fn test_zero_window() {
        assert!(matches!(
            ContextWindow::new(0, 0),
            Err(TiertagError::Configuration(_))
        ));
        assert!(ContextWindow::new(0, 1).is_ok());
        assert!(ContextWindow::new(1, 0).is_ok());
    }

    #[test]
    fn test_range_clamped() {
        let w = ContextWindow::new(2, 1).unwrap();
        assert_eq!(0..=1, w.range(0, 5));
        assert_eq!(1..=4, w.range(3, 5));
        assert_eq!(2..=4, w.range(4, 5));
    }

    #[test]
    fn test_extract_offsets() {
        let span = ["мама", "мыла", "раму"];
        let intrinsic: Vec<Vec<Feature>> = span.iter().map(|t| intrinsic_features(t)).collect();
        let w = ContextWindow::new(1, 1).unwrap();

        let f = w.extract(&intrinsic, 0);
        assert!(f.contains(&Feature::new("w@-1", OUT_OF_BOUNDS)));
        assert!(f.contains(&Feature::new("w@1", "мыла")));
        assert!(f.contains(&Feature::new("suf2@1", "ла")));
        assert!(!f.iter().any(|x| x.name() == "pre1@1"));

        let f = w.extract(&intrinsic, 2);
        assert!(f.contains(&Feature::new("w@-1", "мыла")));
        assert!(f.contains(&Feature::new("w@1", OUT_OF_BOUNDS)));
    }
}
