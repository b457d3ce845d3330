//! 前段ティアのラベル特徴量

use crate::feature::context::ContextWindow;
use crate::feature::{Feature, label};

/// 前段ティアの特徴量名の接頭辞。後ろに相対位置が付きます。
pub const PRIOR_FEATURE_PREFIX: &str = "Gram_at_";

/// 確定したティアのラベルから位置`pos`の特徴量を作ります。
///
/// 窓内の各近傍位置`q`について、そのラベルの文法素ごとに
/// `Gram_at_{pos - q}`という名前の特徴量を一つ出力します。
///
/// # 引数
///
/// * `labels` - スパン全体の確定ラベル
/// * `pos` - 対象トークンの位置
/// * `window` - 文脈窓
pub fn prior_tier_features<S>(labels: &[S], pos: usize, window: &ContextWindow) -> Vec<Feature>
where
    S: AsRef<str>,
{
    let mut features = vec![];
    for q in window.range(pos, labels.len()) {
        let rel = pos as isize - q as isize;
        for gram in label::split(labels[q].as_ref()) {
            features.push(Feature::new(format!("{PRIOR_FEATURE_PREFIX}{rel}"), gram));
        }
    }
    features
}
