//! トークン固有の表層特徴量

use std::sync::LazyLock;

use regex::Regex;

use crate::dictionary::normalize;
use crate::feature::Feature;

static CYRILLIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\p{Cyrillic}\-']+$").unwrap());
static LATIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\p{Latin}\-']+$").unwrap());
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+([.,]\d+)?$").unwrap());
static PUNCT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\p{P}\p{S}]+$").unwrap());

/// 文脈窓で近傍トークンから引き継ぐ特徴量の名前。
pub(crate) const CONTEXT_FEATURE_NAMES: &[&str] = &["w", "suf2", "suf3", "class"];

/// トークンの表層形から特徴量を抽出します。
///
/// | 名前 | 内容 |
/// |------|------|
/// | `w` | 正規化された語形 |
/// | `suf1`..`suf3` | 末尾1〜3文字 |
/// | `pre1`, `pre2` | 先頭1〜2文字 |
/// | `shape` | 文字種を`X`/`x`/`d`/`-`に置き換えて連続を潰した形 |
/// | `case` | `lower`/`upper`/`title`/`mixed`/`none` |
/// | `class` | `cyr`/`lat`/`num`/`punct`/`other` |
pub fn intrinsic_features(text: &str) -> Vec<Feature> {
    let norm = normalize(text);
    let chars: Vec<char> = norm.chars().collect();
    let mut features = Vec::with_capacity(9);
    features.push(Feature::new("w", norm.as_str()));
    for n in 1..=3 {
        if chars.len() > n {
            let suf: String = chars[chars.len() - n..].iter().collect();
            features.push(Feature::new(format!("suf{n}"), suf));
        }
    }
    for n in 1..=2 {
        if chars.len() > n {
            let pre: String = chars[..n].iter().collect();
            features.push(Feature::new(format!("pre{n}"), pre));
        }
    }
    features.push(Feature::new("shape", shape(text)));
    features.push(Feature::new("case", casing(text)));
    features.push(Feature::new("class", char_class(text)));
    features
}

fn shape(text: &str) -> String {
    let mut out = String::new();
    let mut last = None;
    for c in text.chars() {
        let s = if c.is_uppercase() {
            'X'
        } else if c.is_lowercase() {
            'x'
        } else if c.is_numeric() {
            'd'
        } else {
            '-'
        };
        if last != Some(s) {
            out.push(s);
            last = Some(s);
        }
    }
    out
}

fn casing(text: &str) -> &'static str {
    let mut upper = 0;
    let mut lower = 0;
    for c in text.chars() {
        if c.is_uppercase() {
            upper += 1;
        } else if c.is_lowercase() {
            lower += 1;
        }
    }
    match (upper, lower) {
        (0, 0) => "none",
        (0, _) => "lower",
        (_, 0) => "upper",
        (1, _) if text.chars().next().is_some_and(char::is_uppercase) => "title",
        _ => "mixed",
    }
}

fn char_class(text: &str) -> &'static str {
    if CYRILLIC.is_match(text) {
        "cyr"
    } else if LATIN.is_match(text) {
        "lat"
    } else if NUMBER.is_match(text) {
        "num"
    } else if PUNCT.is_match(text) {
        "punct"
    } else {
        "other"
    }
}
