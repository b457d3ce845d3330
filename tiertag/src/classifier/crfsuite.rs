//! CRFsuite形式のファイル処理
//!
//! `crfsuite dump`が出力するテキスト形式のモデルを[`LinearChainModel`]に変換します。
//! また、学習データの属性をCRFsuiteの書式でエスケープする関数を提供します。

use std::io::{BufRead, BufReader, Read};
use std::sync::LazyLock;

use regex::Regex;

use crate::classifier::{LinearChainModel, LinearChainModelBuilder};
use crate::errors::{Result, TiertagError};

/// 空のラベルをCRFsuiteの入出力で表す記号。
pub const EMPTY_LABEL_MARK: &str = "_";

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Z_]+) = \{$").unwrap());
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+): (.*)$").unwrap());
static WEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\(\d+\) (.*) --> (\S*): (\S+)$").unwrap());

/// CRFsuiteのラベルをラベル表現に戻します。
#[inline(always)]
pub fn decode_label(label: &str) -> &str {
    if label == EMPTY_LABEL_MARK { "" } else { label }
}

/// ラベル表現をCRFsuiteのラベルにします。
#[inline(always)]
pub fn encode_label(label: &str) -> &str {
    if label.is_empty() { EMPTY_LABEL_MARK } else { label }
}

/// 属性名に含まれる`:`と`\`をエスケープします。
pub fn escape_attribute(attr: &str) -> String {
    let mut out = String::with_capacity(attr.len());
    for c in attr.chars() {
        match c {
            ':' => out.push_str("\\:"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out
}

#[derive(PartialEq)]
enum Section {
    None,
    Labels,
    Transitions,
    StateFeatures,
    Other,
}

/// `crfsuite dump`の出力から線形連鎖モデルを作成します。
///
/// `LABELS`、`TRANSITIONS`、`STATE_FEATURES`の各セクションを読み込み、
/// その他のセクションは無視します。ラベル`_`は空のラベルとして扱われます。
///
/// # エラー
///
/// ラベルが一つもない場合、重みの行が解析できない場合、
/// または未定義のラベルが参照された場合にエラーを返します。
pub fn from_dump<R>(rdr: R) -> Result<LinearChainModel>
where
    R: Read,
{
    let reader = BufReader::new(rdr);
    let mut section = Section::None;
    let mut labels = vec![];
    let mut transitions = vec![];
    let mut states = vec![];

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(cap) = SECTION_RE.captures(trimmed) {
            section = match &cap[1] {
                "LABELS" => Section::Labels,
                "TRANSITIONS" => Section::Transitions,
                "STATE_FEATURES" => Section::StateFeatures,
                _ => Section::Other,
            };
            continue;
        }
        if trimmed == "}" {
            section = Section::None;
            continue;
        }
        match section {
            Section::Labels => {
                let cap = LABEL_RE.captures(trimmed).ok_or_else(|| {
                    TiertagError::invalid_format("dump", format!("line {}: bad label", i + 1))
                })?;
                labels.push(decode_label(&cap[2]).to_string());
            }
            Section::Transitions | Section::StateFeatures => {
                let cap = WEIGHT_RE.captures(trimmed).ok_or_else(|| {
                    TiertagError::invalid_format("dump", format!("line {}: bad weight", i + 1))
                })?;
                let w = cap[3].parse::<f64>()?;
                let entry = (cap[1].to_string(), decode_label(&cap[2]).to_string(), w);
                if section == Section::Transitions {
                    transitions.push(entry);
                } else {
                    states.push(entry);
                }
            }
            Section::None | Section::Other => {}
        }
    }

    let mut builder = LinearChainModelBuilder::new(labels)?;
    for (prev, cur, w) in transitions {
        builder.set_transition(decode_label(&prev), &cur, w)?;
    }
    for (attr, label, w) in states {
        builder.add_state_weight(&attr, &label, w)?;
    }
    let model = builder.build()?;
    log::info!(
        "[tiertag] imported CRFsuite model: {} labels, {} attributes",
        model.labels().len(),
        model.num_features()
    );
    Ok(model)
}
