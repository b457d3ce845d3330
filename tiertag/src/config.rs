//! モデルディレクトリの設定ファイル
//!
//! モデルディレクトリ直下の`model.conf`は`key = value`形式のテキストです。
//!
//! | キー | 内容 | 既定値 |
//! |------|------|--------|
//! | `tiers` | 復号順のティアID(カンマまたは空白区切り) | 必須 |
//! | `tier.<id>` | ティアが持つカテゴリ | 必須 |
//! | `context.left` | 左文脈窓の大きさ | `2` |
//! | `context.right` | 右文脈窓の大きさ | `2` |
//! | `ignored` | モデル化しないカテゴリ | なし |
//! | `multi_valued` | 複数の値を許すカテゴリ | なし |
//! | `pos_category` | 品詞として扱うカテゴリ | `POST` |
//!
//! 空行と`#`で始まる行は無視されます。

use std::io::{BufRead, BufReader, Read};
use std::sync::LazyLock;

use hashbrown::HashMap;
use regex::Regex;

use crate::catalog::{DEFAULT_POS_CATEGORY, GrammemeCatalog};
use crate::errors::{Result, TiertagError};
use crate::feature::ContextWindow;
use crate::tiers::{Tier, TierPartition};

/// 設定ファイル名。
pub const CONFIG_FILE_NAME: &str = "model.conf";

static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([\w.\-]+)\s*=\s*(.*?)\s*$").unwrap());

/// `model.conf`の内容。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelConfig {
    tiers: Vec<Tier>,
    left: usize,
    right: usize,
    ignored: Vec<String>,
    multi_valued: Vec<String>,
    pos_category: String,
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ModelConfig {
    /// 設定を読み込みます。
    ///
    /// # エラー
    ///
    /// 行の形式が不正な場合、`tiers`や`tier.<id>`が欠けている場合、
    /// 未知のキーがある場合、または窓の大きさが数値でない場合に
    /// [`TiertagError::Configuration`]を返します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut entries = HashMap::new();
        let reader = BufReader::new(rdr);
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let cap = ENTRY_RE.captures(trimmed).ok_or_else(|| {
                TiertagError::configuration(format!(
                    "{CONFIG_FILE_NAME}: line {}: expected `key = value`",
                    i + 1
                ))
            })?;
            if entries
                .insert(cap[1].to_string(), cap[2].to_string())
                .is_some()
            {
                return Err(TiertagError::configuration(format!(
                    "{CONFIG_FILE_NAME}: line {}: duplicate key '{}'",
                    i + 1,
                    &cap[1]
                )));
            }
        }

        let tier_ids = entries
            .remove("tiers")
            .map(|v| split_list(&v))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| TiertagError::configuration(format!("{CONFIG_FILE_NAME}: `tiers` is missing")))?;
        let mut tiers = Vec::with_capacity(tier_ids.len());
        for id in &tier_ids {
            let cats = entries.remove(&format!("tier.{id}")).ok_or_else(|| {
                TiertagError::configuration(format!(
                    "{CONFIG_FILE_NAME}: `tier.{id}` is missing"
                ))
            })?;
            tiers.push(Tier::new(id, split_list(&cats)));
        }

        let parse_size = |key: &str, entries: &mut HashMap<String, String>| -> Result<usize> {
            match entries.remove(key) {
                None => Ok(2),
                Some(v) => v.parse::<usize>().map_err(|e| {
                    TiertagError::configuration(format!("{CONFIG_FILE_NAME}: `{key}`: {e}"))
                }),
            }
        };
        let left = parse_size("context.left", &mut entries)?;
        let right = parse_size("context.right", &mut entries)?;
        let ignored = entries
            .remove("ignored")
            .map(|v| split_list(&v))
            .unwrap_or_default();
        let multi_valued = entries
            .remove("multi_valued")
            .map(|v| split_list(&v))
            .unwrap_or_default();
        let pos_category = entries
            .remove("pos_category")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_POS_CATEGORY.to_string());

        if let Some(key) = entries.keys().min() {
            return Err(TiertagError::configuration(format!(
                "{CONFIG_FILE_NAME}: unknown key '{key}'"
            )));
        }

        Ok(Self {
            tiers,
            left,
            right,
            ignored,
            multi_valued,
            pos_category,
        })
    }

    /// ティアIDを復号順に返します。
    pub fn tier_ids(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(Tier::id)
    }

    /// 文脈窓を返します。
    ///
    /// # エラー
    ///
    /// 左右とも0の場合は[`TiertagError::Configuration`]を返します。
    pub fn window(&self) -> Result<ContextWindow> {
        ContextWindow::new(self.left, self.right)
    }

    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn pos_category(&self) -> &str {
        &self.pos_category
    }

    /// カタログに対してティア分割を検証して作成します。
    ///
    /// # エラー
    ///
    /// 分割が不正な場合、または品詞カテゴリが未登録の場合に
    /// [`TiertagError::Configuration`]を返します。
    pub fn partition(&self, catalog: &GrammemeCatalog) -> Result<TierPartition> {
        if !catalog.is_category(&self.pos_category) {
            return Err(TiertagError::configuration(format!(
                "pos category '{}' is not a registered category",
                self.pos_category
            )));
        }
        TierPartition::new(catalog, self.tiers.clone(), &self.ignored)?
            .with_multi_valued(&self.multi_valued)
    }
}
