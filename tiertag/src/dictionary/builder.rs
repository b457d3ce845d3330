//! 辞書構築のためのビルダー
//!
//! このモジュールは、CSV形式の辞書ソースと頻度ソースから [`MorphDictionaryInner`] を
//! 構築するためのビルダーを提供します。

use std::io::{BufRead, BufReader, Read};

use hashbrown::HashMap;

use crate::catalog::{GrammemeCatalog, TagBits};
use crate::dictionary::frequency::WordformStore;
use crate::dictionary::map::WordMapBuilder;
use crate::dictionary::{MorphDictionaryInner, normalize};
use crate::errors::{Result, TiertagError};
use crate::utils::parse_csv_row;

/// 1行分の辞書エントリ
struct RawEntry {
    wordform: String,
    tag: TagBits,
}

/// 異なるタグパターンに連番を振るテーブル
#[derive(Default)]
struct TagTable {
    tags: Vec<TagBits>,
    ids: HashMap<TagBits, u32>,
}

impl TagTable {
    fn intern(&mut self, tag: TagBits) -> Result<u32> {
        if let Some(&id) = self.ids.get(&tag) {
            return Ok(id);
        }
        let id = u32::try_from(self.tags.len())?;
        self.ids.insert(tag.clone(), id);
        self.tags.push(tag);
        Ok(id)
    }
}

/// 辞書ソースから [`MorphDictionaryInner`] を構築するビルダー
pub struct MorphDictionaryBuilder {}

impl MorphDictionaryBuilder {
    /// CSV形式のソースから新しい [`MorphDictionaryInner`] を作成します。
    ///
    /// 辞書ソースの各行は`wordform,GRAM,GRAM,...`の形式で、一行が一つの読みを表します。
    /// 同じ語形の行が複数あれば、それらが曖昧性クラスを構成します。
    /// 頻度ソースも同じ形式で、語形ごとに最頻の読みを一行だけ持ちます。
    /// 語形は[`normalize`]で正規化されて格納されます。
    ///
    /// # 引数
    ///
    ///  - `catalog`: 文法素カタログ
    ///  - `dict_rdr`: 辞書ソースのリーダー
    ///  - `freq_rdr`: 頻度ソースのリーダー(任意)
    ///
    /// # エラー
    ///
    /// 入力フォーマットが不正な場合、または未登録の文法素が含まれる場合に
    /// [`TiertagError`] を返します。
    pub fn from_readers<D, F>(
        catalog: &GrammemeCatalog,
        dict_rdr: D,
        freq_rdr: Option<F>,
    ) -> Result<MorphDictionaryInner>
    where
        D: Read,
        F: Read,
    {
        let entries = Self::parse_csv(catalog, dict_rdr, "dict.csv")?;
        let mut table = TagTable::default();
        let mut map = WordMapBuilder::new();
        for e in entries {
            let id = table.intern(e.tag)?;
            map.add_record(e.wordform, id);
        }
        let index = map.build()?;

        let mut frequencies = vec![];
        if let Some(freq_rdr) = freq_rdr {
            let mut seen = HashMap::new();
            for e in Self::parse_csv(catalog, freq_rdr, "freq.csv")? {
                let id = table.intern(e.tag)?;
                if let Some(prev) = seen.insert(e.wordform.clone(), id)
                    && prev != id
                {
                    log::warn!(
                        "[tiertag] freq.csv: '{}' has more than one reading, keeping the last",
                        e.wordform
                    );
                }
            }
            frequencies = seen.into_iter().collect();
            frequencies.sort_by(|a: &(String, u32), b| a.0.cmp(&b.0));
        }

        log::info!(
            "[tiertag] dictionary built: {} wordforms, {} distinct tags, {} frequency entries",
            index.len(),
            table.tags.len(),
            frequencies.len()
        );

        Ok(MorphDictionaryInner {
            grammemes: catalog.id_order(),
            tags: table.tags,
            index,
            frequencies: WordformStore::from_sorted(frequencies),
        })
    }

    fn parse_csv<R>(catalog: &GrammemeCatalog, rdr: R, name: &'static str) -> Result<Vec<RawEntry>>
    where
        R: Read,
    {
        let mut entries = vec![];
        let reader = BufReader::new(rdr);
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let cols = parse_csv_row(trimmed)?;
            let wordform = cols[0].trim();
            if wordform.is_empty() {
                return Err(TiertagError::invalid_format(
                    name,
                    format!("line {}: empty wordform", i + 1),
                ));
            }
            let grams: Vec<&str> = cols[1..]
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            if grams.is_empty() {
                log::warn!(
                    "[tiertag] {name}: line {}: '{wordform}' has no grammemes, skipped",
                    i + 1
                );
                continue;
            }
            let tag = catalog.to_bits(&grams).map_err(|e| {
                TiertagError::invalid_format(name, format!("line {}: {e}", i + 1))
            })?;
            entries.push(RawEntry {
                wordform: normalize(wordform),
                tag,
            });
        }
        Ok(entries)
    }
}
