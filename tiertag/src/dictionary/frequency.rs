//! 語形頻度ストア
//!
//! 正規化済み語形ごとに、参照コーパスで最も頻繁に観測された読み(タグ)を一つだけ保持します。
//! 辞書が複数の候補を返した場合の曖昧性解消に使われます。

use std::io::Write;

use hashbrown::HashMap;
use rkyv::{Archive, Deserialize, Serialize};

use crate::catalog::{GrammemeCatalog, TagBits};
use crate::dictionary::normalize;
use crate::errors::Result;
use crate::utils::quote_csv_cell;

/// 語形から最頻タグIDへのマップ。
///
/// タグIDは辞書のタグ表を指します。
#[derive(Archive, Serialize, Deserialize, Default)]
pub struct WordformStore {
    words: Vec<String>,
    tag_ids: Vec<u32>,
}

impl WordformStore {
    /// ソート済みの`(語形, タグID)`の列から作成します。
    pub(crate) fn from_sorted(entries: Vec<(String, u32)>) -> Self {
        let (words, tag_ids) = entries.into_iter().unzip();
        Self { words, tag_ids }
    }

    /// 語形の最頻タグIDを返します。
    #[inline(always)]
    pub fn get(&self, word: &str) -> Option<u32> {
        self.words
            .binary_search_by(|w| w.as_str().cmp(word))
            .ok()
            .map(|i| self.tag_ids[i])
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl ArchivedWordformStore {
    /// 語形の最頻タグIDを返します（アーカイブ版）。
    #[inline(always)]
    pub fn get(&self, word: &str) -> Option<u32> {
        self.words
            .binary_search_by(|w| w.as_str().cmp(word))
            .ok()
            .map(|i| self.tag_ids[i].to_native())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[derive(Default)]
struct ReadingCounts {
    // (reading, count), in first-observation order
    readings: Vec<(TagBits, u32)>,
}

/// 観測された読みを数え、語形ごとの最頻の読みを求めるビルダー。
///
/// 最頻の読みが複数ある場合は、最初に観測された読みが選ばれます。
#[derive(Default)]
pub struct WordformStoreBuilder {
    counts: HashMap<String, ReadingCounts>,
}

impl WordformStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 語形の読みを一件観測として加えます。語形は内部で正規化されます。
    pub fn add_observation(&mut self, wordform: &str, reading: &TagBits) {
        let entry = self.counts.entry(normalize(wordform)).or_default();
        match entry.readings.iter_mut().find(|(r, _)| r == reading) {
            Some((_, n)) => *n += 1,
            None => entry.readings.push((reading.clone(), 1)),
        }
    }

    /// 語形ごとの最頻の読みを語形順に返します。
    pub fn most_frequent(&self) -> Vec<(String, TagBits)> {
        let mut result: Vec<(String, TagBits)> = self
            .counts
            .iter()
            .filter_map(|(word, counts)| {
                let mut best: Option<&(TagBits, u32)> = None;
                for rc in &counts.readings {
                    // strict comparison keeps the earliest reading on ties
                    if best.is_none_or(|b| rc.1 > b.1) {
                        best = Some(rc);
                    }
                }
                best.map(|(r, _)| (word.clone(), r.clone()))
            })
            .collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }

    /// 最頻の読みを`wordform,GRAM,...`形式のCSVとして書き出します。
    ///
    /// 出力は[`MorphDictionaryBuilder`](crate::dictionary::MorphDictionaryBuilder)の
    /// 頻度ソースとしてそのまま読み込めます。
    ///
    /// # エラー
    ///
    /// 書き込みに失敗した場合にエラーを返します。
    pub fn write_csv<W>(&self, catalog: &GrammemeCatalog, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        for (word, reading) in self.most_frequent() {
            quote_csv_cell(&mut wtr, word.as_bytes())?;
            for g in catalog.grammemes_of(&reading) {
                wtr.write_all(b",")?;
                quote_csv_cell(&mut wtr, g.as_bytes())?;
            }
            wtr.write_all(b"\n")?;
        }
        Ok(())
    }

    /// 学習用コーパスの正解タグから頻度を数えます。
    ///
    /// # 引数
    ///
    /// * `corpus` - 正解コーパス
    /// * `catalog` - 文法素カタログ
    /// * `keep` - 数える前に読みに適用するマスク
    ///
    /// # エラー
    ///
    /// 未登録の文法素がコーパスに含まれる場合にエラーを返します。
    #[cfg(feature = "train")]
    pub fn from_corpus(
        corpus: &crate::trainer::Corpus,
        catalog: &GrammemeCatalog,
        keep: &TagBits,
    ) -> Result<Self> {
        let mut builder = Self::new();
        for span in corpus.spans() {
            for word in span.tokens() {
                let bits = catalog.to_bits(word.grammemes())?.masked(keep);
                if !bits.is_empty() {
                    builder.add_observation(word.surface(), &bits);
                }
            }
        }
        Ok(builder)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_frequent_with_tie_break() {
        let a = TagBits::from_indices(4, [0]).unwrap();
        let b = TagBits::from_indices(4, [1]).unwrap();

        let mut builder = WordformStoreBuilder::new();
        builder.add_observation("Банка", &a);
        builder.add_observation("банка", &b);
        builder.add_observation("банка", &b);
        builder.add_observation("стекло", &b);
        builder.add_observation("стекло", &a);

        let mf = builder.most_frequent();
        assert_eq!(
            vec![("банка".to_string(), b.clone()), ("стекло".to_string(), b)],
            mf
        );
    }

    #[test]
    fn test_store_get() {
        let store = WordformStore::from_sorted(vec![
            ("банка".to_string(), 3),
            ("кот".to_string(), 1),
        ]);
        assert_eq!(Some(3), store.get("банка"));
        assert_eq!(None, store.get("пёс"));
        assert_eq!(2, store.len());
    }

    #[test]
    fn test_write_csv() {
        let catalog = GrammemeCatalog::from_reader(
            "POST,,,\nNOUN,POST,,\nCAse,,,\nnomn,CAse,,\n".as_bytes(),
        )
        .unwrap();
        let mut builder = WordformStoreBuilder::new();
        builder.add_observation("кот", &catalog.to_bits(["NOUN", "nomn"]).unwrap());
        let mut buf = vec![];
        builder.write_csv(&catalog, &mut buf).unwrap();
        assert_eq!("кот,NOUN,nomn\n", String::from_utf8(buf).unwrap());
    }
}
