//! 正規化済み語形からタグIDへのマップ
//!
//! 語形はソート済みの配列に格納され、二分探索で参照されます。
//! 候補タグIDはすべての語形について一本の配列に連結され、語形`i`の候補は
//! `ids[ends[i - 1]..ends[i]]`(`i == 0`では`ids[..ends[0]]`)に並びます。

use std::collections::BTreeMap;
use std::ops::Range;

use rkyv::{Archive, Deserialize, Serialize};

use crate::errors::Result;
use crate::utils::FromU32;

/// 語形をソート済み配列で管理するマップ
#[derive(Archive, Serialize, Deserialize)]
pub struct WordMap {
    words: Vec<String>,
    // exclusive end of each word's run in `ids`
    ends: Vec<u32>,
    ids: Vec<u32>,
}

/// `i`番目の語形の候補が占める範囲。
#[inline(always)]
fn run(i: usize, end_of: impl Fn(usize) -> u32) -> Range<usize> {
    let start = if i == 0 { 0 } else { usize::from_u32(end_of(i - 1)) };
    start..usize::from_u32(end_of(i))
}

impl WordMap {
    /// 語形に対応するIDを列挙します。未登録の語形では空になります。
    #[inline(always)]
    pub fn get(&self, word: &str) -> impl Iterator<Item = u32> + '_ {
        self.words
            .binary_search_by(|w| w.as_str().cmp(word))
            .ok()
            .and_then(|i| self.ids.get(run(i, |j| self.ends[j])))
            .unwrap_or_default()
            .iter()
            .copied()
    }

    /// 登録された語形の数を返します。
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// 語形マップを構築するビルダー
#[derive(Default)]
pub struct WordMapBuilder {
    map: BTreeMap<String, Vec<u32>>,
}

impl WordMapBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// 語形にIDを追加します。同じ語形に同じIDが重ねて追加された場合は一つにまとめます。
    #[inline(always)]
    pub fn add_record(&mut self, word: String, id: u32) {
        let ids = self.map.entry(word).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    /// # エラー
    ///
    /// IDの総数が`u32`に収まらない場合にエラーを返します。
    pub fn build(self) -> Result<WordMap> {
        let mut words = Vec::with_capacity(self.map.len());
        let mut ends = Vec::with_capacity(self.map.len());
        let mut ids = vec![];
        for (word, word_ids) in self.map {
            ids.extend(word_ids);
            words.push(word);
            ends.push(u32::try_from(ids.len())?);
        }
        Ok(WordMap { words, ends, ids })
    }
}

impl ArchivedWordMap {
    /// 語形に対応するIDを列挙します（アーカイブ版）。
    ///
    /// 範囲が壊れている語形は未登録として扱います。
    #[inline(always)]
    pub fn get(&self, word: &str) -> impl Iterator<Item = u32> + '_ {
        self.words
            .binary_search_by(|w| w.as_str().cmp(word))
            .ok()
            .filter(|&i| i < self.ends.len())
            .and_then(|i| self.ids.get(run(i, |j| self.ends[j].to_native())))
            .unwrap_or_default()
            .iter()
            .map(|id| id.to_native())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
