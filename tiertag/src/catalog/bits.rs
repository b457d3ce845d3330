//! 文法素の固定幅ビットベクター
//!
//! 各ビット位置は[`GrammemeCatalog`](crate::catalog::GrammemeCatalog)で割り当てられた
//! 数値IDに対応します。

use rkyv::{Archive, Deserialize, Serialize};

const BLOCK_BITS: usize = 64;

/// 文法素集合を表す固定幅ビットベクター。
///
/// 辞書の候補1件、または確定したタグ1件を表します。
/// 幅は生成時のカタログに登録された文法素の数で決まります。
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
pub struct TagBits {
    blocks: Vec<u64>,
}

impl TagBits {
    /// 指定された幅の空のビットベクターを作成します。
    pub fn with_width(width: usize) -> Self {
        Self {
            blocks: vec![0; width.div_ceil(BLOCK_BITS)],
        }
    }

    /// ビット位置の列からビットベクターを作成します。
    ///
    /// # 引数
    ///
    /// * `width` - ビットベクターの幅
    /// * `indices` - 立てるビット位置
    ///
    /// # 戻り値
    ///
    /// 幅を超えるビット位置が含まれる場合は`None`。
    pub fn from_indices<I>(width: usize, indices: I) -> Option<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut bits = Self::with_width(width);
        for i in indices {
            if i >= width {
                return None;
            }
            bits.set(i);
        }
        Some(bits)
    }

    /// 指定位置のビットを立てます。
    ///
    /// # Panics
    ///
    /// `i`がビットベクターの容量を超える場合にパニックします。
    #[inline(always)]
    pub fn set(&mut self, i: usize) {
        self.blocks[i / BLOCK_BITS] |= 1 << (i % BLOCK_BITS);
    }

    /// 指定位置のビットを落とします。範囲外の位置は無視されます。
    #[inline(always)]
    pub fn clear(&mut self, i: usize) {
        if let Some(block) = self.blocks.get_mut(i / BLOCK_BITS) {
            *block &= !(1 << (i % BLOCK_BITS));
        }
    }

    /// 指定位置のビットが立っていれば`true`を返します。
    #[inline(always)]
    pub fn get(&self, i: usize) -> bool {
        self.blocks
            .get(i / BLOCK_BITS)
            .is_some_and(|b| b & (1 << (i % BLOCK_BITS)) != 0)
    }

    /// 立っているビットが一つもなければ`true`を返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|&b| b == 0)
    }

    /// 立っているビットの数を返します。
    pub fn count_ones(&self) -> usize {
        self.blocks.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// 立っているビット位置を昇順に列挙します。
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().enumerate().flat_map(|(bi, &block)| {
            let mut rest = block;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let tz = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(bi * BLOCK_BITS + tz)
            })
        })
    }

    /// `mask`で立っているビットだけを残した新しいビットベクターを返します。
    pub fn masked(&self, mask: &TagBits) -> TagBits {
        TagBits {
            blocks: self
                .blocks
                .iter()
                .enumerate()
                .map(|(i, &b)| b & mask.blocks.get(i).copied().unwrap_or(0))
                .collect(),
        }
    }

    /// `other`のビットをこのビットベクターに加えます。
    pub fn union_with(&mut self, other: &TagBits) {
        if self.blocks.len() < other.blocks.len() {
            self.blocks.resize(other.blocks.len(), 0);
        }
        for (a, b) in self.blocks.iter_mut().zip(&other.blocks) {
            *a |= b;
        }
    }

    /// `mask`の補集合を取ったビットベクターを返します。
    ///
    /// 幅は自身のブロック数に揃えられます。末尾ブロックの余剰ビットも立つため、
    /// 結果は[`masked`](Self::masked)のマスクとしてのみ使用してください。
    pub fn complement(&self) -> TagBits {
        TagBits {
            blocks: self.blocks.iter().map(|b| !b).collect(),
        }
    }

    /// 2つのビットベクターに共通するビットがあれば`true`を返します。
    pub fn intersects(&self, other: &TagBits) -> bool {
        self.blocks
            .iter()
            .zip(&other.blocks)
            .any(|(a, b)| a & b != 0)
    }
}

impl ArchivedTagBits {
    /// この[`ArchivedTagBits`]を対応する[`TagBits`]に変換します。
    pub fn to_native(&self) -> TagBits {
        TagBits {
            blocks: self.blocks.iter().map(|b| b.to_native()).collect(),
        }
    }
}
