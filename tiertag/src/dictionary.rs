//! 形態素辞書モジュール。
//!
//! 正規化済みの語形から候補タグ(ビットベクター)の集合を引く辞書索引と、
//! 曖昧性解消のための語形頻度ストアを一つのバイナリファイルにまとめて扱います。
//!
//! - ゼロコピーデシリアライゼーションによる高速な辞書アクセス
//! - メモリマップドファイルによる効率的なメモリ使用
//! - メタデータハッシュによる検証結果のキャッシング
//!
//! # 辞書の読み込み方法
//!
//! - [`MorphDictionary::from_path`]: ファイルパスから辞書を読み込む(推奨)
//! - [`MorphDictionary::read`]: リーダーから辞書を読み込む
//!
//! # 辞書のビルド
//!
//! [`MorphDictionaryBuilder`]を使用して、CSV形式のソースデータから辞書を構築できます。
pub mod builder;
pub mod frequency;
pub(crate) mod map;
mod normalize;

use std::fs::{self, File, Metadata, create_dir_all};
use std::io::{Read, Write};
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use memmap2::Mmap;
use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use rkyv::{
    Archive, Deserialize, Serialize, access, access_unchecked, api::serialize_using,
    ser::Serializer, ser::allocator::Arena, ser::sharing::Share, ser::writer::IoWriter,
    util::with_arena,
};
use sha2::{Digest, Sha256};

use crate::catalog::{GrammemeCatalog, TagBits};
use crate::dictionary::frequency::WordformStore;
use crate::dictionary::map::WordMap;
use crate::errors::{Result, TiertagError};
use crate::utils::FromU32;

pub use crate::dictionary::builder::MorphDictionaryBuilder;
pub use crate::dictionary::frequency::WordformStoreBuilder;
pub use crate::dictionary::normalize::normalize;

/// コンパイル済み辞書を識別するマジックバイト。
///
/// "0.1"はファイル形式のバージョンで、クレートのバージョンとは独立しています。
pub const DICTIONARY_MAGIC: &[u8] = b"TiertagMorphDictionary 0.1\n";

const MAGIC_LEN: usize = DICTIONARY_MAGIC.len();
const RKYV_ALIGNMENT: usize = 16;
const PADDING_LEN: usize = (RKYV_ALIGNMENT - (MAGIC_LEN % RKYV_ALIGNMENT)) % RKYV_ALIGNMENT;
const DATA_START: usize = MAGIC_LEN + PADDING_LEN;

/// グローバルキャッシュディレクトリのパス。
///
/// ユーザー固有のシステムキャッシュディレクトリ内の`tiertag`サブディレクトリを指します。
/// - Linux: `$XDG_CACHE_HOME/tiertag` または `$HOME/.cache/tiertag`
/// - macOS: `$HOME/Library/Caches/tiertag`
/// - Windows: `{FOLDERID_LocalAppData}/tiertag`
pub static GLOBAL_CACHE_DIR: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let path = dirs::cache_dir()?.join("tiertag");
    fs::create_dir_all(&path).ok()?;

    Some(path)
});

/// 辞書の読み込みモード。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum LoadMode {
    /// 読み込むたびに完全な検証を実行します。
    ///
    /// キャッシュファイルは作成されません。
    Validate,
    /// ファイルメタデータのハッシュに対応するプルーフファイルが存在する場合は検証をスキップします。
    ///
    /// 高速な再読み込みが可能ですが、ファイルが置き換えられるTOCTOU攻撃に対して脆弱です。
    TrustCache,
}

/// [`MorphDictionary`]の内部データ。
#[derive(Archive, Serialize, Deserialize)]
pub struct MorphDictionaryInner {
    // grammeme ids in numeric-id order of the catalog used at build time
    grammemes: Vec<String>,
    tags: Vec<TagBits>,
    index: WordMap,
    frequencies: WordformStore,
}

#[allow(dead_code)]
enum DictBuffer {
    Mmap(Mmap),
    Aligned(AlignedVec<16>),
}

/// 読み取り専用の形態素辞書。
///
/// 読み込み後は複数のスレッドから同時に参照できます。
pub enum MorphDictionary {
    Archived(ArchivedMorphDictionary),
    Owned(Arc<MorphDictionaryInner>),
}

/// アーカイブ形式の辞書。
pub struct ArchivedMorphDictionary {
    _buffer: DictBuffer,
    data: &'static ArchivedMorphDictionaryInner,
}

impl Deref for ArchivedMorphDictionary {
    type Target = ArchivedMorphDictionaryInner;
    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl MorphDictionaryInner {
    fn lookup(&self, normalized: &str) -> Vec<TagBits> {
        self.index
            .get(normalized)
            .map(|id| self.tags[usize::from_u32(id)].clone())
            .collect()
    }

    fn pos_bits(&self, normalized: &str) -> Option<TagBits> {
        self.frequencies
            .get(normalized)
            .map(|id| self.tags[usize::from_u32(id)].clone())
    }

    /// 辞書をシリアライズしてライターに書き込みます。
    ///
    /// 出力は[`MorphDictionary::from_path`]と[`MorphDictionary::read`]が期待する形式です。
    ///
    /// # エラー
    ///
    /// 書き込みに失敗した場合、または`rkyv`シリアライゼーションでエラーが発生した場合に
    /// エラーを返します。
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(DICTIONARY_MAGIC)?;

        let padding_bytes = vec![0xFF; PADDING_LEN];
        wtr.write_all(&padding_bytes)?;

        with_arena(|arena: &mut Arena| {
            let writer = IoWriter::new(&mut wtr);
            let mut serializer = Serializer::new(writer, arena.acquire(), Share::new());
            serialize_using::<_, rkyv::rancor::Error>(self, &mut serializer)
        })
        .map_err(|e| TiertagError::invalid_state("rkyv serialization failed", e.to_string()))?;

        Ok(())
    }
}

impl ArchivedMorphDictionaryInner {
    fn lookup(&self, normalized: &str) -> Vec<TagBits> {
        self.index
            .get(normalized)
            .map(|id| self.tags[usize::from_u32(id)].to_native())
            .collect()
    }

    fn pos_bits(&self, normalized: &str) -> Option<TagBits> {
        self.frequencies
            .get(normalized)
            .map(|id| self.tags[usize::from_u32(id)].to_native())
    }
}

impl MorphDictionary {
    /// 構築済みの内部データから辞書を作成します。
    pub fn from_inner(dict: MorphDictionaryInner) -> Self {
        Self::Owned(Arc::new(dict))
    }

    /// 正規化済みの語形に対する候補タグの集合を返します。
    ///
    /// 空のベクターは未知語を意味します。
    #[inline(always)]
    pub fn lookup(&self, normalized: &str) -> Vec<TagBits> {
        match self {
            Self::Archived(archived) => archived.lookup(normalized),
            Self::Owned(dict) => dict.lookup(normalized),
        }
    }

    /// 正規化済みの語形に対する最頻の読みを頻度ストアから返します。
    #[inline(always)]
    pub fn pos_bits(&self, normalized: &str) -> Option<TagBits> {
        match self {
            Self::Archived(archived) => archived.pos_bits(normalized),
            Self::Owned(dict) => dict.pos_bits(normalized),
        }
    }

    /// 索引に登録された語形の数を返します。
    pub fn word_count(&self) -> usize {
        match self {
            Self::Archived(archived) => archived.index.len(),
            Self::Owned(dict) => dict.index.len(),
        }
    }

    /// 頻度ストアに登録された語形の数を返します。
    pub fn frequency_count(&self) -> usize {
        match self {
            Self::Archived(archived) => archived.frequencies.len(),
            Self::Owned(dict) => dict.frequencies.len(),
        }
    }

    /// 辞書が指定されたカタログと同じ文法素の並びで構築されたか検証します。
    ///
    /// # エラー
    ///
    /// 文法素の並びが異なる場合に[`TiertagError::Configuration`]を返します。
    pub fn verify_catalog(&self, catalog: &GrammemeCatalog) -> Result<()> {
        let matches = match self {
            Self::Archived(archived) => {
                archived.grammemes.len() == catalog.len()
                    && archived
                        .grammemes
                        .iter()
                        .zip(catalog.iter())
                        .all(|(a, g)| a.as_str() == g.id())
            }
            Self::Owned(dict) => {
                dict.grammemes.len() == catalog.len()
                    && dict
                        .grammemes
                        .iter()
                        .zip(catalog.iter())
                        .all(|(a, g)| a == g.id())
            }
        };
        if matches {
            Ok(())
        } else {
            Err(TiertagError::configuration(
                "the dictionary was compiled against a different grammeme catalog",
            ))
        }
    }

    /// 辞書をシリアライズしてライターに書き込みます。
    ///
    /// # エラー
    ///
    /// 書き込みに失敗した場合、またはアーカイブから読み込まれた辞書に対して
    /// 呼び出された場合にエラーを返します。
    pub fn write<W>(&self, wtr: W) -> Result<()>
    where
        W: Write,
    {
        match self {
            Self::Owned(dict) => dict.write(wtr),
            Self::Archived(_) => Err(TiertagError::invalid_state(
                "cannot re-serialize an archived dictionary",
                "write the dictionary built by MorphDictionaryBuilder instead",
            )),
        }
    }

    /// すべてのデータをヒープバッファに読み込むことで、リーダーから辞書を作成します。
    ///
    /// # エラー
    ///
    /// データを読み込めない場合、またはコンテンツが無効な場合にエラーを返します。
    pub fn read<R: Read>(mut rdr: R) -> Result<Self> {
        let mut magic = [0; MAGIC_LEN];
        rdr.read_exact(&mut magic)?;

        if !magic.starts_with(DICTIONARY_MAGIC) {
            return Err(TiertagError::invalid_argument(
                "rdr",
                "The magic number of the input dictionary mismatches.",
            ));
        }

        let mut padding_buf = vec![0; PADDING_LEN];
        rdr.read_exact(&mut padding_buf)?;

        let mut buffer = Vec::new();
        rdr.read_to_end(&mut buffer)?;

        let mut aligned_bytes = AlignedVec::with_capacity(buffer.len());
        aligned_bytes.extend_from_slice(&buffer);

        let archived = access::<ArchivedMorphDictionaryInner, Error>(&aligned_bytes).map_err(|e| {
            TiertagError::invalid_state(
                "rkyv validation failed. The dictionary file may be corrupted or incompatible.",
                e.to_string(),
            )
        })?;

        // SAFETY: AlignedVec ensures correct alignment and lives as long as the returned value.
        let data: &'static ArchivedMorphDictionaryInner = unsafe { &*(archived as *const _) };

        Ok(Self::Archived(ArchivedMorphDictionary {
            _buffer: DictBuffer::Aligned(aligned_bytes),
            data,
        }))
    }

    /// メモリマッピングを使用してファイルパスから辞書を作成します。
    ///
    /// | モード | 検証 | キャッシュ書き込み |
    /// |------|-------------|---------------|
    /// | `Validate` | 毎回完全検証 | なし |
    /// | `TrustCache` | プルーフファイルが存在する場合はスキップ | あり |
    ///
    /// `TrustCache`モードでは、ファイルのメタデータから計算したハッシュに対応する
    /// プルーフファイル(`<hash>.sha256`)を、辞書と同じディレクトリの`.cache/`と
    /// グローバルキャッシュディレクトリの順に探します。見つからなければ完全な検証を行い、
    /// 成功時にグローバルキャッシュへプルーフファイルを作成します。
    ///
    /// # 引数
    ///
    /// - `path` - 辞書ファイルへのパス。
    /// - `mode` - 検証戦略を指定する[`LoadMode`]。
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - ファイルを開けない、または読み込めない場合。
    /// - ファイルが破損している、またはマジックナンバーが一致しない場合。
    pub fn from_path<P: AsRef<std::path::Path>>(path: P, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            TiertagError::invalid_argument("path", format!("Failed to open dictionary file: {}", e))
        })?;
        let meta = &file.metadata()?;
        let mut magic = [0u8; MAGIC_LEN];
        file.read_exact(&mut magic)?;

        if !magic.starts_with(DICTIONARY_MAGIC) {
            return Err(TiertagError::invalid_argument(
                "path",
                "The magic number of the input dictionary mismatches.",
            ));
        }

        let mmap = unsafe { Mmap::map(&file)? };

        let Some(data_bytes) = &mmap.get(DATA_START..) else {
            return Err(TiertagError::invalid_argument(
                "path",
                "Dictionary file too small or corrupted.",
            ));
        };

        let hash_name = format!("{}.sha256", compute_metadata_hash(meta));

        if mode == LoadMode::TrustCache {
            let local = path
                .parent()
                .map(|p| p.join(".cache").join(&hash_name));
            let global = GLOBAL_CACHE_DIR.as_ref().map(|d| d.join(&hash_name));
            if local.iter().chain(global.iter()).any(|p| p.exists()) {
                log::debug!("[tiertag] proof file found, skipping validation");
                let archived =
                    unsafe { access_unchecked::<ArchivedMorphDictionaryInner>(data_bytes) };
                let data: &'static ArchivedMorphDictionaryInner =
                    unsafe { &*(archived as *const _) };
                return Ok(Self::Archived(ArchivedMorphDictionary {
                    _buffer: DictBuffer::Mmap(mmap),
                    data,
                }));
            }
        }

        match access::<ArchivedMorphDictionaryInner, Error>(data_bytes) {
            Ok(archived) => {
                if mode == LoadMode::TrustCache {
                    let global_cache_dir = GLOBAL_CACHE_DIR.as_ref().ok_or_else(|| {
                        TiertagError::invalid_state("Could not determine system cache directory.", "")
                    })?;
                    create_dir_all(global_cache_dir)?;
                    File::create(global_cache_dir.join(&hash_name))?;
                }

                let data: &'static ArchivedMorphDictionaryInner =
                    unsafe { &*(archived as *const _) };
                Ok(Self::Archived(ArchivedMorphDictionary {
                    _buffer: DictBuffer::Mmap(mmap),
                    data,
                }))
            }
            Err(_) => {
                // The mapping may be misaligned; retry on an aligned copy.
                let mut aligned_bytes = AlignedVec::with_capacity(data_bytes.len());
                aligned_bytes.extend_from_slice(data_bytes);

                let archived = access::<ArchivedMorphDictionaryInner, Error>(&aligned_bytes)
                    .map_err(|e| {
                        TiertagError::invalid_state(
                            "rkyv validation failed. The dictionary file may be corrupted or incompatible.",
                            e.to_string(),
                        )
                    })?;

                let data: &'static ArchivedMorphDictionaryInner =
                    unsafe { &*(archived as *const _) };
                Ok(Self::Archived(ArchivedMorphDictionary {
                    _buffer: DictBuffer::Aligned(aligned_bytes),
                    data,
                }))
            }
        }
    }
}

/// 候補タグから扱わないビットを落とし、同じパターンになった候補を一つにまとめます。
///
/// 順序は最初に現れた候補の順に保たれます。マスク後に空になった候補は捨てられます。
/// この関数は冪等です。
///
/// # 引数
///
/// * `candidates` - 辞書から得た候補タグ
/// * `keep` - 残すビットのマスク
pub fn trim_and_merge<I>(candidates: I, keep: &TagBits) -> Vec<TagBits>
where
    I: IntoIterator<Item = TagBits>,
{
    let mut merged: Vec<TagBits> = vec![];
    for c in candidates {
        let trimmed = c.masked(keep);
        if !trimmed.is_empty() && !merged.contains(&trimmed) {
            merged.push(trimmed);
        }
    }
    merged
}

/// ファイルメタデータからSHA256ハッシュを計算します。
///
/// # 戻り値
///
/// メタデータのSHA256ハッシュの16進数表現文字列。
#[inline(always)]
pub(crate) fn compute_metadata_hash(meta: &Metadata) -> String {
    let mut hasher = Sha256::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        hasher.update(meta.dev().to_le_bytes());
        hasher.update(meta.ino().to_le_bytes());
        hasher.update(meta.size().to_le_bytes());
        hasher.update(meta.mtime().to_le_bytes());
        hasher.update(meta.mtime_nsec().to_le_bytes());
    }

    #[cfg(not(unix))]
    {
        use std::time::SystemTime;

        hasher.update(meta.len().to_le_bytes());
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok());
        match modified {
            Some(d) => {
                hasher.update(d.as_secs().to_le_bytes());
                hasher.update(d.subsec_nanos().to_le_bytes());
            }
            None => hasher.update([0u8; 12]),
        }
    }

    hex::encode(hasher.finalize())
}
