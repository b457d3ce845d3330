//! ユーティリティ関数と型変換トレイトを提供するモジュール
//!
//! - `FromU32`: u32からの型変換トレイト
//! - CSV行の解析と引用符処理
//! - 一度だけ読み込まれる共有リソース

use std::io::Write;
use std::sync::{Arc, Mutex, OnceLock};

use csv_core::ReadFieldResult;

use crate::errors::{Result, TiertagError};

/// u32から他の型への変換を提供するトレイト
pub trait FromU32 {
    /// u32値から実装型を生成する
    fn from_u32(src: u32) -> Self;
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl FromU32 for usize {
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // Since the pointer width is guaranteed to be 32 or 64,
        // the following process always succeeds.
        unsafe { Self::try_from(src).unwrap_unchecked() }
    }
}

/// CSVセルのデータを適切に引用符で囲んで書き出す
///
/// 必要に応じてダブルクォートやエスケープ処理を自動的に行います。
///
/// # 引数
///
/// * `wtr` - 書き込み先のWriterオブジェクト
/// * `data` - CSVセルとして書き込むバイト列
pub fn quote_csv_cell<W>(mut wtr: W, mut data: &[u8]) -> std::io::Result<()>
where
    W: Write,
{
    let mut output = [0; 4096];
    let mut writer = csv_core::Writer::new();
    loop {
        let (result, nin, nout) = writer.field(data, &mut output);
        wtr.write_all(&output[..nout])?;
        if result == csv_core::WriteResult::InputEmpty {
            break;
        }
        data = &data[nin..];
    }
    let (_, nout) = writer.finish(&mut output);
    wtr.write_all(&output[..nout])?;
    Ok(())
}

/// CSV形式の行を解析してフィールドのベクターに分割する
///
/// ダブルクォートで囲まれたフィールドや、フィールド内のカンマも正しく処理します。
///
/// # 例
///
/// ```
/// # use tiertag::utils::parse_csv_row;
/// let fields = parse_csv_row("кот,NOUN,anim").unwrap();
/// assert_eq!(fields, vec!["кот", "NOUN", "anim"]);
///
/// let fields_with_quote = parse_csv_row("\"1,5\",NUMR").unwrap();
/// assert_eq!(fields_with_quote, vec!["1,5", "NUMR"]);
/// ```
///
/// # エラー
///
/// フィールドが4096バイトを超える場合、またはUTF-8として不正な場合にエラーを返します。
pub fn parse_csv_row(row: &str) -> Result<Vec<String>> {
    let mut fields = vec![];
    let mut rdr = csv_core::Reader::new();
    let mut bytes = row.as_bytes();
    let mut output = [0; 4096];
    loop {
        let (result, nin, nout) = rdr.read_field(bytes, &mut output);
        let end = match result {
            ReadFieldResult::InputEmpty | ReadFieldResult::End => true,
            ReadFieldResult::Field { .. } => false,
            ReadFieldResult::OutputFull => {
                return Err(TiertagError::invalid_format("row", "Field too large"));
            }
        };
        fields.push(std::str::from_utf8(&output[..nout])?.to_string());
        if end {
            break;
        }
        bytes = &bytes[nin..];
    }
    Ok(fields)
}

/// プロセス全体で一度だけ読み込まれる共有リソース。
///
/// 最初のアクセスが並行しても読み込み処理は一度しか実行されません。
/// 読み込み後は`Arc`を複製して返すだけで、以降ロックは取りません。
///
/// # 例
///
/// ```
/// use tiertag::utils::SharedResource;
///
/// static TABLE: SharedResource<Vec<u32>> = SharedResource::new();
///
/// let table = TABLE.get_or_try_init(|| Ok(vec![1, 2, 3])).unwrap();
/// assert_eq!(table.len(), 3);
/// ```
pub struct SharedResource<T> {
    cell: OnceLock<Arc<T>>,
    init_lock: Mutex<()>,
}

impl<T> Default for SharedResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedResource<T> {
    /// 未初期化のリソースを作成します。
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// 読み込み済みであればリソースを返します。
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    /// リソースを返します。未読み込みの場合は`load`を一度だけ実行します。
    ///
    /// `load`が失敗した場合はリソースは未初期化のまま残り、次の呼び出しで再試行されます。
    ///
    /// # エラー
    ///
    /// `load`が返したエラー、または初期化ロックが汚染されている場合にエラーを返します。
    pub fn get_or_try_init<F>(&self, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.cell.get() {
            return Ok(value.clone());
        }
        let _guard = self.init_lock.lock().map_err(|e| {
            TiertagError::invalid_state("resource initialization lock is poisoned", e.to_string())
        })?;
        if let Some(value) = self.cell.get() {
            return Ok(value.clone());
        }
        let value = Arc::new(load()?);
        log::info!("[tiertag] shared resource initialized");
        Ok(self.cell.get_or_init(|| value).clone())
    }
}
