//! エラー型の定義
//!
//! このモジュールは、tiertagライブラリで使用されるすべてのエラー型を定義します。
//! 読み込み時の致命的な設定エラーと、スパン単位で隔離される分類エラーを区別します。

use std::error::Error;
use std::fmt::{self, Debug};

/// tiertag専用のResult型
///
/// エラー型としてデフォルトで[`TiertagError`]を使用します。
pub type Result<T, E = TiertagError> = std::result::Result<T, E>;

/// tiertagのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
#[derive(Debug, thiserror::Error)]
pub enum TiertagError {
    /// 無効な引数エラー
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// 無効なフォーマットエラー
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 無効な状態エラー
    #[error(transparent)]
    InvalidState(InvalidStateError),

    /// 設定エラー
    ///
    /// 読み込み時に検出される致命的なエラーです。ティア分割の重複や欠落、
    /// ティア数と分類器数の不一致、左右とも0の文脈窓、モデル成果物の欠落など。
    #[error(transparent)]
    Configuration(ConfigurationError),

    /// 文法素IDの重複登録
    #[error(transparent)]
    DuplicateId(DuplicateIdError),

    /// スパン単位の分類失敗
    ///
    /// 他のスパンの確定済み結果には影響しません。再試行やスキップは呼び出し側が決めます。
    #[error(transparent)]
    Classification(ClassificationFailure),

    /// 注釈状態の不整合
    ///
    /// 不変条件が要求する語形が欠けている、または矛盾している場合に即座に報告されます。
    #[error(transparent)]
    InconsistentAnnotation(InconsistentAnnotationState),

    /// 整数変換エラー
    #[error(transparent)]
    TryFromInt(std::num::TryFromIntError),

    /// 浮動小数点数パースエラー
    #[error(transparent)]
    ParseFloat(std::num::ParseFloatError),

    /// 整数パースエラー
    #[error(transparent)]
    ParseInt(std::num::ParseIntError),

    /// UTF-8エンコーディングエラー
    #[error(transparent)]
    Utf8(std::str::Utf8Error),

    /// I/Oエラー
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// rkyvシリアライゼーションエラー
    #[error(transparent)]
    Rkyv(#[from] rkyv::rancor::Error),
}

impl TiertagError {
    /// 無効な引数エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 引数の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - フォーマット名
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効な状態エラーを生成します
    pub(crate) fn invalid_state<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::InvalidState(InvalidStateError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }

    /// 設定エラーを生成します
    pub(crate) fn configuration<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Configuration(ConfigurationError { msg: msg.into() })
    }

    /// スパン単位の分類失敗を生成します
    ///
    /// # 引数
    ///
    /// * `tier` - 失敗したティアのID
    /// * `cause` - 失敗の原因
    pub(crate) fn classification<S, M>(tier: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::Classification(ClassificationFailure {
            tier: tier.into(),
            cause: cause.into(),
        })
    }

    /// 注釈状態の不整合エラーを生成します
    pub(crate) fn inconsistent_annotation<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InconsistentAnnotation(InconsistentAnnotationState { msg: msg.into() })
    }

    /// 読み込み時に起動を中断すべきエラーであれば`true`を返します。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::DuplicateId(_) | Self::InconsistentAnnotation(_)
        )
    }
}

/// 引数が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// 引数の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidFormatError {
    /// フォーマットの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}

/// 状態が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidStateError {
    /// エラーメッセージ
    pub(crate) msg: String,

    /// エラーの根本原因
    pub(crate) cause: String,
}

impl fmt::Display for InvalidStateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidStateError: {}: {}", self.msg, self.cause)
    }
}

impl Error for InvalidStateError {}

/// 設定が不正な場合に使用されるエラー
#[derive(Debug)]
pub struct ConfigurationError {
    pub(crate) msg: String,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ConfigurationError: {}", self.msg)
    }
}

impl Error for ConfigurationError {}

/// 同じIDの文法素が二度登録された場合に使用されるエラー
#[derive(Debug)]
pub struct DuplicateIdError {
    /// 重複したID
    pub(crate) id: String,
}

impl DuplicateIdError {
    /// 重複したIDを返します。
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DuplicateIdError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DuplicateIdError: grammeme '{}' is already registered", self.id)
    }
}

impl Error for DuplicateIdError {}

/// 分類器の呼び出しがスパン単位で失敗した場合に使用されるエラー
#[derive(Debug)]
pub struct ClassificationFailure {
    /// 失敗したティアのID
    pub(crate) tier: String,

    /// 失敗の原因
    pub(crate) cause: String,
}

impl ClassificationFailure {
    /// 失敗したティアのIDを返します。
    pub fn tier(&self) -> &str {
        &self.tier
    }
}

impl fmt::Display for ClassificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ClassificationFailure: tier '{}': {}", self.tier, self.cause)
    }
}

impl Error for ClassificationFailure {}

/// 注釈状態が不変条件に違反している場合に使用されるエラー
#[derive(Debug)]
pub struct InconsistentAnnotationState {
    pub(crate) msg: String,
}

impl fmt::Display for InconsistentAnnotationState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InconsistentAnnotationState: {}", self.msg)
    }
}

impl Error for InconsistentAnnotationState {}

impl From<std::num::TryFromIntError> for TiertagError {
    fn from(error: std::num::TryFromIntError) -> Self {
        Self::TryFromInt(error)
    }
}

impl From<std::num::ParseFloatError> for TiertagError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::ParseFloat(error)
    }
}

impl From<std::num::ParseIntError> for TiertagError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::ParseInt(error)
    }
}

impl From<std::str::Utf8Error> for TiertagError {
    fn from(error: std::str::Utf8Error) -> Self {
        Self::Utf8(error)
    }
}
