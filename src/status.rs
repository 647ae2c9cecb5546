//! `execute()` の結果

use crate::error::{ErrorKind, ParseError};

/// `execute()` の状態
///
/// 一時停止とエラーは別のバリアントであり、数値空間を共有しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserStatus {
    /// 入力をすべて消費した
    Success,
    /// ボディを持たないメッセージ (HEAD へのレスポンス、1xx/204/304、ボディなしリクエスト)
    NoBody,
    /// フレーミング上ボディ長が 0 のメッセージ (Content-Length: 0)
    NoBodyData,
    /// アップグレード境界またはコールバックの要求で一時停止した
    ///
    /// 未消費のバイトは新しいプロトコル (または次のメッセージ) のもの。
    Paused,
    /// パースエラー (終端状態)
    Error(ErrorKind),
}

impl ParserStatus {
    /// 数値表現に変換
    ///
    /// 新しいバリアントを追加した場合はここでコンパイルエラーになる。
    pub fn to_int(self) -> i32 {
        match self {
            ParserStatus::Error(_) => -1,
            ParserStatus::Success => 0,
            ParserStatus::NoBody => 1,
            ParserStatus::NoBodyData => 2,
            ParserStatus::Paused => 21,
        }
    }

    /// エラーかどうか
    pub fn is_error(self) -> bool {
        matches!(self, ParserStatus::Error(_))
    }

    /// エラーの種類を取得
    pub fn error_kind(self) -> Option<ErrorKind> {
        match self {
            ParserStatus::Error(kind) => Some(kind),
            _ => None,
        }
    }
}

/// `execute()` の戻り値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOutcome {
    /// 消費したバイト数
    ///
    /// エラー時は問題のあるバイトの位置、一時停止時は HTTP フレーミングが終わった位置。
    pub consumed: usize,
    /// 状態
    pub status: ParserStatus,
}

impl ExecuteOutcome {
    pub(crate) fn new(consumed: usize, status: ParserStatus) -> Self {
        Self { consumed, status }
    }

    /// 一時停止したかどうか
    pub fn is_paused(&self) -> bool {
        self.status == ParserStatus::Paused
    }

    /// エラーを `Result` に変換
    ///
    /// エラー以外の状態はそのまま `Ok` で返す。
    pub fn into_result(self) -> Result<(usize, ParserStatus), ParseError> {
        match self.status {
            ParserStatus::Error(kind) => Err(ParseError {
                kind,
                offset: self.consumed,
            }),
            status => Ok((self.consumed, status)),
        }
    }
}
