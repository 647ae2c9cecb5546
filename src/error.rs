use std::fmt;

/// パースエラーの種類
///
/// エラーは終端状態であり、一度エラーになったパーサーは `reset()` するまで
/// バイトを受け付けない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// スタートラインが不正 (未知のメソッド、不正なバージョン、不正なステータスコード等)
    MalformedStartLine,
    /// ヘッダー行が不正 (不正なフィールド名、制御文字、不正な Content-Length 等)
    InvalidHeaderSyntax,
    /// チャンクサイズ行またはチャンク区切りが不正
    InvalidChunkSize,
    /// テーブルには存在するが HTTP/1.x としては処理しないメソッド (PRI)
    UnsupportedMethod,
    /// メッセージ途中でストリームが終了した
    PrematureEof,
    /// コールバックが処理を拒否した
    CallbackRejected,
}

impl ErrorKind {
    /// 安定した識別子を取得
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::MalformedStartLine => "HPE_MALFORMED_START_LINE",
            ErrorKind::InvalidHeaderSyntax => "HPE_INVALID_HEADER_SYNTAX",
            ErrorKind::InvalidChunkSize => "HPE_INVALID_CHUNK_SIZE",
            ErrorKind::UnsupportedMethod => "HPE_UNSUPPORTED_METHOD",
            ErrorKind::PrematureEof => "HPE_PREMATURE_EOF",
            ErrorKind::CallbackRejected => "HPE_CALLBACK_REJECTED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MalformedStartLine => write!(f, "malformed start line"),
            ErrorKind::InvalidHeaderSyntax => write!(f, "invalid header syntax"),
            ErrorKind::InvalidChunkSize => write!(f, "invalid chunk size"),
            ErrorKind::UnsupportedMethod => write!(f, "unsupported method"),
            ErrorKind::PrematureEof => write!(f, "premature end of stream"),
            ErrorKind::CallbackRejected => write!(f, "rejected by callback"),
        }
    }
}

impl std::error::Error for ErrorKind {}

/// コールバックが返す拒否
///
/// どのコールバックから返されてもパースはその場で停止し、
/// `ErrorKind::CallbackRejected` として扱われる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rejected;

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rejected by callback")
    }
}

impl std::error::Error for Rejected {}

/// エラー位置付きのパースエラー
///
/// `offset` は `execute()` に渡したスライス内での位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub offset: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
