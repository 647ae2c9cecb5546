//! tokio-http1-parser エラー型

use std::fmt;

use shiguredo_http1_parser::ErrorKind;

use crate::config::ConfigError;

/// tokio-http1-parser エラー
#[derive(Debug)]
pub enum Error {
    /// I/O エラー
    Io(std::io::Error),
    /// HTTP パースエラー
    ///
    /// `offset` はストリーム先頭からの絶対位置。
    Parse { kind: ErrorKind, offset: u64 },
    /// 設定エラー
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Parse { kind, offset } => {
                write!(f, "HTTP parse error: {} at stream offset {}", kind, offset)
            }
            Error::Config(e) => write!(f, "config error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Parse { kind, .. } => Some(kind),
            Error::Config(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
