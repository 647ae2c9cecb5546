//! パイプライン設定
//!
//! JSON で書かれた設定を読み込む。
//!
//! ```json
//! {
//!   "read_buffer_size": 16384,
//!   "allow_chunked_length": false,
//!   "limits": {
//!     "max_headers_size": 61440,
//!     "max_headers_count": 100,
//!     "max_url_size": 8192
//!   }
//! }
//! ```
//!
//! 省略したキーはデフォルト値になる。型が合わないキーと未知のキーはエラーになる。

use std::fmt;

use shiguredo_http1_parser::{ParserCallbacks, ParserLimits, PolicyCallbacks};

/// 設定エラー
#[derive(Debug)]
pub enum ConfigError {
    /// 値の型または範囲が不正
    InvalidField { key: String },
    /// 未知のキー
    UnknownField { key: String },
    /// JSON として不正
    Json(nojson::JsonParseError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidField { key } => write!(f, "invalid value for {:?}", key),
            ConfigError::UnknownField { key } => write!(f, "unknown field {:?}", key),
            ConfigError::Json(e) => write!(f, "JSON parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
            _ => None,
        }
    }
}

fn invalid(key: &str) -> ConfigError {
    ConfigError::InvalidField {
        key: key.to_string(),
    }
}

/// 接続パイプラインの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 読み取りバッファサイズ (デフォルト: 8192)
    pub read_buffer_size: usize,
    /// パーサーの制限
    pub limits: ParserLimits,
    /// Transfer-Encoding と Content-Length の併用を許可するか (デフォルト: false)
    pub allow_chunked_length: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 8192,
            limits: ParserLimits::default(),
            allow_chunked_length: false,
        }
    }
}

impl PipelineConfig {
    /// JSON から読み込む
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw = nojson::RawJson::parse(text).map_err(ConfigError::Json)?;
        let members = raw.value().to_object().map_err(ConfigError::Json)?;

        let mut config = Self::default();
        for (key, value) in members {
            let key = String::try_from(key).map_err(ConfigError::Json)?;
            match key.as_str() {
                "read_buffer_size" => {
                    config.read_buffer_size = usize::try_from(value)
                        .ok()
                        .filter(|size| *size > 0)
                        .ok_or_else(|| invalid(&key))?;
                }
                "allow_chunked_length" => {
                    config.allow_chunked_length =
                        bool::try_from(value).map_err(|_| invalid(&key))?;
                }
                "limits" => {
                    config.limits = parse_limits(value)?;
                }
                _ => return Err(ConfigError::UnknownField { key }),
            }
        }
        Ok(config)
    }

    /// 設定したポリシーでコールバックを包む
    pub fn policy<C: ParserCallbacks>(&self, inner: C) -> PolicyCallbacks<C> {
        PolicyCallbacks::with_limits(inner, self.limits.clone())
            .with_allow_chunked_length(self.allow_chunked_length)
    }
}

fn parse_limits(value: nojson::RawJsonValue<'_, '_>) -> Result<ParserLimits, ConfigError> {
    let members = value.to_object().map_err(|_| invalid("limits"))?;

    let mut limits = ParserLimits::default();
    for (key, value) in members {
        let key = format!(
            "limits.{}",
            String::try_from(key).map_err(ConfigError::Json)?
        );
        let n = usize::try_from(value).map_err(|_| invalid(&key))?;
        match key.as_str() {
            "limits.max_headers_size" => limits.max_headers_size = n,
            "limits.max_headers_count" => limits.max_headers_count = n,
            "limits.max_url_size" => limits.max_url_size = n,
            _ => return Err(ConfigError::UnknownField { key }),
        }
    }
    Ok(limits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn all_fields() {
        let config = PipelineConfig::from_json(
            r#"{
                "read_buffer_size": 1024,
                "allow_chunked_length": true,
                "limits": {"max_headers_size": 100, "max_headers_count": 3, "max_url_size": 50}
            }"#,
        )
        .unwrap();
        assert_eq!(config.read_buffer_size, 1024);
        assert!(config.allow_chunked_length);
        assert_eq!(config.limits.max_headers_size, 100);
        assert_eq!(config.limits.max_headers_count, 3);
        assert_eq!(config.limits.max_url_size, 50);
    }

    #[test]
    fn partial_limits_keep_defaults() {
        let config = PipelineConfig::from_json(r#"{"limits": {"max_url_size": 10}}"#).unwrap();
        assert_eq!(config.limits.max_url_size, 10);
        assert_eq!(
            config.limits.max_headers_count,
            ParserLimits::default().max_headers_count
        );
    }

    #[test]
    fn invalid_fields() {
        for (text, expected) in [
            (r#"{"read_buffer_size": "big"}"#, "read_buffer_size"),
            (r#"{"read_buffer_size": 0}"#, "read_buffer_size"),
            (r#"{"read_buffer_size": -1}"#, "read_buffer_size"),
            (r#"{"allow_chunked_length": 1}"#, "allow_chunked_length"),
            (r#"{"limits": 5}"#, "limits"),
            (r#"{"limits": {"max_url_size": null}}"#, "limits.max_url_size"),
        ] {
            match PipelineConfig::from_json(text) {
                Err(ConfigError::InvalidField { key }) => assert_eq!(key, expected, "{text}"),
                other => panic!("unexpected result for {text}: {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_fields() {
        match PipelineConfig::from_json(r#"{"max_body": 1}"#) {
            Err(ConfigError::UnknownField { key }) => assert_eq!(key, "max_body"),
            other => panic!("unexpected result: {other:?}"),
        }
        match PipelineConfig::from_json(r#"{"limits": {"max_body": 1}}"#) {
            Err(ConfigError::UnknownField { key }) => assert_eq!(key, "limits.max_body"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            PipelineConfig::from_json("{"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json("[]"),
            Err(ConfigError::Json(_))
        ));
    }
}
