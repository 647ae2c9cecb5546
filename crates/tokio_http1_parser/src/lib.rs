//! tokio_http1_parser - Tokio integration for shiguredo_http1_parser
//!
//! tokio の `AsyncRead` から読み取ったバイト列を HTTP/1.x パーサーに渡す接続パイプライン。
//!
//! ## 特徴
//!
//! - **shiguredo_http1_parser ベース**: Sans I/O パーサーをベースにした設計
//! - **非同期 I/O**: tokio による完全非同期対応
//! - **絶対位置**: パースエラーをストリーム先頭からの位置で報告
//! - **アップグレード**: CONNECT / Upgrade 後の未消費バイトを新しいプロトコルに引き渡す
//! - **JSON 設定**: nojson による設定の読み込み
//!
//! ## 使い方
//!
//! ```ignore
//! use shiguredo_http1_parser::Parser;
//! use tokio_http1_parser::{DriverEvent, PipelineConfig, StreamDriver};
//!
//! let config = PipelineConfig::from_json(&std::fs::read_to_string("pipeline.json")?)?;
//! let parser = Parser::request(config.policy(MyCallbacks::default()));
//! let mut driver = StreamDriver::with_config(stream, parser, &config);
//! while driver.advance().await? == DriverEvent::Paused {
//!     driver.resume();
//! }
//! ```

pub mod config;
pub mod driver;
pub mod error;

pub use config::{ConfigError, PipelineConfig};
pub use driver::{DriverEvent, StreamDriver};
pub use error::{Error, Result};
