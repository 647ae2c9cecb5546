//! # shiguredo_http1_parser
//!
//! 依存なしの HTTP/1.x インクリメンタルパーサー (Sans I/O)
//!
//! ## 特徴
//!
//! - **依存なし**: 標準ライブラリのみ使用
//! - **Sans I/O**: I/O を完全に分離した設計
//! - **ゼロコピー**: 入力をコピーせず、スライスの一部をそのままコールバックに渡す
//! - **分割耐性**: 入力をどう分割して渡しても同じイベント列になる
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_http1_parser::{
//!     CallbackResult, Parser, ParserCallbacks, ParserStatus,
//! };
//!
//! #[derive(Default)]
//! struct Collect {
//!     url: Vec<u8>,
//!     body: Vec<u8>,
//! }
//!
//! impl ParserCallbacks for Collect {
//!     fn on_url(&mut self, data: &[u8]) -> CallbackResult {
//!         self.url.extend_from_slice(data);
//!         Ok(())
//!     }
//!
//!     fn on_body(&mut self, data: &[u8]) -> CallbackResult {
//!         self.body.extend_from_slice(data);
//!         Ok(())
//!     }
//! }
//!
//! let mut parser = Parser::request(Collect::default());
//! // 受信したデータを順に渡す
//! let outcome = parser.execute(b"POST /x HTTP/1.1\r\nContent-Len");
//! assert_eq!(outcome.status, ParserStatus::Success);
//! let outcome = parser.execute(b"gth: 5\r\n\r\nhello");
//! assert_eq!(outcome.status, ParserStatus::Success);
//!
//! assert_eq!(parser.callbacks().url, b"/x");
//! assert_eq!(parser.callbacks().body, b"hello");
//! ```
//!
//! ## ポリシー
//!
//! パーサーは Content-Length と Transfer-Encoding の併用を拒否しない。
//! [`PolicyCallbacks`] でコールバックを包むと、あいまいなフレーミングと
//! [`ParserLimits`] の超過を拒否できる。

mod callbacks;
mod error;
mod flags;
mod limits;
mod message;
mod method;
mod parser;
mod policy;
mod status;

pub use callbacks::{CallbackResult, Flow, NoopCallbacks, ParserCallbacks};
pub use error::{ErrorKind, ParseError, Rejected};
pub use flags::MessageFlags;
pub use limits::ParserLimits;
pub use message::MessageInfo;
pub use method::Method;
pub use parser::{Framing, MessageKind, Parser};
pub use policy::{PolicyCallbacks, PolicyViolation};
pub use status::{ExecuteOutcome, ParserStatus};
