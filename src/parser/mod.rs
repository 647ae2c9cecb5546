//! HTTP/1.x インクリメンタルパーサー
//!
//! 入力スライスを 1 バイトずつ状態遷移させ、構造要素を認識するたびに
//! [`ParserCallbacks`] を同期的に呼び出す。入力はコピーも保持もしない。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_http1_parser::{NoopCallbacks, Parser, ParserStatus};
//!
//! let mut parser = Parser::request(NoopCallbacks);
//! let data = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let outcome = parser.execute(data);
//! assert_eq!(outcome.consumed, data.len());
//! assert_eq!(outcome.status, ParserStatus::NoBody);
//! ```

mod chars;
mod header;
mod machine;
mod state;

pub use state::Framing;

use crate::callbacks::ParserCallbacks;
use crate::error::ErrorKind;
use crate::flags::MessageFlags;
use crate::message::MessageInfo;
use crate::method::{MAX_METHOD_LEN, Method};
use crate::status::{ExecuteOutcome, ParserStatus};

use header::HeaderScanner;
use state::State;

/// メッセージの種類
///
/// パーサーの生成時に決まり、以後変わらない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// リクエスト
    Request,
    /// レスポンス
    Response,
}

/// HTTP/1.x パーサー
///
/// 接続の方向ごとに一つ作り、キープアライブ接続では複数のメッセージに使い回す。
/// メッセージ単位の情報は `on_message_begin` の直前にリセットされる。
#[derive(Debug)]
pub struct Parser<C: ParserCallbacks> {
    kind: MessageKind,
    callbacks: C,
    state: State,
    message: MessageInfo,
    error: Option<ErrorKind>,
    paused: bool,
    framing: Option<Framing>,
    expect_no_body: bool,
    expect_tunnel: bool,
    scanner: HeaderScanner,
    method_buf: [u8; MAX_METHOD_LEN],
    method_len: usize,
    /// 固定長ボディまたは現在のチャンクの残りバイト数
    remaining: u64,
    chunk_size: u64,
    /// この `execute()` 呼び出しで最後にヘッダーが完了したメッセージの状態
    last_status: ParserStatus,
}

impl<C: ParserCallbacks> Parser<C> {
    /// 新しいパーサーを作成
    pub fn new(kind: MessageKind, callbacks: C) -> Self {
        Self {
            kind,
            callbacks,
            state: State::Start,
            message: MessageInfo::default(),
            error: None,
            paused: false,
            framing: None,
            expect_no_body: false,
            expect_tunnel: false,
            scanner: HeaderScanner::default(),
            method_buf: [0; MAX_METHOD_LEN],
            method_len: 0,
            remaining: 0,
            chunk_size: 0,
            last_status: ParserStatus::Success,
        }
    }

    /// リクエスト用のパーサーを作成
    pub fn request(callbacks: C) -> Self {
        Self::new(MessageKind::Request, callbacks)
    }

    /// レスポンス用のパーサーを作成
    pub fn response(callbacks: C) -> Self {
        Self::new(MessageKind::Response, callbacks)
    }

    /// バイト列をパース
    ///
    /// 空のスライスはストリームの終了を意味する。
    /// エラー状態または一時停止中は何も消費せず、現在の状態をそのまま返す。
    pub fn execute(&mut self, data: &[u8]) -> ExecuteOutcome {
        if let Some(kind) = self.error {
            return ExecuteOutcome::new(0, ParserStatus::Error(kind));
        }
        if self.paused {
            return ExecuteOutcome::new(0, ParserStatus::Paused);
        }
        if data.is_empty() {
            return self.finish();
        }

        self.last_status = ParserStatus::Success;
        let stop = match self.run(data) {
            Ok(()) => return ExecuteOutcome::new(data.len(), self.last_status),
            Err(stop) => stop,
        };
        self.stopped(stop)
    }

    /// 一時停止を解除
    ///
    /// アップグレードで停止していた場合、以後のバイトはすべて
    /// `on_upgraded_data` に渡される。一時停止していなかった場合は false を返す。
    pub fn resume(&mut self) -> bool {
        std::mem::replace(&mut self.paused, false)
    }

    /// 初期状態に戻す
    ///
    /// 種類、コールバック、`set_expect_no_body` / `set_expect_tunnel` の設定は保持する。
    pub fn reset(&mut self) {
        self.state = State::Start;
        self.message = MessageInfo::default();
        self.error = None;
        self.paused = false;
        self.framing = None;
        self.scanner = HeaderScanner::default();
        self.method_len = 0;
        self.remaining = 0;
        self.chunk_size = 0;
        self.last_status = ParserStatus::Success;
    }

    /// HEAD リクエストへのレスポンスであることを設定
    ///
    /// レスポンスはヘッダーの内容に関係なくボディを持たない。
    pub fn set_expect_no_body(&mut self, expect: bool) {
        self.expect_no_body = expect;
    }

    /// CONNECT リクエストへのレスポンスであることを設定
    ///
    /// 2xx レスポンスはトンネルへのアップグレードとして扱う。
    pub fn set_expect_tunnel(&mut self, expect: bool) {
        self.expect_tunnel = expect;
    }

    /// メッセージの種類
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// コールバックへの参照
    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    /// コールバックへの可変参照
    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    /// コールバックを取り出す
    pub fn into_callbacks(self) -> C {
        self.callbacks
    }

    /// 現在のメッセージの情報
    pub fn message(&self) -> &MessageInfo {
        &self.message
    }

    pub fn http_major(&self) -> u8 {
        self.message.http_major
    }

    pub fn http_minor(&self) -> u8 {
        self.message.http_minor
    }

    /// リクエストメソッド (スタートライン完了前は None)
    pub fn method(&self) -> Option<Method> {
        self.message.method
    }

    pub fn method_name(&self) -> Option<&'static str> {
        self.message.method.map(Method::as_str)
    }

    pub fn status_code(&self) -> u16 {
        self.message.status_code
    }

    /// Content-Length の値
    ///
    /// chunked の場合は直近のチャンクサイズ。
    pub fn content_length(&self) -> u64 {
        self.message.content_length
    }

    pub fn flags(&self) -> &MessageFlags {
        &self.message.flags
    }

    pub fn seen_content_length(&self) -> bool {
        self.message.seen_content_length
    }

    pub fn set_seen_content_length(&mut self, seen: bool) {
        self.message.seen_content_length = seen;
    }

    /// 最後のエラー
    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    /// 現在の状態を表す識別子 ("HPE_OK", "HPE_PAUSED", またはエラー名)
    pub fn error_name(&self) -> &'static str {
        match self.error {
            Some(kind) => kind.name(),
            None if self.paused => "HPE_PAUSED",
            None => "HPE_OK",
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// アップグレード (CONNECT を含む) を検出したかどうか
    pub fn is_upgrade(&self) -> bool {
        self.message.upgrade
    }

    pub fn uses_transfer_encoding(&self) -> bool {
        self.message.flags.has_transfer_encoding
    }

    /// このメッセージの後に接続を再利用できるかどうか
    pub fn should_keep_alive(&self) -> bool {
        !self.message_needs_eof() && self.message.is_keep_alive()
    }

    /// ボディの終端を接続の終了で判断するかどうか
    pub fn message_needs_eof(&self) -> bool {
        self.framing == Some(Framing::UntilClose)
    }

    /// 決定済みのフレーミング (ヘッダー完了前は None)
    pub fn framing(&self) -> Option<Framing> {
        self.framing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::NoopCallbacks;

    #[test]
    fn error_is_terminal() {
        let mut parser = Parser::request(NoopCallbacks);
        let outcome = parser.execute(b"get / HTTP/1.1\r\n");
        assert_eq!(
            outcome.status,
            ParserStatus::Error(ErrorKind::MalformedStartLine)
        );
        assert_eq!(parser.error_name(), "HPE_MALFORMED_START_LINE");

        let outcome = parser.execute(b"GET / HTTP/1.1\r\n\r\n");
        assert_eq!(outcome.consumed, 0);
        assert_eq!(
            outcome.status,
            ParserStatus::Error(ErrorKind::MalformedStartLine)
        );
    }

    #[test]
    fn reset_clears_error_and_keeps_settings() {
        let mut parser = Parser::response(NoopCallbacks);
        parser.set_expect_no_body(true);
        parser.execute(b"XTTP/1.1 200 OK\r\n");
        assert!(parser.error().is_some());

        parser.reset();
        assert_eq!(parser.error(), None);
        assert_eq!(parser.error_name(), "HPE_OK");

        let outcome = parser.execute(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n");
        assert_eq!(outcome.status, ParserStatus::NoBody);
        assert!(parser.flags().skip_body);
    }

    #[test]
    fn resume_without_pause() {
        let mut parser = Parser::request(NoopCallbacks);
        assert!(!parser.resume());
    }

    #[test]
    fn accessors_after_request_line() {
        let mut parser = Parser::request(NoopCallbacks);
        parser.execute(b"M-SEARCH * HTTP/1.0\r\n");
        assert_eq!(parser.method(), Some(Method::MSearch));
        assert_eq!(parser.method_name(), Some("M-SEARCH"));
        assert_eq!(parser.http_major(), 1);
        assert_eq!(parser.http_minor(), 0);
        assert_eq!(parser.kind(), MessageKind::Request);
    }
}
