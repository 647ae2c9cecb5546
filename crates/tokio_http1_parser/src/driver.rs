//! ストリームドライバー
//!
//! `AsyncRead` から読み取ったバイトを [`Parser`] に渡し続ける。
//! パーサー自体はバイトをコピーも保持もしないため、未消費のバイトは
//! ドライバーの読み取りバッファに残る。
//!
//! ## 使い方
//!
//! ```ignore
//! use shiguredo_http1_parser::{NoopCallbacks, Parser};
//! use tokio_http1_parser::{DriverEvent, StreamDriver};
//!
//! let mut driver = StreamDriver::new(stream, Parser::request(NoopCallbacks));
//! loop {
//!     match driver.advance().await? {
//!         DriverEvent::Closed => break,
//!         DriverEvent::Paused => driver.resume(),
//!         DriverEvent::Upgraded => {
//!             let early_data = driver.take_remaining();
//!             let (stream, _parser) = driver.into_parts();
//!             // stream と early_data を新しいプロトコルに渡す
//!             break;
//!         }
//!     }
//! }
//! ```

use shiguredo_http1_parser::{
    ExecuteOutcome, MessageKind, Parser, ParserCallbacks, ParserStatus, PolicyCallbacks,
};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::PipelineConfig;
use crate::error::{Error, Result};

/// `advance()` が返るきっかけ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    /// ストリームが終了し、パーサーも正常に終了した
    Closed,
    /// コールバックの要求でメッセージ境界で一時停止した
    Paused,
    /// アップグレード (CONNECT を含む) に到達した
    ///
    /// 未消費のバイトは新しいプロトコルのもの。
    Upgraded,
}

/// ストリームドライバー
#[derive(Debug)]
pub struct StreamDriver<R, C: ParserCallbacks> {
    reader: R,
    parser: Parser<C>,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    /// `buf[start]` のストリーム先頭からの位置
    stream_offset: u64,
    eof: bool,
}

impl<R, C> StreamDriver<R, C>
where
    R: AsyncRead + Unpin,
    C: ParserCallbacks,
{
    /// デフォルトの読み取りバッファサイズで作成
    pub fn new(reader: R, parser: Parser<C>) -> Self {
        Self::with_buffer_size(reader, parser, PipelineConfig::default().read_buffer_size)
    }

    /// 設定の読み取りバッファサイズで作成
    pub fn with_config(reader: R, parser: Parser<C>, config: &PipelineConfig) -> Self {
        Self::with_buffer_size(reader, parser, config.read_buffer_size)
    }

    /// 読み取りバッファサイズを指定して作成
    pub fn with_buffer_size(reader: R, parser: Parser<C>, size: usize) -> Self {
        Self {
            reader,
            parser,
            buf: vec![0; size.max(1)],
            start: 0,
            end: 0,
            stream_offset: 0,
            eof: false,
        }
    }

    pub fn parser(&self) -> &Parser<C> {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut Parser<C> {
        &mut self.parser
    }

    /// パーサーが消費したバイト数 (ストリーム先頭から)
    pub fn stream_offset(&self) -> u64 {
        self.stream_offset
    }

    /// 読み取り済みで未消費のバイト列
    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    /// 読み取り済みで未消費のバイト列を取り出す
    ///
    /// アップグレード後は新しいプロトコルの先頭のバイト列になる。
    pub fn take_remaining(&mut self) -> Vec<u8> {
        let data = self.buf[self.start..self.end].to_vec();
        self.stream_offset += data.len() as u64;
        self.start = self.end;
        data
    }

    /// 一時停止を解除
    ///
    /// アップグレード後に解除した場合、以降のバイトは `on_upgraded_data` に渡される。
    pub fn resume(&mut self) {
        self.parser.resume();
    }

    /// リーダーとパーサーに分解
    pub fn into_parts(self) -> (R, Parser<C>) {
        (self.reader, self.parser)
    }

    /// ストリームの終了、一時停止、アップグレードのいずれかまで進める
    ///
    /// パースエラーの後は何も読み取らず、同じエラーを返し続ける。
    pub async fn advance(&mut self) -> Result<DriverEvent> {
        if let Some(kind) = self.parser.error() {
            return Err(Error::Parse {
                kind,
                offset: self.stream_offset,
            });
        }
        loop {
            if self.start < self.end {
                let outcome = self.parser.execute(&self.buf[self.start..self.end]);
                if let Some(event) = self.apply(outcome)? {
                    return Ok(event);
                }
                continue;
            }

            if self.eof {
                return Ok(DriverEvent::Closed);
            }

            let n = self.reader.read(&mut self.buf).await?;
            tracing::trace!(bytes = n, offset = self.stream_offset, "read");
            self.start = 0;
            self.end = n;

            if n == 0 {
                self.eof = true;
                let outcome = self.parser.execute(&[]);
                if let Some(event) = self.apply(outcome)? {
                    return Ok(event);
                }
                return Ok(DriverEvent::Closed);
            }
        }
    }

    fn apply(&mut self, outcome: ExecuteOutcome) -> Result<Option<DriverEvent>> {
        let offset = self.stream_offset + outcome.consumed as u64;
        self.start += outcome.consumed;
        self.stream_offset = offset;

        match outcome.status {
            ParserStatus::Error(kind) => {
                tracing::warn!(error = kind.name(), offset, "HTTP parse error");
                Err(Error::Parse { kind, offset })
            }
            ParserStatus::Paused if self.parser.is_upgrade() => {
                tracing::debug!(offset, "upgrade");
                Ok(Some(DriverEvent::Upgraded))
            }
            ParserStatus::Paused => {
                tracing::debug!(offset, "paused at message boundary");
                Ok(Some(DriverEvent::Paused))
            }
            ParserStatus::NoBody | ParserStatus::NoBodyData => {
                tracing::debug!(status = ?outcome.status, offset, "message without body");
                Ok(None)
            }
            ParserStatus::Success => Ok(None),
        }
    }
}

impl<R, C> StreamDriver<R, PolicyCallbacks<C>>
where
    R: AsyncRead + Unpin,
    C: ParserCallbacks,
{
    /// JSON の設定からポリシー付きのドライバーを作成
    pub fn from_json_config(
        reader: R,
        kind: MessageKind,
        callbacks: C,
        json: &str,
    ) -> Result<Self> {
        let config = PipelineConfig::from_json(json)?;
        let parser = Parser::new(kind, config.policy(callbacks));
        Ok(Self::with_config(reader, parser, &config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiguredo_http1_parser::{CallbackResult, ErrorKind, Flow, PolicyViolation, Rejected};

    use crate::config::ConfigError;

    #[derive(Debug, Default)]
    struct Collect {
        urls: Vec<Vec<u8>>,
        body: Vec<u8>,
        upgraded: Vec<u8>,
        completed: usize,
        pause: bool,
    }

    impl ParserCallbacks for Collect {
        fn on_message_begin(&mut self) -> CallbackResult {
            self.urls.push(Vec::new());
            Ok(())
        }

        fn on_url(&mut self, data: &[u8]) -> CallbackResult {
            if let Some(url) = self.urls.last_mut() {
                url.extend_from_slice(data);
            }
            Ok(())
        }

        fn on_body(&mut self, data: &[u8]) -> CallbackResult {
            self.body.extend_from_slice(data);
            Ok(())
        }

        fn on_message_complete(&mut self) -> std::result::Result<Flow, Rejected> {
            self.completed += 1;
            Ok(if self.pause { Flow::Pause } else { Flow::Continue })
        }

        fn on_upgraded_data(&mut self, data: &[u8]) -> CallbackResult {
            self.upgraded.extend_from_slice(data);
            Ok(())
        }
    }

    #[tokio::test]
    async fn reads_until_close_in_small_pieces() {
        let data: &[u8] = b"POST /a HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello world\
                            GET /b HTTP/1.1\r\n\r\n";
        let mut driver = StreamDriver::with_buffer_size(data, Parser::request(Collect::default()), 3);

        assert_eq!(driver.advance().await.unwrap(), DriverEvent::Closed);
        let collect = driver.parser().callbacks();
        assert_eq!(collect.urls, vec![b"/a".to_vec(), b"/b".to_vec()]);
        assert_eq!(collect.body, b"hello world");
        assert_eq!(collect.completed, 2);
        assert_eq!(driver.stream_offset(), data.len() as u64);
    }

    #[tokio::test]
    async fn parse_error_has_stream_offset() {
        let data: &[u8] = b"GET / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n";
        let mut bad = data.to_vec();
        bad.extend_from_slice(b"GET / HTTP/1.1\r\n\r\n");
        // chunked なのでボディの先頭の G でチャンクサイズエラー
        let mut driver = StreamDriver::with_buffer_size(&bad[..], Parser::request(Collect::default()), 4);

        match driver.advance().await {
            Err(Error::Parse { kind, offset }) => {
                assert_eq!(kind, ErrorKind::InvalidChunkSize);
                assert_eq!(offset, data.len() as u64);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn premature_close() {
        let data: &[u8] = b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
        let mut driver = StreamDriver::new(data, Parser::request(Collect::default()));
        match driver.advance().await {
            Err(Error::Parse { kind, offset }) => {
                assert_eq!(kind, ErrorKind::PrematureEof);
                assert_eq!(offset, data.len() as u64);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn upgrade_hands_over_remaining_bytes() {
        let head: &[u8] = b"CONNECT example.com:443 HTTP/1.1\r\n\r\n";
        let mut data = head.to_vec();
        data.extend_from_slice(b"\x16\x03\x01");

        let mut driver = StreamDriver::new(&data[..], Parser::request(Collect::default()));
        assert_eq!(driver.advance().await.unwrap(), DriverEvent::Upgraded);
        assert_eq!(driver.stream_offset(), head.len() as u64);
        assert_eq!(driver.remaining(), b"\x16\x03\x01");

        assert_eq!(driver.take_remaining(), b"\x16\x03\x01");
        let (_reader, parser) = driver.into_parts();
        assert!(parser.is_upgrade());
        assert!(parser.callbacks().upgraded.is_empty());
    }

    #[tokio::test]
    async fn upgrade_then_resume_delivers_upgraded_data() {
        let mut data = b"CONNECT example.com:443 HTTP/1.1\r\n\r\n".to_vec();
        data.extend_from_slice(b"tunnel bytes");

        let mut driver = StreamDriver::with_buffer_size(&data[..], Parser::request(Collect::default()), 5);
        assert_eq!(driver.advance().await.unwrap(), DriverEvent::Upgraded);
        driver.resume();
        assert_eq!(driver.advance().await.unwrap(), DriverEvent::Closed);
        assert_eq!(driver.parser().callbacks().upgraded, b"tunnel bytes");
    }

    #[tokio::test]
    async fn pause_at_each_message() {
        let data: &[u8] = b"GET /1 HTTP/1.1\r\n\r\nGET /2 HTTP/1.1\r\n\r\n";
        let collect = Collect {
            pause: true,
            ..Collect::default()
        };
        let mut driver = StreamDriver::new(data, Parser::request(collect));

        assert_eq!(driver.advance().await.unwrap(), DriverEvent::Paused);
        assert_eq!(driver.parser().callbacks().completed, 1);
        driver.resume();
        assert_eq!(driver.advance().await.unwrap(), DriverEvent::Paused);
        assert_eq!(driver.parser().callbacks().completed, 2);
        driver.resume();
        assert_eq!(driver.advance().await.unwrap(), DriverEvent::Closed);
    }

    #[tokio::test]
    async fn config_policy_rejects_ambiguous_framing() {
        let config = PipelineConfig::from_json(r#"{"read_buffer_size": 16}"#).unwrap();
        let data: &[u8] =
            b"POST / HTTP/1.1\r\nContent-Length: 1\r\nTransfer-Encoding: chunked\r\n\r\n";
        let parser = Parser::request(config.policy(Collect::default()));
        let mut driver = StreamDriver::with_config(data, parser, &config);

        match driver.advance().await {
            Err(Error::Parse { kind, offset }) => {
                assert_eq!(kind, ErrorKind::CallbackRejected);
                assert_eq!(offset, data.len() as u64);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(driver.parser().callbacks().violation().is_some());
    }

    #[tokio::test]
    async fn error_stays_terminal_after_close() {
        let data: &[u8] = b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
        let mut driver = StreamDriver::new(data, Parser::request(Collect::default()));

        for _ in 0..2 {
            match driver.advance().await {
                Err(Error::Parse { kind, offset }) => {
                    assert_eq!(kind, ErrorKind::PrematureEof);
                    assert_eq!(offset, data.len() as u64);
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn error_at_buffer_end_does_not_read_further() {
        let head: &[u8] =
            b"POST / HTTP/1.1\r\nContent-Length: 1\r\nTransfer-Encoding: chunked\r\n\r\n";
        let mut data = head.to_vec();
        data.extend_from_slice(b"GET / HTTP/1.1\r\n\r\n");
        let parser = Parser::request(PolicyCallbacks::new(Collect::default()));
        let mut driver = StreamDriver::with_buffer_size(&data[..], parser, head.len());

        for _ in 0..2 {
            match driver.advance().await {
                Err(Error::Parse { kind, offset }) => {
                    assert_eq!(kind, ErrorKind::CallbackRejected);
                    assert_eq!(offset, head.len() as u64);
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
        // 2 回目の advance() はストリームから読み取らない
        let (reader, _parser) = driver.into_parts();
        assert_eq!(reader, b"GET / HTTP/1.1\r\n\r\n");
    }

    #[tokio::test]
    async fn json_config_builds_policy_driver() {
        let data: &[u8] = b"GET /too-long HTTP/1.1\r\n\r\n";
        let mut driver = StreamDriver::from_json_config(
            data,
            MessageKind::Request,
            Collect::default(),
            r#"{"limits": {"max_url_size": 4}}"#,
        )
        .unwrap();

        assert!(matches!(
            driver.advance().await,
            Err(Error::Parse {
                kind: ErrorKind::CallbackRejected,
                ..
            })
        ));
        assert_eq!(
            driver.parser().callbacks().violation(),
            Some(PolicyViolation::UrlTooLong)
        );
    }

    #[tokio::test]
    async fn json_config_error_is_config_error() {
        let data: &[u8] = b"";
        let result = StreamDriver::from_json_config(
            data,
            MessageKind::Request,
            Collect::default(),
            r#"{"read_buffer_size": 0}"#,
        );
        match result {
            Err(Error::Config(ConfigError::InvalidField { key })) => {
                assert_eq!(key, "read_buffer_size");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
