//! `execute()` の状態遷移
//!
//! スパン (URL、ステータスフレーズ、ヘッダー名、ヘッダー値) はスパンの終端か
//! スライスの終端で通知する。スライスをまたぐスパンは同じコールバックが
//! 連続して呼ばれる形になる。

use crate::callbacks::{Flow, ParserCallbacks};
use crate::error::ErrorKind;
use crate::message::MessageInfo;
use crate::method::{MAX_METHOD_LEN, Method};
use crate::status::{ExecuteOutcome, ParserStatus};

use super::chars::{
    CR, LF, SP, hex_value, is_field_vchar, is_method_char, is_ows, is_token_char, is_url_char,
};
use super::state::{Framing, State};
use super::{MessageKind, Parser};

const HTTP_PREFIX: &[u8; 5] = b"HTTP/";

/// パースの中断
#[derive(Debug)]
pub(super) enum Stop {
    /// 一時停止 (消費したバイト数)
    Paused(usize),
    /// エラー (問題のある位置)
    Failed(ErrorKind, usize),
}

fn malformed(p: usize) -> Stop {
    Stop::Failed(ErrorKind::MalformedStartLine, p)
}

fn invalid_header(p: usize) -> Stop {
    Stop::Failed(ErrorKind::InvalidHeaderSyntax, p)
}

fn invalid_chunk(p: usize) -> Stop {
    Stop::Failed(ErrorKind::InvalidChunkSize, p)
}

fn rejected(p: usize) -> Stop {
    Stop::Failed(ErrorKind::CallbackRejected, p)
}

/// 残りバイト数とスライスの残りの小さい方
fn available(remaining: u64, rest: usize) -> usize {
    usize::try_from(remaining).map_or(rest, |r| r.min(rest))
}

impl<C: ParserCallbacks> Parser<C> {
    pub(super) fn stopped(&mut self, stop: Stop) -> ExecuteOutcome {
        match stop {
            Stop::Paused(consumed) => {
                self.paused = true;
                ExecuteOutcome::new(consumed, ParserStatus::Paused)
            }
            Stop::Failed(kind, offset) => {
                self.error = Some(kind);
                ExecuteOutcome::new(offset, ParserStatus::Error(kind))
            }
        }
    }

    /// ストリームの終了
    pub(super) fn finish(&mut self) -> ExecuteOutcome {
        match self.state {
            State::Start | State::Upgraded => ExecuteOutcome::new(0, ParserStatus::Success),
            State::BodyUntilClose => match self.complete_message(0) {
                Ok(()) => ExecuteOutcome::new(0, ParserStatus::Success),
                Err(stop) => self.stopped(stop),
            },
            _ => self.stopped(Stop::Failed(ErrorKind::PrematureEof, 0)),
        }
    }

    pub(super) fn run(&mut self, data: &[u8]) -> Result<(), Stop> {
        // 前回の呼び出しから続くスパンはスライスの先頭から始まる
        let mut mark = self.state.is_span().then_some(0);
        let mut p = 0;

        while p < data.len() {
            let b = data[p];
            match self.state {
                State::Start => {
                    if b == CR || b == LF {
                        p += 1;
                    } else {
                        // 同じバイトをスタートラインとして読み直す
                        self.begin_message(p)?;
                    }
                    continue;
                }

                State::Method => self.method_byte(b, p)?,
                State::UrlStart => {
                    if !is_url_char(b) {
                        return Err(malformed(p));
                    }
                    mark = Some(p);
                    self.state = State::Url;
                }
                State::Url => {
                    if b == SP {
                        self.emit_span(data, &mut mark, p)?;
                        self.state = State::RequestVersion(0);
                    } else if !is_url_char(b) {
                        return Err(malformed(p));
                    }
                }
                State::RequestVersion(i) => {
                    if b != HTTP_PREFIX[usize::from(i)] {
                        return Err(malformed(p));
                    }
                    self.state = if usize::from(i) + 1 == HTTP_PREFIX.len() {
                        State::RequestMajor
                    } else {
                        State::RequestVersion(i + 1)
                    };
                }
                State::RequestMajor => {
                    self.major_byte(b, p)?;
                    self.state = State::RequestDot;
                }
                State::RequestDot => {
                    if b != b'.' {
                        return Err(malformed(p));
                    }
                    self.state = State::RequestMinor;
                }
                State::RequestMinor => {
                    self.minor_byte(b, p)?;
                    self.state = State::RequestLineCr;
                }
                State::RequestLineCr => {
                    if b != CR {
                        return Err(malformed(p));
                    }
                    self.state = State::RequestLineLf;
                }
                State::RequestLineLf | State::ResponseLineLf => {
                    if b != LF {
                        return Err(malformed(p));
                    }
                    self.state = State::HeaderFieldStart;
                }

                State::ResponseVersion(i) => {
                    if b != HTTP_PREFIX[usize::from(i)] {
                        return Err(malformed(p));
                    }
                    self.state = if usize::from(i) + 1 == HTTP_PREFIX.len() {
                        State::ResponseMajor
                    } else {
                        State::ResponseVersion(i + 1)
                    };
                }
                State::ResponseMajor => {
                    self.major_byte(b, p)?;
                    self.state = State::ResponseDot;
                }
                State::ResponseDot => {
                    if b != b'.' {
                        return Err(malformed(p));
                    }
                    self.state = State::ResponseMinor;
                }
                State::ResponseMinor => {
                    self.minor_byte(b, p)?;
                    self.state = State::ResponseSpace;
                }
                State::ResponseSpace => {
                    if b != SP {
                        return Err(malformed(p));
                    }
                    self.state = State::Status(0);
                }
                State::Status(n) => {
                    if !b.is_ascii_digit() {
                        return Err(malformed(p));
                    }
                    self.message.status_code = self.message.status_code * 10 + u16::from(b - b'0');
                    if n < 2 {
                        self.state = State::Status(n + 1);
                    } else if (100..=599).contains(&self.message.status_code) {
                        self.state = State::AfterStatus;
                    } else {
                        return Err(malformed(p));
                    }
                }
                State::AfterStatus => {
                    if b == SP {
                        mark = Some(p + 1);
                        self.state = State::Reason;
                    } else if b == CR {
                        self.state = State::ResponseLineLf;
                    } else {
                        return Err(malformed(p));
                    }
                }
                State::Reason => {
                    if b == CR {
                        self.emit_span(data, &mut mark, p)?;
                        self.state = State::ResponseLineLf;
                    } else if !is_field_vchar(b) {
                        return Err(malformed(p));
                    }
                }

                State::HeaderFieldStart => {
                    if b == CR {
                        self.state = State::HeadersLf;
                    } else if is_token_char(b) {
                        self.scanner.push_name(b);
                        mark = Some(p);
                        self.state = State::HeaderField;
                    } else {
                        // obs-fold や空のフィールド名
                        return Err(invalid_header(p));
                    }
                }
                State::HeaderField => {
                    if b == b':' {
                        self.emit_span(data, &mut mark, p)?;
                        let trailing = self.message.flags.trailing;
                        self.scanner.begin_value(trailing, &mut self.message);
                        self.state = State::HeaderValueStart;
                    } else if is_token_char(b) {
                        self.scanner.push_name(b);
                    } else {
                        return Err(invalid_header(p));
                    }
                }
                State::HeaderValueStart => {
                    if is_ows(b) {
                        // 先頭の OWS は値に含めない
                    } else if b == CR {
                        self.callbacks
                            .on_header_value(&[])
                            .map_err(|_| rejected(p))?;
                        self.end_value(p)?;
                        self.state = State::HeaderValueLf;
                    } else if is_field_vchar(b) {
                        self.feed_value(b, p)?;
                        mark = Some(p);
                        self.state = State::HeaderValue;
                    } else {
                        return Err(invalid_header(p));
                    }
                }
                State::HeaderValue => {
                    if b == CR {
                        self.emit_span(data, &mut mark, p)?;
                        self.end_value(p)?;
                        self.state = State::HeaderValueLf;
                    } else if is_field_vchar(b) {
                        self.feed_value(b, p)?;
                    } else {
                        return Err(invalid_header(p));
                    }
                }
                State::HeaderValueLf => {
                    if b != LF {
                        return Err(invalid_header(p));
                    }
                    self.state = State::HeaderFieldStart;
                }
                State::HeadersLf => {
                    if b != LF {
                        return Err(invalid_header(p));
                    }
                    self.headers_done(p)?;
                }

                State::BodyIdentity | State::ChunkData => {
                    let n = available(self.remaining, data.len() - p);
                    self.callbacks
                        .on_body(&data[p..p + n])
                        .map_err(|_| rejected(p))?;
                    self.remaining -= n as u64;
                    p += n;
                    if self.remaining == 0 {
                        if self.state == State::BodyIdentity {
                            self.complete_message(p)?;
                        } else {
                            self.state = State::ChunkDataCr;
                        }
                    }
                    continue;
                }
                State::BodyUntilClose => {
                    self.callbacks
                        .on_body(&data[p..])
                        .map_err(|_| rejected(p))?;
                    p = data.len();
                    continue;
                }
                State::Upgraded => {
                    self.callbacks
                        .on_upgraded_data(&data[p..])
                        .map_err(|_| rejected(p))?;
                    p = data.len();
                    continue;
                }

                State::ChunkSizeStart => {
                    let v = hex_value(b).ok_or_else(|| invalid_chunk(p))?;
                    self.chunk_size = u64::from(v);
                    self.state = State::ChunkSize;
                }
                State::ChunkSize => {
                    if let Some(v) = hex_value(b) {
                        self.chunk_size = self
                            .chunk_size
                            .checked_mul(16)
                            .and_then(|n| n.checked_add(u64::from(v)))
                            .ok_or_else(|| invalid_chunk(p))?;
                    } else if b == b';' {
                        self.state = State::ChunkExtension;
                    } else if is_ows(b) {
                        self.state = State::ChunkSizeWs;
                    } else if b == CR {
                        self.state = State::ChunkSizeLf;
                    } else {
                        return Err(invalid_chunk(p));
                    }
                }
                State::ChunkSizeWs => {
                    if b == b';' {
                        self.state = State::ChunkExtension;
                    } else if b == CR {
                        self.state = State::ChunkSizeLf;
                    } else if !is_ows(b) {
                        return Err(invalid_chunk(p));
                    }
                }
                State::ChunkExtension => {
                    // チャンク拡張は読み飛ばす
                    if b == CR {
                        self.state = State::ChunkSizeLf;
                    } else if !is_field_vchar(b) {
                        return Err(invalid_chunk(p));
                    }
                }
                State::ChunkSizeLf => {
                    if b != LF {
                        return Err(invalid_chunk(p));
                    }
                    self.chunk_header_done(p)?;
                }
                State::ChunkDataCr => {
                    if b != CR {
                        return Err(invalid_chunk(p));
                    }
                    self.state = State::ChunkDataLf;
                }
                State::ChunkDataLf => {
                    if b != LF {
                        return Err(invalid_chunk(p));
                    }
                    self.state = State::ChunkSizeStart;
                }
            }
            p += 1;
        }

        // スライスの終端で途中までのスパンを通知する
        self.emit_span(data, &mut mark, data.len())
    }

    /// 現在の状態に対応するスパンを通知
    ///
    /// 空のスパンは通知しない。拒否された場合はスパンの開始位置をエラー位置とする。
    fn emit_span(
        &mut self,
        data: &[u8],
        mark: &mut Option<usize>,
        end: usize,
    ) -> Result<(), Stop> {
        let Some(start) = mark.take() else {
            return Ok(());
        };
        let span = &data[start..end];
        if span.is_empty() {
            return Ok(());
        }
        let result = match self.state {
            State::Url => self.callbacks.on_url(span),
            State::Reason => self.callbacks.on_status(span),
            State::HeaderField => self.callbacks.on_header_field(span),
            State::HeaderValue => self.callbacks.on_header_value(span),
            _ => Ok(()),
        };
        result.map_err(|_| rejected(start))
    }

    fn begin_message(&mut self, p: usize) -> Result<(), Stop> {
        self.message = MessageInfo::default();
        self.framing = None;
        self.scanner.reset(self.kind == MessageKind::Request);
        self.method_len = 0;
        self.remaining = 0;
        self.chunk_size = 0;
        self.state = match self.kind {
            MessageKind::Request => State::Method,
            MessageKind::Response => State::ResponseVersion(0),
        };
        self.callbacks.on_message_begin().map_err(|_| rejected(p))
    }

    fn method_byte(&mut self, b: u8, p: usize) -> Result<(), Stop> {
        if b == SP {
            let method = Method::from_bytes(&self.method_buf[..self.method_len])
                .ok_or_else(|| malformed(p))?;
            if method.is_unsupported() {
                return Err(Stop::Failed(ErrorKind::UnsupportedMethod, p));
            }
            self.message.method = Some(method);
            self.state = State::UrlStart;
            return Ok(());
        }
        if !is_method_char(b) || self.method_len == MAX_METHOD_LEN {
            return Err(malformed(p));
        }
        self.method_buf[self.method_len] = b;
        self.method_len += 1;
        if !Method::is_prefix(&self.method_buf[..self.method_len]) {
            return Err(malformed(p));
        }
        Ok(())
    }

    fn major_byte(&mut self, b: u8, p: usize) -> Result<(), Stop> {
        // HTTP/1.x 以外は扱わない
        if b != b'1' {
            return Err(malformed(p));
        }
        self.message.http_major = 1;
        Ok(())
    }

    fn minor_byte(&mut self, b: u8, p: usize) -> Result<(), Stop> {
        if !b.is_ascii_digit() {
            return Err(malformed(p));
        }
        self.message.http_minor = b - b'0';
        Ok(())
    }

    fn feed_value(&mut self, b: u8, p: usize) -> Result<(), Stop> {
        self.scanner
            .feed(b, &mut self.message)
            .map_err(|kind| Stop::Failed(kind, p))
    }

    fn end_value(&mut self, p: usize) -> Result<(), Stop> {
        self.scanner
            .end_value(&mut self.message)
            .map_err(|kind| Stop::Failed(kind, p))
    }

    /// ヘッダー (またはトレーラー) 終端の空行の LF
    fn headers_done(&mut self, p: usize) -> Result<(), Stop> {
        if self.message.flags.trailing {
            return self.complete_message(p + 1);
        }

        let framing = self
            .decide_framing()
            .map_err(|kind| Stop::Failed(kind, p))?;
        self.framing = Some(framing);
        self.callbacks
            .on_headers_complete(&mut self.message)
            .map_err(|_| rejected(p + 1))?;

        match framing {
            Framing::NoBody => {
                self.last_status = ParserStatus::NoBody;
                self.complete_message(p + 1)
            }
            Framing::Length(0) => {
                self.last_status = ParserStatus::NoBodyData;
                self.complete_message(p + 1)
            }
            Framing::Length(n) => {
                self.last_status = ParserStatus::Success;
                self.remaining = n;
                self.state = State::BodyIdentity;
                Ok(())
            }
            Framing::Chunked => {
                self.last_status = ParserStatus::Success;
                self.state = State::ChunkSizeStart;
                Ok(())
            }
            Framing::UntilClose => {
                self.last_status = ParserStatus::Success;
                self.state = State::BodyUntilClose;
                Ok(())
            }
        }
    }

    /// ボディのフレーミングを決定 (RFC 9112 Section 6.3)
    ///
    /// Transfer-Encoding と Content-Length が両方ある場合もここでは拒否せず、
    /// chunked を優先した上で両方の事実をフラグに残す。
    fn decide_framing(&mut self) -> Result<Framing, ErrorKind> {
        let chunked = self.message.flags.has_transfer_encoding && self.scanner.te_chunked_last();
        self.message.flags.chunked = chunked;
        let flags = self.message.flags;

        match self.kind {
            MessageKind::Request => {
                let connect = self.message.method == Some(Method::Connect);
                if connect || (flags.has_upgrade && flags.connection_upgrade) {
                    self.message.upgrade = true;
                }
                if connect {
                    Ok(Framing::NoBody)
                } else if flags.has_transfer_encoding {
                    // 最後のコーディングが chunked でないリクエストはボディ長を決定できない
                    if chunked {
                        Ok(Framing::Chunked)
                    } else {
                        Err(ErrorKind::InvalidHeaderSyntax)
                    }
                } else if flags.content_length {
                    Ok(Framing::Length(self.message.content_length))
                } else {
                    Ok(Framing::NoBody)
                }
            }
            MessageKind::Response => {
                let status = self.message.status_code;
                if status == 101 && flags.has_upgrade && flags.connection_upgrade {
                    self.message.upgrade = true;
                    return Ok(Framing::NoBody);
                }
                if self.expect_tunnel && (200..300).contains(&status) {
                    self.message.upgrade = true;
                    return Ok(Framing::NoBody);
                }
                if self.expect_no_body {
                    self.message.flags.skip_body = true;
                    return Ok(Framing::NoBody);
                }
                if (100..200).contains(&status) || status == 204 || status == 304 {
                    Ok(Framing::NoBody)
                } else if chunked {
                    Ok(Framing::Chunked)
                } else if flags.has_transfer_encoding {
                    Ok(Framing::UntilClose)
                } else if flags.content_length {
                    Ok(Framing::Length(self.message.content_length))
                } else {
                    Ok(Framing::UntilClose)
                }
            }
        }
    }

    /// チャンクサイズ行の LF
    fn chunk_header_done(&mut self, p: usize) -> Result<(), Stop> {
        self.message.content_length = self.chunk_size;
        let is_final = self.chunk_size == 0;
        self.callbacks
            .on_chunk_header(is_final)
            .map_err(|_| rejected(p + 1))?;
        if is_final {
            self.message.flags.trailing = true;
            self.state = State::HeaderFieldStart;
        } else {
            self.remaining = self.chunk_size;
            self.state = State::ChunkData;
        }
        Ok(())
    }

    /// メッセージの完了
    ///
    /// `next` は完了したメッセージの直後の位置。
    fn complete_message(&mut self, next: usize) -> Result<(), Stop> {
        let flow = self
            .callbacks
            .on_message_complete()
            .map_err(|_| rejected(next))?;
        if self.message.upgrade {
            // 以降のバイトは HTTP ではない
            self.state = State::Upgraded;
            return Err(Stop::Paused(next));
        }
        self.state = State::Start;
        match flow {
            Flow::Continue => Ok(()),
            Flow::Pause => Err(Stop::Paused(next)),
        }
    }
}
