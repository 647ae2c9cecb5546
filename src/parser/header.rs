//! フレーミングに関係するヘッダーの逐次解析
//!
//! ヘッダーは複数の `execute()` にまたがって届くため、名前と値を
//! 1 バイトずつ受け取り、必要な事実だけを固定長の状態に畳み込む。

use crate::error::ErrorKind;
use crate::message::MessageInfo;

use super::chars::is_ows;

/// フレーミングに関係するヘッダーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeaderKind {
    General,
    ContentLength,
    TransferEncoding,
    Connection,
    Upgrade,
}

/// 小文字化した短いトークン
///
/// 比較対象より長いトークンは `overflow` として扱い、どれとも一致しない。
#[derive(Debug, Clone, Copy, Default)]
struct Token {
    buf: [u8; 24],
    len: usize,
    overflow: bool,
    closed: bool,
}

impl Token {
    fn clear(&mut self) {
        self.len = 0;
        self.overflow = false;
        self.closed = false;
    }

    fn is_empty(&self) -> bool {
        self.len == 0 && !self.overflow
    }

    fn push(&mut self, b: u8) {
        if self.closed {
            // "chunked x" のようにトークン内に空白を含む
            self.overflow = true;
            return;
        }
        if self.len < self.buf.len() {
            self.buf[self.len] = b.to_ascii_lowercase();
            self.len += 1;
        } else {
            self.overflow = true;
        }
    }

    fn is(&self, s: &str) -> bool {
        !self.overflow && &self.buf[..self.len] == s.as_bytes()
    }
}

/// ヘッダー名と値のスキャナー
#[derive(Debug, Clone, Default)]
pub(crate) struct HeaderScanner {
    name: Token,
    kind: Option<HeaderKind>,
    value: Token,
    number: u64,
    digits: bool,
    number_closed: bool,
    /// リクエストで chunked の後に別のコーディングが来たら拒否する
    strict_coding_order: bool,
    te_chunked_last: bool,
}

impl HeaderScanner {
    /// メッセージ単位のリセット
    pub(crate) fn reset(&mut self, strict_coding_order: bool) {
        *self = Self {
            strict_coding_order,
            ..Self::default()
        };
    }

    /// 最後のコーディングが chunked かどうか
    pub(crate) fn te_chunked_last(&self) -> bool {
        self.te_chunked_last
    }

    /// フィールド名の 1 バイトを追加
    pub(crate) fn push_name(&mut self, b: u8) {
        self.name.push(b);
    }

    /// フィールド名が完了し、値の読み取りを開始
    ///
    /// トレーラーはフレーミングに影響しないため常に General として扱う。
    pub(crate) fn begin_value(&mut self, trailing: bool, message: &mut MessageInfo) {
        let kind = if trailing {
            HeaderKind::General
        } else if self.name.is("content-length") {
            HeaderKind::ContentLength
        } else if self.name.is("transfer-encoding") {
            message.flags.has_transfer_encoding = true;
            HeaderKind::TransferEncoding
        } else if self.name.is("connection") || self.name.is("proxy-connection") {
            HeaderKind::Connection
        } else if self.name.is("upgrade") {
            message.flags.has_upgrade = true;
            HeaderKind::Upgrade
        } else {
            HeaderKind::General
        };
        self.name.clear();
        self.kind = Some(kind);
        self.value.clear();
        self.number = 0;
        self.digits = false;
        self.number_closed = false;
    }

    /// 値の 1 バイトを追加
    ///
    /// 呼び出し側で field-vchar であることを検証済みであること。
    pub(crate) fn feed(&mut self, b: u8, message: &mut MessageInfo) -> Result<(), ErrorKind> {
        match self.kind {
            Some(HeaderKind::ContentLength) => self.feed_content_length(b),
            Some(HeaderKind::TransferEncoding) => self.feed_coding(b),
            Some(HeaderKind::Connection) => {
                self.feed_list(b, message);
                Ok(())
            }
            Some(HeaderKind::General) | Some(HeaderKind::Upgrade) | None => Ok(()),
        }
    }

    /// 値が完了
    pub(crate) fn end_value(&mut self, message: &mut MessageInfo) -> Result<(), ErrorKind> {
        let kind = self.kind.take();
        match kind {
            Some(HeaderKind::ContentLength) => {
                if !self.digits {
                    return Err(ErrorKind::InvalidHeaderSyntax);
                }
                // 同じ値の重複は呼び出し側の判断に任せる
                if message.flags.content_length && message.content_length != self.number {
                    return Err(ErrorKind::InvalidHeaderSyntax);
                }
                message.content_length = self.number;
                message.flags.content_length = true;
                Ok(())
            }
            Some(HeaderKind::TransferEncoding) => {
                self.finish_coding();
                Ok(())
            }
            Some(HeaderKind::Connection) => {
                self.finish_connection_token(message);
                Ok(())
            }
            Some(HeaderKind::General) | Some(HeaderKind::Upgrade) | None => Ok(()),
        }
    }

    fn feed_content_length(&mut self, b: u8) -> Result<(), ErrorKind> {
        if b.is_ascii_digit() {
            if self.number_closed {
                return Err(ErrorKind::InvalidHeaderSyntax);
            }
            self.number = self
                .number
                .checked_mul(10)
                .and_then(|n| n.checked_add(u64::from(b - b'0')))
                .ok_or(ErrorKind::InvalidHeaderSyntax)?;
            self.digits = true;
            Ok(())
        } else if is_ows(b) && self.digits {
            self.number_closed = true;
            Ok(())
        } else {
            Err(ErrorKind::InvalidHeaderSyntax)
        }
    }

    fn feed_coding(&mut self, b: u8) -> Result<(), ErrorKind> {
        if b == b',' {
            self.finish_coding();
        } else if is_ows(b) {
            if !self.value.is_empty() {
                self.value.closed = true;
            }
        } else {
            if self.value.is_empty() && self.strict_coding_order && self.te_chunked_last {
                // RFC 9112 Section 6.1: chunked は最後のコーディングでなければならない
                return Err(ErrorKind::InvalidHeaderSyntax);
            }
            self.value.push(b);
        }
        Ok(())
    }

    fn finish_coding(&mut self) {
        if self.value.is_empty() {
            return;
        }
        self.te_chunked_last = self.value.is("chunked");
        self.value.clear();
    }

    fn feed_list(&mut self, b: u8, message: &mut MessageInfo) {
        if b == b',' {
            self.finish_connection_token(message);
        } else if is_ows(b) {
            if !self.value.is_empty() {
                self.value.closed = true;
            }
        } else {
            self.value.push(b);
        }
    }

    fn finish_connection_token(&mut self, message: &mut MessageInfo) {
        if self.value.is("close") {
            message.flags.connection_close = true;
        } else if self.value.is("keep-alive") {
            message.flags.connection_keep_alive = true;
        } else if self.value.is("upgrade") {
            message.flags.connection_upgrade = true;
        }
        self.value.clear();
    }
}
