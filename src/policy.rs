//! フレーミングポリシー
//!
//! ステートマシンは Content-Length と Transfer-Encoding の併用を拒否せず、
//! 事実 (`has_transfer_encoding` と `seen_content_length`) だけを公開する。
//! [`PolicyCallbacks`] はその事実と [`ParserLimits`] に基づいて
//! コールバックを拒否する呼び出し側の層。

use std::fmt;

use crate::callbacks::{CallbackResult, Flow, ParserCallbacks};
use crate::error::Rejected;
use crate::limits::ParserLimits;
use crate::message::MessageInfo;

const CONTENT_LENGTH: &[u8] = b"content-length";

/// ポリシー違反の理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyViolation {
    /// Transfer-Encoding と Content-Length が両方ある (リクエストスマグリング対策)
    AmbiguousFraming,
    /// ヘッダーの合計サイズが上限を超えた
    HeadersTooLarge,
    /// ヘッダー数が上限を超えた
    TooManyHeaders,
    /// リクエストターゲットが上限を超えた
    UrlTooLong,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::AmbiguousFraming => {
                write!(f, "both transfer-encoding and content-length present")
            }
            PolicyViolation::HeadersTooLarge => write!(f, "headers too large"),
            PolicyViolation::TooManyHeaders => write!(f, "too many headers"),
            PolicyViolation::UrlTooLong => write!(f, "request target too long"),
        }
    }
}

impl std::error::Error for PolicyViolation {}

/// ポリシーを適用するコールバック
///
/// 違反を検出するとコールバックを拒否し、理由を [`PolicyCallbacks::violation`] に記録する。
/// 内側のコールバックは違反がない場合にのみ呼ばれる。
#[derive(Debug)]
pub struct PolicyCallbacks<C> {
    inner: C,
    limits: ParserLimits,
    allow_chunked_length: bool,
    violation: Option<PolicyViolation>,
    url_size: usize,
    headers_size: usize,
    headers_count: usize,
    /// 直前のコールバックが on_header_field だったかどうか
    in_field: bool,
    /// フィールド名が "content-length" の先頭何バイトと一致しているか
    name_matched: Option<usize>,
    seen_content_length: bool,
}

impl<C: ParserCallbacks> PolicyCallbacks<C> {
    /// デフォルトの制限で作成
    pub fn new(inner: C) -> Self {
        Self::with_limits(inner, ParserLimits::default())
    }

    /// 制限を指定して作成
    pub fn with_limits(inner: C, limits: ParserLimits) -> Self {
        Self {
            inner,
            limits,
            allow_chunked_length: false,
            violation: None,
            url_size: 0,
            headers_size: 0,
            headers_count: 0,
            in_field: false,
            name_matched: None,
            seen_content_length: false,
        }
    }

    /// Transfer-Encoding と Content-Length の併用を許可するかどうかを設定
    ///
    /// 許可した場合は chunked が優先される。
    pub fn with_allow_chunked_length(mut self, allow: bool) -> Self {
        self.allow_chunked_length = allow;
        self
    }

    /// 検出したポリシー違反
    pub fn violation(&self) -> Option<PolicyViolation> {
        self.violation
    }

    pub fn limits(&self) -> &ParserLimits {
        &self.limits
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn reject(&mut self, violation: PolicyViolation) -> CallbackResult {
        self.violation = Some(violation);
        Err(Rejected)
    }

    fn add_header_bytes(&mut self, len: usize) -> CallbackResult {
        self.headers_size = self.headers_size.saturating_add(len);
        if self.headers_size > self.limits.max_headers_size {
            return self.reject(PolicyViolation::HeadersTooLarge);
        }
        Ok(())
    }

    fn match_name(&mut self, data: &[u8]) {
        self.name_matched = self.name_matched.and_then(|n| {
            let end = n + data.len();
            (end <= CONTENT_LENGTH.len() && CONTENT_LENGTH[n..end].eq_ignore_ascii_case(data))
                .then_some(end)
        });
    }
}

impl<C: ParserCallbacks> ParserCallbacks for PolicyCallbacks<C> {
    fn on_message_begin(&mut self) -> CallbackResult {
        self.url_size = 0;
        self.headers_size = 0;
        self.headers_count = 0;
        self.in_field = false;
        self.name_matched = None;
        self.seen_content_length = false;
        self.inner.on_message_begin()
    }

    fn on_url(&mut self, data: &[u8]) -> CallbackResult {
        self.url_size = self.url_size.saturating_add(data.len());
        if self.url_size > self.limits.max_url_size {
            return self.reject(PolicyViolation::UrlTooLong);
        }
        self.inner.on_url(data)
    }

    fn on_status(&mut self, data: &[u8]) -> CallbackResult {
        self.inner.on_status(data)
    }

    fn on_header_field(&mut self, data: &[u8]) -> CallbackResult {
        if !self.in_field {
            self.in_field = true;
            self.name_matched = Some(0);
            self.headers_count += 1;
            if self.headers_count > self.limits.max_headers_count {
                return self.reject(PolicyViolation::TooManyHeaders);
            }
        }
        self.add_header_bytes(data.len())?;
        self.match_name(data);
        self.inner.on_header_field(data)
    }

    fn on_header_value(&mut self, data: &[u8]) -> CallbackResult {
        if self.in_field {
            self.in_field = false;
            if self.name_matched == Some(CONTENT_LENGTH.len()) {
                self.seen_content_length = true;
            }
        }
        self.add_header_bytes(data.len())?;
        self.inner.on_header_value(data)
    }

    fn on_headers_complete(&mut self, message: &mut MessageInfo) -> CallbackResult {
        message.set_seen_content_length(self.seen_content_length);
        if message.flags().has_transfer_encoding
            && message.seen_content_length()
            && !self.allow_chunked_length
        {
            return self.reject(PolicyViolation::AmbiguousFraming);
        }
        self.inner.on_headers_complete(message)
    }

    fn on_body(&mut self, data: &[u8]) -> CallbackResult {
        self.inner.on_body(data)
    }

    fn on_chunk_header(&mut self, is_final: bool) -> CallbackResult {
        self.inner.on_chunk_header(is_final)
    }

    fn on_message_complete(&mut self) -> Result<Flow, Rejected> {
        self.inner.on_message_complete()
    }

    fn on_upgraded_data(&mut self, data: &[u8]) -> CallbackResult {
        self.inner.on_upgraded_data(data)
    }
}
