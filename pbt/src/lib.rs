//! PBT テスト共通ユーティリティ

use proptest::prelude::*;
use shiguredo_http1_parser::{
    CallbackResult, Flow, MessageInfo, Parser, ParserCallbacks, ParserStatus, Rejected,
};

// ========================================
// イベント記録
// ========================================

/// パーサーが呼び出したコールバック
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    MessageBegin,
    Url(Vec<u8>),
    Status(Vec<u8>),
    HeaderField(Vec<u8>),
    HeaderValue(Vec<u8>),
    HeadersComplete { trailing: bool },
    Body(Vec<u8>),
    ChunkHeader(bool),
    MessageComplete,
    UpgradedData(Vec<u8>),
}

/// すべてのコールバックを記録する
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Recorder {
    /// 同じ種類のデータイベントが連続している場合に結合したイベント列
    pub fn coalesced(&self) -> Vec<Event> {
        let mut out: Vec<Event> = Vec::new();
        for event in &self.events {
            let merged = match (out.last_mut(), event) {
                (Some(Event::Url(a)), Event::Url(b))
                | (Some(Event::Status(a)), Event::Status(b))
                | (Some(Event::HeaderField(a)), Event::HeaderField(b))
                | (Some(Event::HeaderValue(a)), Event::HeaderValue(b))
                | (Some(Event::Body(a)), Event::Body(b))
                | (Some(Event::UpgradedData(a)), Event::UpgradedData(b)) => {
                    a.extend_from_slice(b);
                    true
                }
                _ => false,
            };
            if !merged {
                out.push(event.clone());
            }
        }
        out
    }

    /// ボディの合計
    pub fn body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for event in &self.events {
            if let Event::Body(data) = event {
                body.extend_from_slice(data);
            }
        }
        body
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

impl ParserCallbacks for Recorder {
    fn on_message_begin(&mut self) -> CallbackResult {
        self.events.push(Event::MessageBegin);
        Ok(())
    }

    fn on_url(&mut self, data: &[u8]) -> CallbackResult {
        self.events.push(Event::Url(data.to_vec()));
        Ok(())
    }

    fn on_status(&mut self, data: &[u8]) -> CallbackResult {
        self.events.push(Event::Status(data.to_vec()));
        Ok(())
    }

    fn on_header_field(&mut self, data: &[u8]) -> CallbackResult {
        self.events.push(Event::HeaderField(data.to_vec()));
        Ok(())
    }

    fn on_header_value(&mut self, data: &[u8]) -> CallbackResult {
        self.events.push(Event::HeaderValue(data.to_vec()));
        Ok(())
    }

    fn on_headers_complete(&mut self, message: &mut MessageInfo) -> CallbackResult {
        self.events.push(Event::HeadersComplete {
            trailing: message.flags().trailing,
        });
        Ok(())
    }

    fn on_body(&mut self, data: &[u8]) -> CallbackResult {
        self.events.push(Event::Body(data.to_vec()));
        Ok(())
    }

    fn on_chunk_header(&mut self, is_final: bool) -> CallbackResult {
        self.events.push(Event::ChunkHeader(is_final));
        Ok(())
    }

    fn on_message_complete(&mut self) -> Result<Flow, Rejected> {
        self.events.push(Event::MessageComplete);
        Ok(Flow::Continue)
    }

    fn on_upgraded_data(&mut self, data: &[u8]) -> CallbackResult {
        self.events.push(Event::UpgradedData(data.to_vec()));
        Ok(())
    }
}

/// 分割位置で区切って順に渡す
///
/// 戻り値は合計消費バイト数と最後の状態。エラーまたは一時停止で止める。
pub fn feed_split<C: ParserCallbacks>(
    parser: &mut Parser<C>,
    data: &[u8],
    splits: &[usize],
) -> (usize, ParserStatus) {
    let mut points: Vec<usize> = splits.iter().map(|&s| s.min(data.len())).collect();
    points.sort_unstable();
    points.push(data.len());

    let mut consumed = 0;
    let mut status = ParserStatus::Success;
    let mut start = 0;
    for end in points {
        if end == start {
            continue;
        }
        let outcome = parser.execute(&data[start..end]);
        consumed += outcome.consumed;
        status = outcome.status;
        if outcome.consumed != end - start {
            break;
        }
        start = end;
    }
    (consumed, status)
}

// ========================================
// Strategy 定義
// ========================================

/// 分割位置
pub fn split_points() -> impl Strategy<Value = Vec<prop::sample::Index>> {
    proptest::collection::vec(any::<prop::sample::Index>(), 0..8)
}

/// Index を長さ `len` のデータ上の位置に変換
pub fn resolve_splits(indexes: &[prop::sample::Index], len: usize) -> Vec<usize> {
    indexes.iter().map(|i| i.index(len + 1)).collect()
}

fn token_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('-'),
        Just('_'),
        Just('.'),
        Just('!'),
        Just('~'),
    ]
}

/// フレーミングに関係しないヘッダー名
pub fn header_name() -> impl Strategy<Value = String> {
    proptest::collection::vec(token_char(), 1..=24)
        .prop_map(|chars| format!("X-{}", chars.into_iter().collect::<String>()))
}

/// ヘッダー値 (先頭は OWS 以外、空も含む)
pub fn header_value() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[!-~][ -~]{0,40}".prop_map(|s| s),]
}

pub fn headers() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((header_name(), header_value()), 0..8)
}

pub fn request_method() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("GET"),
        Just("POST"),
        Just("PUT"),
        Just("DELETE"),
        Just("PATCH"),
        Just("OPTIONS"),
        Just("M-SEARCH"),
        Just("PROPFIND"),
        Just("UNSUBSCRIBE"),
    ]
}

pub fn request_target() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/".to_string()),
        Just("*".to_string()),
        "/[a-zA-Z0-9/_.?=&%-]{1,64}".prop_map(|s| s),
    ]
}

pub fn status_code() -> impl Strategy<Value = u16> {
    prop_oneof![200u16..=203, 205u16..=206, 300u16..=303, 400u16..=451, 500u16..=511,]
}

pub fn reason_phrase() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("OK".to_string()),
        Just("Not Found".to_string()),
        "[A-Za-z][A-Za-z ]{0,31}".prop_map(|s| s),
    ]
}

pub fn body() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..512)
}

/// ボディのフレーミング
#[derive(Debug, Clone)]
pub enum BodyFraming {
    /// Content-Length
    Length,
    /// chunked (各チャンクの長さ)
    Chunked(Vec<usize>),
}

/// ボディを chunked でエンコードする際の分割
pub fn body_framing() -> impl Strategy<Value = BodyFraming> {
    prop_oneof![
        Just(BodyFraming::Length),
        proptest::collection::vec(1usize..64, 0..8).prop_map(BodyFraming::Chunked),
    ]
}

// ========================================
// メッセージ組み立て
// ========================================

/// ボディを chunked エンコード
///
/// チャンクの長さの合計がボディより短い場合、残りは最後のチャンクにまとめる。
pub fn encode_chunked(body: &[u8], sizes: &[usize], trailers: &[(String, String)]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = body;
    for &size in sizes {
        if rest.is_empty() {
            break;
        }
        let n = size.min(rest.len());
        out.extend_from_slice(format!("{:x}\r\n", n).as_bytes());
        out.extend_from_slice(&rest[..n]);
        out.extend_from_slice(b"\r\n");
        rest = &rest[n..];
    }
    if !rest.is_empty() {
        out.extend_from_slice(format!("{:X}\r\n", rest.len()).as_bytes());
        out.extend_from_slice(rest);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n");
    for (name, value) in trailers {
        out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out
}

fn encode_head_and_body(
    start_line: String,
    headers: &[(String, String)],
    body: &[u8],
    framing: &BodyFraming,
) -> Vec<u8> {
    let mut out = start_line.into_bytes();
    for (name, value) in headers {
        out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    match framing {
        BodyFraming::Length => {
            out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
            out.extend_from_slice(body);
        }
        BodyFraming::Chunked(sizes) => {
            out.extend_from_slice(b"Transfer-Encoding: chunked\r\n\r\n");
            out.extend_from_slice(&encode_chunked(body, sizes, &[]));
        }
    }
    out
}

/// リクエストを組み立てる
pub fn encode_request(
    method: &str,
    target: &str,
    headers: &[(String, String)],
    body: &[u8],
    framing: &BodyFraming,
) -> Vec<u8> {
    encode_head_and_body(
        format!("{} {} HTTP/1.1\r\n", method, target),
        headers,
        body,
        framing,
    )
}

/// レスポンスを組み立てる
pub fn encode_response(
    status: u16,
    reason: &str,
    headers: &[(String, String)],
    body: &[u8],
    framing: &BodyFraming,
) -> Vec<u8> {
    encode_head_and_body(
        format!("HTTP/1.1 {} {}\r\n", status, reason),
        headers,
        body,
        framing,
    )
}
