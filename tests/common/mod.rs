//! 統合テスト共通のイベント記録用コールバック

#![allow(dead_code)]

use shiguredo_http1_parser::{
    CallbackResult, Flow, MessageInfo, Parser, ParserCallbacks, Rejected,
};

/// 記録したイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    MessageBegin,
    Url(Vec<u8>),
    Status(Vec<u8>),
    HeaderField(Vec<u8>),
    HeaderValue(Vec<u8>),
    HeadersComplete,
    Body(Vec<u8>),
    ChunkHeader(bool),
    MessageComplete,
    UpgradedData(Vec<u8>),
}

impl Event {
    pub fn url(s: &str) -> Self {
        Event::Url(s.as_bytes().to_vec())
    }

    pub fn status(s: &str) -> Self {
        Event::Status(s.as_bytes().to_vec())
    }

    pub fn field(s: &str) -> Self {
        Event::HeaderField(s.as_bytes().to_vec())
    }

    pub fn value(s: &str) -> Self {
        Event::HeaderValue(s.as_bytes().to_vec())
    }

    pub fn body(s: &str) -> Self {
        Event::Body(s.as_bytes().to_vec())
    }

    pub fn upgraded(data: &[u8]) -> Self {
        Event::UpgradedData(data.to_vec())
    }
}

/// イベントを記録するコールバック
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    /// n 番目 (0 始まり) のヘッダー名で拒否する
    pub reject_header_field: Option<usize>,
    /// メッセージ完了ごとに一時停止する
    pub pause_on_complete: bool,
    /// ヘッダー完了時のフラグ
    pub trailing_at_headers_complete: Option<bool>,
    pub header_fields: usize,
}

impl Recorder {
    /// 同じ種類のデータイベントが連続している場合に結合したイベント列
    pub fn coalesced(&self) -> Vec<Event> {
        coalesce(&self.events)
    }

    /// ボディの合計
    pub fn body(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Body(data) => Some(data.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

pub fn coalesce(events: &[Event]) -> Vec<Event> {
    let mut out: Vec<Event> = Vec::new();
    for event in events {
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
        let index = self.header_fields;
        self.header_fields += 1;
        if self.reject_header_field == Some(index) {
            return Err(Rejected);
        }
        Ok(())
    }

    fn on_header_value(&mut self, data: &[u8]) -> CallbackResult {
        self.events.push(Event::HeaderValue(data.to_vec()));
        Ok(())
    }

    fn on_headers_complete(&mut self, message: &mut MessageInfo) -> CallbackResult {
        self.trailing_at_headers_complete = Some(message.flags().trailing);
        self.events.push(Event::HeadersComplete);
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
        if self.pause_on_complete {
            Ok(Flow::Pause)
        } else {
            Ok(Flow::Continue)
        }
    }

    fn on_upgraded_data(&mut self, data: &[u8]) -> CallbackResult {
        self.events.push(Event::UpgradedData(data.to_vec()));
        Ok(())
    }
}

/// データを `size` バイトずつ渡す
///
/// 一時停止とエラーはそこで止める。戻り値は合計消費バイト数と最後の状態。
pub fn feed_in_pieces<C: ParserCallbacks>(
    parser: &mut Parser<C>,
    data: &[u8],
    size: usize,
) -> (usize, shiguredo_http1_parser::ParserStatus) {
    let mut total = 0;
    let mut status = shiguredo_http1_parser::ParserStatus::Success;
    for piece in data.chunks(size.max(1)) {
        let outcome = parser.execute(piece);
        total += outcome.consumed;
        status = outcome.status;
        if outcome.consumed != piece.len() {
            break;
        }
    }
    (total, status)
}
