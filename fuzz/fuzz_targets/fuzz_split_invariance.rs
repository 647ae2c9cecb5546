#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http1_parser::{
    CallbackResult, Flow, MessageInfo, MessageKind, Parser, ParserCallbacks, ParserStatus,
    Rejected,
};

#[derive(Arbitrary, Debug)]
struct FuzzSplit {
    response: bool,
    splits: Vec<u16>,
    data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Begin,
    Url(Vec<u8>),
    Status(Vec<u8>),
    Field(Vec<u8>),
    Value(Vec<u8>),
    HeadersComplete,
    Body(Vec<u8>),
    ChunkHeader(bool),
    Complete,
    Upgraded(Vec<u8>),
}

#[derive(Debug, Default)]
struct Recorder {
    events: Vec<Event>,
}

impl Recorder {
    fn push_data(&mut self, event: Event) {
        let merged = match (self.events.last_mut(), &event) {
            (Some(Event::Url(a)), Event::Url(b))
            | (Some(Event::Status(a)), Event::Status(b))
            | (Some(Event::Field(a)), Event::Field(b))
            | (Some(Event::Value(a)), Event::Value(b))
            | (Some(Event::Body(a)), Event::Body(b))
            | (Some(Event::Upgraded(a)), Event::Upgraded(b)) => {
                a.extend_from_slice(b);
                true
            }
            _ => false,
        };
        if !merged {
            self.events.push(event);
        }
    }
}

impl ParserCallbacks for Recorder {
    fn on_message_begin(&mut self) -> CallbackResult {
        self.events.push(Event::Begin);
        Ok(())
    }

    fn on_url(&mut self, data: &[u8]) -> CallbackResult {
        self.push_data(Event::Url(data.to_vec()));
        Ok(())
    }

    fn on_status(&mut self, data: &[u8]) -> CallbackResult {
        self.push_data(Event::Status(data.to_vec()));
        Ok(())
    }

    fn on_header_field(&mut self, data: &[u8]) -> CallbackResult {
        self.push_data(Event::Field(data.to_vec()));
        Ok(())
    }

    fn on_header_value(&mut self, data: &[u8]) -> CallbackResult {
        self.push_data(Event::Value(data.to_vec()));
        Ok(())
    }

    fn on_headers_complete(&mut self, _message: &mut MessageInfo) -> CallbackResult {
        self.events.push(Event::HeadersComplete);
        Ok(())
    }

    fn on_body(&mut self, data: &[u8]) -> CallbackResult {
        self.push_data(Event::Body(data.to_vec()));
        Ok(())
    }

    fn on_chunk_header(&mut self, is_final: bool) -> CallbackResult {
        self.events.push(Event::ChunkHeader(is_final));
        Ok(())
    }

    fn on_message_complete(&mut self) -> Result<Flow, Rejected> {
        self.events.push(Event::Complete);
        Ok(Flow::Continue)
    }

    fn on_upgraded_data(&mut self, data: &[u8]) -> CallbackResult {
        self.push_data(Event::Upgraded(data.to_vec()));
        Ok(())
    }
}

/// 分割して渡し、一時停止は解除して続ける
fn run(kind: MessageKind, data: &[u8], splits: &[usize]) -> (Vec<Event>, usize, ParserStatus) {
    let mut parser = Parser::new(kind, Recorder::default());
    let mut consumed = 0;
    let mut status = ParserStatus::Success;
    let mut start = 0;
    for &end in splits.iter().chain(std::iter::once(&data.len())) {
        while start < end {
            let outcome = parser.execute(&data[start..end]);
            consumed += outcome.consumed;
            start += outcome.consumed;
            status = outcome.status;
            match status {
                ParserStatus::Paused => {
                    parser.resume();
                }
                ParserStatus::Error(_) => return (parser.into_callbacks().events, consumed, status),
                _ => {}
            }
        }
    }
    (parser.into_callbacks().events, consumed, status)
}

fuzz_target!(|input: FuzzSplit| {
    let kind = if input.response {
        MessageKind::Response
    } else {
        MessageKind::Request
    };
    let len = input.data.len();
    let mut splits: Vec<usize> = input
        .splits
        .iter()
        .take(32)
        .map(|&s| usize::from(s) % (len + 1))
        .collect();
    splits.sort_unstable();

    let whole = run(kind, &input.data, &[]);
    let split = run(kind, &input.data, &splits);
    assert_eq!(whole.1, split.1);
    if whole.2.is_error() || split.2.is_error() {
        // エラー位置までに通知済みのスパンは分割によって異なる
        assert_eq!(whole.2, split.2);
    } else {
        assert_eq!(whole.0, split.0);
    }
});
