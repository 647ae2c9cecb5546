#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http1_parser::{
    ErrorKind, NoopCallbacks, Parser, ParserLimits, ParserStatus, PolicyCallbacks,
};

#[derive(Arbitrary, Debug)]
struct FuzzPolicy {
    max_headers_size: u16,
    max_headers_count: u8,
    max_url_size: u16,
    allow_chunked_length: bool,
    data: Vec<u8>,
}

fuzz_target!(|input: FuzzPolicy| {
    let limits = ParserLimits {
        max_headers_size: usize::from(input.max_headers_size),
        max_headers_count: usize::from(input.max_headers_count),
        max_url_size: usize::from(input.max_url_size),
    };
    let policy = PolicyCallbacks::with_limits(NoopCallbacks, limits)
        .with_allow_chunked_length(input.allow_chunked_length);
    let mut parser = Parser::request(policy);

    for chunk in input.data.chunks(31) {
        let outcome = parser.execute(chunk);
        if outcome.status == ParserStatus::Error(ErrorKind::CallbackRejected) {
            // 拒否したのはポリシー層
            assert!(parser.callbacks().violation().is_some());
        }
        if outcome.consumed != chunk.len() {
            break;
        }
    }
});
