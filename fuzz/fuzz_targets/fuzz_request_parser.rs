#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_http1_parser::{NoopCallbacks, Parser, ParserStatus};

fuzz_target!(|data: &[u8]| {
    // データを一度に渡す
    let mut parser = Parser::request(NoopCallbacks);
    let mut rest = data;
    loop {
        let outcome = parser.execute(rest);
        assert!(outcome.consumed <= rest.len());
        rest = &rest[outcome.consumed..];
        match outcome.status {
            ParserStatus::Paused => {
                let _ = parser.resume();
            }
            ParserStatus::Error(kind) => {
                assert_eq!(parser.error(), Some(kind));
                assert_eq!(parser.execute(b"GET / HTTP/1.1\r\n\r\n").consumed, 0);
                break;
            }
            _ => {}
        }
        if rest.is_empty() {
            let _ = parser.execute(&[]);
            break;
        }
    }

    // データを分割して渡す (ストリーミングシナリオ)
    parser.reset();
    for chunk in data.chunks(17) {
        let outcome = parser.execute(chunk);
        if outcome.consumed != chunk.len() {
            break;
        }
    }
    let _ = parser.should_keep_alive();
    let _ = parser.method_name();
    let _ = parser.error_name();
});
