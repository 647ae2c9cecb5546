#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http1_parser::{NoopCallbacks, Parser, ParserStatus};

#[derive(Arbitrary, Debug)]
struct FuzzResponse {
    expect_no_body: bool,
    expect_tunnel: bool,
    data: Vec<u8>,
}

fuzz_target!(|input: FuzzResponse| {
    let mut parser = Parser::response(NoopCallbacks);
    parser.set_expect_no_body(input.expect_no_body);
    parser.set_expect_tunnel(input.expect_tunnel);

    let outcome = parser.execute(&input.data);
    assert!(outcome.consumed <= input.data.len());
    match outcome.status {
        ParserStatus::Error(_) => {
            assert!(parser.error().is_some());
        }
        ParserStatus::Paused => {
            // アップグレード後の残りはすべて on_upgraded_data に渡る
            if parser.resume() && parser.is_upgrade() {
                let rest = &input.data[outcome.consumed..];
                assert_eq!(parser.execute(rest).consumed, rest.len());
            }
        }
        _ => {
            let _ = parser.execute(&[]);
        }
    }
    let _ = parser.status_code();
    let _ = parser.message_needs_eof();
    let _ = parser.framing();
});
