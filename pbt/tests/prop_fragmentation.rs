//! 分割耐性のプロパティテスト
//!
//! 同じバイト列をどう分割して渡しても、同じ種類のデータイベントの結合を除いて
//! 同じイベント列と最終状態になる。

use pbt::{
    Event, Recorder, body, body_framing, encode_request, encode_response, feed_split, headers,
    reason_phrase, request_method, request_target, resolve_splits, split_points, status_code,
};
use proptest::prelude::*;
use shiguredo_http1_parser::{Parser, ParserStatus};

proptest! {
    #[test]
    fn request_split_invariance(
        method in request_method(),
        target in request_target(),
        headers in headers(),
        body in body(),
        framing in body_framing(),
        splits in split_points(),
    ) {
        let data = encode_request(method, &target, &headers, &body, &framing);

        let mut whole = Parser::request(Recorder::default());
        let outcome = whole.execute(&data);
        prop_assert_eq!(outcome.consumed, data.len());
        prop_assert!(!outcome.status.is_error());

        let mut split = Parser::request(Recorder::default());
        let (consumed, _) = feed_split(&mut split, &data, &resolve_splits(&splits, data.len()));
        prop_assert_eq!(consumed, data.len());
        prop_assert_eq!(split.callbacks().coalesced(), whole.callbacks().coalesced());
        prop_assert_eq!(split.message(), whole.message());
        prop_assert_eq!(split.framing(), whole.framing());
        prop_assert_eq!(split.callbacks().body(), body);
    }

    #[test]
    fn response_split_invariance(
        status in status_code(),
        reason in reason_phrase(),
        headers in headers(),
        body in body(),
        framing in body_framing(),
        splits in split_points(),
    ) {
        let data = encode_response(status, &reason, &headers, &body, &framing);

        let mut whole = Parser::response(Recorder::default());
        whole.execute(&data);

        let mut split = Parser::response(Recorder::default());
        let (consumed, status_after) =
            feed_split(&mut split, &data, &resolve_splits(&splits, data.len()));
        prop_assert_eq!(consumed, data.len());
        prop_assert!(!status_after.is_error());
        prop_assert_eq!(split.callbacks().coalesced(), whole.callbacks().coalesced());
        prop_assert_eq!(split.status_code(), status);
        prop_assert_eq!(split.callbacks().body(), body);
        let whole_events = whole.callbacks().coalesced();
        prop_assert_eq!(
            whole_events.get(1),
            Some(&Event::Status(reason.into_bytes()))
        );
    }

    #[test]
    fn pipelined_requests_split_invariance(
        first_headers in headers(),
        first_body in body(),
        second_body in body(),
        framing in body_framing(),
        splits in split_points(),
    ) {
        let mut data = encode_request("POST", "/first", &first_headers, &first_body, &framing);
        data.extend_from_slice(&encode_request("PUT", "/second", &[], &second_body, &framing));

        let mut whole = Parser::request(Recorder::default());
        let outcome = whole.execute(&data);
        prop_assert_eq!(outcome.consumed, data.len());

        let mut split = Parser::request(Recorder::default());
        let (consumed, _) = feed_split(&mut split, &data, &resolve_splits(&splits, data.len()));
        prop_assert_eq!(consumed, data.len());
        prop_assert_eq!(split.callbacks().coalesced(), whole.callbacks().coalesced());
        prop_assert_eq!(split.callbacks().count(&Event::MessageComplete), 2);
    }

    #[test]
    fn upgraded_bytes_are_never_parsed(
        tunnel in proptest::collection::vec(any::<u8>(), 1..256),
        splits in split_points(),
    ) {
        let mut parser = Parser::request(Recorder::default());
        let head = b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\n\r\n";
        let outcome = parser.execute(head);
        prop_assert_eq!(outcome.status, ParserStatus::Paused);
        prop_assert!(parser.resume());

        let (consumed, status) = feed_split(&mut parser, &tunnel, &resolve_splits(&splits, tunnel.len()));
        prop_assert_eq!(consumed, tunnel.len());
        prop_assert_eq!(status, ParserStatus::Success);
        prop_assert_eq!(parser.callbacks().count(&Event::MessageBegin), 1);
        let upgraded = parser.callbacks().coalesced().pop();
        prop_assert_eq!(upgraded, Some(Event::UpgradedData(tunnel)));
    }
}
