//! パーサーが呼び出すコールバック

use crate::error::Rejected;
use crate::message::MessageInfo;

/// コールバックの戻り値
pub type CallbackResult = Result<(), Rejected>;

/// メッセージ完了後の流れ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// 次のメッセージのパースを続ける
    #[default]
    Continue,
    /// ここで一時停止する (パイプライン化されたリクエストを保留する等)
    Pause,
}

/// パースイベントの受け手
///
/// パーサーは構造要素を認識した順に同期的に呼び出す。
/// バイト列を受け取るコールバックはそのスライスを呼び出し中のみ参照できる。
/// 一つの要素が複数の `execute()` 呼び出しにまたがる場合は、同じコールバックが
/// 連続して複数回呼ばれる。
///
/// どのコールバックも `Err(Rejected)` を返すとパースはその場で停止し、
/// `ErrorKind::CallbackRejected` になる。
/// すべてのメソッドにはデフォルト実装 (何もしない) がある。
pub trait ParserCallbacks {
    /// メッセージの開始
    fn on_message_begin(&mut self) -> CallbackResult {
        Ok(())
    }

    /// リクエストターゲット (リクエストのみ)
    fn on_url(&mut self, _data: &[u8]) -> CallbackResult {
        Ok(())
    }

    /// ステータスフレーズ (レスポンスのみ、空の場合は呼ばれない)
    fn on_status(&mut self, _data: &[u8]) -> CallbackResult {
        Ok(())
    }

    /// ヘッダーのフィールド名 (トレーラーも含む)
    fn on_header_field(&mut self, _data: &[u8]) -> CallbackResult {
        Ok(())
    }

    /// ヘッダーの値 (トレーラーも含む)
    ///
    /// 値が空の場合も空スライスで一度呼ばれる。
    fn on_header_value(&mut self, _data: &[u8]) -> CallbackResult {
        Ok(())
    }

    /// ヘッダーの完了
    ///
    /// メッセージごとに一度だけ、ボディやトレーラーより前に呼ばれる。
    fn on_headers_complete(&mut self, _message: &mut MessageInfo) -> CallbackResult {
        Ok(())
    }

    /// ボディデータ
    fn on_body(&mut self, _data: &[u8]) -> CallbackResult {
        Ok(())
    }

    /// チャンクヘッダー
    ///
    /// `is_final` はサイズ 0 の終端チャンクの場合のみ true。
    fn on_chunk_header(&mut self, _is_final: bool) -> CallbackResult {
        Ok(())
    }

    /// メッセージの完了
    fn on_message_complete(&mut self) -> Result<Flow, Rejected> {
        Ok(Flow::Continue)
    }

    /// アップグレード後のデータ
    ///
    /// アップグレードで一時停止し `resume()` した後のバイトはすべてここに渡される。
    fn on_upgraded_data(&mut self, _data: &[u8]) -> CallbackResult {
        Ok(())
    }
}

impl<C: ParserCallbacks + ?Sized> ParserCallbacks for &mut C {
    fn on_message_begin(&mut self) -> CallbackResult {
        (**self).on_message_begin()
    }

    fn on_url(&mut self, data: &[u8]) -> CallbackResult {
        (**self).on_url(data)
    }

    fn on_status(&mut self, data: &[u8]) -> CallbackResult {
        (**self).on_status(data)
    }

    fn on_header_field(&mut self, data: &[u8]) -> CallbackResult {
        (**self).on_header_field(data)
    }

    fn on_header_value(&mut self, data: &[u8]) -> CallbackResult {
        (**self).on_header_value(data)
    }

    fn on_headers_complete(&mut self, message: &mut MessageInfo) -> CallbackResult {
        (**self).on_headers_complete(message)
    }

    fn on_body(&mut self, data: &[u8]) -> CallbackResult {
        (**self).on_body(data)
    }

    fn on_chunk_header(&mut self, is_final: bool) -> CallbackResult {
        (**self).on_chunk_header(is_final)
    }

    fn on_message_complete(&mut self) -> Result<Flow, Rejected> {
        (**self).on_message_complete()
    }

    fn on_upgraded_data(&mut self, data: &[u8]) -> CallbackResult {
        (**self).on_upgraded_data(data)
    }
}

/// 何もしないコールバック
///
/// フレーミングだけを検証したい場合に使う。
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCallbacks;

impl ParserCallbacks for NoopCallbacks {}
