//! メッセージ単位の状態

use crate::flags::MessageFlags;
use crate::method::Method;

/// パース中のメッセージの情報
///
/// `on_message_begin` のたびにリセットされる。
/// `on_headers_complete` には可変参照で渡され、呼び出し側はここに
/// `seen_content_length` を記録できる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageInfo {
    pub(crate) method: Option<Method>,
    pub(crate) status_code: u16,
    pub(crate) http_major: u8,
    pub(crate) http_minor: u8,
    pub(crate) content_length: u64,
    pub(crate) flags: MessageFlags,
    pub(crate) seen_content_length: bool,
    pub(crate) upgrade: bool,
}

impl MessageInfo {
    /// リクエストメソッド (スタートライン完了後のみ有効)
    pub fn method(&self) -> Option<Method> {
        self.method
    }

    /// ステータスコード (レスポンスのみ)
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// HTTP メジャーバージョン
    pub fn http_major(&self) -> u8 {
        self.http_major
    }

    /// HTTP マイナーバージョン
    pub fn http_minor(&self) -> u8 {
        self.http_minor
    }

    /// Content-Length の値、chunked の場合は直近のチャンクサイズ
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// フラグ
    pub fn flags(&self) -> &MessageFlags {
        &self.flags
    }

    /// 呼び出し側が Content-Length ヘッダーを観測したかどうか
    pub fn seen_content_length(&self) -> bool {
        self.seen_content_length
    }

    /// Content-Length ヘッダーの観測を記録
    pub fn set_seen_content_length(&mut self, seen: bool) {
        self.seen_content_length = seen;
    }

    /// プロトコルのアップグレード (CONNECT を含む) かどうか
    pub fn is_upgrade(&self) -> bool {
        self.upgrade
    }

    /// キープアライブ接続を継続できるかどうか
    ///
    /// HTTP/1.1 は close がなければ継続、HTTP/1.0 は keep-alive があれば継続。
    pub fn is_keep_alive(&self) -> bool {
        if self.http_major == 1 && self.http_minor >= 1 {
            !self.flags.connection_close
        } else {
            self.flags.connection_keep_alive
        }
    }
}
