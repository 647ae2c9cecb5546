//! メッセージに関するフラグ

/// メッセージ単位の事実の集合
///
/// `on_message_begin` のたびにすべて false に戻る。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFlags {
    /// ボディが chunked でフレーミングされる
    pub chunked: bool,
    /// Transfer-Encoding ヘッダーがある
    pub has_transfer_encoding: bool,
    /// Upgrade ヘッダーがある
    pub has_upgrade: bool,
    /// Content-Length ヘッダーがある
    pub content_length: bool,
    /// Connection: keep-alive
    pub connection_keep_alive: bool,
    /// Connection: close
    pub connection_close: bool,
    /// Connection: upgrade
    pub connection_upgrade: bool,
    /// ボディを読み飛ばす (HEAD へのレスポンス等)
    pub skip_body: bool,
    /// トレーラーを読み取り中
    pub trailing: bool,
}

impl MessageFlags {
    /// 立っているフラグの名前を列挙
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.chunked, "chunked"),
            (self.has_transfer_encoding, "transfer-encoding"),
            (self.has_upgrade, "upgrade"),
            (self.content_length, "content-length"),
            (self.connection_keep_alive, "connection-keep-alive"),
            (self.connection_close, "connection-close"),
            (self.connection_upgrade, "connection-upgrade"),
            (self.skip_body, "skip-body"),
            (self.trailing, "trailing"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}
