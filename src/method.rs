//! リクエストメソッドのテーブル
//!
//! 数値コードは固定であり、テーブルにないメソッドはパースエラーになる。

/// リクエストメソッド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Method {
    Delete = 0,
    Get = 1,
    Head = 2,
    Post = 3,
    Put = 4,
    Connect = 5,
    Options = 6,
    Trace = 7,
    Copy = 8,
    Lock = 9,
    MkCol = 10,
    Move = 11,
    PropFind = 12,
    PropPatch = 13,
    Search = 14,
    Unlock = 15,
    Bind = 16,
    Rebind = 17,
    Unbind = 18,
    Acl = 19,
    Report = 20,
    MkActivity = 21,
    Checkout = 22,
    Merge = 23,
    MSearch = 24,
    Notify = 25,
    Subscribe = 26,
    Unsubscribe = 27,
    Patch = 28,
    Purge = 29,
    MkCalendar = 30,
    Link = 31,
    Unlink = 32,
    Source = 33,
    Pri = 34,
}

/// コード順のメソッド一覧
const METHODS: [Method; 35] = [
    Method::Delete,
    Method::Get,
    Method::Head,
    Method::Post,
    Method::Put,
    Method::Connect,
    Method::Options,
    Method::Trace,
    Method::Copy,
    Method::Lock,
    Method::MkCol,
    Method::Move,
    Method::PropFind,
    Method::PropPatch,
    Method::Search,
    Method::Unlock,
    Method::Bind,
    Method::Rebind,
    Method::Unbind,
    Method::Acl,
    Method::Report,
    Method::MkActivity,
    Method::Checkout,
    Method::Merge,
    Method::MSearch,
    Method::Notify,
    Method::Subscribe,
    Method::Unsubscribe,
    Method::Patch,
    Method::Purge,
    Method::MkCalendar,
    Method::Link,
    Method::Unlink,
    Method::Source,
    Method::Pri,
];

/// 最長のメソッド名の長さ (UNSUBSCRIBE)
pub(crate) const MAX_METHOD_LEN: usize = 11;

impl Method {
    /// メソッド名
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Delete => "DELETE",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Copy => "COPY",
            Method::Lock => "LOCK",
            Method::MkCol => "MKCOL",
            Method::Move => "MOVE",
            Method::PropFind => "PROPFIND",
            Method::PropPatch => "PROPPATCH",
            Method::Search => "SEARCH",
            Method::Unlock => "UNLOCK",
            Method::Bind => "BIND",
            Method::Rebind => "REBIND",
            Method::Unbind => "UNBIND",
            Method::Acl => "ACL",
            Method::Report => "REPORT",
            Method::MkActivity => "MKACTIVITY",
            Method::Checkout => "CHECKOUT",
            Method::Merge => "MERGE",
            Method::MSearch => "M-SEARCH",
            Method::Notify => "NOTIFY",
            Method::Subscribe => "SUBSCRIBE",
            Method::Unsubscribe => "UNSUBSCRIBE",
            Method::Patch => "PATCH",
            Method::Purge => "PURGE",
            Method::MkCalendar => "MKCALENDAR",
            Method::Link => "LINK",
            Method::Unlink => "UNLINK",
            Method::Source => "SOURCE",
            Method::Pri => "PRI",
        }
    }

    /// 数値コード
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 数値コードから取得
    pub fn from_code(code: u8) -> Option<Self> {
        METHODS.get(code as usize).copied()
    }

    /// メソッド名から取得 (大文字小文字を区別する)
    pub fn from_bytes(name: &[u8]) -> Option<Self> {
        METHODS
            .iter()
            .copied()
            .find(|m| m.as_str().as_bytes() == name)
    }

    /// いずれかのメソッド名の先頭部分かどうか
    ///
    /// 1 バイトずつ受け取るメソッド名を途中で拒否するために使う。
    pub(crate) fn is_prefix(partial: &[u8]) -> bool {
        METHODS
            .iter()
            .any(|m| m.as_str().as_bytes().starts_with(partial))
    }

    /// HTTP/1.x パーサーとして処理しないメソッドかどうか
    ///
    /// PRI は HTTP/2 コネクションプリフェースでのみ使われる。
    pub fn is_unsupported(self) -> bool {
        self == Method::Pri
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
