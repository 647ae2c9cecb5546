//! パース状態の定義

/// バイト単位のパース状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// メッセージ開始待ち (先頭の CR/LF は読み飛ばす)
    Start,

    // リクエストライン
    Method,
    UrlStart,
    Url,
    /// "HTTP/" の何文字目か
    RequestVersion(u8),
    RequestMajor,
    RequestDot,
    RequestMinor,
    RequestLineCr,
    RequestLineLf,

    // ステータスライン
    /// "HTTP/" の何文字目か
    ResponseVersion(u8),
    ResponseMajor,
    ResponseDot,
    ResponseMinor,
    ResponseSpace,
    /// 読み取ったステータスコードの桁数
    Status(u8),
    AfterStatus,
    Reason,
    ResponseLineLf,

    // ヘッダー (トレーラーも同じ状態を使う)
    HeaderFieldStart,
    HeaderField,
    HeaderValueStart,
    HeaderValue,
    HeaderValueLf,
    HeadersLf,

    // ボディ
    BodyIdentity,
    BodyUntilClose,
    ChunkSizeStart,
    ChunkSize,
    ChunkSizeWs,
    ChunkExtension,
    ChunkSizeLf,
    ChunkData,
    ChunkDataCr,
    ChunkDataLf,

    /// アップグレード後 (HTTP としてはパースしない)
    Upgraded,
}

impl State {
    /// 呼び出しをまたいで継続するバイト列スパンの状態かどうか
    pub(crate) fn is_span(self) -> bool {
        matches!(
            self,
            State::Url | State::Reason | State::HeaderField | State::HeaderValue
        )
    }
}

/// ボディのフレーミング
///
/// ヘッダー完了時に決定する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// ボディなし
    NoBody,
    /// Content-Length による固定長
    Length(u64),
    /// Transfer-Encoding: chunked
    Chunked,
    /// 接続が閉じるまで (レスポンスのみ)
    UntilClose,
}
