//! バイト分類

pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';
pub(crate) const SP: u8 = b' ';
pub(crate) const HTAB: u8 = b'\t';

/// トークン文字か確認 (RFC 9110 Section 5.6.2)
pub(crate) fn is_token_char(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'0'..=b'9' | b'A'..=b'Z' | b'^' | b'_' | b'`' | b'a'..=b'z' | b'|' | b'~'
    )
}

/// ヘッダー値に許可される文字か確認 (RFC 9110 Section 5.5)
///
/// field-vchar = VCHAR / obs-text に SP と HTAB を加えたもの
pub(crate) fn is_field_vchar(b: u8) -> bool {
    matches!(b, HTAB | 0x20..=0x7E | 0x80..=0xFF)
}

/// request-target に許可される文字か確認
///
/// 制御文字、SP、DEL 以外を許可する (obs-text を含む)。
pub(crate) fn is_url_char(b: u8) -> bool {
    matches!(b, 0x21..=0x7E | 0x80..=0xFF)
}

/// メソッド名に許可される文字か確認
pub(crate) fn is_method_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'-')
}

/// 16 進数の値
pub(crate) fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// OWS (SP / HTAB) か確認
pub(crate) fn is_ows(b: u8) -> bool {
    b == SP || b == HTAB
}
