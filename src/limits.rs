/// パーサー呼び出し側の制限設定
///
/// ステートマシン自体は制限を持たない。
/// `PolicyCallbacks` がコールバックを拒否することで制限を適用する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserLimits {
    /// ヘッダーのフィールド名と値の合計最大バイト数 (デフォルト: 60KB)
    pub max_headers_size: usize,
    /// 最大ヘッダー数 (デフォルト: 100)
    pub max_headers_count: usize,
    /// 最大リクエストターゲット長 (デフォルト: 8KB)
    pub max_url_size: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_headers_size: 60 * 1024, // 60KB
            max_headers_count: 100,
            max_url_size: 8 * 1024, // 8KB
        }
    }
}

impl ParserLimits {
    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            max_headers_size: usize::MAX,
            max_headers_count: usize::MAX,
            max_url_size: usize::MAX,
        }
    }
}
