//! HTTP/1.x メッセージのコールバックを表示する例
//!
//! 使い方:
//!   # ファイルのリクエストを表示
//!   cargo run -p http1_dump -- requests.txt
//!
//!   # 標準入力のレスポンスを 7 バイトずつ読み取って表示
//!   cat response.txt | cargo run -p http1_dump -- --response --read-size 7
//!
//!   # ログを有効にする
//!   RUST_LOG=tokio_http1_parser=debug cargo run -p http1_dump -- requests.txt

use shiguredo_http1_parser::{
    CallbackResult, Flow, MessageInfo, MessageKind, Parser, ParserCallbacks, PolicyCallbacks,
    Rejected,
};
use tokio::io::AsyncRead;
use tokio_http1_parser::{DriverEvent, PipelineConfig, StreamDriver};
use tracing_subscriber::EnvFilter;

struct DumpOptions {
    path: Option<String>,
    kind: MessageKind,
    expect_no_body: bool,
    read_size: Option<usize>,
    config_path: Option<String>,
}

/// コールバックを 1 行ずつ標準出力に書き出す
#[derive(Debug, Default)]
struct Dump {
    messages: usize,
}

impl Dump {
    fn line(&self, name: &str, data: &[u8]) {
        println!("{:>4} {:<18} {}", self.messages, name, data.escape_ascii());
    }
}

impl ParserCallbacks for Dump {
    fn on_message_begin(&mut self) -> CallbackResult {
        self.messages += 1;
        self.line("message_begin", b"");
        Ok(())
    }

    fn on_url(&mut self, data: &[u8]) -> CallbackResult {
        self.line("url", data);
        Ok(())
    }

    fn on_status(&mut self, data: &[u8]) -> CallbackResult {
        self.line("status", data);
        Ok(())
    }

    fn on_header_field(&mut self, data: &[u8]) -> CallbackResult {
        self.line("header_field", data);
        Ok(())
    }

    fn on_header_value(&mut self, data: &[u8]) -> CallbackResult {
        self.line("header_value", data);
        Ok(())
    }

    fn on_headers_complete(&mut self, message: &mut MessageInfo) -> CallbackResult {
        let summary = format!(
            "HTTP/{}.{} method={} status={} content_length={} flags={}",
            message.http_major(),
            message.http_minor(),
            message.method().map(|m| m.as_str()).unwrap_or("-"),
            message.status_code(),
            message.content_length(),
            message.flags().names().join(","),
        );
        self.line("headers_complete", summary.as_bytes());
        Ok(())
    }

    fn on_body(&mut self, data: &[u8]) -> CallbackResult {
        self.line("body", data);
        Ok(())
    }

    fn on_chunk_header(&mut self, is_final: bool) -> CallbackResult {
        let data: &[u8] = if is_final { b"final" } else { b"" };
        self.line("chunk_header", data);
        Ok(())
    }

    fn on_message_complete(&mut self) -> Result<Flow, Rejected> {
        self.line("message_complete", b"");
        Ok(Flow::Continue)
    }

    fn on_upgraded_data(&mut self, data: &[u8]) -> CallbackResult {
        self.line("upgraded_data", data);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = parse_args()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &options.config_path {
        Some(path) => PipelineConfig::from_json(&tokio::fs::read_to_string(path).await?)?,
        None => PipelineConfig::default(),
    };
    if let Some(size) = options.read_size {
        config.read_buffer_size = size;
    }

    let mut parser = Parser::new(options.kind, config.policy(Dump::default()));
    parser.set_expect_no_body(options.expect_no_body);

    match &options.path {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            dump(file, parser, &config).await
        }
        None => dump(tokio::io::stdin(), parser, &config).await,
    }
}

async fn dump<R: AsyncRead + Unpin>(
    reader: R,
    parser: Parser<PolicyCallbacks<Dump>>,
    config: &PipelineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut driver = StreamDriver::with_config(reader, parser, config);
    loop {
        let event = match driver.advance().await {
            Ok(event) => event,
            Err(e) => {
                if let Some(violation) = driver.parser().callbacks().violation() {
                    eprintln!("policy violation: {}", violation);
                }
                return Err(e.into());
            }
        };
        match event {
            DriverEvent::Closed => break,
            DriverEvent::Paused => driver.resume(),
            DriverEvent::Upgraded => {
                tracing::info!(offset = driver.stream_offset(), "switched protocols");
                driver.resume();
            }
        }
    }
    println!(
        "{} message(s), {} byte(s)",
        driver.parser().callbacks().inner().messages,
        driver.stream_offset()
    );
    Ok(())
}

fn parse_args() -> Result<DumpOptions, Box<dyn std::error::Error>> {
    let mut args = noargs::raw_args();
    args.metadata_mut().app_name = "http1_dump";

    // --help フラグ
    noargs::HELP_FLAG.take_help(&mut args);

    // --version フラグ
    let version_flag: bool = noargs::flag("version")
        .short('V')
        .doc("Show version")
        .take(&mut args)
        .is_present();
    if version_flag {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    // --response フラグ
    let response: bool = noargs::flag("response")
        .short('r')
        .doc("Parse responses instead of requests")
        .take(&mut args)
        .is_present();

    // --head フラグ
    let expect_no_body: bool = noargs::flag("head")
        .doc("Treat responses as replies to HEAD (no body)")
        .take(&mut args)
        .is_present();

    // --read-size オプション
    let read_size: Option<usize> = noargs::opt("read-size")
        .short('n')
        .doc("Read buffer size in bytes (overrides the config file)")
        .take(&mut args)
        .present_and_then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // --config オプション
    let config_path: Option<String> = noargs::opt("config")
        .short('c')
        .doc("Path to pipeline config file (JSON)")
        .take(&mut args)
        .present_and_then(|o| Ok::<_, &str>(o.value().to_string()))
        .map_err(|e| format!("{:?}", e))?;

    // 位置引数: ファイル (省略時は標準入力)
    let path: Option<String> = noargs::arg("[FILE]")
        .doc("File to parse (default: stdin)")
        .take(&mut args)
        .present_and_then(|a| Ok::<_, &str>(a.value().to_string()))
        .map_err(|e| format!("{:?}", e))?;

    // 未知の引数があればエラー、ヘルプが返されたら表示
    if let Some(help) = args.finish().map_err(|e| format!("{:?}", e))? {
        print!("{}", help);
        std::process::exit(0);
    }

    if read_size == Some(0) {
        return Err("--read-size must be greater than 0".into());
    }

    Ok(DumpOptions {
        path,
        kind: if response {
            MessageKind::Response
        } else {
            MessageKind::Request
        },
        expect_no_body,
        read_size,
        config_path,
    })
}
