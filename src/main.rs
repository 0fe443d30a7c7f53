//!
//! leaguegate server binary
//! ------------------------
//! Starts the HTTP surface. Configuration comes from `LEAGUEGATE_*` environment variables;
//! command-line flags override them.

use std::env;

use leaguegate::config::AuthConfig;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].parse::<u16>().ok();
        }
        i += 1;
    }
    None
}

fn parse_string_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .filter(|v| !v.starts_with('-'))
        .cloned()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("leaguegate\n\nUSAGE:\n  leaguegate [--http-port N] [--bind ADDR] [--insecure-cookies]\n\nOPTIONS:\n  --http-port N         HTTP port (env: LEAGUEGATE_HTTP_PORT, default 7878)\n  --bind ADDR           Bind address (env: LEAGUEGATE_BIND, default 0.0.0.0)\n  --insecure-cookies    Omit the Secure cookie attribute (env: LEAGUEGATE_SECURE_COOKIES=false)\n");
        return Ok(());
    }

    let mut config = AuthConfig::from_env();
    if let Some(p) = parse_port_arg(&args, "--http-port") { config.http_port = p; }
    if let Some(b) = parse_string_arg(&args, "--bind") { config.bind_addr = b; }
    if has_flag(&args, "--insecure-cookies") { config.csrf.secure_cookie = false; }

    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "startup", "RUST_LOG='{}'", rust_log);

    leaguegate::server::run(config).await
}
