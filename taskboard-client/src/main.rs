use clap::Parser;

use taskboard_client::cli::{self, Cli};
use taskboard_client::log_bridge;

#[tokio::main]
async fn main() {
    if let Err(e) = log_bridge::init() {
        log_bridge::write_fallback_line(&format!("logger init failed: {}", e));
    }

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli).await {
        log::error!("[taskboard.cli] {}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
