// Entrypoint for the terminal navigator.
// - Loads `.env`, parses flags (each backed by an environment variable) and
//   validates them into a `Config` before touching the terminal.
// - Logs go to a file; stdout belongs to the UI.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use beeminder_tui::config::{self, Config};
use beeminder_tui::terminal::{self, Terminal};
use beeminder_tui::{ui, ApiClient};

#[derive(Parser, Debug)]
#[command(name = "beeminder-tui", version, about = "Browse Beeminder goals and log datapoints")]
struct Cli {
    /// Personal auth token from https://www.beeminder.com/api/v1/auth_token.json
    #[arg(long, env = config::API_KEY_VAR, hide_env_values = true)]
    api_key: Option<String>,

    /// Default username; the token's owner when omitted
    #[arg(long, short, env = config::USERNAME_VAR)]
    username: Option<String>,

    #[arg(long, env = config::BASE_URL_VAR, default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    #[arg(long, env = "BEEMINDER_LOG", default_value = "info")]
    log_level: LevelFilter,

    /// Defaults to beeminder-tui/beeminder.log under the user cache directory
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::new(cli.api_key.unwrap_or_default(), cli.username)?
        .with_base_url(cli.base_url)
        .with_timeout(std::time::Duration::from_secs(cli.timeout));
    init_logging(cli.log_level, cli.log_file)?;

    let api = ApiClient::new(config.clone())?;

    terminal::install_panic_hook();
    let mut term = Terminal::enter()?;
    let result = ui::run(&api, &mut term, &config);
    // Restore the terminal before anything is printed.
    drop(term);

    result?;
    Ok(())
}

fn init_logging(level: LevelFilter, path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("beeminder-tui")
            .join("beeminder.log")
    });
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}
