use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use shell_protocol::config::EnvSource;
use shell_protocol::desktop::entry::{self, DEFAULT_EXEC};
use shell_protocol::observability::init_logging;

#[derive(Parser)]
#[command(name = "desktop-entry")]
#[command(about = "Install a desktop launcher entry for a development build", long_about = None)]
struct Cli {
    /// Application name; the entry is installed as dev-<name>.desktop
    app_name: String,

    /// Launch command written to Exec
    #[arg(default_value = DEFAULT_EXEC)]
    exec: String,

    /// Packaging config, if not in the working directory
    config: Option<PathBuf>,

    /// Write the entry without registering it with xdg-desktop-menu
    #[arg(long)]
    no_install: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging("info");

    let env = EnvSource::Process;
    if let Some(reason) = entry::skip_reason(&env, std::env::consts::OS) {
        tracing::info!("{reason}");
        return Ok(());
    }
    tracing::info!("Generating dev desktop file");

    let working_dir = std::env::current_dir().context("working directory is not accessible")?;
    let config = match cli.config {
        Some(path) => path,
        None => entry::find_config(&working_dir)?,
    };
    tracing::info!(config = %config.display(), "Using packaging config");

    let section = entry::read_desktop_section(&config).await?;
    let contents = entry::render(section, &working_dir, &cli.exec);
    let path = entry::install_path(&env, &cli.app_name)?;

    entry::write_entry(&path, &contents).await?;
    tracing::info!(path = %path.display(), "Desktop entry written");

    if !cli.no_install {
        entry::install(&path).await?;
        tracing::info!(path = %path.display(), "Desktop entry installed");
    }
    Ok(())
}
