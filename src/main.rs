use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use shell_protocol::config::{
    load_config, resolve_app_paths, BuildLayout, EnvSource, PathOverrides, ShellConfig,
};
use shell_protocol::http::{HttpServer, NetFetcher};
use shell_protocol::lifecycle::Shutdown;
use shell_protocol::observability::init_logging;
use shell_protocol::scheme::{privileged_scheme, register_handler, RouterOptions, SchemeRegistry};

#[derive(Parser)]
#[command(name = "shell-protocol")]
#[command(about = "Serve a bundled web app and its API proxies under a custom scheme", long_about = None)]
struct Cli {
    /// TOML config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the privileged scheme descriptor as JSON and exit
    #[arg(long)]
    print_scheme: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path).with_context(|| format!("loading {}", path.display()))?,
        None => ShellConfig::default(),
    };
    init_logging(&config.observability.log_level);

    let scheme = privileged_scheme(&config.scheme.name, config.scheme.privileges);
    if cli.print_scheme {
        println!("{}", serde_json::to_string_pretty(&scheme)?);
        return Ok(());
    }

    tracing::info!("shell-protocol v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        scheme = %scheme.scheme,
        privileges = ?scheme.privileges,
        base_path = %config.scheme.base_path,
        route_proxies = config.route_proxies.len(),
        "Configuration loaded"
    );

    let env = EnvSource::Process;
    let app_dir = std::env::current_dir().context("working directory is not accessible")?;
    match resolve_app_paths(
        &scheme.scheme,
        &PathOverrides {
            window_url: env.get("OVERRIDE_WINDOW_URL"),
            public_server_url: env.get("OVERRIDE_PUBLIC_SERVER_URL"),
        },
        &BuildLayout::from_env(&env),
        &env,
        &app_dir,
    ) {
        Ok(paths) => tracing::info!(
            window_url = %paths.window_url,
            public_server_url = %paths.public_server_url,
            preload_path = %paths.preload_path.display(),
            "App paths resolved"
        ),
        Err(err) => tracing::warn!(error = %err, "App paths unresolved"),
    }

    let registry = Arc::new(SchemeRegistry::new());
    let fetcher = Arc::new(NetFetcher::new().with_registry(&registry));
    let options = RouterOptions::default()
        .log_requests(config.scheme.log_requests)
        .error_page(config.scheme.error_page.clone())
        .env(env)
        .fetcher(fetcher);
    register_handler(
        registry.as_ref(),
        &scheme.scheme,
        &config.scheme.base_path,
        config.proxy_table(),
        options,
    )?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .with_context(|| format!("binding {}", config.listener.bind_address))?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    HttpServer::new(registry, scheme.scheme.clone(), shutdown.clone())
        .run(listener)
        .await?;

    if shutdown.is_triggered() {
        anyhow::bail!("stopped after a fatal scheme error");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
