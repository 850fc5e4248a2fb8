use clap::Parser;
use radius_das::{Config, DasServer, ServerConfig};
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// RADIUS Dynamic Authorization Server - RFC 5176 Disconnect / CoA
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "radius-das")]
struct Cli {
    /// Path to configuration file
    #[arg(value_name = "CONFIG", default_value = "config.json")]
    config_path: String,

    /// Validate configuration and exit (doesn't start server)
    #[arg(short, long)]
    validate: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing_subscriber::registry()
                .with(EnvFilter::new("info"))
                .with(tracing_subscriber::fmt::layer())
                .init();

            if cli.validate {
                eprintln!("Configuration validation failed!");
                eprintln!("   Error: {}", e);
                process::exit(1);
            }

            // An existing but invalid file is never overwritten
            if std::path::Path::new(&cli.config_path).exists() {
                error!("Invalid configuration in {}: {}", cli.config_path, e);
                process::exit(1);
            }

            warn!("Could not load config file from: {}", cli.config_path);
            info!("Creating example configuration at: {}", cli.config_path);

            if let Err(e) = Config::example().to_file(&cli.config_path) {
                error!("Error creating example config: {}", e);
                process::exit(1);
            }

            info!("Please edit {} and restart the server", cli.config_path);
            process::exit(0);
        }
    };

    if cli.validate {
        println!("Configuration validated successfully!");
        println!();
        println!("Configuration summary:");
        println!("  Listen: {}:{}", config.listen_address, config.listen_port);
        println!(
            "  Client: {}",
            config.client_address.as_deref().unwrap_or("(none)")
        );
        println!("  Log level: {}", config.log_level.as_deref().unwrap_or("info"));
        if let Some(ref path) = config.audit_log_path {
            println!("  Audit log: {}", path);
        }
        process::exit(0);
    }

    let log_level = config.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("RADIUS DAS v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from: {}", cli.config_path);

    let server_config = match ServerConfig::from_config(&config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    if let Some(ref path) = config.audit_log_path {
        info!("Audit logging enabled: {}", path);
    }

    let server = match DasServer::init(server_config) {
        Ok(srv) => srv,
        Err(e) => {
            error!("Failed to initialize DAS: {}", e);
            process::exit(1);
        }
    };

    info!("Press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    info!("Shutting down");
    server.deinit().await;
}
