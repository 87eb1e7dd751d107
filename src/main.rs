mod cli;

use podstream::{config, extractor, resolver::TierResolver, server};
use podstream_common::{MediaId, Tier};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // CLI flags win over the config file
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting podstream server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

async fn resolve_id(id: &str, config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let id: MediaId = id.parse().context("Invalid media id")?;

    let resolver = TierResolver::from_config(&config);
    let result = resolver.resolve(&id).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "podstream=trace,podstream_common=debug,tower_http=debug".to_string()
        } else {
            "podstream=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Resolve { id } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve_id(&id, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("podstream {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn check_tools(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = extractor::check_tools(config.extractor.ytdlp_path.as_deref());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("yt-dlp is missing: local extraction will be skipped.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, searching default locations");
            let config = config::load_config_or_default(None)?;
            println!("✓ Configuration is valid");
            config
        }
    };

    let count = |tier: Tier| config.mirrors.iter().filter(|m| m.tier == tier).count();
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Tier A mirrors: {}", count(Tier::A));
    println!("  Tier B mirrors: {}", count(Tier::B));
    println!("  Mirror timeout: {}s", config.resolver.mirror_timeout_secs);
    println!("  Local extraction: {}", config.extractor.enabled);
    println!("  Proxy chunk size: {} bytes", config.proxy.chunk_size);

    Ok(())
}
