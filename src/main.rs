use anyhow::{Context, Result};
use clap::Parser;
use gcp_collector_config::{
    component::Kind,
    factory::nop_factories,
    googlecloud,
    loader::ConfigLoader,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the collector configuration file
    #[arg(short, long, env = "OTELCOL_CONFIG", default_value = "config.yaml")]
    config: String,

    /// Prefix of environment variables overriding file values
    #[arg(long, env = "OTELCOL_ENV_PREFIX")]
    env_prefix: Option<String>,

    /// Print the resolved exporter configurations as JSON
    #[arg(long)]
    print: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    info!(
        "Google Cloud exporter config check v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut factories = nop_factories().context("Failed to build factories")?;
    factories
        .register(Kind::Exporter, googlecloud::new_factory()?)
        .context("Failed to register googlecloud exporter")?;

    let mut loader = ConfigLoader::new(&factories);
    if let Some(prefix) = args.env_prefix {
        loader = loader.with_env_prefix(prefix);
    }

    let config = match loader.load_and_validate(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    for id in config.exporter_ids() {
        info!("Exporter {} configured", id);
    }
    info!("Configuration {} is valid", args.config);

    if args.print {
        let exporters = config
            .to_json(Kind::Exporter)
            .context("Failed to serialize exporters")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&exporters).context("Failed to render JSON")?
        );
    }

    Ok(())
}
