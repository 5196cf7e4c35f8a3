use anyhow::Result;
use choromap::{config, pipeline, render, server};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every dashboard and write the site
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the site and answer point-in-area queries
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn build_all(app_config: &config::AppConfig) -> Result<Vec<pipeline::Dashboard>> {
    app_config
        .dashboards
        .iter()
        .map(pipeline::build_dashboard)
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            println!("Generating dashboards with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let dashboards = build_all(&app_config)?;
            render::write_site(&app_config, &dashboards)?;

            println!("Generation complete! Open {:?}", app_config.output.dir.join("index.html"));
        }
        Commands::Serve { config } => {
            println!("Serving dashboards with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            // Fresh build so the API answers from the current input files.
            let dashboards = build_all(&app_config)?;

            server::start_server(app_config, dashboards).await?;
        }
    }

    Ok(())
}
