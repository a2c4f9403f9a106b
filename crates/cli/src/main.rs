mod config;
mod error;
mod logging;
mod maps;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::io::BufReader;
use tracing::info;

use config::Config;
use error::Result;

const CONFIG_FILE: &str = "gmp.toml";

#[derive(Parser)]
#[command(name = "gmp-server")]
#[command(about = "MCP server that renders Google Maps in an embedded app view", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults to ./gmp.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory containing the built mcp-app.html
    #[arg(long, global = true)]
    asset_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve one MCP session over stdio
    Serve,
    /// Invoke renderMap locally and print the result
    Call {
        /// Latitude (-90 to 90)
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude (-180 to 180)
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Zoom level (0-21)
        #[arg(long)]
        zoom: f64,
    },
    /// Print the tool list as the server advertises it
    Tools,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.asset_dir {
        config.server.asset_dir = dir;
    }

    match cli.command {
        Some(Commands::Serve) | None => cmd_serve(&config).await,
        Some(Commands::Call { lat, lng, zoom }) => cmd_call(&config, lat, lng, zoom),
        Some(Commands::Tools) => cmd_tools(&config),
    }
}

async fn cmd_serve(config: &Config) -> Result<()> {
    let server = maps::create_server(config)?;
    info!(
        name = %config.server.name,
        assets = %config.server.asset_dir.display(),
        "serving over stdio"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    server.serve(stdin, stdout).await?;
    Ok(())
}

fn cmd_call(config: &Config, lat: f64, lng: f64, zoom: f64) -> Result<()> {
    let server = maps::create_server(config)?;
    let arguments = json!({ "lat": lat, "lng": lng, "zoom": zoom });
    let result = server.call_tool(maps::TOOL_NAME, Some(&arguments))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_tools(config: &Config) -> Result<()> {
    let server = maps::create_server(config)?;
    let tools = mcp::ListToolsResult {
        tools: server.tools().list(),
    };
    println!("{}", serde_json::to_string_pretty(&tools)?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None if Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}
