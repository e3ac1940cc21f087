use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use trellis_sync::{DiagramServerConfig, DEFAULT_CONFIG_NAME};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Client id sent with every message
    #[arg(short, long, default_value = "trellis-client")]
    pub client_id: String,

    /// Let the authority compute layout from measured bounds
    #[arg(short, long)]
    pub server_layout: bool,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let mut config = DiagramServerConfig::new(args.client_id);
    config.needs_server_layout = args.server_layout;

    fs::write(&config_path, config.to_json_pretty()?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!("    client id:     {}", config.client_id.bright_white());
    println!(
        "    layout:        {}",
        if config.needs_server_layout {
            "server"
        } else {
            "client"
        }
    );
    println!();
    println!("Next steps:");
    println!("  1. Write a replay script (one JSON step per line)");
    println!("  2. Run: trellis replay script.jsonl");

    Ok(())
}
