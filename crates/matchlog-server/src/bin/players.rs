//! Print the roster of the most recent match file.

use anyhow::{Context, Result};
use clap::Parser;
use matchlog_core::{load, profile_links_for, DisabledLookup, MatchLookup, MatchStore, OpenDotaClient, RosterExtractor};
use matchlog_server::config::Config;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "matchlog-players")]
#[command(about = "Show the players of the most recently recorded match")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the directory match files are read from
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Disable roster lookups against OpenDota
    #[arg(long)]
    no_lookup: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    let store = MatchStore::new(&config.output_dir);
    let Some(path) = store.latest_record_path()? else {
        println!("No match files found in {}.", config.output_dir.display());
        return Ok(());
    };

    let record = load(&path).with_context(|| format!("Failed to read {}", path.display()))?;

    let lookup: Arc<dyn MatchLookup> = if config.lookup.enabled && !cli.no_lookup {
        Arc::new(OpenDotaClient::new(config.lookup.base_url.clone(), config.lookup.timeout())?)
    } else {
        Arc::new(DisabledLookup)
    };
    let players = RosterExtractor::new(lookup)
        .extract(&record.last_snapshot, record.session_id.as_ref())
        .await;

    if players.is_empty() {
        println!("No players found in {}.", path.display());
        return Ok(());
    }

    println!("Players in {} ({}):", path.display(), players.len());
    println!("{}", "=".repeat(80));
    for (i, player) in players.iter().enumerate() {
        println!("{}. {}", i + 1, player.display_name());
        println!("   SteamID: {}", player.steam_id);
        println!(
            "   Team: {}",
            player.side.map(|s| s.as_str()).unwrap_or("N/A")
        );
        if let Some(links) = profile_links_for(player.steam_id) {
            println!("   Dotabuff: {}", links.dotabuff);
            println!("   OpenDota: {}", links.opendota);
        }
        println!();
    }

    Ok(())
}
