use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use lexiloot_server::{Api, Service, ServiceConfig};
use lexiloot_types::{InventoryEntry, DEFAULT_FULFILLMENT_DELAY_MS};

#[derive(Parser, Debug)]
#[command(name = "lexiloot-server", about = "Ad-gated word game backend")]
struct Args {
    /// Port for the HTTP API.
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// SQLite database path. Omit to keep all state in memory.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Delay before a pending redemption is settled against inventory.
    #[arg(long, default_value_t = DEFAULT_FULFILLMENT_DELAY_MS)]
    fulfillment_delay_ms: u64,
    /// JSON file of gift-card inventory entries to stock at startup.
    #[arg(long)]
    inventory: Option<PathBuf>,
    /// Fixed word-selection seed for replayable runs.
    #[arg(long)]
    deterministic_seed: Option<u64>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();
}

fn build_config(args: &Args) -> Result<ServiceConfig> {
    let extra_inventory = match &args.inventory {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read inventory file {}", path.display()))?;
            let entries: Vec<InventoryEntry> =
                serde_json::from_str(&raw).context("parse inventory file")?;
            entries
        }
        None => Vec::new(),
    };
    Ok(ServiceConfig {
        db_path: args.db.clone(),
        fulfillment_delay: Duration::from_millis(args.fulfillment_delay_ms),
        deterministic_seed: args.deterministic_seed,
        extra_inventory,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = build_config(&args)?;
    let service = Service::build(config)?;
    let api = Api::new(service);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind http listener on {addr}"))?;
    info!(%addr, "serving lexiloot backend");
    axum::serve(listener, api.router())
        .await
        .context("serve http")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let args = Args::parse_from(["lexiloot-server"]);
        let config = build_config(&args).expect("config should build");
        assert_eq!(args.port, 8080);
        assert!(config.db_path.is_none());
        assert_eq!(
            config.fulfillment_delay,
            Duration::from_millis(DEFAULT_FULFILLMENT_DELAY_MS)
        );
        assert!(config.extra_inventory.is_empty());
    }

    #[test]
    fn parses_inventory_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock.json");
        std::fs::write(
            &path,
            r#"[{"id":"inv_9","method":"robux","value_usd":10,"code":"RBX-TEST-0001","used":false}]"#,
        )
        .unwrap();
        let args = Args::parse_from([
            "lexiloot-server",
            "--inventory",
            path.to_str().unwrap(),
            "--fulfillment-delay-ms",
            "250",
        ]);
        let config = build_config(&args).expect("config should build");
        assert_eq!(config.extra_inventory.len(), 1);
        assert_eq!(config.extra_inventory[0].code, "RBX-TEST-0001");
        assert_eq!(config.fulfillment_delay, Duration::from_millis(250));
    }

    #[test]
    fn missing_inventory_file_is_an_error() {
        let args = Args::parse_from(["lexiloot-server", "--inventory", "/nonexistent/stock.json"]);
        assert!(build_config(&args).is_err());
    }
}
