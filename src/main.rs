use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};

use clover_inventory::{
    config::{self, AppConfig},
    events::{self, EventSender},
    pos::ConnectionSettings,
    scheduler::RefreshInterval,
    services::analytics::DashboardMetrics,
    Dashboard,
};

#[derive(Parser)]
#[command(
    name = "clover-inventory",
    about = "Inventory dashboard for a Clover merchant",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and keep the catalog in sync until interrupted
    Watch(WatchArgs),
    /// Connect once and print inventory, vendor and category rollups
    Report(ReportArgs),
}

#[derive(Args)]
struct ConnectionArgs {
    /// Use built-in demo data instead of a live merchant
    #[arg(long, conflicts_with_all = ["merchant_id", "token"])]
    demo: bool,

    #[arg(long, required_unless_present = "demo")]
    merchant_id: Option<String>,

    /// API access token; only held in memory
    #[arg(long, required_unless_present = "demo")]
    token: Option<String>,

    /// Use the production endpoint instead of the sandbox
    #[arg(long)]
    production: bool,
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Refresh period in seconds (15, 30, 60, 120 or 300)
    #[arg(long, value_parser = parse_interval)]
    interval: Option<RefreshInterval>,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Print the report as pretty JSON
    #[arg(long)]
    json: bool,
}

fn parse_interval(value: &str) -> Result<RefreshInterval, String> {
    value
        .parse::<u64>()
        .ok()
        .and_then(RefreshInterval::from_secs)
        .ok_or_else(|| format!("'{}' is not one of 15, 30, 60, 120, 300", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.structured_logs());

    let (event_sender, event_rx) = EventSender::channel(cfg.event_channel_capacity);
    tokio::spawn(events::process_events(event_rx, |note| println!("{}", note)));

    match cli.command {
        Commands::Watch(args) => watch(cfg, event_sender, args).await,
        Commands::Report(args) => report(cfg, event_sender, args).await,
    }
}

async fn connect(dashboard: &Dashboard, args: ConnectionArgs) -> Result<()> {
    if args.demo {
        dashboard.load_demo().await;
        return Ok(());
    }

    let settings = ConnectionSettings::new(
        args.token.unwrap_or_default(),
        args.merchant_id.unwrap_or_default(),
        !args.production,
    );
    dashboard
        .connect(settings)
        .await
        .context("failed to connect to Clover")?;
    Ok(())
}

async fn watch(mut cfg: AppConfig, events: EventSender, args: WatchArgs) -> Result<()> {
    if let Some(interval) = args.interval {
        cfg.refresh_interval_secs = interval.as_secs();
    }
    let dashboard = Dashboard::new(cfg, events);
    connect(&dashboard, args.connection).await?;
    log_summary(&dashboard.metrics().await);

    let interval = dashboard.scheduler().interval().await;
    let after_sync = (interval.as_secs() as u32).saturating_sub(1);
    let mut countdown = dashboard.scheduler().countdown();
    info!(%interval, "Watching catalog; press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            changed = countdown.changed() => {
                if changed.is_err() {
                    break;
                }
                // One second after each scheduled sync.
                if *countdown.borrow_and_update() == after_sync {
                    log_summary(&dashboard.metrics().await);
                }
            }
        }
    }

    dashboard.disconnect().await;
    info!("Stopped");
    Ok(())
}

async fn report(cfg: AppConfig, events: EventSender, args: ReportArgs) -> Result<()> {
    let dashboard = Dashboard::new(cfg, events);
    connect(&dashboard, args.connection).await?;
    let metrics = dashboard.metrics().await;
    dashboard.disconnect().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    let inventory = &metrics.inventory;
    println!("Items:            {}", inventory.item_count);
    println!("Inventory value:  ${:.2}", inventory.total_value);
    println!("Inventory cost:   ${:.2}", inventory.total_cost);
    println!("Expiring soon:    {}", inventory.expiring_count);
    println!("Expired:          {}", inventory.expired_count);
    println!("Low stock:        {}", inventory.low_stock_count);

    if !metrics.vendors.is_empty() {
        println!("\nVendors");
        for v in &metrics.vendors {
            let last = v
                .last_delivery
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<24} {:>3} deliveries {:>6} units  ${:>9.2}  last {}",
                v.vendor_name, v.delivery_count, v.total_quantity, v.total_spend, last
            );
        }
    }

    if !metrics.categories.is_empty() {
        println!("\nCategories");
        for c in &metrics.categories {
            println!("  {:<24} {:>3} items  ${:>9.2}", c.name, c.item_count, c.total_value);
        }
    }
    Ok(())
}

fn log_summary(metrics: &DashboardMetrics) {
    let inventory = &metrics.inventory;
    if inventory.expired_count > 0 {
        warn!(expired = inventory.expired_count, "Expired items on hand");
    }
    info!(
        items = inventory.item_count,
        total_value = %inventory.total_value.round_dp(2),
        total_cost = %inventory.total_cost.round_dp(2),
        expiring = inventory.expiring_count,
        low_stock = inventory.low_stock_count,
        "Inventory summary"
    );
}
