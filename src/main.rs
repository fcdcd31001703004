//! Terminal front end for the coin dashboard

use anyhow::Context;
use clap::{Parser, Subcommand};
use coin_dashboard::{
    debounce::QueryDebouncer,
    types::CoinMarket,
    views::{CoinDetailController, DashboardController, FavoritesController},
    Config, Services,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coin-dashboard", version, about = "Cryptocurrency market dashboard")]
struct Cli {
    /// File holding persisted favorites
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Quote currency (e.g. usd, eur)
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Market data API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print request and cache statistics before exiting
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List coins by market cap
    Markets {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        per_page: Option<u32>,
        /// Only show coins whose name or symbol contains this text
        #[arg(long)]
        query: Option<String>,
    },
    /// Show detail and price history for one coin
    Coin {
        id: String,
        /// Chart window in days
        #[arg(long)]
        days: Option<u32>,
    },
    /// List favorite coins
    Favorites,
    /// Add a coin to favorites, or remove it if already there
    Toggle { id: String },
    /// Filter the listing interactively, one query per stdin line
    Search {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coin_dashboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(storage) = cli.storage {
        config.storage_path = storage;
    }
    if let Some(currency) = cli.currency {
        config.vs_currency = currency.to_lowercase();
    }
    if let Some(api_url) = cli.api_url {
        config.api_base_url = api_url;
    }

    let services =
        Services::from_config(config).context("failed to initialize market data client")?;

    match cli.command {
        Command::Markets {
            page,
            per_page,
            query,
        } => {
            let mut dashboard = DashboardController::new(services.clone());
            if let Some(per_page) = per_page {
                dashboard.set_per_page(per_page);
            }
            dashboard.go_to(page).await;
            if let Some(query) = query {
                dashboard.set_query(query);
            }
            print_dashboard(&dashboard, &services.config.vs_currency);
        }
        Command::Coin { id, days } => {
            let mut services = services.clone();
            if let Some(days) = days {
                let mut config = (*services.config).clone();
                config.chart_days = days;
                services.config = config.into();
            }
            let controller = CoinDetailController::new(services.clone());
            if let Some(view) = controller.fetch(&id).await {
                print_coin(&view, &services.config.vs_currency, controller.is_fav());
            }
        }
        Command::Favorites => {
            let mut favorites = FavoritesController::new(services.clone());
            favorites.load().await;
            if favorites.coins().is_empty() {
                println!("No favorites yet. Add one with `coin-dashboard toggle <id>`.");
            }
            for coin in favorites.coins() {
                println!("{}", format_row(coin, true, &services.config.vs_currency));
            }
        }
        Command::Toggle { id } => {
            let favorites = services
                .favorites
                .toggle(&id)
                .context("failed to save favorites")?;
            let state = if favorites.contains(&id) { "added to" } else { "removed from" };
            println!("{id} {state} favorites ({} total)", favorites.len());
        }
        Command::Search { page } => {
            let mut dashboard = DashboardController::new(services.clone());
            dashboard.go_to(page).await;
            print_dashboard(&dashboard, &services.config.vs_currency);

            let (debouncer, mut settled) = QueryDebouncer::spawn(services.config.search_debounce);
            let reader = tokio::spawn(async move {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debouncer.push(line);
                }
                debouncer.close().await;
            });

            while let Some(query) = settled.recv().await {
                dashboard.set_query(query);
                dashboard.sync_favorites().await;
                println!("--- query: {:?}", dashboard.query());
                print_dashboard(&dashboard, &services.config.vs_currency);
            }
            reader.await.context("stdin reader panicked")?;
        }
    }

    if cli.stats {
        print_stats(&services);
    }

    Ok(())
}

fn format_price(value: Option<f64>, currency: &str) -> String {
    match value {
        Some(v) if v >= 1.0 => format!("{v:.2} {}", currency.to_uppercase()),
        Some(v) => format!("{v:.6} {}", currency.to_uppercase()),
        None => "-".to_string(),
    }
}

fn format_row(coin: &CoinMarket, favorite: bool, currency: &str) -> String {
    let rank = coin
        .market_cap_rank
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    let change = coin
        .price_change_percentage_24h
        .map(|c| format!("{c:+.2}%"))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} {:>4}  {:<24} {:<8} {:>20} {:>9}",
        if favorite { "*" } else { " " },
        rank,
        coin.name,
        coin.symbol.to_uppercase(),
        format_price(coin.current_price, currency),
        change
    )
}

fn print_dashboard(dashboard: &DashboardController, currency: &str) {
    if let Some(error) = dashboard.error() {
        eprintln!("{error}");
    }
    if !dashboard.fav_coins().is_empty() {
        println!("Favorites:");
        for coin in dashboard.fav_coins() {
            println!("{}", format_row(coin, true, currency));
        }
        println!();
    }
    println!("Page {} ({} per page)", dashboard.page(), dashboard.per_page());
    for (coin, favorite) in dashboard.rows() {
        println!("{}", format_row(coin, favorite, currency));
    }
}

fn print_coin(view: &coin_dashboard::views::CoinDetailView, currency: &str, favorite: bool) {
    let Some(coin) = &view.coin else {
        eprintln!("{}", view.error.as_deref().unwrap_or("No data"));
        return;
    };

    println!(
        "{}{} ({})",
        if favorite { "* " } else { "" },
        coin.name,
        coin.symbol.to_uppercase()
    );
    println!("Price: {}", format_price(coin.price_in(currency), currency));
    if let Some(change) = coin
        .market_data
        .as_ref()
        .and_then(|m| m.price_change_percentage_24h)
    {
        println!("24h:   {change:+.2}%");
    }
    if let Some(homepage) = coin.links.homepage.iter().find(|h| !h.is_empty()) {
        println!("Web:   {homepage}");
    }

    let series = view.chart.series();
    if let (Some((low, high)), Some(first), Some(last)) =
        (view.chart.range(), series.labels.first(), series.labels.last())
    {
        println!(
            "Chart: {} points {first}..{last}, low {}, high {}",
            series.values.len(),
            format_price(Some(low), currency),
            format_price(Some(high), currency)
        );
    } else {
        println!("Chart: no data");
    }
}

fn print_stats(services: &Services) {
    for m in services.client.metrics() {
        eprintln!(
            "{:<13} requests={} failed={} p50={:.0}ms p99={:.0}ms",
            m.endpoint.as_str(),
            m.total_requests, m.failed_requests, m.latency_p50_ms, m.latency_p99_ms
        );
    }
    let cache = services.cache.stats();
    eprintln!(
        "cache         entries={} hits={} misses={} expired={}",
        cache.entries, cache.hits, cache.misses, cache.expirations
    );
}
