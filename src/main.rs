use anyhow::Result;
use clap::{Parser, Subcommand};
use diesel_scout::collectors::{links, CollectionSession};
use diesel_scout::config::Config;
use diesel_scout::run_guard::RunGuard;
use diesel_scout::scheduler;
use diesel_scout::server::{self, AppState};
use diesel_scout::store::AdvertisementStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "diesel-scout")]
#[command(about = "Classic Mercedes diesel advertisement finder")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "diesel-scout.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the listing API together with the daily scheduler
    Serve {
        /// Override the configured listen address
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Run one collection pass and exit
    Scrape {
        /// Restrict the run to one country code (e.g. DE)
        #[arg(long)]
        country: Option<String>,
    },
    /// Insert search-redirect links for marketplaces that block scraping
    SeedLinks,
    /// Print store statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve { listen } => {
            if let Some(listen) = listen {
                config.http.listen_addr = listen;
            }
            let config = Arc::new(config);
            let store = AdvertisementStore::connect(&config.database.path).await?;
            let guard = Arc::new(RunGuard::default());

            info!("diesel-scout — classic Mercedes diesel finder");
            info!(
                "Daily collection scheduled at {}",
                config.schedule.daily_at
            );

            let scheduler_task = tokio::spawn(scheduler::run_daily(
                config.clone(),
                store.clone(),
                guard.clone(),
            ));

            let result = server::serve(AppState {
                store,
                config,
                guard,
            })
            .await;
            scheduler_task.abort();
            result
        }
        Commands::Scrape { country } => {
            let store = AdvertisementStore::connect(&config.database.path).await?;
            let session = CollectionSession::new(&config, store.clone())?;
            info!("Starting collection run");
            let report = session.run(country.as_deref()).await;
            info!(
                found = report.found,
                saved = report.saved,
                rejected = report.rejected,
                failed_queries = report.failed_queries,
                "Scrape finished"
            );
            Ok(())
        }
        Commands::SeedLinks => {
            let store = AdvertisementStore::connect(&config.database.path).await?;
            let seeded = links::seed_search_links(&store).await?;
            info!(seeded, "Search links seeded");
            Ok(())
        }
        Commands::Stats => {
            let store = AdvertisementStore::connect(&config.database.path).await?;
            let years = config.search.inclusion_years();
            let stats = store.statistics(&years, config.search.min_price).await?;
            println!("Active advertisements: {}", stats.total_active);
            for (country, count) in &stats.by_country {
                println!("  {country}: {count}");
            }
            match stats.last_update {
                Some(last) => println!("Last update: {last}"),
                None => println!("Last update: never"),
            }
            Ok(())
        }
    }
}
