use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use adsync_core::AppConfig;
use adsync_creative::{CreativeService, EnrichOptions, ServiceOptions};
use adsync_db::PgCreativeStore;
use adsync_graph::GraphClient;

#[derive(Debug, Parser)]
#[command(name = "adsync")]
#[command(about = "Ad creative sync: fetch, classify, enrich, and cache creatives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch one creative (served from the store when fresh).
    Fetch {
        #[arg(long)]
        creative_id: String,
        #[arg(long)]
        account_id: String,
        /// Bypass the freshness window and re-fetch unconditionally.
        #[arg(long)]
        force: bool,
    },
    /// Smart-refresh one creative's media from its stored shape.
    Refresh {
        #[arg(long)]
        creative_id: String,
        #[arg(long)]
        account_id: String,
    },
    /// Force-fetch every creative referenced by analytics in a date range.
    SyncRange {
        #[arg(long)]
        client_id: i64,
        #[arg(long)]
        account_id: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Run pending database migrations and exit.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = adsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let pool_config = adsync_db::PoolConfig::from_app_config(&config);
    let pool = adsync_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Migrate => {
            let applied = adsync_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Fetch {
            creative_id,
            account_id,
            force,
        } => {
            let (service, token) = build_service(&config, pool)?;
            match service.get(&creative_id, &account_id, &token, force).await? {
                Some(record) => {
                    println!(
                        "{} [{} / {}] images={} videos={} previews={}",
                        record.creative_id,
                        record.assembly_mode.as_str(),
                        record.media_type.as_str(),
                        record.image_urls.len(),
                        record.video_urls.len(),
                        record.preview_fragments.len(),
                    );
                }
                None => println!("creative {creative_id} could not be fetched"),
            }
        }
        Commands::Refresh {
            creative_id,
            account_id,
        } => {
            let (service, token) = build_service(&config, pool)?;
            match service.refresh(&creative_id, &account_id, &token).await? {
                Some(record) => {
                    println!(
                        "{} refreshed: images={} videos={} previews={}",
                        record.creative_id,
                        record.image_urls.len(),
                        record.video_urls.len(),
                        record.preview_fragments.len(),
                    );
                }
                None => println!("creative {creative_id} could not be refreshed"),
            }
        }
        Commands::SyncRange {
            client_id,
            account_id,
            start,
            end,
        } => {
            let (service, token) = build_service(&config, pool)?;
            let outcome = service
                .fetch_and_save_for_date_range(client_id, &account_id, &token, start, end)
                .await?;
            println!(
                "synced {} creative(s), {} failed, {} referenced in range",
                outcome.saved,
                outcome.failed,
                outcome.creative_ids.len(),
            );
        }
    }

    Ok(())
}

/// Wires the service from config: Postgres store, Graph client, and the
/// access token every command needs.
fn build_service(
    config: &AppConfig,
    pool: sqlx::PgPool,
) -> anyhow::Result<(CreativeService<PgCreativeStore>, String)> {
    let token = config
        .graph_access_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("GRAPH_ACCESS_TOKEN is not set"))?;
    let graph = GraphClient::new(
        config.graph_request_timeout_secs,
        config.graph_max_retries,
        config.graph_retry_backoff_base_ms,
    )?;
    let service = CreativeService::new(
        PgCreativeStore::new(pool),
        graph,
        ServiceOptions {
            cache_ttl_days: config.cache_ttl_days,
            fetch_concurrency: config.fetch_concurrency,
            enrich: EnrichOptions {
                resolve_feed_videos: config.resolve_feed_videos,
            },
        },
    );
    Ok((service, token))
}
