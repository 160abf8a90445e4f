use chrono::Utc;
use clap::{Parser, Subcommand};
use deadpool_sqlite::Pool;
use profscope::analytics::{queries, summary};
use profscope::config::{AppConfig, SessionBackend};
use profscope::listing::pagination::parse_page_number;
use profscope::listing::requests::{self, ListingQuery};
use profscope::selection::{
    MemorySelectionStore, SelectionStore, SessionContext, SqliteSelectionStore, REQUEST_FILTERS,
    SUMMARY_FILTERS,
};
use profscope::storage;
use profscope::storage::loader::LoadOptions;
use profscope::types::{Payload, RequestRecord};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "profscope", about = "Request and SQL profiling analytics")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

/// `IDENT:TYP=VALUE`, e.g. `slow:OverallTimeFilter=250`.
#[derive(Debug, Clone)]
struct FilterArg {
    ident: String,
    typ: String,
    value: String,
}

fn parse_filter_arg(s: &str) -> Result<FilterArg, String> {
    let (ident, rest) = s
        .split_once(':')
        .ok_or_else(|| format!("expected IDENT:TYP=VALUE, got {s:?}"))?;
    let (typ, value) = rest
        .split_once('=')
        .ok_or_else(|| format!("expected IDENT:TYP=VALUE, got {s:?}"))?;
    if ident.is_empty() || typ.is_empty() {
        return Err(format!("filter identifier and type must be non-empty in {s:?}"));
    }
    Ok(FilterArg {
        ident: ident.to_string(),
        typ: typ.to_string(),
        value: value.to_string(),
    })
}

#[derive(Subcommand)]
enum Command {
    /// Load captured requests from a JSON array file into the database
    Import { file: PathBuf },
    /// Delete every captured request, query and response
    Clear,
    /// Summary statistics over the session's summary filters
    Summary {
        #[arg(long)]
        session: String,
        /// Replace all filters with a time preset (15m, 1h, 6h, 24h, 7d)
        #[arg(long)]
        preset: Option<String>,
        #[arg(long)]
        clear: bool,
        #[arg(long = "filter", value_parser = parse_filter_arg)]
        filters: Vec<FilterArg>,
    },
    /// One page of the request listing
    Requests {
        #[arg(long)]
        session: String,
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        show: Option<String>,
        #[arg(long)]
        per_page: Option<String>,
        #[arg(long)]
        order_by: Option<String>,
        #[arg(long)]
        order_dir: Option<String>,
        /// JSON list of {"field", "dir"} objects
        #[arg(long)]
        sort_criteria: Option<String>,
        #[arg(long)]
        view_style: Option<String>,
        /// Restrict to one path without saving it
        #[arg(long)]
        path: Option<String>,
        #[arg(long = "filter", value_parser = parse_filter_arg)]
        filters: Vec<FilterArg>,
        #[arg(long)]
        clear_filters: bool,
    },
    /// SQL analysis and N+1 detection for one request
    Queries {
        #[arg(long)]
        request: String,
        #[arg(long)]
        threshold: Option<usize>,
    },
}

fn insert_filters(payload: &mut Payload, filters: Vec<FilterArg>) {
    for f in filters {
        payload.insert(format!("filter-{}-typ", f.ident), f.typ);
        payload.insert(format!("filter-{}-value", f.ident), f.value);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), value)?;
    println!();
    Ok(())
}

fn open_store(config: &AppConfig) -> Result<Box<dyn SelectionStore>, Box<dyn std::error::Error>> {
    Ok(match config.sessions.backend {
        SessionBackend::Sqlite => Box::new(SqliteSelectionStore::open(&config.database.path)?),
        SessionBackend::Memory => {
            tracing::warn!("memory session backend does not persist across invocations");
            Box::new(MemorySelectionStore::with_limits(
                config.sessions.max_sessions,
                config.sessions.idle_ttl(),
            ))
        }
    })
}

async fn load_batch(
    pool: &Pool,
    config: &AppConfig,
) -> Result<Vec<RequestRecord>, Box<dyn std::error::Error>> {
    let opts = LoadOptions {
        max_requests: config.loader.max_requests,
        window_hours: config.loader.window_hours,
        now: Utc::now(),
    };
    Ok(storage::loader::load_requests(pool, &opts).await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profscope=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(Some(&cli.config))?;

    tracing::debug!(db = %config.database.path.display(), "configuration loaded");

    let pool = storage::sqlite::create_pool(&config.database)?;
    storage::sqlite::init_pool(&pool).await?;

    match cli.command {
        Command::Import { file } => {
            let raw = tokio::fs::read_to_string(&file).await?;
            let records: Vec<RequestRecord> = serde_json::from_str(&raw)?;
            let written = storage::writer::write_requests(&pool, records).await?;
            tracing::info!(count = written, file = %file.display(), "imported requests");
            print_json(&serde_json::json!({ "imported": written }))?;
        }

        Command::Clear => {
            let cleared = storage::writer::clear_requests(&pool).await?;
            print_json(&serde_json::json!({ "cleared": cleared }))?;
        }

        Command::Summary {
            session,
            preset,
            clear,
            filters,
        } => {
            let store = open_store(&config)?;
            let ctx = SessionContext::new(store.as_ref(), SUMMARY_FILTERS, &session);

            let mut payload = Payload::new();
            if let Some(preset) = preset {
                payload.insert(summary::TIME_PRESET_KEY.to_string(), preset);
            }
            if clear {
                payload.insert("clear_filters".to_string(), String::new());
            }
            insert_filters(&mut payload, filters);
            if !payload.is_empty() {
                summary::apply_form(&ctx, &payload)?;
            }

            let batch = load_batch(&pool, &config).await?;
            let report = summary::summarize(&ctx, batch, Utc::now(), &config.analytics)?;
            print_json(&report)?;
        }

        Command::Requests {
            session,
            page,
            show,
            per_page,
            order_by,
            order_dir,
            sort_criteria,
            view_style,
            path,
            filters,
            clear_filters,
        } => {
            let store = open_store(&config)?;
            let ctx = SessionContext::new(store.as_ref(), REQUEST_FILTERS, &session);

            let mut payload = Payload::new();
            let params = [
                ("show", show),
                ("per_page", per_page),
                ("order_by", order_by),
                ("order_dir", order_dir),
                ("sort_criteria", sort_criteria),
                ("view_style", view_style),
            ];
            for (key, value) in params {
                if let Some(v) = value {
                    payload.insert(key.to_string(), v);
                }
            }

            // Filter edits go through the form flow; everything else is a link.
            if clear_filters || !filters.is_empty() {
                if clear_filters {
                    payload.insert("clear_filters".to_string(), String::new());
                }
                insert_filters(&mut payload, filters);
                requests::apply_form(&ctx, &payload, &config.display)?;
            } else {
                requests::apply_query_params(&ctx, &payload, &config.display)?;
            }

            let batch = load_batch(&pool, &config).await?;
            let query = ListingQuery {
                page_number: parse_page_number(page.as_deref()),
                path,
            };
            let listing = requests::list_requests(&ctx, batch, &query, Utc::now(), &config.display)?;
            print_json(&listing)?;
        }

        Command::Queries { request, threshold } => {
            let threshold = threshold.unwrap_or(config.analytics.n_plus_one_threshold).max(1);
            let Some(record) = storage::loader::load_request(&pool, request.clone()).await? else {
                return Err(format!("request not found: {request}").into());
            };
            print_json(&queries::analyze_request(&record, threshold))?;
        }
    }

    Ok(())
}
