use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use dotenvy::dotenv;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use record_sources::{SourceContext, SourceKind, sample::generate_sample_rides};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

mod aggregator;
mod config;
mod dal;
mod model;
mod record_sources;
mod server;
mod utils;

const SERVICE_NAME: &str = "ridership_stats";

#[derive(Parser)]
#[command(name = "ridership_stats")]
#[command(about = "Bus ridership statistics service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the analytics API
    Serve,
    /// Print the statistics of a record source as JSON
    Summarize {
        #[arg(short, long, value_enum, default_value_t = SourceKind::Database)]
        source: SourceKind,

        /// Print the hourly chart rows instead of the overview
        #[arg(long, default_value_t = false)]
        hourly: bool,
    },
    /// Insert generated sample rides into the database
    Seed {
        /// Number of hourly slices, each one is three rides
        #[arg(short, long, default_value_t = 24)]
        count: usize,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    _ = dotenv();
    let cli = Cli::parse();
    let config = Config::load()?;

    let (_guard, provider) = init_tracing(&config)?;

    let ctx = SourceContext::new(config)?;

    let res = match cli.command {
        Commands::Serve => serve(ctx).await,
        Commands::Summarize { source, hourly } => summarize(&ctx, source, hourly).await,
        Commands::Seed { count } => seed(&ctx, count).await,
    };

    if let Err(e) = &res {
        error!("{e:?}");
    }

    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            eprintln!("error shutting down the tracer provider: {e}");
        }
    }

    res
}

/// Sets up a rolling file log, a stderr log and, when `OTLP_ENDPOINT` is
/// configured, span export over OTLP.
fn init_tracing(config: &Config) -> Result<(WorkerGuard, Option<SdkTracerProvider>)> {
    let provider = match &config.otlp_endpoint {
        Some(endpoint) => {
            let exporter = SpanExporter::builder()
                .with_tonic()
                .with_timeout(Duration::from_millis(1000))
                .with_endpoint(endpoint.clone())
                .with_protocol(opentelemetry_otlp::Protocol::Grpc)
                .build()
                .context("couldn't build the OTLP span exporter")?;

            Some(
                SdkTracerProvider::builder()
                    .with_batch_exporter(exporter)
                    .with_resource(Resource::builder().with_service_name(SERVICE_NAME).build())
                    .build(),
            )
        }
        None => None,
    };

    let telemetry_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let appender = tracing_appender::rolling::daily(&config.log_dir, "ridership_stats.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(appender);

    // A layer that logs events to rolling files.
    let file_log = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_appender)
        .with_ansi(false)
        .pretty();

    let stderr_log = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    Registry::default()
        .with(telemetry_layer)
        .with(file_log)
        .with(stderr_log)
        .with(env_filter)
        .try_init()
        .context("couldn't install the tracing subscriber")?;

    if let Some(endpoint) = &config.otlp_endpoint {
        info!("OTLP_ENDPOINT: {endpoint}");
    }

    Ok((guard, provider))
}

async fn serve(ctx: SourceContext) -> Result<()> {
    // The API still serves open data and sample statistics without a database
    if let Err(e) = sqlx::migrate!("./migrations").run(&ctx.pool).await {
        error!("couldn't run migrations, database statistics will be empty: {e}");
    }

    server::start_server(ctx).await
}

#[tracing::instrument(err, skip(ctx))]
async fn summarize(ctx: &SourceContext, source: SourceKind, hourly: bool) -> Result<()> {
    let fetched = ctx.source(source).fetch().await?;
    info!(
        "summarizing {} records from {}",
        fetched.records.len(),
        fetched.served_by
    );

    let timezone = ctx.config.timezone;
    let json = if hourly {
        serde_json::to_string_pretty(&aggregator::hourly_breakdown(&fetched.records, timezone))?
    } else {
        serde_json::to_string_pretty(&aggregator::aggregate(&fetched.records, timezone))?
    };

    println!("{json}");

    Ok(())
}

#[tracing::instrument(err, skip(ctx))]
async fn seed(ctx: &SourceContext, count: usize) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(&ctx.pool)
        .await
        .context("couldn't run migrations")?;

    let rides = generate_sample_rides(&mut rand::thread_rng(), ctx.config.timezone, count);

    let mut tx = ctx.pool.begin().await?;
    let inserted = dal::insert_rides(&rides, &mut tx).await?;
    tx.commit().await?;

    info!("inserted {inserted} sample rides");

    Ok(())
}
