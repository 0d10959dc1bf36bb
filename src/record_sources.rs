//! Where ride records come from.
//!
//! Every source yields materialized [`RideRecord`]s. Failures are handled by
//! wrapping a source in a [`FallbackSource`] so the aggregator always gets a
//! record set to work with.
pub mod database;
pub mod fallback;
pub mod open_data;
pub mod sample;

use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{config::Config, model::ride::RideRecord};

pub use database::DatabaseSource;
pub use fallback::{EmptySource, FallbackSource};
pub use open_data::OpenDataSource;
pub use sample::SampleSource;

/// Records plus the name of the source that actually produced them.
#[derive(Debug)]
pub struct FetchedRecords {
    pub served_by: &'static str,
    pub records: Vec<RideRecord>,
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_records(&self) -> anyhow::Result<Vec<RideRecord>>;

    async fn fetch(&self) -> anyhow::Result<FetchedRecords> {
        Ok(FetchedRecords {
            served_by: self.name(),
            records: self.fetch_records().await?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    #[default]
    Database,
    OpenData,
    Sample,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Database => "database",
            SourceKind::OpenData => "open-data",
            SourceKind::Sample => "sample",
        }
    }
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "database" => Ok(SourceKind::Database),
            "open-data" => Ok(SourceKind::OpenData),
            "sample" => Ok(SourceKind::Sample),
            _ => Err(anyhow!(
                "unknown record source {s:?}, expected database, open-data or sample"
            )),
        }
    }
}

/// Everything needed to build a record source.
#[derive(Clone)]
pub struct SourceContext {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub http: reqwest::Client,
}

impl SourceContext {
    /// The pool connects on first use so the open data and sample sources keep
    /// working while the database is unreachable.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(&config.database_url)
            .context("invalid DATABASE_URL")?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("couldn't build the http client")?;

        Ok(SourceContext {
            config: Arc::new(config),
            pool,
            http,
        })
    }

    /// Builds the source for `kind` with its fallback: the database falls back
    /// to no records, the open data feed to generated sample records.
    pub fn source(&self, kind: SourceKind) -> Box<dyn RecordSource> {
        let timezone = self.config.timezone;

        match kind {
            SourceKind::Database => Box::new(FallbackSource::new(
                DatabaseSource::new(self.pool.clone()),
                EmptySource,
            )),
            SourceKind::OpenData => Box::new(FallbackSource::new(
                OpenDataSource::new(
                    self.http.clone(),
                    self.config.open_data_url.clone(),
                    self.config.open_data_limit,
                    timezone,
                ),
                SampleSource::new(timezone),
            )),
            SourceKind::Sample => Box::new(SampleSource::new(timezone)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_names_round_trip() -> anyhow::Result<()> {
        for kind in [SourceKind::Database, SourceKind::OpenData, SourceKind::Sample] {
            assert_eq!(kind.as_str().parse::<SourceKind>()?, kind);
        }

        assert!("mongo".parse::<SourceKind>().is_err());

        Ok(())
    }
}
