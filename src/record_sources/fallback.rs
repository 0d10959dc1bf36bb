use async_trait::async_trait;
use tracing::{error, info};

use super::{FetchedRecords, RecordSource};
use crate::model::ride::RideRecord;

/// Serves the records of `primary`, or those of `fallback` when `primary` fails.
pub struct FallbackSource<P, F> {
    primary: P,
    fallback: F,
}

impl<P: RecordSource, F: RecordSource> FallbackSource<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        FallbackSource { primary, fallback }
    }
}

#[async_trait]
impl<P: RecordSource, F: RecordSource> RecordSource for FallbackSource<P, F> {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn fetch_records(&self) -> anyhow::Result<Vec<RideRecord>> {
        Ok(self.fetch().await?.records)
    }

    async fn fetch(&self) -> anyhow::Result<FetchedRecords> {
        match self.primary.fetch().await {
            Ok(fetched) => Ok(fetched),
            Err(e) => {
                error!(
                    "{:?}",
                    e.context(format!("error fetching records from {}", self.primary.name()))
                );
                info!("falling back to {} records", self.fallback.name());
                self.fallback.fetch().await
            }
        }
    }
}

/// A source without any records.
pub struct EmptySource;

#[async_trait]
impl RecordSource for EmptySource {
    fn name(&self) -> &'static str {
        "empty"
    }

    async fn fetch_records(&self) -> anyhow::Result<Vec<RideRecord>> {
        Ok(vec![])
    }
}
