use async_trait::async_trait;
use sqlx::PgPool;

use super::RecordSource;
use crate::{dal::get_rides, model::ride::RideRecord};

pub struct DatabaseSource {
    pool: PgPool,
}

impl DatabaseSource {
    pub fn new(pool: PgPool) -> Self {
        DatabaseSource { pool }
    }
}

#[async_trait]
impl RecordSource for DatabaseSource {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn fetch_records(&self) -> anyhow::Result<Vec<RideRecord>> {
        get_rides(&self.pool).await
    }
}
