use axum::{
    Json,
    extract::{Query, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::AppError;
use crate::{
    aggregator::{aggregate, hourly_breakdown},
    record_sources::{FetchedRecords, SourceContext, SourceKind},
};

pub const RECORD_SOURCE_HEADER: &str = "x-record-source";

#[derive(Debug, Default, Deserialize)]
pub struct SourceQuery {
    source: Option<String>,
}

impl SourceQuery {
    fn kind(&self) -> Result<SourceKind, AppError> {
        match self.source.as_deref() {
            Some(raw) => raw.parse().map_err(AppError::InvalidSource),
            None => Ok(SourceKind::default()),
        }
    }
}

/// GET /api/analytics/overview
#[tracing::instrument(skip(ctx))]
pub async fn overview_handler(
    State(ctx): State<SourceContext>,
    Query(query): Query<SourceQuery>,
) -> Result<Response, AppError> {
    let fetched = fetch(&ctx, query.kind()?).await?;
    let stats = aggregate(&fetched.records, ctx.config.timezone);

    Ok(with_source_header(stats, fetched.served_by))
}

/// GET /api/analytics/hourly
#[tracing::instrument(skip(ctx))]
pub async fn hourly_handler(
    State(ctx): State<SourceContext>,
    Query(query): Query<SourceQuery>,
) -> Result<Response, AppError> {
    let fetched = fetch(&ctx, query.kind()?).await?;
    let rows = hourly_breakdown(&fetched.records, ctx.config.timezone);

    Ok(with_source_header(rows, fetched.served_by))
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn fetch(ctx: &SourceContext, kind: SourceKind) -> anyhow::Result<FetchedRecords> {
    ctx.source(kind).fetch().await
}

fn with_source_header<T: Serialize>(body: T, served_by: &'static str) -> Response {
    let mut response = Json(body).into_response();

    response
        .headers_mut()
        .insert(RECORD_SOURCE_HEADER, HeaderValue::from_static(served_by));

    response
}
