use anyhow::{Error, bail};
use itertools::Itertools;
use sqlx::{Pool, Postgres, QueryBuilder, Transaction, query_as};
use tracing::{Instrument, info_span};

use crate::model::{db_model::RideDb, ride::RideRecord};

/// Returns every stored ride
#[tracing::instrument(err, skip(pool))]
pub async fn get_rides(pool: &Pool<Postgres>) -> Result<Vec<RideRecord>, Error> {
    let rides: Vec<RideDb> = query_as(
        r#"SELECT
        route,
        "timestamp",
        ridership,
        payment_method,
        latitude,
        longitude,
        vehicle_id,
        transfers
        from bus_rides"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rides.into_iter().map(RideRecord::from).collect_vec())
}

/// Inserts the rides in batches and returns how many rows were written.
/// Rides with a payment method the table doesn't accept are refused up front.
#[tracing::instrument(err, skip(rides, tx), fields(ride_count = rides.len()))]
pub async fn insert_rides(
    rides: &[RideRecord],
    tx: &mut Transaction<'_, Postgres>,
) -> Result<u64, Error> {
    if let Some(ride) = rides.iter().find(|r| !r.payment_method.is_known()) {
        bail!(
            "refusing to store ride on route {} with payment method {:?}",
            ride.route,
            ride.payment_method.as_str()
        );
    }

    let mut inserted = 0;

    for chunk in rides.chunks(1024) {
        let mut query_builder = QueryBuilder::new(
            r#"INSERT INTO bus_rides (
                route,
                "timestamp",
                ridership,
                payment_method,
                latitude,
                longitude,
                vehicle_id,
                transfers
            )"#,
        );

        query_builder.push_values(chunk, |mut b, ride| {
            b.push_bind(&ride.route)
                .push_bind(ride.timestamp)
                .push_bind(ride.ridership_count)
                .push_bind(ride.payment_method.as_str())
                .push_bind(ride.latitude)
                .push_bind(ride.longitude)
                .push_bind(&ride.vehicle_id)
                .push_bind(ride.transfers);
        });

        inserted += query_builder
            .build()
            .execute(&mut **tx)
            .instrument(info_span!("Inserting rides"))
            .await?
            .rows_affected();
    }

    Ok(inserted)
}
