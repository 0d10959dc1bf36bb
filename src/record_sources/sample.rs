//! Generated records for when there is nothing real to show.
use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use rand::{Rng, seq::SliceRandom};

use super::RecordSource;
use crate::model::ride::{PaymentMethod, RideRecord};

pub const SAMPLE_ROUTES: [&str; 5] = ["M15", "M34", "M42", "M86", "M116"];

/// One day worth of hourly slices
pub const HOURS_PER_DAY: usize = 24;

pub struct SampleSource {
    timezone: Tz,
}

impl SampleSource {
    pub fn new(timezone: Tz) -> Self {
        SampleSource { timezone }
    }
}

#[async_trait]
impl RecordSource for SampleSource {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn fetch_records(&self) -> anyhow::Result<Vec<RideRecord>> {
        Ok(generate_sample_rides(
            &mut rand::thread_rng(),
            self.timezone,
            HOURS_PER_DAY,
        ))
    }
}

/// Generates `slices` consecutive hourly slices starting at midnight of
/// 2024-01-01 in `timezone`. Every slice is one random route with an OMNY,
/// a MetroCard and a No Fare record.
pub fn generate_sample_rides<R: Rng + ?Sized>(
    rng: &mut R,
    timezone: Tz,
    slices: usize,
) -> Vec<RideRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let mut rides = Vec::with_capacity(slices * 3);

    for slice in 0..slices {
        let Some(timestamp) = start
            .checked_add_days(Days::new((slice / HOURS_PER_DAY) as u64))
            .and_then(|date| {
                NaiveTime::from_hms_opt((slice % HOURS_PER_DAY) as u32, 0, 0)
                    .map(|time| date.and_time(time))
            })
            .and_then(|local| local.and_local_timezone(timezone).earliest())
            .map(|local| local.with_timezone(&Utc))
        else {
            // skipped by a DST transition
            continue;
        };

        let route = *SAMPLE_ROUTES.choose(rng).unwrap_or(&SAMPLE_ROUTES[0]);

        let mut omny = RideRecord::new(
            route,
            timestamp,
            rng.gen_range(0..3000) as f64,
            PaymentMethod::Omny,
        );
        omny.transfers = Some(rng.gen_range(0..500) as f64);

        let metro_card = RideRecord::new(
            route,
            timestamp,
            rng.gen_range(0..2000) as f64,
            PaymentMethod::MetroCard,
        );
        let no_fare = RideRecord::new(
            route,
            timestamp,
            rng.gen_range(0..200) as f64,
            PaymentMethod::NoFare,
        );

        rides.extend([omny, metro_card, no_fare]);
    }

    rides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use chrono_tz::America::New_York;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn one_day_of_samples() {
        let rides = generate_sample_rides(&mut StdRng::seed_from_u64(7), New_York, HOURS_PER_DAY);

        assert_eq!(rides.len(), 72);
        assert!(rides.iter().all(|r| SAMPLE_ROUTES.contains(&r.route.as_str())));

        for ride in &rides {
            let limit = match ride.payment_method {
                PaymentMethod::Omny => 3000.0,
                PaymentMethod::MetroCard => 2000.0,
                PaymentMethod::NoFare => 200.0,
                PaymentMethod::Unknown(_) => panic!("sample with unknown payment method"),
            };
            assert!((0.0..limit).contains(&ride.ridership_count));
        }

        let stats = aggregate(&rides, New_York);
        assert_eq!(stats.hourly_trend.len(), 24);
        assert_eq!(stats.hourly_trend[0].hour, "0:00");
    }

    #[test]
    fn slices_past_a_day_roll_over() {
        let rides = generate_sample_rides(&mut StdRng::seed_from_u64(7), New_York, 30);

        assert_eq!(rides.len(), 90);
        assert!(rides.last().unwrap().timestamp > rides.first().unwrap().timestamp);
    }

    #[tokio::test]
    async fn sample_source_serves_a_day() -> anyhow::Result<()> {
        let fetched = SampleSource::new(New_York).fetch().await?;

        assert_eq!(fetched.served_by, "sample");
        assert_eq!(fetched.records.len(), 72);

        Ok(())
    }
}
