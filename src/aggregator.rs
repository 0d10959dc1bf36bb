//! Turns ride records into the statistics shown on the dashboard.
//!
//! Everything in here is a pure function of its input. Every record source
//! and every output (HTTP, CLI) goes through these functions.
use std::collections::{BTreeMap, HashMap};

use chrono::Timelike;
use chrono_tz::Tz;
use tracing::warn;

use crate::{
    model::{
        ride::{PaymentMethod, RideRecord},
        stats::{AggregateStats, HourlyBreakdown, HourlyPoint, PaymentBreakdown},
    },
    utils::{hour_label, percent_one_decimal},
};

/// Route reported when there is no ridership at all.
pub const NO_ROUTE: &str = "N/A";

/// Computes the [`AggregateStats`] of `records`.
///
/// Hours are local calendar hours in `timezone`. Ties for the peak hour and
/// the top route go to the first one seen: hours are visited in ascending
/// order, routes in the order they first appear in `records`.
#[tracing::instrument(skip_all, fields(record_count = records.len()))]
pub fn aggregate(records: &[RideRecord], timezone: Tz) -> AggregateStats {
    let mut total = 0.0;
    let mut by_hour: BTreeMap<u32, f64> = BTreeMap::new();
    let mut by_route = RouteTotals::default();
    let mut by_method = MethodTotals::default();

    for record in records {
        let riders = record.effective_ridership();
        total += riders;

        *by_hour.entry(local_hour(record, timezone)).or_default() += riders;
        by_route.add(&record.route, riders);
        by_method.add(&record.payment_method, riders);
    }

    if by_method.unknown > 0.0 {
        warn!(
            unknown_ridership = by_method.unknown,
            "riders with an unknown payment method are excluded from the payment breakdown"
        );
    }

    let route_count = by_route.len();
    let average_per_route = if route_count > 0 {
        (total / route_count as f64).round() as u64
    } else {
        0
    };

    let mut peak_hour = 0;
    let mut peak_ridership = 0.0;
    for (&hour, &riders) in &by_hour {
        if riders > peak_ridership {
            peak_ridership = riders;
            peak_hour = hour;
        }
    }

    let evasion_rate_percent = if total > 0.0 {
        format!("{}%", percent_one_decimal(by_method.no_fare, total))
    } else {
        "0%".to_string()
    };

    AggregateStats {
        total_ridership: total.floor() as u64,
        average_per_route,
        peak_hour: hour_label(peak_hour),
        top_route: by_route.top().unwrap_or(NO_ROUTE).to_string(),
        evasion_rate_percent,
        hourly_trend: by_hour
            .into_iter()
            .map(|(hour, ridership)| HourlyPoint {
                hour: hour_label(hour),
                ridership,
            })
            .collect(),
        payment_method_breakdown: PaymentBreakdown {
            omny: percent_of(by_method.omny, total),
            metro_card: percent_of(by_method.metro_card, total),
            no_fare: percent_of(by_method.no_fare, total),
        },
    }
}

/// Builds the per-hour chart rows, ascending by hour.
///
/// Riders with an unknown payment method only show up in `ridership`.
#[tracing::instrument(skip_all, fields(record_count = records.len()))]
pub fn hourly_breakdown(records: &[RideRecord], timezone: Tz) -> Vec<HourlyBreakdown> {
    let mut by_hour: BTreeMap<u32, HourlyBreakdown> = BTreeMap::new();

    for record in records {
        let hour = local_hour(record, timezone);
        let riders = record.effective_ridership();
        let row = by_hour.entry(hour).or_insert_with(|| HourlyBreakdown {
            hour: hour_label(hour),
            ..Default::default()
        });

        row.ridership += riders;
        row.transfers += record
            .transfers
            .filter(|t| t.is_finite() && *t > 0.0)
            .unwrap_or(0.0);

        match record.payment_method {
            PaymentMethod::Omny => row.omny += riders,
            PaymentMethod::MetroCard => row.metrocard += riders,
            PaymentMethod::NoFare => row.no_fare_recorded += riders,
            PaymentMethod::Unknown(_) => {}
        }
    }

    by_hour
        .into_values()
        .map(|mut row| {
            let denominator = if row.ridership > 0.0 { row.ridership } else { 1.0 };
            row.evasion_rate = percent_one_decimal(row.no_fare_recorded, denominator);
            row
        })
        .collect()
}

fn local_hour(record: &RideRecord, timezone: Tz) -> u32 {
    record.timestamp.with_timezone(&timezone).hour()
}

fn percent_of(part: f64, total: f64) -> u32 {
    if total > 0.0 {
        (part / total * 100.0).round() as u32
    } else {
        0
    }
}

/// Ridership per route, remembering the order routes were first seen in.
#[derive(Default)]
struct RouteTotals<'a> {
    index: HashMap<&'a str, usize>,
    totals: Vec<(&'a str, f64)>,
}

impl<'a> RouteTotals<'a> {
    fn add(&mut self, route: &'a str, riders: f64) {
        match self.index.get(route) {
            Some(&i) => self.totals[i].1 += riders,
            None => {
                self.index.insert(route, self.totals.len());
                self.totals.push((route, riders));
            }
        }
    }

    fn len(&self) -> usize {
        self.totals.len()
    }

    /// The first route with the highest ridership, if any route has riders.
    fn top(&self) -> Option<&'a str> {
        let mut top = None;
        let mut max = 0.0;

        for &(route, riders) in &self.totals {
            if riders > max {
                max = riders;
                top = Some(route);
            }
        }

        top
    }
}

#[derive(Default)]
struct MethodTotals {
    omny: f64,
    metro_card: f64,
    no_fare: f64,
    unknown: f64,
}

impl MethodTotals {
    fn add(&mut self, method: &PaymentMethod, riders: f64) {
        match method {
            PaymentMethod::Omny => self.omny += riders,
            PaymentMethod::MetroCard => self.metro_card += riders,
            PaymentMethod::NoFare => self.no_fare += riders,
            PaymentMethod::Unknown(_) => self.unknown += riders,
        }
    }
}
