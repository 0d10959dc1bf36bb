use serde::{Deserialize, Serialize};

/// Summary of one aggregation pass over a set of ride records.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_ridership: u64,
    pub average_per_route: u64,
    pub peak_hour: String,
    pub top_route: String,
    /// Formatted like "3.2%"
    pub evasion_rate_percent: String,
    /// Ascending by hour, one entry per hour present in the input.
    pub hourly_trend: Vec<HourlyPoint>,
    pub payment_method_breakdown: PaymentBreakdown,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct HourlyPoint {
    pub hour: String,
    pub ridership: f64,
}

/// Share of the total ridership per payment method, in whole percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentBreakdown {
    #[serde(rename = "OMNY")]
    pub omny: u32,
    #[serde(rename = "MetroCard")]
    pub metro_card: u32,
    #[serde(rename = "NoFare")]
    pub no_fare: u32,
}

/// One row of the hourly chart series.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyBreakdown {
    pub hour: String,
    pub ridership: f64,
    pub transfers: f64,
    pub omny: f64,
    pub metrocard: f64,
    pub no_fare_recorded: f64,
    /// No Fare riders per hundred riders in this hour, one decimal.
    pub evasion_rate: String,
}
