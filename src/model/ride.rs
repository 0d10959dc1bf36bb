use std::{convert::Infallible, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::lenient_count;

/// One observed boarding event.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRecord {
    pub route: String,
    pub timestamp: DateTime<Utc>,
    /// Riders attributed to this record. Negative or non-finite counts are
    /// treated as zero when aggregating, and so are null or unparseable ones.
    #[serde(
        default = "default_ridership_count",
        deserialize_with = "lenient_count"
    )]
    pub ridership_count: f64,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    /// Only the open data feed and the sample generator fill this in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfers: Option<f64>,
}

fn default_ridership_count() -> f64 {
    1.0
}

impl RideRecord {
    pub fn new(
        route: impl Into<String>,
        timestamp: DateTime<Utc>,
        ridership_count: f64,
        payment_method: PaymentMethod,
    ) -> Self {
        RideRecord {
            route: route.into(),
            timestamp,
            ridership_count,
            payment_method,
            latitude: None,
            longitude: None,
            vehicle_id: None,
            transfers: None,
        }
    }

    /// The ridership count clamped to something that can be summed.
    pub fn effective_ridership(&self) -> f64 {
        if self.ridership_count.is_finite() && self.ridership_count > 0.0 {
            self.ridership_count
        } else {
            0.0
        }
    }
}

/// How the riders of a [`RideRecord`] paid.
///
/// Anything outside the three known methods is kept verbatim in `Unknown`
/// so it still counts toward the total ridership.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Omny,
    MetroCard,
    NoFare,
    Unknown(String),
}

impl PaymentMethod {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Omny => "OMNY",
            PaymentMethod::MetroCard => "MetroCard",
            PaymentMethod::NoFare => "No Fare",
            PaymentMethod::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PaymentMethod::Unknown(_))
    }
}

impl FromStr for PaymentMethod {
    type Err = Infallible;

    /// Accepts both the stored spellings ("OMNY", "MetroCard", "No Fare") and
    /// the open data ones ("omny", "metrocard").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        let method = match normalized.as_str() {
            "omny" => PaymentMethod::Omny,
            "metrocard" => PaymentMethod::MetroCard,
            "nofare" => PaymentMethod::NoFare,
            _ => PaymentMethod::Unknown(s.to_string()),
        };

        Ok(method)
    }
}

impl From<&str> for PaymentMethod {
    fn from(value: &str) -> Self {
        let Ok(method) = value.parse::<PaymentMethod>();
        method
    }
}

impl Serialize for PaymentMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PaymentMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s: String = Deserialize::deserialize(deserializer)?;
        Ok(PaymentMethod::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_and_open_data_spellings() {
        assert_eq!(PaymentMethod::from("OMNY"), PaymentMethod::Omny);
        assert_eq!(PaymentMethod::from("omny"), PaymentMethod::Omny);
        assert_eq!(PaymentMethod::from("MetroCard"), PaymentMethod::MetroCard);
        assert_eq!(PaymentMethod::from("metrocard"), PaymentMethod::MetroCard);
        assert_eq!(PaymentMethod::from("No Fare"), PaymentMethod::NoFare);
        assert_eq!(PaymentMethod::from("NoFare"), PaymentMethod::NoFare);
        assert_eq!(PaymentMethod::from("no_fare"), PaymentMethod::NoFare);
        assert_eq!(
            PaymentMethod::from("Cash"),
            PaymentMethod::Unknown("Cash".to_string())
        );
    }

    #[test]
    fn ridership_defaults_to_one_when_absent() -> anyhow::Result<()> {
        let record: RideRecord = serde_json::from_str(
            r#"{"route":"M15","timestamp":"2024-01-01T13:00:00Z","paymentMethod":"No Fare"}"#,
        )?;

        assert_eq!(record.ridership_count, 1.0);
        assert_eq!(record.payment_method, PaymentMethod::NoFare);
        assert_eq!(record.vehicle_id, None);

        Ok(())
    }

    #[test]
    fn null_and_text_counts_are_lenient() -> anyhow::Result<()> {
        let base = r#""route":"M15","timestamp":"2024-01-01T13:00:00Z","paymentMethod":"OMNY""#;

        let null: RideRecord = serde_json::from_str(&format!(r#"{{{base},"ridershipCount":null}}"#))?;
        assert_eq!(null.ridership_count, 0.0);

        let text: RideRecord = serde_json::from_str(&format!(r#"{{{base},"ridershipCount":"3"}}"#))?;
        assert_eq!(text.ridership_count, 3.0);

        let garbage: RideRecord =
            serde_json::from_str(&format!(r#"{{{base},"ridershipCount":"lots"}}"#))?;
        assert_eq!(garbage.ridership_count, 0.0);

        let number: RideRecord = serde_json::from_str(&format!(r#"{{{base},"ridershipCount":2}}"#))?;
        assert_eq!(number.ridership_count, 2.0);

        Ok(())
    }

    #[test]
    fn invalid_counts_are_ignored() {
        let mut record = RideRecord::new("M15", Utc::now(), -4.0, PaymentMethod::Omny);
        assert_eq!(record.effective_ridership(), 0.0);

        record.ridership_count = f64::NAN;
        assert_eq!(record.effective_ridership(), 0.0);

        record.ridership_count = 2.5;
        assert_eq!(record.effective_ridership(), 2.5);
    }
}
