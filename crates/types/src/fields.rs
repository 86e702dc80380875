//! Field enumerations for the transaction schema.
//!
//! The declared order of [`NumericField::ALL`] and [`CategoricalField::ALL`]
//! fixes the column order of every feature vector, so it must never be
//! reshuffled once a model has been trained.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the opaque identifier column.
pub const TXN_ID_FIELD: &str = "txn_id";

/// Name of the label column in training data.
pub const LABEL_FIELD: &str = "status";

/// Separator between a categorical field and its value in indicator names.
pub const INDICATOR_SEPARATOR: char = '_';

/// Numeric attributes copied verbatim into the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Amount,
    NetworkLatencyMs,
    Hour,
    RecentFailRateSrcDest5m,
    PspSuccessRate5m,
}

impl NumericField {
    /// Declared order; numeric columns always lead the column list in this order.
    pub const ALL: [NumericField; 5] = [
        NumericField::Amount,
        NumericField::NetworkLatencyMs,
        NumericField::Hour,
        NumericField::RecentFailRateSrcDest5m,
        NumericField::PspSuccessRate5m,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericField::Amount => "amount",
            NumericField::NetworkLatencyMs => "network_latency_ms",
            NumericField::Hour => "hour",
            NumericField::RecentFailRateSrcDest5m => "recent_fail_rate_src_dest_5m",
            NumericField::PspSuccessRate5m => "psp_success_rate_5m",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Categorical attributes expanded into one indicator column per observed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    App,
    PspCandidate,
    SrcBank,
    DestBank,
    Channel,
    DeviceType,
    Weekday,
}

impl CategoricalField {
    /// Declared order; indicator columns are grouped by field in this order.
    pub const ALL: [CategoricalField; 7] = [
        CategoricalField::App,
        CategoricalField::PspCandidate,
        CategoricalField::SrcBank,
        CategoricalField::DestBank,
        CategoricalField::Channel,
        CategoricalField::DeviceType,
        CategoricalField::Weekday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CategoricalField::App => "app",
            CategoricalField::PspCandidate => "psp_candidate",
            CategoricalField::SrcBank => "src_bank",
            CategoricalField::DestBank => "dest_bank",
            CategoricalField::Channel => "channel",
            CategoricalField::DeviceType => "device_type",
            CategoricalField::Weekday => "weekday",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Indicator column name for one observed value, `<field>_<value>`.
    pub fn indicator_name(self, value: &str) -> String {
        format!("{}{}{}", self.name(), INDICATOR_SEPARATOR, value)
    }

    /// Recover `(field, value)` from an indicator column name.
    ///
    /// The split happens at the first separator that follows a known field
    /// name, so field names may contain the separator themselves
    /// (`psp_candidate_HDFC_PSP` resolves to `psp_candidate` / `HDFC_PSP`).
    /// No declared field name is a separator-prefix of another one.
    pub fn split_indicator(name: &str) -> Option<(Self, &str)> {
        Self::ALL.into_iter().find_map(|field| {
            name.strip_prefix(field.name())
                .and_then(|rest| rest.strip_prefix(INDICATOR_SEPARATOR))
                .map(|value| (field, value))
        })
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every column a training file must carry.
pub fn required_training_fields() -> Vec<&'static str> {
    NumericField::ALL
        .iter()
        .map(|field| field.name())
        .chain(CategoricalField::ALL.iter().map(|field| field.name()))
        .chain(std::iter::once(LABEL_FIELD))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for field in NumericField::ALL {
            assert_eq!(NumericField::from_name(field.name()), Some(field));
        }
        for field in CategoricalField::ALL {
            assert_eq!(CategoricalField::from_name(field.name()), Some(field));
        }
        assert_eq!(NumericField::from_name("status"), None);
    }

    #[test]
    fn split_indicator_handles_underscored_fields() {
        assert_eq!(
            CategoricalField::split_indicator("psp_candidate_HDFC_PSP"),
            Some((CategoricalField::PspCandidate, "HDFC_PSP"))
        );
        assert_eq!(
            CategoricalField::split_indicator("app_GooglePay"),
            Some((CategoricalField::App, "GooglePay"))
        );
        assert_eq!(
            CategoricalField::split_indicator("weekday_3"),
            Some((CategoricalField::Weekday, "3"))
        );
        assert_eq!(CategoricalField::split_indicator("appGooglePay"), None);
        assert_eq!(CategoricalField::split_indicator("merchant_42"), None);
    }

    #[test]
    fn no_field_is_a_separator_prefix_of_another() {
        for a in CategoricalField::ALL {
            for b in CategoricalField::ALL {
                if a != b {
                    let prefix = format!("{}{}", a.name(), INDICATOR_SEPARATOR);
                    assert!(!b.name().starts_with(&prefix), "{a} shadows {b}");
                }
            }
        }
    }

    #[test]
    fn required_fields_cover_schema() {
        let required = required_training_fields();
        assert_eq!(required.len(), 13);
        assert_eq!(required.last(), Some(&LABEL_FIELD));
        assert!(!required.contains(&TXN_ID_FIELD));
    }
}
