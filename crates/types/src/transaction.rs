use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::fields::{CategoricalField, NumericField};

/// Latency assumed when a prediction request omits `network_latency_ms`.
pub const DEFAULT_NETWORK_LATENCY_MS: f64 = 100.0;

/// PSP success rate assumed when a prediction request omits `psp_success_rate_5m`.
pub const DEFAULT_PSP_SUCCESS_RATE: f64 = 0.95;

/// Weekday assumed when a prediction request omits `weekday`.
pub const DEFAULT_WEEKDAY: i64 = 0;

/// A payment transaction routed to a candidate PSP
///
/// Deserialization is lenient: every field is optional, `null` behaves like an
/// absent field, numeric strings are accepted for numeric fields and any other
/// unparseable numeric input becomes `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Opaque identifier, echoed back by the predictor
    #[serde(default, deserialize_with = "lenient_text")]
    pub txn_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub app: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub psp_candidate: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub src_bank: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dest_bank: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub channel: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub device_type: Option<String>,

    /// Day of week, encoded categorically through its decimal form
    #[serde(default = "default_weekday", deserialize_with = "lenient_weekday")]
    pub weekday: Option<i64>,

    #[serde(default, deserialize_with = "lenient_zero")]
    pub amount: f64,
    #[serde(
        default = "default_network_latency",
        deserialize_with = "lenient_network_latency"
    )]
    pub network_latency_ms: f64,
    #[serde(default, deserialize_with = "lenient_zero")]
    pub hour: f64,
    #[serde(default, deserialize_with = "lenient_zero")]
    pub recent_fail_rate_src_dest_5m: f64,
    #[serde(
        default = "default_psp_success_rate",
        deserialize_with = "lenient_psp_success_rate"
    )]
    pub psp_success_rate_5m: f64,
}

impl Default for Transaction {
    /// The neutral request: no categorical values, benign numeric defaults.
    fn default() -> Self {
        Self {
            txn_id: None,
            app: None,
            psp_candidate: None,
            src_bank: None,
            dest_bank: None,
            channel: None,
            device_type: None,
            weekday: default_weekday(),
            amount: 0.0,
            network_latency_ms: DEFAULT_NETWORK_LATENCY_MS,
            hour: 0.0,
            recent_fail_rate_src_dest_5m: 0.0,
            psp_success_rate_5m: DEFAULT_PSP_SUCCESS_RATE,
        }
    }
}

impl Transaction {
    /// A record with every field missing, as seen by the training loader
    /// before any cell is read: numerics at `0.0`, categoricals unset.
    pub fn blank() -> Self {
        Self {
            weekday: None,
            network_latency_ms: 0.0,
            psp_success_rate_5m: 0.0,
            ..Self::default()
        }
    }

    /// Numeric value for `field`; non-finite values read as `0.0`.
    pub fn numeric(&self, field: NumericField) -> f64 {
        let value = match field {
            NumericField::Amount => self.amount,
            NumericField::NetworkLatencyMs => self.network_latency_ms,
            NumericField::Hour => self.hour,
            NumericField::RecentFailRateSrcDest5m => self.recent_fail_rate_src_dest_5m,
            NumericField::PspSuccessRate5m => self.psp_success_rate_5m,
        };
        finite_or_zero(value)
    }

    pub fn set_numeric(&mut self, field: NumericField, value: f64) {
        let value = finite_or_zero(value);
        match field {
            NumericField::Amount => self.amount = value,
            NumericField::NetworkLatencyMs => self.network_latency_ms = value,
            NumericField::Hour => self.hour = value,
            NumericField::RecentFailRateSrcDest5m => self.recent_fail_rate_src_dest_5m = value,
            NumericField::PspSuccessRate5m => self.psp_success_rate_5m = value,
        }
    }

    /// String form of a categorical value, `None` when missing.
    pub fn categorical(&self, field: CategoricalField) -> Option<Cow<'_, str>> {
        let text = match field {
            CategoricalField::App => &self.app,
            CategoricalField::PspCandidate => &self.psp_candidate,
            CategoricalField::SrcBank => &self.src_bank,
            CategoricalField::DestBank => &self.dest_bank,
            CategoricalField::Channel => &self.channel,
            CategoricalField::DeviceType => &self.device_type,
            CategoricalField::Weekday => {
                return self.weekday.map(|day| Cow::Owned(day.to_string()));
            }
        };
        text.as_deref().map(Cow::Borrowed)
    }

    /// Store a categorical value. Weekday text that is not an integer is
    /// dropped, which leaves the field missing.
    pub fn set_categorical(&mut self, field: CategoricalField, value: Option<String>) {
        match field {
            CategoricalField::App => self.app = value,
            CategoricalField::PspCandidate => self.psp_candidate = value,
            CategoricalField::SrcBank => self.src_bank = value,
            CategoricalField::DestBank => self.dest_bank = value,
            CategoricalField::Channel => self.channel = value,
            CategoricalField::DeviceType => self.device_type = value,
            CategoricalField::Weekday => {
                self.weekday = value.as_deref().and_then(parse_integral);
            }
        }
    }
}

/// Outcome of a routed payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failure,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Failure => "failure",
        }
    }

    /// Binary training label; only an exact `failure` counts as positive.
    pub fn failure_indicator(raw: &str) -> u8 {
        u8::from(matches!(raw.parse::<PaymentStatus>(), Ok(PaymentStatus::Failure)))
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(PaymentStatus::Success),
            "failure" => Ok(PaymentStatus::Failure),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Parse a numeric cell; empty, unparseable or non-finite input reads as `0.0`.
pub fn parse_numeric_cell(raw: &str) -> f64 {
    raw.trim().parse::<f64>().map(finite_or_zero).unwrap_or(0.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn parse_integral(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(day) = raw.parse::<i64>() {
        return Some(day);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.fract() == 0.0)
        .map(|value| value as i64)
}

fn default_weekday() -> Option<i64> {
    Some(DEFAULT_WEEKDAY)
}

fn default_network_latency() -> f64 {
    DEFAULT_NETWORK_LATENCY_MS
}

fn default_psp_success_rate() -> f64 {
    DEFAULT_PSP_SUCCESS_RATE
}

fn coerce_number(value: &Value, default: f64) -> f64 {
    match value {
        Value::Null => default,
        Value::Number(number) => number.as_f64().map(finite_or_zero).unwrap_or(0.0),
        Value::String(text) => parse_numeric_cell(text),
        _ => 0.0,
    }
}

fn lenient_number<'de, D>(deserializer: D, default: f64) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value, default))
}

fn lenient_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer, 0.0)
}

fn lenient_network_latency<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer, DEFAULT_NETWORK_LATENCY_MS)
}

fn lenient_psp_success_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer, DEFAULT_PSP_SUCCESS_RATE)
}

fn lenient_weekday<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => default_weekday(),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(|f| parse_integral(&f.to_string()))),
        Value::String(text) => parse_integral(&text),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_request_uses_documented_defaults() {
        let txn: Transaction = serde_json::from_value(json!({})).unwrap();
        assert_eq!(txn, Transaction::default());
        assert_eq!(txn.amount, 0.0);
        assert_eq!(txn.network_latency_ms, 100.0);
        assert_eq!(txn.hour, 0.0);
        assert_eq!(txn.weekday, Some(0));
        assert_eq!(txn.recent_fail_rate_src_dest_5m, 0.0);
        assert_eq!(txn.psp_success_rate_5m, 0.95);
        assert!(txn.txn_id.is_none());
        assert!(txn.app.is_none());
    }

    #[test]
    fn null_behaves_like_absent() {
        let txn: Transaction = serde_json::from_value(json!({
            "network_latency_ms": null,
            "psp_success_rate_5m": null,
            "weekday": null,
            "app": null
        }))
        .unwrap();
        assert_eq!(txn, Transaction::default());
    }

    #[test]
    fn numeric_strings_are_accepted_and_garbage_is_zero() {
        let txn: Transaction = serde_json::from_value(json!({
            "amount": "1250.5",
            "network_latency_ms": "fast",
            "hour": true,
            "psp_success_rate_5m": [1, 2]
        }))
        .unwrap();
        assert_eq!(txn.amount, 1250.5);
        assert_eq!(txn.network_latency_ms, 0.0);
        assert_eq!(txn.hour, 0.0);
        assert_eq!(txn.psp_success_rate_5m, 0.0);
    }

    #[test]
    fn categorical_values_use_string_form() {
        let txn: Transaction = serde_json::from_value(json!({
            "app": "PhonePe",
            "channel": 7,
            "weekday": "3"
        }))
        .unwrap();
        assert_eq!(txn.categorical(CategoricalField::App).as_deref(), Some("PhonePe"));
        assert_eq!(txn.categorical(CategoricalField::Channel).as_deref(), Some("7"));
        assert_eq!(txn.categorical(CategoricalField::Weekday).as_deref(), Some("3"));
        assert_eq!(txn.categorical(CategoricalField::SrcBank), None);
    }

    #[test]
    fn weekday_accepts_integral_floats_only() {
        let txn: Transaction = serde_json::from_value(json!({ "weekday": 4.0 })).unwrap();
        assert_eq!(txn.weekday, Some(4));

        let txn: Transaction = serde_json::from_value(json!({ "weekday": 4.5 })).unwrap();
        assert_eq!(txn.weekday, None);

        let txn: Transaction = serde_json::from_value(json!({ "weekday": "monday" })).unwrap();
        assert_eq!(txn.weekday, None);
    }

    #[test]
    fn setters_coerce_non_finite_values() {
        let mut txn = Transaction::blank();
        txn.set_numeric(NumericField::Amount, f64::NAN);
        txn.set_numeric(NumericField::Hour, 13.0);
        assert_eq!(txn.numeric(NumericField::Amount), 0.0);
        assert_eq!(txn.numeric(NumericField::Hour), 13.0);

        txn.set_categorical(CategoricalField::Weekday, Some("6".to_string()));
        assert_eq!(txn.weekday, Some(6));
        txn.set_categorical(CategoricalField::Weekday, Some("x".to_string()));
        assert_eq!(txn.weekday, None);
    }

    #[test]
    fn numeric_cells_default_to_zero() {
        assert_eq!(parse_numeric_cell(" 42.5 "), 42.5);
        assert_eq!(parse_numeric_cell(""), 0.0);
        assert_eq!(parse_numeric_cell("n/a"), 0.0);
        assert_eq!(parse_numeric_cell("inf"), 0.0);
    }

    #[test]
    fn failure_indicator_is_exact() {
        assert_eq!(PaymentStatus::failure_indicator("failure"), 1);
        assert_eq!(PaymentStatus::failure_indicator("success"), 0);
        assert_eq!(PaymentStatus::failure_indicator("FAILURE"), 0);
        assert_eq!(PaymentStatus::failure_indicator(" failure"), 0);
        assert_eq!(PaymentStatus::failure_indicator(""), 0);
        assert_eq!("failure".parse::<PaymentStatus>(), Ok(PaymentStatus::Failure));
        assert!("pending".parse::<PaymentStatus>().is_err());
    }
}
