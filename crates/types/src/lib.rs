//! Transaction schema shared by the trainer, the predictor and the generator.

pub mod fields;
pub mod psp;
pub mod transaction;

pub use fields::{
    required_training_fields, CategoricalField, NumericField, INDICATOR_SEPARATOR, LABEL_FIELD,
    TXN_ID_FIELD,
};
pub use psp::{psp_profile, PspProfile, PSP_PROFILES};
pub use transaction::{
    parse_numeric_cell, PaymentStatus, Transaction, DEFAULT_NETWORK_LATENCY_MS,
    DEFAULT_PSP_SUCCESS_RATE, DEFAULT_WEEKDAY,
};
