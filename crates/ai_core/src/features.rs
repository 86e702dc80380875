//! Feature encoding contract shared by training and serving
//!
//! A [`ColumnList`] is produced once at training time and persisted verbatim.
//! [`encode`] turns one transaction into a vector laid out exactly like that
//! list. The serving path only ever reads a persisted list; indicator columns
//! are never re-derived from an incoming request.

use psp_types::{CategoricalField, NumericField, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::slice;

use crate::errors::AiCoreError;
use crate::serde_canon::{hash_canonical_hex, CanonicalError};

/// Dense feature vector, one value per column of the list it was encoded against
pub type FeatureVector = Vec<f64>;

/// One entry of the column list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    /// A numeric field copied as-is
    Numeric(NumericField),
    /// One-hot indicator: 1.0 exactly when `field` equals `value`
    Indicator {
        field: CategoricalField,
        value: String,
    },
    /// A persisted name that names no known field; always encodes as 0.0
    Unrecognized(String),
}

impl Column {
    pub fn indicator(field: CategoricalField, value: impl Into<String>) -> Self {
        Column::Indicator {
            field,
            value: value.into(),
        }
    }

    /// Resolve a persisted column name.
    pub fn parse(name: &str) -> Self {
        if let Some(field) = NumericField::from_name(name) {
            return Column::Numeric(field);
        }
        match CategoricalField::split_indicator(name) {
            Some((field, value)) => Column::indicator(field, value),
            None => Column::Unrecognized(name.to_string()),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Column::Numeric(field) => field.name().to_string(),
            Column::Indicator { field, value } => field.indicator_name(value),
            Column::Unrecognized(name) => name.clone(),
        }
    }

    /// Value of this column for `txn`.
    pub fn value_for(&self, txn: &Transaction) -> f64 {
        match self {
            Column::Numeric(field) => txn.numeric(*field),
            Column::Indicator { field, value } => match txn.categorical(*field) {
                Some(actual) if actual == value.as_str() => 1.0,
                _ => 0.0,
            },
            Column::Unrecognized(_) => 0.0,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Frozen, ordered feature schema
///
/// Serialized as a JSON array of column names, in order. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ColumnList {
    columns: Vec<Column>,
}

impl ColumnList {
    pub fn new(columns: Vec<Column>) -> Result<Self, AiCoreError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            let name = column.name();
            if !seen.insert(name.clone()) {
                return Err(AiCoreError::DuplicateColumn(name));
            }
        }
        Ok(Self { columns })
    }

    pub fn from_names<I, S>(names: I) -> Result<Self, AiCoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(names.into_iter().map(|name| Column::parse(name.as_ref())).collect())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name() == name)
    }

    /// Indicator values recorded for `field`, in column order.
    pub fn values_of(&self, field: CategoricalField) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|column| match column {
                Column::Indicator { field: f, value } if *f == field => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Canonical blake3 digest, recorded in model metadata to pair a model
    /// with the list it was trained against.
    pub fn hash_hex(&self) -> Result<String, CanonicalError> {
        hash_canonical_hex(&self.names())
    }
}

impl TryFrom<Vec<String>> for ColumnList {
    type Error = AiCoreError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_names(names)
    }
}

impl From<ColumnList> for Vec<String> {
    fn from(list: ColumnList) -> Self {
        list.names()
    }
}

impl<'a> IntoIterator for &'a ColumnList {
    type Item = &'a Column;
    type IntoIter = slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Encode `txn` against `columns`.
///
/// The result always has `columns.len()` entries. Missing numeric input reads
/// as 0.0 and a categorical value absent from the list (unseen at training
/// time, or missing) leaves every indicator of its field at 0.0.
pub fn encode(txn: &Transaction, columns: &ColumnList) -> FeatureVector {
    columns.iter().map(|column| column.value_for(txn)).collect()
}
