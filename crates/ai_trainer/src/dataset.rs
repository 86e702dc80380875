//! CSV dataset loading
//!
//! Reads one transaction per row under a header naming the schema fields.
//! Numeric cells that are empty or unparseable read as 0.0 and empty
//! categorical cells stay missing; both are counted in [`DataQuality`].

use psp_types::{
    parse_numeric_cell, required_training_fields, CategoricalField, NumericField, PaymentStatus,
    Transaction, LABEL_FIELD, TXN_ID_FIELD,
};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::{info, warn};

use crate::errors::TrainerError;

/// Counters for cells that were substituted while loading
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataQuality {
    /// Empty or unparseable numeric cells read as 0.0
    pub defaulted_numeric_cells: usize,
    /// Empty categorical cells (or non-integer weekdays) left missing
    pub missing_categorical_cells: usize,
}

/// Labelled training rows
#[derive(Clone, Debug)]
pub struct Dataset {
    pub transactions: Vec<Transaction>,
    /// 1 for `failure`, 0 otherwise
    pub labels: Vec<u8>,
    pub quality: DataQuality,
}

impl Dataset {
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, TrainerError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                TrainerError::MissingInput(path.to_path_buf())
            } else {
                TrainerError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            failures = dataset.failure_count(),
            "loaded training dataset"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TrainerError> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let position = |name: &str| headers.iter().position(|header| header == name);

        let missing: Vec<String> = required_training_fields()
            .into_iter()
            .filter(|name| position(name).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(TrainerError::MissingColumns(missing));
        }

        let numeric: Vec<(NumericField, usize)> = NumericField::ALL
            .into_iter()
            .filter_map(|field| position(field.name()).map(|idx| (field, idx)))
            .collect();
        let categorical: Vec<(CategoricalField, usize)> = CategoricalField::ALL
            .into_iter()
            .filter_map(|field| position(field.name()).map(|idx| (field, idx)))
            .collect();
        let label_idx = position(LABEL_FIELD).ok_or_else(|| {
            TrainerError::MissingColumns(vec![LABEL_FIELD.to_string()])
        })?;
        let txn_id_idx = position(TXN_ID_FIELD);

        let mut transactions = Vec::new();
        let mut labels = Vec::new();
        let mut quality = DataQuality::default();

        for record in csv.records() {
            let record = record?;
            let cell = |idx: usize| record.get(idx).unwrap_or("");

            let mut txn = Transaction::blank();
            txn.txn_id = txn_id_idx.map(cell).filter(|id| !id.is_empty()).map(str::to_string);

            for &(field, idx) in &numeric {
                let raw = cell(idx);
                let value = parse_numeric_cell(raw);
                if value == 0.0 && !is_literal_zero(raw) {
                    quality.defaulted_numeric_cells += 1;
                }
                txn.set_numeric(field, value);
            }

            for &(field, idx) in &categorical {
                let raw = cell(idx);
                if raw.is_empty() {
                    quality.missing_categorical_cells += 1;
                    continue;
                }
                txn.set_categorical(field, Some(raw.to_string()));
                if txn.categorical(field).is_none() {
                    quality.missing_categorical_cells += 1;
                }
            }

            labels.push(PaymentStatus::failure_indicator(cell(label_idx)));
            transactions.push(txn);
        }

        if transactions.is_empty() {
            return Err(TrainerError::EmptyDataset);
        }

        if quality != DataQuality::default() {
            warn!(
                defaulted_numeric_cells = quality.defaulted_numeric_cells,
                missing_categorical_cells = quality.missing_categorical_cells,
                "substituted defaults for unusable cells"
            );
        }

        Ok(Self {
            transactions,
            labels,
            quality,
        })
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.labels.iter().filter(|&&label| label == 1).count()
    }
}

fn is_literal_zero(raw: &str) -> bool {
    raw.parse::<f64>().map(|value| value == 0.0).unwrap_or(false)
}
