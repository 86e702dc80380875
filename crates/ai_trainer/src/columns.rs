//! Column derivation from a training dataset

use psp_ai_core::{Column, ColumnList};
use psp_types::{CategoricalField, NumericField};
use std::collections::BTreeSet;
use tracing::debug;

use crate::dataset::Dataset;
use crate::errors::TrainerError;

/// Numeric fields in declared order, then one indicator per observed
/// categorical value, grouped by field and sorted within a field.
///
/// Row order never affects the result.
pub fn derive_columns(dataset: &Dataset) -> Result<ColumnList, TrainerError> {
    let mut columns: Vec<Column> = NumericField::ALL.into_iter().map(Column::Numeric).collect();

    for field in CategoricalField::ALL {
        let values: BTreeSet<String> = dataset
            .transactions
            .iter()
            .filter_map(|txn| txn.categorical(field))
            .filter(|value| !value.is_empty())
            .map(|value| value.into_owned())
            .collect();

        debug!(field = %field, distinct = values.len(), "derived indicator columns");
        columns.extend(values.into_iter().map(|value| Column::indicator(field, value)));
    }

    Ok(ColumnList::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use psp_types::Transaction;

    fn dataset(transactions: Vec<Transaction>) -> Dataset {
        let labels = vec![0; transactions.len()];
        Dataset {
            transactions,
            labels,
            quality: Default::default(),
        }
    }

    fn txn(app: Option<&str>, weekday: Option<i64>) -> Transaction {
        Transaction {
            app: app.map(str::to_string),
            psp_candidate: Some("HDFC_PSP".to_string()),
            weekday,
            ..Transaction::blank()
        }
    }

    #[test]
    fn numeric_first_then_sorted_indicators() {
        let columns = derive_columns(&dataset(vec![
            txn(Some("PhonePe"), Some(3)),
            txn(Some("GooglePay"), Some(0)),
            txn(None, None),
        ]))
        .unwrap();

        assert_eq!(
            columns.names(),
            vec![
                "amount",
                "network_latency_ms",
                "hour",
                "recent_fail_rate_src_dest_5m",
                "psp_success_rate_5m",
                "app_GooglePay",
                "app_PhonePe",
                "psp_candidate_HDFC_PSP",
                "weekday_0",
                "weekday_3",
            ]
        );
    }

    #[test]
    fn row_order_is_irrelevant() {
        let rows = vec![
            txn(Some("Paytm"), Some(6)),
            txn(Some("BHIM"), Some(1)),
            txn(Some("GooglePay"), Some(6)),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        assert_eq!(
            derive_columns(&dataset(rows)).unwrap(),
            derive_columns(&dataset(reversed)).unwrap()
        );
    }

    #[test]
    fn missing_values_create_no_column() {
        let columns = derive_columns(&dataset(vec![txn(None, None)])).unwrap();
        assert!(columns.values_of(CategoricalField::App).is_empty());
        assert!(columns.values_of(CategoricalField::Weekday).is_empty());
        assert_eq!(columns.len(), NumericField::ALL.len() + 1);
    }
}
