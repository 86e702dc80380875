//! Property tests for the feature encoding contract.

use proptest::prelude::*;
use psp_ai_core::{encode, Column, ColumnList};
use psp_types::{CategoricalField, NumericField, Transaction};

const APPS: &[&str] = &["GooglePay", "PhonePe", "Paytm", "BHIM"];
const BANKS: &[&str] = &["SBI", "HDFC", "ICICI", "Axis", "YesBank"];

fn optional_pick(options: &'static [&'static str]) -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(options).prop_map(str::to_string))
}

fn numeric_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0e6..1.0e6f64,
        Just(0.0),
        Just(f64::NAN),
        Just(f64::INFINITY),
    ]
}

fn any_transaction() -> impl Strategy<Value = Transaction> {
    (
        optional_pick(APPS),
        optional_pick(BANKS),
        optional_pick(BANKS),
        prop::option::of(0i64..7),
        prop::collection::vec(numeric_value(), 5),
    )
        .prop_map(|(app, src_bank, dest_bank, weekday, numbers)| Transaction {
            app,
            src_bank,
            dest_bank,
            weekday,
            psp_candidate: Some("HDFC_PSP".to_string()),
            amount: numbers[0],
            network_latency_ms: numbers[1],
            hour: numbers[2],
            recent_fail_rate_src_dest_5m: numbers[3],
            psp_success_rate_5m: numbers[4],
            ..Transaction::blank()
        })
}

fn any_column() -> impl Strategy<Value = Column> {
    prop_oneof![
        prop::sample::select(NumericField::ALL.to_vec()).prop_map(Column::Numeric),
        prop::sample::select(APPS).prop_map(|v| Column::indicator(CategoricalField::App, v)),
        prop::sample::select(BANKS).prop_map(|v| Column::indicator(CategoricalField::SrcBank, v)),
        prop::sample::select(BANKS).prop_map(|v| Column::indicator(CategoricalField::DestBank, v)),
        (0i64..7).prop_map(|d| Column::indicator(CategoricalField::Weekday, d.to_string())),
        Just(Column::indicator(CategoricalField::PspCandidate, "HDFC_PSP")),
        "[a-z]{1,6}_[A-Za-z]{1,6}".prop_map(|name| Column::parse(&name)),
    ]
}

fn any_column_list() -> impl Strategy<Value = ColumnList> {
    prop::collection::vec(any_column(), 0..40).prop_map(|columns| {
        let mut unique: Vec<Column> = Vec::new();
        for column in columns {
            if !unique.iter().any(|seen| seen.name() == column.name()) {
                unique.push(column);
            }
        }
        ColumnList::new(unique).expect("deduplicated above")
    })
}

proptest! {
    #[test]
    fn vector_length_matches_column_list(txn in any_transaction(), columns in any_column_list()) {
        prop_assert_eq!(encode(&txn, &columns).len(), columns.len());
    }

    #[test]
    fn numeric_columns_copy_the_field(txn in any_transaction(), columns in any_column_list()) {
        let vector = encode(&txn, &columns);
        for (column, value) in columns.iter().zip(&vector) {
            if let Column::Numeric(field) = column {
                prop_assert_eq!(*value, txn.numeric(*field));
                prop_assert!(value.is_finite());
            }
        }
    }

    #[test]
    fn indicator_fires_iff_value_matches(txn in any_transaction(), columns in any_column_list()) {
        let vector = encode(&txn, &columns);
        for (column, value) in columns.iter().zip(&vector) {
            match column {
                Column::Indicator { field, value: expected } => {
                    let matches = txn.categorical(*field).as_deref() == Some(expected.as_str());
                    prop_assert_eq!(*value, if matches { 1.0 } else { 0.0 });
                }
                Column::Unrecognized(_) => prop_assert_eq!(*value, 0.0),
                Column::Numeric(_) => {}
            }
        }
    }

    #[test]
    fn at_most_one_indicator_per_field(txn in any_transaction(), columns in any_column_list()) {
        let vector = encode(&txn, &columns);
        for field in CategoricalField::ALL {
            let fired = columns
                .iter()
                .zip(&vector)
                .filter(|(column, value)| {
                    matches!(column, Column::Indicator { field: f, .. } if *f == field)
                        && **value == 1.0
                })
                .count();
            prop_assert!(fired <= 1);
        }
    }

    #[test]
    fn encoding_is_idempotent(txn in any_transaction(), columns in any_column_list()) {
        let first = encode(&txn, &columns);
        let second = encode(&txn, &columns);
        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn persisted_names_resolve_to_the_same_columns(columns in any_column_list()) {
        let json = serde_json::to_string(&columns).unwrap();
        let restored: ColumnList = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(restored, columns);
    }
}

#[test]
fn unseen_app_yields_zero_on_known_app_columns() {
    let columns = ColumnList::from_names(["amount", "app_GooglePay", "app_PhonePe"]).unwrap();
    let txn = Transaction {
        app: Some("Paytm".to_string()),
        amount: 99.0,
        ..Transaction::default()
    };
    assert_eq!(encode(&txn, &columns), vec![99.0, 0.0, 0.0]);
}
