//! Synthetic PSP transaction generator
//!
//! Produces labelled rows in the training CSV layout. Failure odds grow with
//! the PSP's base failure rate, the amount, network latency and the recent
//! failure rate between the two banks.

use std::io::Write;

use psp_types::{PaymentStatus, PSP_PROFILES};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

pub const APPS: [&str; 3] = ["GooglePay", "PhonePe", "Paytm"];
pub const BANKS: [&str; 5] = ["SBI", "HDFC", "ICICI", "Axis", "YesBank"];
pub const DEVICES: [&str; 2] = ["Android", "iOS"];
pub const CHANNEL: &str = "UPI";

/// Evening hours carry extra recent-failure pressure.
const PEAK_HOURS: [u32; 3] = [18, 19, 20];
const MAX_FAIL_PROBABILITY: f64 = 0.95;

/// One generated CSV row. Field order is the column order of the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedTransaction {
    pub txn_id: String,
    pub app: &'static str,
    pub psp_candidate: &'static str,
    pub src_bank: &'static str,
    pub dest_bank: &'static str,
    pub amount: u64,
    pub channel: &'static str,
    pub device_type: &'static str,
    pub network_latency_ms: u64,
    pub hour: u32,
    pub weekday: u32,
    pub recent_fail_rate_src_dest_5m: f64,
    pub psp_success_rate_5m: f64,
    pub status: PaymentStatus,
}

/// Failure probability of a row before the outcome is drawn.
pub fn failure_probability(
    base_fail: f64,
    amount: u64,
    latency_ms: u64,
    recent_fail: f64,
) -> f64 {
    let p = base_fail
        + 0.0001 * amount as f64
        + 0.001 * (latency_ms as f64 / 100.0)
        + 0.2 * recent_fail;
    p.clamp(0.0, MAX_FAIL_PROBABILITY)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub struct TransactionGenerator {
    rng: StdRng,
}

impl TransactionGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Box-Muller draw from N(mean, std_dev).
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1: f64 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = self.rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.gen_range(0..items.len())]
    }

    pub fn sample(&mut self) -> GeneratedTransaction {
        let psp = self.pick(&PSP_PROFILES);
        let src_bank = self.pick(&BANKS);
        let dest_bank = self.pick(&BANKS);
        let amount = (self.normal(1200.0, 800.0).abs() as u64).max(10);
        let hour = self.rng.gen_range(0..24);
        let weekday = self.rng.gen_range(0..7);
        let device_type = self.pick(&DEVICES);
        let network_latency_ms = (self.normal(150.0, 80.0).abs() as u64).max(20);

        let peak = if PEAK_HOURS.contains(&hour) { 0.05 } else { 0.0 };
        let recent_fail = (self.rng.gen::<f64>() * 0.1 + peak).abs().min(0.5);
        let psp_success = 1.0 - psp.base_fail + self.normal(0.0, 0.005);

        let fail_prob =
            failure_probability(psp.base_fail, amount, network_latency_ms, recent_fail);
        let status = if self.rng.gen::<f64>() < fail_prob {
            PaymentStatus::Failure
        } else {
            PaymentStatus::Success
        };

        let txn_id = uuid::Builder::from_random_bytes(self.rng.gen())
            .into_uuid()
            .to_string();

        GeneratedTransaction {
            txn_id,
            app: self.pick(&APPS),
            psp_candidate: psp.name,
            src_bank,
            dest_bank,
            amount,
            channel: CHANNEL,
            device_type,
            network_latency_ms,
            hour,
            weekday,
            recent_fail_rate_src_dest_5m: round3(recent_fail),
            psp_success_rate_5m: round3(psp_success),
            status,
        }
    }

    /// Write a header and `rows` generated transactions as CSV.
    pub fn write_csv<W: Write>(
        &mut self,
        writer: W,
        rows: usize,
    ) -> Result<Summary, csv::Error> {
        let mut csv = csv::Writer::from_writer(writer);
        let mut summary = Summary::default();
        for _ in 0..rows {
            let row = self.sample();
            summary.record(&row);
            csv.serialize(&row)?;
        }
        if rows == 0 {
            csv.write_record(HEADER)?;
        }
        csv.flush()?;
        Ok(summary)
    }
}

/// Column order written by [`TransactionGenerator::write_csv`].
pub const HEADER: [&str; 14] = [
    "txn_id",
    "app",
    "psp_candidate",
    "src_bank",
    "dest_bank",
    "amount",
    "channel",
    "device_type",
    "network_latency_ms",
    "hour",
    "weekday",
    "recent_fail_rate_src_dest_5m",
    "psp_success_rate_5m",
    "status",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub rows: usize,
    pub failures: usize,
}

impl Summary {
    fn record(&mut self, row: &GeneratedTransaction) {
        self.rows += 1;
        if row.status == PaymentStatus::Failure {
            self.failures += 1;
        }
    }

    pub fn failure_rate(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.failures as f64 / self.rows as f64
        }
    }
}
