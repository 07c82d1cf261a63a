//! # Report
//!
//! $$
//! \operatorname{round}_d(x)=\frac{\lfloor 10^d x \rceil}{10^d}
//! $$
//!
//! Serialization boundary. Results keep full precision in memory; the helpers below
//! round percentages and currency amounts to 2 decimals, weights to 4 decimals and
//! payback periods to 1 decimal only when a value is written out.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde::Serializer;

use crate::error::Result;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
  let scale = 10f64.powi(decimals);
  (value * scale).round() / scale
}

/// Convert any result type into a plain JSON value.
pub fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value> {
  Ok(serde_json::to_value(value)?)
}

pub(crate) fn round1_opt<S: Serializer>(value: &Option<f64>, s: S) -> std::result::Result<S::Ok, S::Error> {
  match value {
    Some(v) => s.serialize_some(&round_to(*v, 1)),
    None => s.serialize_none(),
  }
}

pub(crate) fn round2<S: Serializer>(value: &f64, s: S) -> std::result::Result<S::Ok, S::Error> {
  s.serialize_f64(round_to(*value, 2))
}

pub(crate) fn round2_opt<S: Serializer>(value: &Option<f64>, s: S) -> std::result::Result<S::Ok, S::Error> {
  match value {
    Some(v) => s.serialize_some(&round_to(*v, 2)),
    None => s.serialize_none(),
  }
}

pub(crate) fn round4<S: Serializer>(value: &f64, s: S) -> std::result::Result<S::Ok, S::Error> {
  s.serialize_f64(round_to(*value, 4))
}

pub(crate) fn round2_map<S: Serializer>(
  map: &BTreeMap<String, f64>,
  s: S,
) -> std::result::Result<S::Ok, S::Error> {
  let rounded: BTreeMap<&str, f64> = map
    .iter()
    .map(|(k, v)| (k.as_str(), round_to(*v, 2)))
    .collect();
  rounded.serialize(s)
}

pub(crate) fn round2_table<S: Serializer>(
  table: &BTreeMap<String, BTreeMap<String, f64>>,
  s: S,
) -> std::result::Result<S::Ok, S::Error> {
  let rounded: BTreeMap<&str, BTreeMap<&str, f64>> = table
    .iter()
    .map(|(metric, row)| {
      let row = row
        .iter()
        .map(|(id, v)| (id.as_str(), round_to(*v, 2)))
        .collect();
      (metric.as_str(), row)
    })
    .collect();
  rounded.serialize(s)
}

pub(crate) fn round4_matrix_opt<S: Serializer>(
  matrix: &Option<Vec<Vec<f64>>>,
  s: S,
) -> std::result::Result<S::Ok, S::Error> {
  match matrix {
    Some(m) => {
      let rounded: Vec<Vec<f64>> = m
        .iter()
        .map(|row| row.iter().map(|v| round_to(*v, 4)).collect())
        .collect();
      s.serialize_some(&rounded)
    }
    None => s.serialize_none(),
  }
}

/// Percentage label, `"N/A"` when the metric is absent.
pub fn format_percentage(value: Option<f64>, decimals: usize) -> String {
  match value {
    Some(v) => format!("{v:.decimals$}%"),
    None => "N/A".to_string(),
  }
}

/// Currency label with thousands separators, e.g. `R$ 1,234.50`.
pub fn format_currency(value: f64, currency: &str) -> String {
  let symbol = match currency {
    "BRL" => "R$",
    "USD" => "$",
    "EUR" => "€",
    other => other,
  };

  let fixed = format!("{:.2}", value.abs());
  let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

  let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
  for (i, ch) in int_part.chars().enumerate() {
    if i > 0 && (int_part.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(ch);
  }

  let sign = if value < 0.0 { "-" } else { "" };
  format!("{symbol} {sign}{grouped}.{frac_part}")
}

/// Holding period between two dates in several units.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HoldingPeriod {
  pub days: i64,
  #[serde(serialize_with = "round1")]
  pub months: f64,
  #[serde(serialize_with = "round2")]
  pub years: f64,
  /// Compact `"Ny Mm"` label.
  pub years_months: String,
}

fn round1<S: Serializer>(value: &f64, s: S) -> std::result::Result<S::Ok, S::Error> {
  s.serialize_f64(round_to(*value, 1))
}

impl HoldingPeriod {
  pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
    let days = end.signed_duration_since(start).num_days();
    let years = days as f64 / 365.25;
    let months = days as f64 / 30.44;
    let whole_years = years.trunc() as i64;
    let rem_months = (years.fract() * 12.0).trunc() as i64;

    Self {
      days,
      months,
      years,
      years_months: format!("{whole_years}y {rem_months}m"),
    }
  }
}
