//! Distance unit conversion.
//!
//! Conversion itself is exact; stored workout distances are rounded to one
//! decimal place by the mutation engine, so converting a plan out and back
//! lands within 0.1 km of the original rather than bit-identical. That is a
//! documented property of the format, not a defect.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kilometers per statute mile
pub const KM_PER_MILE: f64 = 1.609344;

/// Linear distance unit for workout distances and weekly totals
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Km,
    Miles,
}

impl Unit {
    /// Short display label
    pub fn label(self) -> &'static str {
        match self {
            Unit::Km => "km",
            Unit::Miles => "mi",
        }
    }

    /// Lenient parse for user input ("km", "miles", "mi")
    pub fn parse(s: &str) -> Option<Unit> {
        match s.to_lowercase().as_str() {
            "km" | "kilometers" | "kilometres" => Some(Unit::Km),
            "mi" | "mile" | "miles" => Some(Unit::Miles),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Convert a distance between units, exactly (no rounding)
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    match (from, to) {
        (Unit::Km, Unit::Miles) => value / KM_PER_MILE,
        (Unit::Miles, Unit::Km) => value * KM_PER_MILE,
        _ => value,
    }
}

/// Round to one decimal place, the precision stored distances carry
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
