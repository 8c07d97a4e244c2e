//! Rate Tables
//!
//! Service tiers, distance tiers and liquid classes with their multipliers.
//! Unknown names fall back to the default tier instead of failing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Transport mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ServiceTier {
    Air,
    Sea,
    #[default]
    Ground,
}

impl ServiceTier {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "air" => Self::Air,
            "sea" => Self::Sea,
            _ => Self::Ground,
        }
    }

    /// Price per chargeable kilogram
    pub fn base_rate(self) -> Decimal {
        match self {
            Self::Air => dec!(2.5),
            Self::Sea => dec!(0.8),
            Self::Ground => dec!(1.2),
        }
    }
}

impl From<String> for ServiceTier {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

/// How far the package travels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum DistanceTier {
    #[default]
    Local,
    Domestic,
    International,
}

impl DistanceTier {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "domestic" => Self::Domestic,
            "international" => Self::International,
            _ => Self::Local,
        }
    }

    pub fn multiplier(self) -> Decimal {
        match self {
            Self::Local => dec!(1.0),
            Self::Domestic => dec!(1.5),
            Self::International => dec!(2.5),
        }
    }
}

impl From<String> for DistanceTier {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

/// Liquid cargo class
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum LiquidType {
    Water,
    Oil,
    Chemical,
    Hazardous,
    Food,
    Pharmaceutical,
    /// Anything unlisted; handled like water
    #[default]
    Other,
}

impl LiquidType {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "water" => Self::Water,
            "oil" => Self::Oil,
            "chemical" => Self::Chemical,
            "hazardous" => Self::Hazardous,
            "food" => Self::Food,
            "pharmaceutical" => Self::Pharmaceutical,
            _ => Self::Other,
        }
    }

    pub fn handling_factor(self) -> Decimal {
        match self {
            Self::Water | Self::Other => dec!(1.0),
            Self::Oil => dec!(1.2),
            Self::Chemical => dec!(1.8),
            Self::Hazardous => dec!(2.5),
            Self::Food => dec!(1.3),
            Self::Pharmaceutical => dec!(1.6),
        }
    }

    /// Temperature-controlled transport surcharge
    pub fn temperature_factor(self) -> Decimal {
        match self {
            Self::Hazardous => dec!(1.5),
            _ => dec!(1.0),
        }
    }
}

impl From<String> for LiquidType {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}
