//! Package Quotes
//!
//! Solid packages are billed on chargeable weight (the greater of actual and
//! volumetric weight); liquids on actual weight with handling surcharges.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};
use crate::model::{DistanceTier, LiquidType, ServiceTier};

/// Volume (cm³) per kilogram of volumetric weight
const VOLUMETRIC_DIVISOR: Decimal = dec!(5000);
const FRAGILE_SURCHARGE: Decimal = dec!(1.3);
/// Solid packages above this volume pay the size surcharge
const LARGE_PACKAGE_VOLUME: Decimal = dec!(1000000);
const LARGE_PACKAGE_SURCHARGE: Decimal = dec!(1.2);
/// Liquid shipments above this volume pay the volume surcharge
const LARGE_LIQUID_VOLUME: Decimal = dec!(1000);
const LARGE_LIQUID_SURCHARGE: Decimal = dec!(1.3);

fn non_negative(field: &'static str, value: Decimal) -> Result<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(PricingError::InvalidInput { field, value });
    }
    Ok(value)
}

/// Multiply `factors` together, failing instead of overflowing
fn product(quantity: &'static str, factors: &[Decimal]) -> Result<Decimal> {
    factors
        .iter()
        .try_fold(Decimal::ONE, |acc, f| acc.checked_mul(*f))
        .ok_or(PricingError::Overflow(quantity))
}

const fn factor(applies: bool, surcharge: Decimal) -> Decimal {
    if applies { surcharge } else { Decimal::ONE }
}

/// Package dimensions (cm)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    #[serde(default)]
    pub fragile: bool,
}

/// Solid package shipment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolidPackage {
    /// Actual weight (kg)
    pub weight: Decimal,
    pub dimensions: Dimensions,
    #[serde(default)]
    pub distance: DistanceTier,
    #[serde(default)]
    pub service: ServiceTier,
}

/// Liquid shipment
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidPackage {
    /// Weight (kg)
    pub weight: Decimal,
    /// Volume (litres)
    pub volume: Decimal,
    #[serde(default)]
    pub distance: DistanceTier,
    #[serde(default)]
    pub service: ServiceTier,
    #[serde(default)]
    pub liquid_type: LiquidType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolidBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub base_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub chargeable_weight: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub distance_multiplier: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub fragility_factor: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub size_factor: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SolidQuote {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub breakdown: SolidBreakdown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub base_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub weight: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub distance_multiplier: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub liquid_handling_factor: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub temperature_factor: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume_factor: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LiquidQuote {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub breakdown: LiquidBreakdown,
}

impl SolidPackage {
    /// Quote this shipment
    pub fn quote(&self) -> Result<SolidQuote> {
        let weight = non_negative("weight", self.weight)?;
        let dims = &self.dimensions;
        let volume = product(
            "volume",
            &[
                non_negative("length", dims.length)?,
                non_negative("width", dims.width)?,
                non_negative("height", dims.height)?,
            ],
        )?;

        let volumetric_weight = volume
            .checked_div(VOLUMETRIC_DIVISOR)
            .ok_or(PricingError::Overflow("volume"))?;
        let chargeable_weight = weight.max(volumetric_weight);

        let breakdown = SolidBreakdown {
            base_rate: self.service.base_rate(),
            chargeable_weight,
            distance_multiplier: self.distance.multiplier(),
            fragility_factor: factor(dims.fragile, FRAGILE_SURCHARGE),
            size_factor: factor(volume > LARGE_PACKAGE_VOLUME, LARGE_PACKAGE_SURCHARGE),
        };
        let price = product(
            "price",
            &[
                breakdown.chargeable_weight,
                breakdown.base_rate,
                breakdown.distance_multiplier,
                breakdown.fragility_factor,
                breakdown.size_factor,
            ],
        )?;

        tracing::debug!(
            %volume,
            %volumetric_weight,
            %chargeable_weight,
            %price,
            "Quoted solid package"
        );

        Ok(SolidQuote { price, breakdown })
    }
}

impl LiquidPackage {
    /// Quote this shipment
    pub fn quote(&self) -> Result<LiquidQuote> {
        let weight = non_negative("weight", self.weight)?;
        let volume = non_negative("volume", self.volume)?;

        let breakdown = LiquidBreakdown {
            base_rate: self.service.base_rate(),
            weight,
            distance_multiplier: self.distance.multiplier(),
            liquid_handling_factor: self.liquid_type.handling_factor(),
            temperature_factor: self.liquid_type.temperature_factor(),
            volume_factor: factor(volume > LARGE_LIQUID_VOLUME, LARGE_LIQUID_SURCHARGE),
        };
        let price = product(
            "price",
            &[
                breakdown.weight,
                breakdown.base_rate,
                breakdown.distance_multiplier,
                breakdown.liquid_handling_factor,
                breakdown.temperature_factor,
                breakdown.volume_factor,
            ],
        )?;

        tracing::debug!(
            %volume,
            liquid_type = ?self.liquid_type,
            %price,
            "Quoted liquid package"
        );

        Ok(LiquidQuote { price, breakdown })
    }
}
