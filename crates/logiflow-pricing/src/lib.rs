//! # logiflow-pricing
//!
//! Freight price quotes for the LogiFlow shipping calculator.
//!
//! ```text
//! solid:  price = max(weight, l·w·h / 5000) × base rate × distance
//!                 × fragility (1.3) × size (1.2 above 1,000,000 cm³)
//!
//! liquid: price = weight × base rate × distance × handling(type)
//!                 × temperature (1.5 hazardous) × volume (1.3 above 1000 L)
//! ```
//!
//! | Service | Base rate |  | Distance      | Multiplier |
//! |---------|-----------|--|---------------|------------|
//! | air     | 2.5       |  | local         | 1.0        |
//! | sea     | 0.8       |  | domestic      | 1.5        |
//! | ground  | 1.2       |  | international | 2.5        |

pub mod calculator;
pub mod error;
pub mod model;

pub use calculator::{
    Dimensions, LiquidBreakdown, LiquidPackage, LiquidQuote, SolidBreakdown, SolidPackage,
    SolidQuote,
};
pub use error::{PricingError, Result};
pub use model::{DistanceTier, LiquidType, ServiceTier};
