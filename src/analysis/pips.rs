use crate::domain::errors::{AnalysisError, AnalysisResult};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Signed price movement from `from` to `to`, expressed in pips and rounded to 2 dp.
///
/// Prices go through `Decimal` so that e.g. `1.1005 - 1.1000` at a pip size of
/// `0.0001` is exactly 5 pips.
pub fn price_movement_pips(from: f64, to: f64, pip_size: Decimal) -> AnalysisResult<f64> {
    if pip_size <= Decimal::ZERO {
        return Err(AnalysisError::InvalidPipSize(format!(
            "pip size must be positive, got {}",
            pip_size
        )));
    }

    let from = to_decimal(from)?;
    let to = to_decimal(to)?;

    let pips = ((to - from) / pip_size).round_dp(2);
    pips.to_f64()
        .ok_or_else(|| AnalysisError::Conversion(format!("{} pips does not fit in f64", pips)))
}

fn to_decimal(price: f64) -> AnalysisResult<Decimal> {
    Decimal::from_f64(price)
        .ok_or_else(|| AnalysisError::Conversion(format!("price {} is not representable", price)))
}
