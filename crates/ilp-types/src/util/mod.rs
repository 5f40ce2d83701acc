//! Helper types shared across the codec and claim modules.
//!
//! - [`decimal_amount`] - arbitrary-precision decimal amount strings (drops/wei/octas)

pub mod decimal_amount;

pub use decimal_amount::{DecimalAmount, DecimalAmountError};
