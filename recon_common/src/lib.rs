mod money;

pub mod op;

pub use money::{MoneyCents, MoneyConversionError, SETTLEMENT_CURRENCY_CODE};
