use anchor_lang::prelude::*;

#[error_code]
pub enum BatchError {
    #[msg("Batch has no exchange rate yet")]
    BatchNotFinalized,
    #[msg("Batch exchange rate is already set")]
    ExchangeRateAlreadySet,
    #[msg("Batch is already finalized")]
    BatchAlreadyFinalized,
    #[msg("Batch is already dispatched")]
    BatchAlreadyDispatched,
    #[msg("Batch id 0 is never used")]
    InvalidBatchId,
    #[msg("No dispatched batch matches this unwrap handle")]
    UnknownUnwrapHandle,
    #[msg("Caller is not allowed to use this encrypted amount")]
    AmountNotAllowed,
    #[msg("Route returned without fixing the exchange rate")]
    RouteDidNotFixRate,
    #[msg("Cannot derive a rate from a zero unwrap amount")]
    ZeroUnwrapAmount,
    #[msg("Exchange rate must be non-zero")]
    ZeroExchangeRate,
    #[msg("Exchange rate would pay out more than fits for this batch")]
    ExchangeRateOverflow,
}
