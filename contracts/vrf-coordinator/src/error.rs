use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("beacon for round {round} already exists")]
    BeaconAlreadyExists { round: u64 },

    #[error("BLS verification failed: {reason}")]
    VerificationFailed { reason: String },

    #[error("invalid hex input: {field}")]
    InvalidHex { field: String },

    #[error("beacon not found for round {round}")]
    BeaconNotFound { round: u64 },

    #[error("invalid pubkey length: expected 96 bytes, got {got}")]
    InvalidPubkeyLength { got: usize },

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("subscription {subscription_id} not found")]
    SubscriptionNotFound { subscription_id: u64 },

    #[error("{consumer} is not a consumer of subscription {subscription_id}")]
    InvalidConsumer {
        subscription_id: u64,
        consumer: String,
    },

    #[error("subscription {subscription_id} already has {max} consumers")]
    TooManyConsumers { subscription_id: u64, max: usize },

    #[error("key hash {key_hash} is not registered")]
    InvalidKeyHash { key_hash: String },

    #[error("request confirmations {have} out of range [{min}, {max}]")]
    InvalidRequestConfirmations { have: u16, min: u16, max: u16 },

    #[error("num words {have} out of range [1, {max}]")]
    NumWordsTooBig { have: u32, max: u32 },

    #[error("callback gas limit must be non-zero")]
    InvalidCallbackGasLimit,

    #[error("randomness request {request_id} not found")]
    RequestNotFound { request_id: u64 },

    #[error("request {request_id} needs {needed} confirmations, has {have}")]
    NotEnoughConfirmations {
        request_id: u64,
        needed: u64,
        have: u64,
    },
}
