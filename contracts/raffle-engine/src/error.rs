use cosmwasm_std::{StdError, Uint128};
use raffle_common::types::RaffleState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("insufficient payment: sent {sent}, entrance fee is {required}")]
    InsufficientPayment { sent: Uint128, required: Uint128 },

    #[error("must pay the entrance fee in {expected}, got {denom}")]
    WrongDenom { denom: String, expected: String },

    #[error("raffle is not open")]
    RaffleNotOpen,

    #[error("raffle is not waiting for randomness")]
    RaffleNotCalculating,

    #[error("upkeep not needed: balance {balance}, players {num_players}, state {raffle_state}")]
    UpkeepNotNeeded {
        balance: Uint128,
        num_players: u32,
        raffle_state: RaffleState,
    },

    #[error("only coordinator can fulfill: have {have}, want {want}")]
    OnlyCoordinatorCanFulfill { have: String, want: String },

    #[error("request {request_id} is not the pending randomness request")]
    UnknownRequest { request_id: u64 },

    #[error("no random words delivered")]
    NoRandomWords,

    #[error("no players in round {round_id}")]
    NoPlayers { round_id: u64 },

    #[error("coordinator response did not include a request id")]
    MissingRequestId,

    #[error("unknown reply id {id}")]
    UnknownReplyId { id: u64 },

    #[error("payout of {amount} to {winner} failed: {reason}")]
    PayoutTransferFailed {
        winner: String,
        amount: String,
        reason: String,
    },
}
