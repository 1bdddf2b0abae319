use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Timestamp, Uint128, Uint256};
use cw_storage_plus::{Item, Map};
use raffle_common::types::RaffleState;

pub const CONFIG: Item<RaffleConfig> = Item::new("config");
pub const RAFFLE: Item<RaffleInfo> = Item::new("raffle");

/// Entries keyed by (round_id, entry index). Starting a new round clears
/// the player list without touching previous rounds' keys.
pub const PLAYERS: Map<(u64, u32), Addr> = Map::new("players");

/// Completed cycles, keyed by round id
pub const ROUNDS: Map<u64, CompletedRound> = Map::new("rounds");

/// Per-user win tracking
pub const USER_WINS: Map<(&Addr, u64), ()> = Map::new("user_wins");
pub const USER_WIN_COUNT: Map<&Addr, u32> = Map::new("user_win_count");
pub const USER_TOTAL_WON: Map<&Addr, Uint128> = Map::new("user_total_won");

pub const REQUEST_CONFIRMATIONS: u16 = 3;
pub const NUM_WORDS: u32 = 1;

/// Fixed at instantiation; there is no way to update it.
#[cw_serde]
pub struct RaffleConfig {
    /// Minimum payment per entry, and the denom the pool is held in
    pub entrance_fee: Coin,
    pub interval_seconds: u64,
    pub vrf_coordinator: Addr,
    /// Gas lane the coordinator bills requests against
    pub key_hash: String,
    pub subscription_id: u64,
    pub callback_gas_limit: u64,
    pub request_confirmations: u16,
    pub num_words: u32,
}

#[cw_serde]
pub struct RaffleInfo {
    pub state: RaffleState,
    pub round_id: u64,
    pub num_players: u32,
    /// When the last cycle completed (instantiation time before the first)
    pub last_timestamp: Timestamp,
    pub recent_winner: Option<Addr>,
    /// Set exactly while `state` is `Calculating`
    pub pending_request_id: Option<u64>,
}

#[cw_serde]
pub struct CompletedRound {
    pub round_id: u64,
    pub request_id: u64,
    pub random_word: Uint256,
    pub winner_index: u32,
    pub winner: Addr,
    pub prize: Coin,
    pub num_players: u32,
    pub completed_at: Timestamp,
}

/// Carried on the payout sub-message so a failed transfer can be reported.
#[cw_serde]
pub struct PendingPayout {
    pub winner: Addr,
    pub amount: Coin,
}
