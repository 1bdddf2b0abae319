use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, Coin, Timestamp, Uint128, Uint256};
use raffle_common::types::RaffleState;

use crate::state::{CompletedRound, RaffleConfig, RaffleInfo};

#[cw_serde]
pub struct InstantiateMsg {
    pub vrf_coordinator: String,
    pub subscription_id: u64,
    /// Gas lane registered on the coordinator
    pub key_hash: String,
    pub interval_seconds: u64,
    pub entrance_fee: Coin,
    pub callback_gas_limit: u64,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Join the current round. Send at least the entrance fee in info.funds.
    EnterRaffle {},
    /// Start a draw when `CheckUpkeep` reports it is due. Anyone can call;
    /// the conditions are re-checked here.
    PerformUpkeep {},
    /// Randomness callback. Only the VRF coordinator can call.
    /// Wire-compatible with `raffle_common::VrfConsumerMsg`.
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<Uint256>,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(RaffleConfig)]
    Config {},
    #[returns(RaffleInfo)]
    State {},
    #[returns(Coin)]
    EntranceFee {},
    /// Entry at `index` in the current round
    #[returns(Addr)]
    Player { index: u32 },
    #[returns(PlayersResponse)]
    Players {
        start_after: Option<u32>,
        limit: Option<u32>,
    },
    #[returns(Option<Addr>)]
    RecentWinner {},
    #[returns(RaffleState)]
    RaffleState {},
    #[returns(u32)]
    NumWords {},
    #[returns(u32)]
    NumberOfPlayers {},
    #[returns(Timestamp)]
    LatestTimestamp {},
    #[returns(u16)]
    RequestConfirmations {},
    #[returns(u64)]
    Interval {},
    /// Whether `PerformUpkeep` would currently succeed
    #[returns(CheckUpkeepResponse)]
    CheckUpkeep {},
    #[returns(Coin)]
    PoolBalance {},
    #[returns(Option<u64>)]
    PendingRequest {},
    #[returns(Option<CompletedRound>)]
    Round { round_id: u64 },
    #[returns(RoundHistoryResponse)]
    RoundHistory {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(UserWinsResponse)]
    UserWins {
        address: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
}

#[cw_serde]
pub struct CheckUpkeepResponse {
    pub upkeep_needed: bool,
    /// Always empty; kept for scheduler compatibility
    pub perform_data: Binary,
    pub time_passed: bool,
    pub is_open: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

#[cw_serde]
pub struct PlayerEntry {
    pub index: u32,
    pub address: Addr,
}

#[cw_serde]
pub struct PlayersResponse {
    pub round_id: u64,
    pub players: Vec<PlayerEntry>,
}

#[cw_serde]
pub struct RoundHistoryResponse {
    pub rounds: Vec<CompletedRound>,
}

#[cw_serde]
pub struct UserWinsResponse {
    pub address: String,
    pub total_wins: u32,
    pub total_won_amount: Uint128,
    pub round_ids: Vec<u64>,
}
