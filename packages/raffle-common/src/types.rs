use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint256;

/// Custom event emitted by the coordinator when it accepts a request.
/// On chain the event type is prefixed with `wasm-`.
pub const RANDOMNESS_REQUESTED_EVENT: &str = "vrf_randomness_requested";
pub const REQUEST_ID_ATTR: &str = "request_id";

/// Lifecycle of the raffle. `Open` accepts entries and may be triggered;
/// `Calculating` waits for exactly one randomness delivery.
#[cw_serde]
#[derive(Copy, Eq)]
pub enum RaffleState {
    Open,
    Calculating,
}

impl fmt::Display for RaffleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaffleState::Open => write!(f, "open"),
            RaffleState::Calculating => write!(f, "calculating"),
        }
    }
}

/// Messages a consumer sends to the VRF coordinator.
#[cw_serde]
pub enum VrfCoordinatorMsg {
    RequestRandomWords {
        /// Gas lane the request is billed against
        key_hash: String,
        subscription_id: u64,
        /// Blocks to wait before the request may be fulfilled
        request_confirmations: u16,
        /// Gas limit applied to the consumer callback
        callback_gas_limit: u64,
        num_words: u32,
    },
}

/// Callback the coordinator delivers to a consumer, exactly once per request.
#[cw_serde]
pub enum VrfConsumerMsg {
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<Uint256>,
    },
}
