use cosmwasm_schema::{cw_serde, QueryResponses};

use crate::state::{CoordinatorConfig, Fulfillment, RandomnessRequest, StoredBeacon, Subscription};

#[cw_serde]
pub struct InstantiateMsg {
    pub operators: Vec<String>,
    /// Hex-encoded quicknet public key (96 bytes = 192 hex chars)
    pub quicknet_pubkey_hex: String,
    pub chain_hash: String,
    pub genesis_time: u64,
    pub period_seconds: u64,
    pub key_hashes: Vec<String>,
    pub max_num_words: u32,
    pub min_request_confirmations: u16,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Submit a drand beacon for verification and storage.
    SubmitBeacon {
        round: u64,
        /// Hex-encoded BLS signature (48 bytes = 96 hex chars)
        signature_hex: String,
    },
    /// Update operator list (admin only).
    UpdateOperators {
        add: Vec<String>,
        remove: Vec<String>,
    },
    /// Open a subscription owned by the sender.
    CreateSubscription {},
    /// Allow a contract to request against a subscription (owner only).
    AddConsumer {
        subscription_id: u64,
        consumer: String,
    },
    RemoveConsumer {
        subscription_id: u64,
        consumer: String,
    },
    /// Request random words. Sender must be a registered consumer.
    /// Wire-compatible with `raffle_common::VrfCoordinatorMsg`.
    RequestRandomWords {
        key_hash: String,
        subscription_id: u64,
        request_confirmations: u16,
        callback_gas_limit: u64,
        num_words: u32,
    },
    /// Deliver a pending request once its beacon is stored. Anyone can call;
    /// the words are fully determined by the beacon and the request id.
    FulfillRandomWords { request_id: u64 },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(CoordinatorConfig)]
    Config {},

    #[returns(Option<StoredBeacon>)]
    Beacon { round: u64 },

    #[returns(u64)]
    LatestRound {},

    #[returns(Subscription)]
    Subscription { subscription_id: u64 },

    #[returns(Option<RandomnessRequest>)]
    Request { request_id: u64 },

    #[returns(Vec<RandomnessRequest>)]
    PendingRequests {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(Option<Fulfillment>)]
    Fulfillment { request_id: u64 },
}
