use cosmwasm_std::{
    entry_point, Binary, Deps, DepsMut, Env, MessageInfo, Reply, Response, StdResult,
};
use cw2::{get_contract_version, set_contract_version};
use raffle_common::types::RaffleState;

use crate::error::ContractError;
use crate::execute::{self, PAYOUT_REPLY_ID, REQUEST_RANDOMNESS_REPLY_ID};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query;
use crate::state::{RaffleConfig, RaffleInfo, CONFIG, NUM_WORDS, RAFFLE, REQUEST_CONFIRMATIONS};

const CONTRACT_NAME: &str = "crates.io:raffle-engine";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    if msg.entrance_fee.denom.is_empty() {
        return Err(ContractError::InvalidConfig {
            reason: "entrance fee denom must be set".to_string(),
        });
    }
    if msg.entrance_fee.amount.is_zero() {
        return Err(ContractError::InvalidConfig {
            reason: "entrance fee must be non-zero".to_string(),
        });
    }
    if msg.interval_seconds == 0 {
        return Err(ContractError::InvalidConfig {
            reason: "interval_seconds must be non-zero".to_string(),
        });
    }
    if msg.callback_gas_limit == 0 {
        return Err(ContractError::InvalidConfig {
            reason: "callback_gas_limit must be non-zero".to_string(),
        });
    }
    if msg.key_hash.is_empty() {
        return Err(ContractError::InvalidConfig {
            reason: "key_hash must be set".to_string(),
        });
    }

    let config = RaffleConfig {
        entrance_fee: msg.entrance_fee,
        interval_seconds: msg.interval_seconds,
        vrf_coordinator: deps.api.addr_validate(&msg.vrf_coordinator)?,
        key_hash: msg.key_hash,
        subscription_id: msg.subscription_id,
        callback_gas_limit: msg.callback_gas_limit,
        request_confirmations: REQUEST_CONFIRMATIONS,
        num_words: NUM_WORDS,
    };
    CONFIG.save(deps.storage, &config)?;

    let raffle = RaffleInfo {
        state: RaffleState::Open,
        round_id: 1,
        num_players: 0,
        last_timestamp: env.block.time,
        recent_winner: None,
        pending_request_id: None,
    };
    RAFFLE.save(deps.storage, &raffle)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "raffle-engine")
        .add_attribute("vrf_coordinator", config.vrf_coordinator.to_string())
        .add_attribute("entrance_fee", config.entrance_fee.to_string())
        .add_attribute("interval_seconds", config.interval_seconds.to_string()))
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::EnterRaffle {} => execute::enter_raffle(deps, env, info),
        ExecuteMsg::PerformUpkeep {} => execute::perform_upkeep(deps, env, info),
        ExecuteMsg::FulfillRandomWords {
            request_id,
            random_words,
        } => execute::fulfill_random_words(deps, env, info, request_id, random_words),
    }
}

#[entry_point]
pub fn reply(deps: DepsMut, env: Env, msg: Reply) -> Result<Response, ContractError> {
    match msg.id {
        REQUEST_RANDOMNESS_REPLY_ID => execute::handle_randomness_requested(deps, env, msg),
        PAYOUT_REPLY_ID => execute::handle_payout_failed(msg),
        id => Err(ContractError::UnknownReplyId { id }),
    }
}

#[entry_point]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::State {} => query::query_state(deps),
        QueryMsg::EntranceFee {} => query::query_entrance_fee(deps),
        QueryMsg::Player { index } => query::query_player(deps, index),
        QueryMsg::Players { start_after, limit } => query::query_players(deps, start_after, limit),
        QueryMsg::RecentWinner {} => query::query_recent_winner(deps),
        QueryMsg::RaffleState {} => query::query_raffle_state(deps),
        QueryMsg::NumWords {} => query::query_num_words(deps),
        QueryMsg::NumberOfPlayers {} => query::query_number_of_players(deps),
        QueryMsg::LatestTimestamp {} => query::query_latest_timestamp(deps),
        QueryMsg::RequestConfirmations {} => query::query_request_confirmations(deps),
        QueryMsg::Interval {} => query::query_interval(deps),
        QueryMsg::CheckUpkeep {} => query::query_check_upkeep(deps, env),
        QueryMsg::PoolBalance {} => query::query_pool_balance(deps, env),
        QueryMsg::PendingRequest {} => query::query_pending_request(deps),
        QueryMsg::Round { round_id } => query::query_round(deps, round_id),
        QueryMsg::RoundHistory { start_after, limit } => {
            query::query_round_history(deps, start_after, limit)
        }
        QueryMsg::UserWins {
            address,
            start_after,
            limit,
        } => query::query_user_wins(deps, address, start_after, limit),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
