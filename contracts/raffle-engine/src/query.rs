use cosmwasm_std::{to_json_binary, Binary, Deps, Env, Order, StdError, StdResult, Uint128};
use cw_storage_plus::Bound;

use crate::execute::{pool_balance, upkeep_status};
use crate::msg::{
    CheckUpkeepResponse, PlayerEntry, PlayersResponse, RoundHistoryResponse, UserWinsResponse,
};
use crate::state::{
    CONFIG, PLAYERS, RAFFLE, ROUNDS, USER_TOTAL_WON, USER_WINS, USER_WIN_COUNT,
};

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_state(deps: Deps) -> StdResult<Binary> {
    let raffle = RAFFLE.load(deps.storage)?;
    to_json_binary(&raffle)
}

pub fn query_entrance_fee(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config.entrance_fee)
}

pub fn query_player(deps: Deps, index: u32) -> StdResult<Binary> {
    let raffle = RAFFLE.load(deps.storage)?;
    if index >= raffle.num_players {
        return Err(StdError::generic_err(format!(
            "player index {} out of range: {} players in round {}",
            index, raffle.num_players, raffle.round_id
        )));
    }
    let player = PLAYERS.load(deps.storage, (raffle.round_id, index))?;
    to_json_binary(&player)
}

pub fn query_players(
    deps: Deps,
    start_after: Option<u32>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let raffle = RAFFLE.load(deps.storage)?;
    let limit = limit.unwrap_or(20).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let players: Vec<PlayerEntry> = PLAYERS
        .prefix(raffle.round_id)
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .filter_map(|r| r.ok())
        .map(|(index, address)| PlayerEntry { index, address })
        .collect();

    to_json_binary(&PlayersResponse {
        round_id: raffle.round_id,
        players,
    })
}

pub fn query_recent_winner(deps: Deps) -> StdResult<Binary> {
    let raffle = RAFFLE.load(deps.storage)?;
    to_json_binary(&raffle.recent_winner)
}

pub fn query_raffle_state(deps: Deps) -> StdResult<Binary> {
    let raffle = RAFFLE.load(deps.storage)?;
    to_json_binary(&raffle.state)
}

pub fn query_num_words(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config.num_words)
}

pub fn query_number_of_players(deps: Deps) -> StdResult<Binary> {
    let raffle = RAFFLE.load(deps.storage)?;
    to_json_binary(&raffle.num_players)
}

pub fn query_latest_timestamp(deps: Deps) -> StdResult<Binary> {
    let raffle = RAFFLE.load(deps.storage)?;
    to_json_binary(&raffle.last_timestamp)
}

pub fn query_request_confirmations(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config.request_confirmations)
}

pub fn query_interval(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config.interval_seconds)
}

pub fn query_check_upkeep(deps: Deps, env: Env) -> StdResult<Binary> {
    let status = upkeep_status(deps, &env)?;
    to_json_binary(&CheckUpkeepResponse {
        upkeep_needed: status.upkeep_needed(),
        perform_data: Binary::default(),
        time_passed: status.time_passed,
        is_open: status.is_open,
        has_players: status.has_players,
        has_balance: status.has_balance,
    })
}

pub fn query_pool_balance(deps: Deps, env: Env) -> StdResult<Binary> {
    to_json_binary(&pool_balance(deps, &env)?)
}

pub fn query_pending_request(deps: Deps) -> StdResult<Binary> {
    let raffle = RAFFLE.load(deps.storage)?;
    to_json_binary(&raffle.pending_request_id)
}

pub fn query_round(deps: Deps, round_id: u64) -> StdResult<Binary> {
    let round = ROUNDS.may_load(deps.storage, round_id)?;
    to_json_binary(&round)
}

pub fn query_round_history(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(20).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let rounds: Vec<_> = ROUNDS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .filter_map(|r| r.ok())
        .map(|(_, round)| round)
        .collect();

    to_json_binary(&RoundHistoryResponse { rounds })
}

pub fn query_user_wins(
    deps: Deps,
    address: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&address)?;
    let limit = limit.unwrap_or(20).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let round_ids: Vec<u64> = USER_WINS
        .prefix(&addr)
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .filter_map(|r| r.ok())
        .map(|(round_id, _)| round_id)
        .collect();

    let total_wins = USER_WIN_COUNT.may_load(deps.storage, &addr)?.unwrap_or(0);
    let total_won = USER_TOTAL_WON
        .may_load(deps.storage, &addr)?
        .unwrap_or(Uint128::zero());

    to_json_binary(&UserWinsResponse {
        address,
        total_wins,
        total_won_amount: total_won,
        round_ids,
    })
}
