use cosmwasm_std::{
    from_json, to_json_binary, BankMsg, Coin, Deps, DepsMut, Env, Event, MessageInfo, Reply,
    Response, StdError, StdResult, SubMsg, SubMsgResult, Uint128, Uint256, WasmMsg,
};
use raffle_common::randomness::winner_index;
use raffle_common::types::{
    RaffleState, VrfCoordinatorMsg, RANDOMNESS_REQUESTED_EVENT, REQUEST_ID_ATTR,
};

use crate::error::ContractError;
use crate::state::{
    CompletedRound, PendingPayout, CONFIG, PLAYERS, RAFFLE, ROUNDS, USER_TOTAL_WON, USER_WINS,
    USER_WIN_COUNT,
};

pub const REQUEST_RANDOMNESS_REPLY_ID: u64 = 1;
pub const PAYOUT_REPLY_ID: u64 = 2;

/// The four conditions `PerformUpkeep` requires, evaluated at one block.
pub struct UpkeepStatus {
    pub time_passed: bool,
    pub is_open: bool,
    pub has_players: bool,
    pub has_balance: bool,
    pub balance: Uint128,
    pub num_players: u32,
    pub state: RaffleState,
}

impl UpkeepStatus {
    pub fn upkeep_needed(&self) -> bool {
        self.time_passed && self.is_open && self.has_players && self.has_balance
    }
}

/// The pool is the contract's own bank balance in the entrance-fee denom.
pub fn pool_balance(deps: Deps, env: &Env) -> StdResult<Coin> {
    let config = CONFIG.load(deps.storage)?;
    deps.querier
        .query_balance(&env.contract.address, config.entrance_fee.denom)
}

pub fn upkeep_status(deps: Deps, env: &Env) -> StdResult<UpkeepStatus> {
    let config = CONFIG.load(deps.storage)?;
    let raffle = RAFFLE.load(deps.storage)?;
    let balance = pool_balance(deps, env)?.amount;

    let elapsed = env
        .block
        .time
        .seconds()
        .saturating_sub(raffle.last_timestamp.seconds());

    Ok(UpkeepStatus {
        time_passed: elapsed > config.interval_seconds,
        is_open: raffle.state == RaffleState::Open,
        has_players: raffle.num_players > 0,
        has_balance: !balance.is_zero(),
        balance,
        num_players: raffle.num_players,
        state: raffle.state,
    })
}

/// Enter the current round with at least the entrance fee.
/// The sender is appended to the players; entering twice buys two entries.
pub fn enter_raffle(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    let mut paid = Uint128::zero();
    for coin in &info.funds {
        if coin.denom != config.entrance_fee.denom {
            return Err(ContractError::WrongDenom {
                denom: coin.denom.clone(),
                expected: config.entrance_fee.denom.clone(),
            });
        }
        paid += coin.amount;
    }

    if paid < config.entrance_fee.amount {
        return Err(ContractError::InsufficientPayment {
            sent: paid,
            required: config.entrance_fee.amount,
        });
    }

    let mut raffle = RAFFLE.load(deps.storage)?;
    if raffle.state != RaffleState::Open {
        return Err(ContractError::RaffleNotOpen);
    }

    let player_index = raffle.num_players;
    PLAYERS.save(deps.storage, (raffle.round_id, player_index), &info.sender)?;
    raffle.num_players += 1;
    RAFFLE.save(deps.storage, &raffle)?;

    Ok(Response::new()
        .add_attribute("action", "enter_raffle")
        .add_attribute("player", info.sender.to_string())
        .add_event(
            Event::new("raffle_entered")
                .add_attribute("player", info.sender.to_string())
                .add_attribute("round_id", raffle.round_id.to_string())
                .add_attribute("player_index", player_index.to_string())
                .add_attribute("amount", paid.to_string()),
        ))
}

/// Arm a draw. Anyone can call.
///
/// The `CheckUpkeep` conditions are evaluated again against this block.
/// Issues one randomness request and pays nothing.
pub fn perform_upkeep(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
) -> Result<Response, ContractError> {
    let status = upkeep_status(deps.as_ref(), &env)?;
    if !status.upkeep_needed() {
        return Err(ContractError::UpkeepNotNeeded {
            balance: status.balance,
            num_players: status.num_players,
            raffle_state: status.state,
        });
    }

    let config = CONFIG.load(deps.storage)?;
    let mut raffle = RAFFLE.load(deps.storage)?;
    raffle.state = RaffleState::Calculating;
    RAFFLE.save(deps.storage, &raffle)?;

    let request = WasmMsg::Execute {
        contract_addr: config.vrf_coordinator.to_string(),
        msg: to_json_binary(&VrfCoordinatorMsg::RequestRandomWords {
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: config.request_confirmations,
            callback_gas_limit: config.callback_gas_limit,
            num_words: config.num_words,
        })?,
        funds: vec![],
    };

    Ok(Response::new()
        .add_submessage(SubMsg::reply_on_success(request, REQUEST_RANDOMNESS_REPLY_ID))
        .add_attribute("action", "perform_upkeep")
        .add_attribute("round_id", raffle.round_id.to_string())
        .add_attribute("num_players", raffle.num_players.to_string())
        .add_attribute("pool", status.balance.to_string()))
}

/// Record the id the coordinator assigned to our request.
///
/// The id is read from the coordinator's `wasm-vrf_randomness_requested`
/// event; events from any other contract are ignored.
pub fn handle_randomness_requested(
    deps: DepsMut,
    _env: Env,
    msg: Reply,
) -> Result<Response, ContractError> {
    let response = msg.result.into_result().map_err(StdError::generic_err)?;
    let config = CONFIG.load(deps.storage)?;

    let event_type = format!("wasm-{}", RANDOMNESS_REQUESTED_EVENT);
    let request_id = response
        .events
        .iter()
        .filter(|e| e.ty == event_type)
        .filter(|e| {
            e.attributes.iter().any(|a| {
                a.key == "_contract_address" && a.value == config.vrf_coordinator.as_str()
            })
        })
        .find_map(|e| e.attributes.iter().find(|a| a.key == REQUEST_ID_ATTR))
        .and_then(|a| a.value.parse::<u64>().ok())
        .ok_or(ContractError::MissingRequestId)?;

    let mut raffle = RAFFLE.load(deps.storage)?;
    raffle.pending_request_id = Some(request_id);
    RAFFLE.save(deps.storage, &raffle)?;

    Ok(Response::new()
        .add_attribute("action", "randomness_requested")
        .add_attribute(REQUEST_ID_ATTR, request_id.to_string())
        .add_event(
            Event::new("raffle_randomness_requested")
                .add_attribute(REQUEST_ID_ATTR, request_id.to_string())
                .add_attribute("round_id", raffle.round_id.to_string()),
        ))
}

/// Randomness callback from the coordinator. Picks the winner, reopens the
/// raffle and pays out the whole pool.
///
/// 1. Check sender, state and request id
/// 2. winner_index = random_words[0] % num_players
/// 3. Record the winner (recent winner, round history, user stats)
/// 4. Reopen: state Open, new empty round, last_timestamp = now
/// 5. Send the entire pool balance to the winner
///
/// State is written before the transfer is dispatched. If the transfer
/// fails the payout reply returns an error, which reverts the whole
/// transaction, so the raffle stays `Calculating` with its players and
/// the coordinator keeps the request pending.
pub fn fulfill_random_words(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: u64,
    random_words: Vec<Uint256>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.vrf_coordinator {
        return Err(ContractError::OnlyCoordinatorCanFulfill {
            have: info.sender.to_string(),
            want: config.vrf_coordinator.to_string(),
        });
    }

    let mut raffle = RAFFLE.load(deps.storage)?;
    if raffle.state != RaffleState::Calculating {
        return Err(ContractError::RaffleNotCalculating);
    }
    if raffle.pending_request_id != Some(request_id) {
        return Err(ContractError::UnknownRequest { request_id });
    }

    let random_word = *random_words.first().ok_or(ContractError::NoRandomWords)?;
    let round_id = raffle.round_id;
    let num_players = raffle.num_players;
    let index = winner_index(random_word, num_players)
        .ok_or(ContractError::NoPlayers { round_id })?;
    let winner = PLAYERS.load(deps.storage, (round_id, index))?;

    let prize = pool_balance(deps.as_ref(), &env)?;

    ROUNDS.save(
        deps.storage,
        round_id,
        &CompletedRound {
            round_id,
            request_id,
            random_word,
            winner_index: index,
            winner: winner.clone(),
            prize: prize.clone(),
            num_players,
            completed_at: env.block.time,
        },
    )?;

    USER_WINS.save(deps.storage, (&winner, round_id), &())?;
    let win_count = USER_WIN_COUNT.may_load(deps.storage, &winner)?.unwrap_or(0);
    USER_WIN_COUNT.save(deps.storage, &winner, &(win_count + 1))?;
    let user_total = USER_TOTAL_WON
        .may_load(deps.storage, &winner)?
        .unwrap_or(Uint128::zero());
    USER_TOTAL_WON.save(deps.storage, &winner, &(user_total + prize.amount))?;

    raffle.recent_winner = Some(winner.clone());
    raffle.state = RaffleState::Open;
    raffle.pending_request_id = None;
    raffle.round_id += 1;
    raffle.num_players = 0;
    raffle.last_timestamp = env.block.time;
    RAFFLE.save(deps.storage, &raffle)?;

    let mut response = Response::new();
    if !prize.amount.is_zero() {
        let payout = PendingPayout {
            winner: winner.clone(),
            amount: prize.clone(),
        };
        let send = BankMsg::Send {
            to_address: winner.to_string(),
            amount: vec![prize.clone()],
        };
        response = response.add_submessage(
            SubMsg::reply_on_error(send, PAYOUT_REPLY_ID).with_payload(to_json_binary(&payout)?),
        );
    }

    Ok(response
        .add_attribute("action", "fulfill_random_words")
        .add_attribute("winner", winner.to_string())
        .add_attribute("prize", prize.to_string())
        .add_event(
            Event::new("raffle_winner_picked")
                .add_attribute("winner", winner.to_string())
                .add_attribute("round_id", round_id.to_string())
                .add_attribute(REQUEST_ID_ATTR, request_id.to_string())
                .add_attribute("winner_index", index.to_string())
                .add_attribute("num_players", num_players.to_string())
                .add_attribute("prize", prize.amount.to_string())
                .add_attribute("denom", prize.denom)
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

/// The payout transfer failed. Abort the whole transaction.
pub fn handle_payout_failed(msg: Reply) -> Result<Response, ContractError> {
    let payout: PendingPayout = from_json(&msg.payload)?;
    let reason = match msg.result {
        SubMsgResult::Err(err) => err,
        SubMsgResult::Ok(_) => "transfer reported success".to_string(),
    };
    Err(ContractError::PayoutTransferFailed {
        winner: payout.winner.to_string(),
        amount: payout.amount.to_string(),
        reason,
    })
}
