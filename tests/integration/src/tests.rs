//! Integration tests for the raffle engine and the VRF coordinator.
//!
//! Both contracts are driven through their entry points with
//! `cosmwasm_std::testing` mocks, one `OwnedDeps` per contract. Messages
//! one contract emits are decoded and fed to the other's `execute` or
//! `reply`, the way the chain would route them. Bank transfers are
//! mirrored with `MockQuerier::bank::update_balance`.
//!
//! A failed transaction is rolled back by restoring storage snapshots
//! taken before it started.
//!
//! Run:
//! ```bash
//! cargo test -p raffle-integration-tests
//! ```

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    coin, coins, from_json, Addr, BankMsg, Binary, CosmosMsg, Env, Event, MemoryStorage, Order,
    OwnedDeps, Reply, Response, Storage, SubMsgResponse, SubMsgResult, Timestamp, Uint256,
    WasmMsg,
};
use raffle_common::randomness::{expand_random_words, winner_index};
use raffle_common::types::RaffleState;

type Deps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

// ─── Constants ───

/// Real drand quicknet public key
const QUICKNET_PK_HEX: &str = "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a";

/// Real quicknet test vector: round 1000
const TEST_ROUND: u64 = 1000;
const TEST_SIG_HEX: &str = "b44679b9a59af2ec876b1a6b1ad52ea9b1615fc3982b19576350f93447cb1125e342b73a8dd2bacbe47e4b6b63ed5e39";
const TEST_RANDOMNESS_HEX: &str =
    "fe290beca10872ef2fb164d2aa4442de4566183ec51c56ff3cd603d930e54fdd";

const GENESIS_TIME: u64 = 1692803367;
/// Requests made at this block time are pinned to round 1000
const DRAW_TIME: u64 = GENESIS_TIME + 2994;
const INTERVAL: u64 = 30;
const KEY_HASH: &str = "quicknet-lane";
const DENOM: &str = "inj";
/// 0.1 INJ
const FEE: u128 = 100_000_000_000_000_000;

// ─── Chain helpers ───

fn addr(name: &str) -> Addr {
    MockApi::default().addr_make(name)
}

fn env_for(contract: &str, time: u64, height: u64) -> Env {
    let mut env = mock_env();
    env.contract.address = addr(contract);
    env.block.time = Timestamp::from_seconds(time);
    env.block.height = height;
    env
}

fn engine_env(time: u64, height: u64) -> Env {
    env_for("raffle", time, height)
}

fn coordinator_env(time: u64, height: u64) -> Env {
    env_for("coordinator", time, height)
}

/// Events as the chain reports them to a reply handler.
fn emitted_events(contract: &Addr, res: &Response) -> Vec<Event> {
    res.events
        .iter()
        .map(|e| {
            let mut event = Event::new(format!("wasm-{}", e.ty))
                .add_attribute("_contract_address", contract.to_string());
            event.attributes.extend(e.attributes.clone());
            event
        })
        .collect()
}

fn wasm_execute(res: &Response) -> (String, Binary) {
    match &res.messages[0].msg {
        CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr, msg, ..
        }) => (contract_addr.clone(), msg.clone()),
        m => panic!("expected wasm execute, got {m:?}"),
    }
}

fn snapshot(storage: &MemoryStorage) -> MemoryStorage {
    let mut copy = MemoryStorage::new();
    for (key, value) in storage.range(None, None, Order::Ascending) {
        copy.set(&key, &value);
    }
    copy
}

fn bank_balance(deps: &Deps, who: &Addr) -> u128 {
    deps.as_ref()
        .querier
        .query_balance(who, DENOM)
        .unwrap()
        .amount
        .u128()
}

fn set_bank_balance(deps: &mut Deps, who: &Addr, amount: u128) {
    deps.querier
        .bank
        .update_balance(who, coins(amount, DENOM));
}

// ─── Coordinator helpers ───

fn setup_coordinator(deps: &mut Deps) {
    let msg = raffle_vrf_coordinator::msg::InstantiateMsg {
        operators: vec![addr("operator").to_string()],
        quicknet_pubkey_hex: QUICKNET_PK_HEX.to_string(),
        chain_hash: "52db9ba70e0cc0f6eaf7803dd07447a1f5477735fd3f661792ba94600c84e971".to_string(),
        genesis_time: GENESIS_TIME,
        period_seconds: 3,
        key_hashes: vec![KEY_HASH.to_string()],
        max_num_words: 10,
        min_request_confirmations: 1,
    };
    raffle_vrf_coordinator::contract::instantiate(
        deps.as_mut(),
        coordinator_env(GENESIS_TIME, 1),
        message_info(&addr("admin"), &[]),
        msg,
    )
    .unwrap();

    raffle_vrf_coordinator::contract::execute(
        deps.as_mut(),
        coordinator_env(GENESIS_TIME, 1),
        message_info(&addr("owner"), &[]),
        raffle_vrf_coordinator::msg::ExecuteMsg::CreateSubscription {},
    )
    .unwrap();
}

fn add_engine_consumer(deps: &mut Deps) {
    raffle_vrf_coordinator::contract::execute(
        deps.as_mut(),
        coordinator_env(GENESIS_TIME, 1),
        message_info(&addr("owner"), &[]),
        raffle_vrf_coordinator::msg::ExecuteMsg::AddConsumer {
            subscription_id: 1,
            consumer: addr("raffle").to_string(),
        },
    )
    .unwrap();
}

fn submit_test_beacon(deps: &mut Deps) {
    raffle_vrf_coordinator::contract::execute(
        deps.as_mut(),
        coordinator_env(DRAW_TIME + 3, 100),
        message_info(&addr("operator"), &[]),
        raffle_vrf_coordinator::msg::ExecuteMsg::SubmitBeacon {
            round: TEST_ROUND,
            signature_hex: TEST_SIG_HEX.to_string(),
        },
    )
    .unwrap();
}

fn pending_request(
    deps: &Deps,
    request_id: u64,
) -> Option<raffle_vrf_coordinator::state::RandomnessRequest> {
    let bin = raffle_vrf_coordinator::contract::query(
        deps.as_ref(),
        coordinator_env(DRAW_TIME, 100),
        raffle_vrf_coordinator::msg::QueryMsg::Request { request_id },
    )
    .unwrap();
    from_json(bin).unwrap()
}

// ─── Engine helpers ───

fn setup_engine(deps: &mut Deps) {
    let msg = raffle_engine::msg::InstantiateMsg {
        vrf_coordinator: addr("coordinator").to_string(),
        subscription_id: 1,
        key_hash: KEY_HASH.to_string(),
        interval_seconds: INTERVAL,
        entrance_fee: coin(FEE, DENOM),
        callback_gas_limit: 500_000,
    };
    raffle_engine::contract::instantiate(
        deps.as_mut(),
        engine_env(DRAW_TIME - 60, 80),
        message_info(&addr("creator"), &[]),
        msg,
    )
    .unwrap();
}

fn enter(deps: &mut Deps, name: &str) -> Addr {
    let player = addr(name);
    raffle_engine::contract::execute(
        deps.as_mut(),
        engine_env(DRAW_TIME - 30, 85),
        message_info(&player, &coins(FEE, DENOM)),
        raffle_engine::msg::ExecuteMsg::EnterRaffle {},
    )
    .unwrap();
    let engine = addr("raffle");
    let pool = bank_balance(deps, &engine);
    set_bank_balance(deps, &engine, pool + FEE);
    player
}

fn raffle_info(deps: &Deps) -> raffle_engine::state::RaffleInfo {
    let bin = raffle_engine::contract::query(
        deps.as_ref(),
        engine_env(DRAW_TIME, 100),
        raffle_engine::msg::QueryMsg::State {},
    )
    .unwrap();
    from_json(bin).unwrap()
}

/// PerformUpkeep on the engine, the coordinator request it dispatches, and
/// the reply carrying the request id back. Returns the request id.
fn perform_upkeep(engine: &mut Deps, coordinator: &mut Deps) -> u64 {
    let res = raffle_engine::contract::execute(
        engine.as_mut(),
        engine_env(DRAW_TIME, 100),
        message_info(&addr("keeper"), &[]),
        raffle_engine::msg::ExecuteMsg::PerformUpkeep {},
    )
    .unwrap();
    let (target, msg) = wasm_execute(&res);
    assert_eq!(target, addr("coordinator").to_string());

    let coord_res = raffle_vrf_coordinator::contract::execute(
        coordinator.as_mut(),
        coordinator_env(DRAW_TIME, 100),
        message_info(&addr("raffle"), &[]),
        from_json(msg).unwrap(),
    )
    .unwrap();

    #[allow(deprecated)]
    let reply = Reply {
        id: res.messages[0].id,
        payload: res.messages[0].payload.clone(),
        gas_used: 0,
        result: SubMsgResult::Ok(SubMsgResponse {
            events: emitted_events(&addr("coordinator"), &coord_res),
            data: coord_res.data.clone(),
            msg_responses: vec![],
        }),
    };
    raffle_engine::contract::reply(engine.as_mut(), engine_env(DRAW_TIME, 100), reply).unwrap();

    from_json(coord_res.data.unwrap()).unwrap()
}

/// Coordinator fulfillment at `height`, with the consumer callback routed
/// into the engine. Returns the engine's response.
fn fulfill(
    engine: &mut Deps,
    coordinator: &mut Deps,
    request_id: u64,
    height: u64,
) -> Result<Response, raffle_engine::error::ContractError> {
    let coord_res = raffle_vrf_coordinator::contract::execute(
        coordinator.as_mut(),
        coordinator_env(DRAW_TIME + 10, height),
        message_info(&addr("relayer"), &[]),
        raffle_vrf_coordinator::msg::ExecuteMsg::FulfillRandomWords { request_id },
    )
    .unwrap();
    assert_eq!(coord_res.messages[0].gas_limit, Some(500_000));
    let (target, msg) = wasm_execute(&coord_res);
    assert_eq!(target, addr("raffle").to_string());

    raffle_engine::contract::execute(
        engine.as_mut(),
        engine_env(DRAW_TIME + 10, height),
        message_info(&addr("coordinator"), &[]),
        from_json(msg).unwrap(),
    )
}

fn expected_word(request_id: u64) -> Uint256 {
    let randomness = hex::decode(TEST_RANDOMNESS_HEX).unwrap();
    expand_random_words(&randomness, request_id, 1)[0]
}

fn payout_of(res: &Response) -> (String, u128) {
    res.messages
        .iter()
        .find_map(|m| match &m.msg {
            CosmosMsg::Bank(BankMsg::Send { to_address, amount }) => {
                Some((to_address.clone(), amount[0].amount.u128()))
            }
            _ => None,
        })
        .expect("no payout")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_full_raffle_cycle_with_quicknet_beacon() {
    let mut coordinator = mock_dependencies();
    let mut engine = mock_dependencies();
    setup_coordinator(&mut coordinator);
    add_engine_consumer(&mut coordinator);
    setup_engine(&mut engine);

    let players = vec![
        enter(&mut engine, "alice"),
        enter(&mut engine, "bob"),
        enter(&mut engine, "carol"),
    ];

    let check: raffle_engine::msg::CheckUpkeepResponse = from_json(
        raffle_engine::contract::query(
            engine.as_ref(),
            engine_env(DRAW_TIME, 100),
            raffle_engine::msg::QueryMsg::CheckUpkeep {},
        )
        .unwrap(),
    )
    .unwrap();
    assert!(check.upkeep_needed);

    let request_id = perform_upkeep(&mut engine, &mut coordinator);
    assert_eq!(request_id, 1);

    let info = raffle_info(&engine);
    assert_eq!(info.state, RaffleState::Calculating);
    assert_eq!(info.pending_request_id, Some(request_id));
    assert_eq!(info.num_players, 3);

    let request = pending_request(&coordinator, request_id).unwrap();
    assert_eq!(request.target_round, TEST_ROUND);
    assert_eq!(request.consumer, addr("raffle"));
    assert_eq!(request.request_confirmations, 3);

    submit_test_beacon(&mut coordinator);

    // Too early: the request needs three blocks on top of it
    let err = raffle_vrf_coordinator::contract::execute(
        coordinator.as_mut(),
        coordinator_env(DRAW_TIME + 10, 102),
        message_info(&addr("relayer"), &[]),
        raffle_vrf_coordinator::msg::ExecuteMsg::FulfillRandomWords { request_id },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        raffle_vrf_coordinator::error::ContractError::NotEnoughConfirmations { .. }
    ));

    let res = fulfill(&mut engine, &mut coordinator, request_id, 103).unwrap();

    let word = expected_word(request_id);
    let index = winner_index(word, 3).unwrap() as usize;
    let winner = players[index].clone();

    let info = raffle_info(&engine);
    assert_eq!(info.recent_winner, Some(winner.clone()));
    assert_eq!(info.state, RaffleState::Open);
    assert_eq!(info.num_players, 0);
    assert_eq!(info.round_id, 2);
    assert_eq!(info.last_timestamp, Timestamp::from_seconds(DRAW_TIME + 10));

    // Apply the payout the way the bank module would
    let (to, amount) = payout_of(&res);
    assert_eq!(to, winner.to_string());
    assert_eq!(amount, FEE * 3);
    let engine_addr = addr("raffle");
    let remaining = bank_balance(&engine, &engine_addr) - amount;
    set_bank_balance(&mut engine, &engine_addr, remaining);
    set_bank_balance(&mut engine, &winner, amount);
    assert_eq!(bank_balance(&engine, &engine_addr), 0);
    assert_eq!(bank_balance(&engine, &winner), FEE * 3);

    assert!(pending_request(&coordinator, request_id).is_none());

    let round: Option<raffle_engine::state::CompletedRound> = from_json(
        raffle_engine::contract::query(
            engine.as_ref(),
            engine_env(DRAW_TIME + 10, 103),
            raffle_engine::msg::QueryMsg::Round { round_id: 1 },
        )
        .unwrap(),
    )
    .unwrap();
    let round = round.unwrap();
    assert_eq!(round.random_word, word);
    assert_eq!(round.winner, winner);
    assert_eq!(round.request_id, request_id);
}

#[test]
fn test_single_player_wins_whole_pool() {
    let mut coordinator = mock_dependencies();
    let mut engine = mock_dependencies();
    setup_coordinator(&mut coordinator);
    add_engine_consumer(&mut coordinator);
    setup_engine(&mut engine);

    let alice = enter(&mut engine, "alice");
    let request_id = perform_upkeep(&mut engine, &mut coordinator);
    submit_test_beacon(&mut coordinator);

    let res = fulfill(&mut engine, &mut coordinator, request_id, 110).unwrap();
    assert_eq!(raffle_info(&engine).recent_winner, Some(alice.clone()));
    assert_eq!(payout_of(&res), (alice.to_string(), FEE));
}

#[test]
fn test_rejected_request_leaves_raffle_open() {
    let mut coordinator = mock_dependencies();
    let mut engine = mock_dependencies();
    setup_coordinator(&mut coordinator);
    // Engine never registered as a consumer
    setup_engine(&mut engine);
    enter(&mut engine, "alice");

    let before = snapshot(&engine.storage);
    let res = raffle_engine::contract::execute(
        engine.as_mut(),
        engine_env(DRAW_TIME, 100),
        message_info(&addr("keeper"), &[]),
        raffle_engine::msg::ExecuteMsg::PerformUpkeep {},
    )
    .unwrap();
    assert_eq!(raffle_info(&engine).state, RaffleState::Calculating);

    let (_, msg) = wasm_execute(&res);
    let err = raffle_vrf_coordinator::contract::execute(
        coordinator.as_mut(),
        coordinator_env(DRAW_TIME, 100),
        message_info(&addr("raffle"), &[]),
        from_json(msg).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        raffle_vrf_coordinator::error::ContractError::InvalidConsumer { .. }
    ));

    // The failed sub-message aborts the whole transaction
    engine.storage = before;
    let info = raffle_info(&engine);
    assert_eq!(info.state, RaffleState::Open);
    assert_eq!(info.num_players, 1);
    assert_eq!(info.pending_request_id, None);
}

#[test]
fn test_failed_payout_reverts_and_request_can_be_retried() {
    let mut coordinator = mock_dependencies();
    let mut engine = mock_dependencies();
    setup_coordinator(&mut coordinator);
    add_engine_consumer(&mut coordinator);
    setup_engine(&mut engine);

    let alice = enter(&mut engine, "alice");
    let bob = enter(&mut engine, "bob");
    let request_id = perform_upkeep(&mut engine, &mut coordinator);
    submit_test_beacon(&mut coordinator);

    let engine_before = snapshot(&engine.storage);
    let coordinator_before = snapshot(&coordinator.storage);

    let res = fulfill(&mut engine, &mut coordinator, request_id, 110).unwrap();
    let payout = res
        .messages
        .iter()
        .find(|m| m.id == raffle_engine::execute::PAYOUT_REPLY_ID)
        .unwrap();

    // The bank rejects the transfer
    let err = raffle_engine::contract::reply(
        engine.as_mut(),
        engine_env(DRAW_TIME + 10, 110),
        Reply {
            id: payout.id,
            payload: payout.payload.clone(),
            gas_used: 0,
            result: SubMsgResult::Err("insufficient funds".to_string()),
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        raffle_engine::error::ContractError::PayoutTransferFailed { .. }
    ));

    // Roll back both contracts
    engine.storage = engine_before;
    coordinator.storage = coordinator_before;

    let info = raffle_info(&engine);
    assert_eq!(info.state, RaffleState::Calculating);
    assert_eq!(info.num_players, 2);
    assert_eq!(info.pending_request_id, Some(request_id));
    assert!(pending_request(&coordinator, request_id).is_some());

    // Retry succeeds with the same words
    let res = fulfill(&mut engine, &mut coordinator, request_id, 111).unwrap();
    let index = winner_index(expected_word(request_id), 2).unwrap();
    let winner = if index == 0 { alice } else { bob };
    assert_eq!(raffle_info(&engine).recent_winner, Some(winner.clone()));
    assert_eq!(payout_of(&res), (winner.to_string(), FEE * 2));
    assert!(pending_request(&coordinator, request_id).is_none());
}

#[test]
fn test_consecutive_rounds() {
    let mut coordinator = mock_dependencies();
    let mut engine = mock_dependencies();
    setup_coordinator(&mut coordinator);
    add_engine_consumer(&mut coordinator);
    setup_engine(&mut engine);

    enter(&mut engine, "alice");
    enter(&mut engine, "bob");
    let request_id = perform_upkeep(&mut engine, &mut coordinator);
    submit_test_beacon(&mut coordinator);
    let res = fulfill(&mut engine, &mut coordinator, request_id, 110).unwrap();
    let (_, amount) = payout_of(&res);
    set_bank_balance(&mut engine, &addr("raffle"), FEE * 2 - amount);

    // Reopened at DRAW_TIME + 10: the interval runs from there
    let dave = addr("dave");
    raffle_engine::contract::execute(
        engine.as_mut(),
        engine_env(DRAW_TIME + 20, 111),
        message_info(&dave, &coins(FEE, DENOM)),
        raffle_engine::msg::ExecuteMsg::EnterRaffle {},
    )
    .unwrap();
    set_bank_balance(&mut engine, &addr("raffle"), FEE);

    let err = raffle_engine::contract::execute(
        engine.as_mut(),
        engine_env(DRAW_TIME + 10 + INTERVAL, 112),
        message_info(&addr("keeper"), &[]),
        raffle_engine::msg::ExecuteMsg::PerformUpkeep {},
    )
    .unwrap_err();
    assert!(matches!(
        err,
        raffle_engine::error::ContractError::UpkeepNotNeeded { num_players: 1, .. }
    ));

    let players: raffle_engine::msg::PlayersResponse = from_json(
        raffle_engine::contract::query(
            engine.as_ref(),
            engine_env(DRAW_TIME + 20, 111),
            raffle_engine::msg::QueryMsg::Players {
                start_after: None,
                limit: None,
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(players.round_id, 2);
    assert_eq!(players.players.len(), 1);
    assert_eq!(players.players[0].address, dave);
}
