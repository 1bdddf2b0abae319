use cosmwasm_std::{
    to_json_binary, DepsMut, Env, Event, MessageInfo, Response, Storage, SubMsg, WasmMsg,
};
use raffle_common::randomness::{expand_random_words, next_drand_round};
use raffle_common::types::{VrfConsumerMsg, RANDOMNESS_REQUESTED_EVENT, REQUEST_ID_ATTR};

use crate::error::ContractError;
use crate::state::{
    Fulfillment, RandomnessRequest, StoredBeacon, Subscription, BEACONS, CONFIG, FULFILLMENTS,
    LATEST_ROUND, NEXT_REQUEST_ID, NEXT_SUBSCRIPTION_ID, REQUESTS, SUBSCRIPTIONS,
};
use crate::verify::beacon_randomness;

pub const MAX_REQUEST_CONFIRMATIONS: u16 = 200;
pub const MAX_NUM_WORDS: u32 = 500;
pub const MAX_CONSUMERS: usize = 100;

/// Parameters of `ExecuteMsg::RequestRandomWords`.
pub struct RequestParams {
    pub key_hash: String,
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u64,
    pub num_words: u32,
}

/// Submit a drand beacon. Only operators can call this.
/// The beacon is BLS-verified with drand-verify before it is stored.
pub fn submit_beacon(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    round: u64,
    signature_hex: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    if !config.operators.contains(&info.sender) {
        return Err(ContractError::Unauthorized {
            reason: "only operators can submit beacons".to_string(),
        });
    }

    if BEACONS.has(deps.storage, round) {
        return Err(ContractError::BeaconAlreadyExists { round });
    }

    let signature = hex::decode(&signature_hex).map_err(|_| ContractError::InvalidHex {
        field: "signature_hex".to_string(),
    })?;

    let randomness = beacon_randomness(&config.quicknet_pubkey, round, &signature).map_err(
        |e| ContractError::VerificationFailed {
            reason: e.to_string(),
        },
    )?;

    let beacon = StoredBeacon {
        round,
        randomness: randomness.to_vec(),
        signature,
        verified: true,
        submitted_at: env.block.time,
        submitted_by: info.sender.clone(),
    };
    BEACONS.save(deps.storage, round, &beacon)?;

    let current_latest = LATEST_ROUND.may_load(deps.storage)?.unwrap_or(0);
    if round > current_latest {
        LATEST_ROUND.save(deps.storage, &round)?;
    }

    Ok(Response::new()
        .add_attribute("action", "submit_beacon")
        .add_attribute("round", round.to_string())
        .add_attribute("submitted_by", info.sender.to_string())
        .add_event(
            Event::new("vrf_beacon_submitted")
                .add_attribute("round", round.to_string())
                .add_attribute("randomness", hex::encode(randomness))
                .add_attribute("submitted_by", info.sender.to_string()),
        ))
}

/// Update the operator list. Admin only.
pub fn update_operators(
    deps: DepsMut,
    info: MessageInfo,
    add: Vec<String>,
    remove: Vec<String>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;

    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update operators".to_string(),
        });
    }

    for addr_str in &remove {
        let addr = deps.api.addr_validate(addr_str)?;
        config.operators.retain(|a| a != &addr);
    }
    for addr_str in &add {
        let addr = deps.api.addr_validate(addr_str)?;
        if !config.operators.contains(&addr) {
            config.operators.push(addr);
        }
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_operators")
        .add_attribute("added", add.join(","))
        .add_attribute("removed", remove.join(",")))
}

pub fn create_subscription(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let subscription_id = NEXT_SUBSCRIPTION_ID.may_load(deps.storage)?.unwrap_or(1);
    NEXT_SUBSCRIPTION_ID.save(deps.storage, &(subscription_id + 1))?;

    let subscription = Subscription {
        id: subscription_id,
        owner: info.sender.clone(),
        consumers: vec![],
        request_count: 0,
        created_at: env.block.time,
    };
    SUBSCRIPTIONS.save(deps.storage, subscription_id, &subscription)?;

    Ok(Response::new()
        .set_data(to_json_binary(&subscription_id)?)
        .add_attribute("action", "create_subscription")
        .add_attribute("subscription_id", subscription_id.to_string())
        .add_event(
            Event::new("vrf_subscription_created")
                .add_attribute("subscription_id", subscription_id.to_string())
                .add_attribute("owner", info.sender.to_string()),
        ))
}

fn load_owned_subscription(
    storage: &dyn Storage,
    info: &MessageInfo,
    subscription_id: u64,
) -> Result<Subscription, ContractError> {
    let subscription = SUBSCRIPTIONS
        .may_load(storage, subscription_id)?
        .ok_or(ContractError::SubscriptionNotFound { subscription_id })?;
    if subscription.owner != info.sender {
        return Err(ContractError::Unauthorized {
            reason: "only the subscription owner can manage consumers".to_string(),
        });
    }
    Ok(subscription)
}

pub fn add_consumer(
    deps: DepsMut,
    info: MessageInfo,
    subscription_id: u64,
    consumer: String,
) -> Result<Response, ContractError> {
    let mut subscription = load_owned_subscription(deps.storage, &info, subscription_id)?;
    let consumer_addr = deps.api.addr_validate(&consumer)?;

    // Adding an existing consumer is a no-op
    if !subscription.consumers.contains(&consumer_addr) {
        if subscription.consumers.len() >= MAX_CONSUMERS {
            return Err(ContractError::TooManyConsumers {
                subscription_id,
                max: MAX_CONSUMERS,
            });
        }
        subscription.consumers.push(consumer_addr);
        SUBSCRIPTIONS.save(deps.storage, subscription_id, &subscription)?;
    }

    Ok(Response::new()
        .add_attribute("action", "add_consumer")
        .add_attribute("subscription_id", subscription_id.to_string())
        .add_attribute("consumer", consumer))
}

pub fn remove_consumer(
    deps: DepsMut,
    info: MessageInfo,
    subscription_id: u64,
    consumer: String,
) -> Result<Response, ContractError> {
    let mut subscription = load_owned_subscription(deps.storage, &info, subscription_id)?;
    let consumer_addr = deps.api.addr_validate(&consumer)?;

    if !subscription.consumers.contains(&consumer_addr) {
        return Err(ContractError::InvalidConsumer {
            subscription_id,
            consumer,
        });
    }
    subscription.consumers.retain(|c| c != &consumer_addr);
    SUBSCRIPTIONS.save(deps.storage, subscription_id, &subscription)?;

    Ok(Response::new()
        .add_attribute("action", "remove_consumer")
        .add_attribute("subscription_id", subscription_id.to_string())
        .add_attribute("consumer", consumer))
}

/// Accept a randomness request from a registered consumer.
///
/// The request is pinned to the first drand round published after this
/// block, so neither the consumer nor the operators know its words yet.
/// The request id is returned both as response data and as the
/// `request_id` attribute of the `vrf_randomness_requested` event.
pub fn request_random_words(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    params: RequestParams,
) -> Result<Response, ContractError> {
    let RequestParams {
        key_hash,
        subscription_id,
        request_confirmations,
        callback_gas_limit,
        num_words,
    } = params;

    let config = CONFIG.load(deps.storage)?;

    let mut subscription = SUBSCRIPTIONS
        .may_load(deps.storage, subscription_id)?
        .ok_or(ContractError::SubscriptionNotFound { subscription_id })?;
    if !subscription.consumers.contains(&info.sender) {
        return Err(ContractError::InvalidConsumer {
            subscription_id,
            consumer: info.sender.to_string(),
        });
    }

    if !config.key_hashes.contains(&key_hash) {
        return Err(ContractError::InvalidKeyHash { key_hash });
    }
    if request_confirmations < config.min_request_confirmations
        || request_confirmations > MAX_REQUEST_CONFIRMATIONS
    {
        return Err(ContractError::InvalidRequestConfirmations {
            have: request_confirmations,
            min: config.min_request_confirmations,
            max: MAX_REQUEST_CONFIRMATIONS,
        });
    }
    if num_words == 0 || num_words > config.max_num_words {
        return Err(ContractError::NumWordsTooBig {
            have: num_words,
            max: config.max_num_words,
        });
    }
    if callback_gas_limit == 0 {
        return Err(ContractError::InvalidCallbackGasLimit);
    }

    let request_id = NEXT_REQUEST_ID.may_load(deps.storage)?.unwrap_or(1);
    NEXT_REQUEST_ID.save(deps.storage, &(request_id + 1))?;

    let target_round = next_drand_round(
        config.genesis_time,
        config.period_seconds,
        env.block.time.seconds(),
    );

    let request = RandomnessRequest {
        id: request_id,
        consumer: info.sender.clone(),
        subscription_id,
        key_hash: key_hash.clone(),
        num_words,
        callback_gas_limit,
        request_confirmations,
        requested_at_height: env.block.height,
        requested_at: env.block.time,
        target_round,
    };
    REQUESTS.save(deps.storage, request_id, &request)?;

    subscription.request_count += 1;
    SUBSCRIPTIONS.save(deps.storage, subscription_id, &subscription)?;

    Ok(Response::new()
        .set_data(to_json_binary(&request_id)?)
        .add_attribute("action", "request_random_words")
        .add_attribute(REQUEST_ID_ATTR, request_id.to_string())
        .add_event(
            Event::new(RANDOMNESS_REQUESTED_EVENT)
                .add_attribute(REQUEST_ID_ATTR, request_id.to_string())
                .add_attribute("consumer", info.sender.to_string())
                .add_attribute("subscription_id", subscription_id.to_string())
                .add_attribute("key_hash", key_hash)
                .add_attribute("target_round", target_round.to_string())
                .add_attribute("num_words", num_words.to_string()),
        ))
}

/// Deliver the words of a pending request to its consumer.
///
/// The callback is a plain sub-message: if the consumer fails, the whole
/// transaction reverts and the request stays pending for another attempt.
pub fn fulfill_random_words(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: u64,
) -> Result<Response, ContractError> {
    let request = REQUESTS
        .may_load(deps.storage, request_id)?
        .ok_or(ContractError::RequestNotFound { request_id })?;

    let confirmations = env.block.height.saturating_sub(request.requested_at_height);
    if confirmations < u64::from(request.request_confirmations) {
        return Err(ContractError::NotEnoughConfirmations {
            request_id,
            needed: u64::from(request.request_confirmations),
            have: confirmations,
        });
    }

    let beacon = BEACONS
        .may_load(deps.storage, request.target_round)?
        .ok_or(ContractError::BeaconNotFound {
            round: request.target_round,
        })?;

    let random_words = expand_random_words(&beacon.randomness, request_id, request.num_words);

    REQUESTS.remove(deps.storage, request_id);
    FULFILLMENTS.save(
        deps.storage,
        request_id,
        &Fulfillment {
            request_id,
            consumer: request.consumer.clone(),
            target_round: request.target_round,
            random_words: random_words.clone(),
            fulfilled_at: env.block.time,
            fulfilled_by: info.sender.clone(),
        },
    )?;

    let callback = WasmMsg::Execute {
        contract_addr: request.consumer.to_string(),
        msg: to_json_binary(&VrfConsumerMsg::FulfillRandomWords {
            request_id,
            random_words,
        })?,
        funds: vec![],
    };

    Ok(Response::new()
        .add_submessage(SubMsg::new(callback).with_gas_limit(request.callback_gas_limit))
        .add_attribute("action", "fulfill_random_words")
        .add_attribute(REQUEST_ID_ATTR, request_id.to_string())
        .add_event(
            Event::new("vrf_randomness_fulfilled")
                .add_attribute(REQUEST_ID_ATTR, request_id.to_string())
                .add_attribute("consumer", request.consumer.to_string())
                .add_attribute("drand_round", request.target_round.to_string())
                .add_attribute("randomness", hex::encode(&beacon.randomness)),
        ))
}
