use cosmwasm_std::{Uint128, Uint256};
use sha2::{Digest, Sha256};

/// Expand a 32-byte beacon into `num_words` independent words.
///
/// `word_i = sha256( seed || request_id_u64_be || i_u32_be )`, read as a
/// big-endian 256-bit integer. Binding the request id keeps two requests
/// pinned to the same drand round from receiving identical words.
pub fn expand_random_words(seed: &[u8], request_id: u64, num_words: u32) -> Vec<Uint256> {
    (0..num_words)
        .map(|i| {
            let mut hasher = Sha256::new();
            hasher.update(seed);
            hasher.update(request_id.to_be_bytes());
            hasher.update(i.to_be_bytes());
            let digest: [u8; 32] = hasher.finalize().into();
            Uint256::from_be_bytes(digest)
        })
        .collect()
}

/// Index of the winning entry: `word mod num_players`.
///
/// Entries, not addresses, are the unit of chance. Returns `None` when
/// there is nobody to pick.
pub fn winner_index(word: Uint256, num_players: u32) -> Option<u32> {
    if num_players == 0 {
        return None;
    }
    let index = word % Uint256::from(num_players);
    Uint128::try_from(index).ok().map(|v| v.u128() as u32)
}

/// First drand round published strictly after `now_seconds`.
///
/// Round 1 is published at `genesis_time`, round `r` at
/// `genesis_time + (r - 1) * period_seconds`.
pub fn next_drand_round(genesis_time: u64, period_seconds: u64, now_seconds: u64) -> u64 {
    if now_seconds < genesis_time || period_seconds == 0 {
        return 1;
    }
    (now_seconds - genesis_time) / period_seconds + 2
}
