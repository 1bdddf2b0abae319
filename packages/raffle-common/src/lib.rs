pub mod randomness;
pub mod types;

pub use randomness::{expand_random_words, next_drand_round, winner_index};
pub use types::{RaffleState, VrfConsumerMsg, VrfCoordinatorMsg};
