use drand_verify::{G2PubkeyRfc, Pubkey};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// drand quicknet public key (G2, 96 bytes), scheme bls-unchained-g1-rfc9380.
pub const QUICKNET_PK_HEX: &str = "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a";

#[derive(Error, Debug, PartialEq)]
pub enum BeaconError {
    #[error("invalid pubkey length (expected 96 bytes)")]
    PubkeyLength,

    #[error("invalid pubkey (not a G2 point)")]
    PubkeyPoint,

    #[error("verification error: {0}")]
    Verification(String),

    #[error("signature does not match round")]
    BadSignature,
}

/// Parse a compressed G2 quicknet key.
pub fn parse_pubkey(pubkey_bytes: &[u8]) -> Result<G2PubkeyRfc, BeaconError> {
    let fixed: [u8; 96] = pubkey_bytes
        .try_into()
        .map_err(|_| BeaconError::PubkeyLength)?;
    G2PubkeyRfc::from_fixed(fixed).map_err(|_| BeaconError::PubkeyPoint)
}

/// Check a quicknet beacon and return its randomness, `sha256(signature)`.
/// Quicknet is unchained, so there is no previous signature.
pub fn beacon_randomness(
    pubkey_bytes: &[u8],
    round: u64,
    signature: &[u8],
) -> Result<[u8; 32], BeaconError> {
    let pk = parse_pubkey(pubkey_bytes)?;

    let valid = pk
        .verify(round, &[], signature)
        .map_err(|e| BeaconError::Verification(format!("{:?}", e)))?;
    if !valid {
        return Err(BeaconError::BadSignature);
    }

    Ok(Sha256::digest(signature).into())
}
