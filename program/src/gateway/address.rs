//! Classic ledger address validation
use crate::constants::{ACCOUNT_ID_LEN, ACCOUNT_ID_VERSION};

/// Shortest and longest encodings of a classic address
const MIN_ADDRESS_LEN: usize = 25;
const MAX_ADDRESS_LEN: usize = 35;

/// Checks an `r...` address: Ripple base58 alphabet, valid checksum, version byte 0
/// and a 20-byte account id.
pub fn is_valid_classic_address(address: &str) -> bool {
    if !address.starts_with('r') || !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&address.len()) {
        return false;
    }
    decode_account_id(address).is_some()
}

/// Decode the 20-byte account id of a classic address
pub fn decode_account_id(address: &str) -> Option<[u8; ACCOUNT_ID_LEN]> {
    let decoded = bs58::decode(address)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check(Some(ACCOUNT_ID_VERSION))
        .into_vec()
        .ok()?;
    let (version, account_id) = decoded.split_first()?;
    if *version != ACCOUNT_ID_VERSION {
        return None;
    }
    account_id.try_into().ok()
}

/// Encode a 20-byte account id as a classic address
pub fn encode_classic_address(account_id: &[u8; ACCOUNT_ID_LEN]) -> String {
    let mut payload = Vec::with_capacity(ACCOUNT_ID_LEN + 1);
    payload.push(ACCOUNT_ID_VERSION);
    payload.extend_from_slice(account_id);
    bs58::encode(payload)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check()
        .into_string()
}
