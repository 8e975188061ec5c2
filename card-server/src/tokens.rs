//! Share token generation.
//!
//! Delivery links use short opaque tokens rather than card IDs so a link
//! reveals nothing about the card or its owner.

use uuid::Uuid;

/// Token length in characters. 10 characters over a 64-symbol alphabet is
/// 60 bits, plenty for share links.
const TOKEN_LEN: usize = 10;

/// URL-safe alphabet, 64 symbols so each 6-bit sample maps uniformly.
const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generate a new opaque share token.
#[must_use]
pub fn generate_share_token() -> String {
    let id = Uuid::new_v4();
    // Bytes 6 and 8 carry the UUID version/variant bits; skip them so
    // every sampled byte is uniformly random.
    id.as_bytes()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 6 && *i != 8)
        .take(TOKEN_LEN)
        .map(|(_, b)| ALPHABET[(b & 0x3f) as usize] as char)
        .collect()
}
