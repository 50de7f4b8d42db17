use sha2::{Digest, Sha256};

/// SHA-256 of the client address followed by the server pepper, hex encoded.
/// The raw address never leaves this function.
pub fn hash_client_identifier(address: &str, pepper: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(address.as_bytes());
    hasher.update(pepper.as_bytes());
    hex::encode(hasher.finalize())
}
