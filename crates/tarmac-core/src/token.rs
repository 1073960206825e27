//! Unguessable archive identifier generation.

use chrono::Utc;
use rand_core::{OsRng, TryRngCore};
use sha2::{Digest, Sha512};

/// Number of random bytes mixed into each token.
const SEED_LEN: usize = 32;

/// Generate a fixed-length hex token for a new archive.
///
/// Concatenates 32 bytes of OS randomness, the caller-supplied
/// discriminator (a path or name with no uniqueness guarantee of its own),
/// and the current time at nanosecond resolution, then hex-encodes the
/// SHA-512 digest of the whole. The result is 128 hex characters.
///
/// Returns an empty string when the OS randomness source fails; callers
/// must treat an empty token as a fatal creation error rather than using
/// it. This is a defensive fallback, not a supported path.
#[must_use]
pub fn generate(discriminator: &str) -> String {
    let mut seed = [0_u8; SEED_LEN];
    if OsRng.try_fill_bytes(&mut seed).is_err() {
        return String::new();
    }

    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut hasher = Sha512::new();
    hasher.update(seed);
    hasher.update(discriminator.as_bytes());
    hasher.update(stamp.to_be_bytes());
    hex::encode(hasher.finalize())
}
