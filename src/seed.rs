//! Deterministic seeding for visual layout.
//!
//! A problem carries a `seed` string. Anything that needs layout randomness
//! (item placement, jitter, colour) derives it from that seed through
//! `ranged_int`, so re-rendering the same problem yields the same picture.
//! The seed itself is fresh per generated problem (see `fresh_seed`).

use rand::Rng;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// FNV-1a over UTF-16 code units, so hashes agree with a JS `charCodeAt` loop.
pub fn hash_to_u32(text: &str) -> u32 {
  text
    .encode_utf16()
    .fold(FNV_OFFSET_BASIS, |hash, unit| (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME))
}

/// Stable integer in `[min, max]` for a given key. A reversed range collapses to `min`.
pub fn ranged_int(seed_key: &str, min: i64, max: i64) -> i64 {
  if max <= min {
    return min;
  }
  let span = (max - min + 1) as u64;
  (u64::from(hash_to_u32(seed_key)) % span) as i64 + min
}

/// `"{seed}-{item}-{axis}"`, the key shape used for per-item layout values.
pub fn layout_key(seed: &str, item: impl std::fmt::Display, axis: &str) -> String {
  format!("{}-{}-{}", seed, item, axis)
}

/// New seed for one problem instance: identifying parts + wall clock + entropy.
pub fn fresh_seed<R: Rng + ?Sized>(parts: &[&str], rng: &mut R) -> String {
  let now = chrono::Utc::now().timestamp_millis();
  let salt: u32 = rng.gen();
  let composite = format!("{}|{}|{:08x}", parts.join("|"), now, salt);
  format!("{:08x}", hash_to_u32(&composite))
}
