//! Room code generation.

use crate::core::GameRng;

/// Inclusive bounds of the 5-digit code space.
const CODE_MIN: u32 = 10_000;
const CODE_MAX: u32 = 99_999;

/// Draw a uniformly random 5-digit room code.
///
/// Uniqueness is the caller's concern; codes are collision-checked
/// against the store at creation time.
#[must_use]
pub fn generate_code(rng: &mut GameRng) -> String {
    rng.gen_range_u32(CODE_MIN..CODE_MAX + 1).to_string()
}
