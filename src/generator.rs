use crate::config::NumberRange;
use rand::Rng;

/// Odd and not a multiple of five, so neither the last digit nor parity gives
/// the answer away.
pub fn is_candidate(n: u64) -> bool {
    n % 2 != 0 && n % 5 != 0
}

/// Draw uniformly from `range` until a candidate turns up.
///
/// Callers pass ranges from a validated [`crate::config::Config`], which
/// guarantees at least one candidate exists, so this terminates with
/// probability 1.
pub fn generate_question<R: Rng + ?Sized>(range: NumberRange, rng: &mut R) -> u64 {
    loop {
        let n = rng.gen_range(range.min..=range.max);
        if is_candidate(n) {
            return n;
        }
    }
}
