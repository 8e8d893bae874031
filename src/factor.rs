use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// What the player claims a number is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Classification {
    Prime,
    Composite,
}

impl Classification {
    /// Parse a submitted answer. Anything other than the two exact names is
    /// malformed and grades as incorrect.
    pub fn from_answer(answer: &str) -> Option<Self> {
        match answer {
            "prime" => Some(Classification::Prime),
            "composite" => Some(Classification::Composite),
            _ => None,
        }
    }
}

/// Prime factors of `n` in ascending order, with multiplicity.
///
/// Trial division by 2, then by odd candidates while `i * i <= n`; whatever
/// cofactor remains above 1 is itself prime. Values below 2 have no prime
/// factorization and yield `[1]`.
pub fn factorize(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    if n < 2 {
        return vec![1];
    }

    while n % 2 == 0 {
        factors.push(2);
        n /= 2;
    }

    let mut i = 3u64;
    while i.saturating_mul(i) <= n {
        if n % i == 0 {
            factors.push(i);
            n /= i;
        } else {
            i += 2;
        }
    }

    if n > 1 {
        factors.push(n);
    }
    factors
}

pub fn classify(factors: &[u64]) -> Classification {
    if factors.len() == 1 {
        Classification::Prime
    } else {
        Classification::Composite
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factorization {
    pub number: u64,
    pub factors: Vec<u64>,
}

impl Factorization {
    pub fn of(number: u64) -> Self {
        Self {
            number,
            factors: factorize(number),
        }
    }

    pub fn classification(&self) -> Classification {
        classify(&self.factors)
    }

    /// "97 is prime" or "91 = 7 * 13"
    pub fn breakdown(&self) -> String {
        match self.classification() {
            Classification::Prime => format!("{} is prime", self.number),
            Classification::Composite => {
                format!("{} = {}", self.number, self.factors.iter().join(" * "))
            }
        }
    }
}
