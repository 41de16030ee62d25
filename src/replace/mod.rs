pub mod clock;
pub mod lru;
pub mod random;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    mmu::PageState,
    resident::PageNumber,
};

/// Outcome of a single page reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Hit,
    /// The page was loaded into a free frame or over a clean victim.
    MissNoEvict,
    /// The page was loaded over a dirty victim, which had to be written back.
    MissEvictDirty,
}

impl AccessResult {
    pub fn is_hit(self) -> bool {
        matches!(self, AccessResult::Hit)
    }
}

pub trait Replace {
    /// Admits `page`, evicting a resident page if every frame is taken.
    ///
    /// A victim's dirty status is consumed through `state.evict`, which
    /// decides between `MissNoEvict` and `MissEvictDirty`.
    fn decide(&mut self, page: PageNumber, state: &mut PageState) -> AccessResult;

    fn resident(&self) -> usize;

    fn capacity(&self) -> usize;

    fn is_resident(&self, page: PageNumber) -> bool;
}

impl<R: Replace + ?Sized> Replace for Box<R> {
    fn decide(&mut self, page: PageNumber, state: &mut PageState) -> AccessResult {
        (**self).decide(page, state)
    }

    fn resident(&self) -> usize {
        (**self).resident()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn is_resident(&self, page: PageNumber) -> bool {
        (**self).is_resident(page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    Clock,
    Lru,
    Rand,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Clock, Algorithm::Lru, Algorithm::Rand];

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Clock => "clock",
            Algorithm::Lru => "lru",
            Algorithm::Rand => "rand",
        }
    }

    /// Builds the policy for `frames` frames. `seed` only affects `Rand`.
    pub fn build(self, frames: usize, seed: Option<u64>) -> Result<Box<dyn Replace + Send>> {
        Ok(match self {
            Algorithm::Clock => Box::new(clock::Clock::new(frames)?),
            Algorithm::Lru => Box::new(lru::Lru::new(frames)?),
            Algorithm::Rand => match seed {
                Some(seed) => Box::new(random::Random::with_rng(
                    frames,
                    fastrand::Rng::with_seed(seed),
                )?),
                None => Box::new(random::Random::new(frames)?),
            },
        })
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "clock" => Ok(Algorithm::Clock),
            "lru" => Ok(Algorithm::Lru),
            "rand" | "random" => Ok(Algorithm::Rand),
            _ => Err(Error::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.as_str().to_string()
    }
}
