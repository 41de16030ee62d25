//! Page-replacement simulator: replays memory reference traces through a
//! fixed number of frames and counts the page faults and disk traffic each
//! replacement policy causes.

pub mod config;
pub mod error;
pub mod experiment;
pub mod mmu;
pub mod replace;
pub mod resident;
pub mod sim;
pub mod trace;

pub use error::{Error, Result};
