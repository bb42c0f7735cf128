//! Generation workers and the streaming coordinator that drains them.
#![forbid(unsafe_code)]

mod preview;
mod scheduler;
mod streamer;

pub use preview::{DrawMode, Preview, preview};
pub use scheduler::{GenResult, GenerationScheduler};
pub use streamer::{MAX_SEED_INPUT, Streamer, TickStats, parse_seed};
