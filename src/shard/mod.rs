//! Shard management module
//!
//! The shard pool runs the gateway connections; shard state holds the live
//! membership every other component reads.

mod pool;
mod state;

pub use pool::ShardPool;
pub use state::{ShardHealth, ShardState};
