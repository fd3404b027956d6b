//! External stats reporting
//!
//! Publishes the bot's server count to top.gg (Discord Bot List).

mod topgg;

pub use topgg::{StatsReporter, TopGgClient, TOPGG_API};
