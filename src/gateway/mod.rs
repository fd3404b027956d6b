//! Connection-layer collaborators
//!
//! Traits at the seams the runtime calls into, with their Twilight
//! implementations. Tests substitute recording doubles.

mod login;
mod presence;
mod registration;

pub use login::login;
pub use presence::{PresenceSink, ShardPresence};
pub use registration::{CommandRegistrar, HttpRegistrar};
