//! CLI commands.

pub mod nonce;
pub mod simulate;

pub use nonce::{cmd_digest, cmd_nonce};
pub use simulate::cmd_simulate;
