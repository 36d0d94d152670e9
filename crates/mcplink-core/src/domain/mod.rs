//! Domain records exchanged with the connection manager
//!
//! - `ServerConfig` and its enums (what to connect to)
//! - Probe results (health, auth detection, transport detection, proxy)
//! - Connection status snapshots

mod probe;
mod server;
mod status;

pub use probe::*;
pub use server::*;
pub use status::*;
