//! Session runtime for the inventory bridge: configuration, the per-session
//! event loop and the scenario replay driver.

pub mod config;
pub mod replay;
pub mod session;
