//! C2DM Core Types
//!
//! Data model and configuration shared by the gateway and dispatch crates.

mod config;
mod notification;
mod outcome;
mod result;
mod session;

pub use config::*;
pub use notification::*;
pub use outcome::*;
pub use result::*;
pub use session::*;
