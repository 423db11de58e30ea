//! C2DM Gateway
//!
//! Transport seam, authentication, and response classification for the
//! C2DM push gateway.

mod auth;
mod classify;
mod form;
mod http;
mod traits;

pub use auth::*;
pub use classify::*;
pub use form::*;
pub use http::*;
pub use traits::*;

// Re-export for convenience
pub use c2dm_core;
