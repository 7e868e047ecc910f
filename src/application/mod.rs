//! Application layer: session state, request orchestration and the session runtime.
//!
//! This module sits between the advisory service and the presentation layer.
//! It owns the only mutable copy of the session state and decides how user
//! actions and flow outcomes change it.

pub mod state;
pub mod coordinator;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use state::*;
pub use coordinator::*;
pub use session::*;
