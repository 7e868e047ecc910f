//! Domain layer: wire data model, request-assembly rules and error taxonomy.

pub mod models;
pub mod services;
pub mod errors;

pub use models::*;
pub use services::*;
pub use errors::*;
