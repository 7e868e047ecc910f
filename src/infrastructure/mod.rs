//! Infrastructure layer providing external service integrations.
//!
//! This module contains the advisory-service HTTP client, the geolocation
//! seam, configuration loading and tracing setup.

pub mod config;
pub mod http;
pub mod location;
pub mod logging;

pub use config::*;
pub use http::*;
pub use location::*;
pub use logging::*;
