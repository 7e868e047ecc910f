//! AgroMind - Terminal Crop Advisory Client
//!
//! Client-side request orchestration and session state for a crop-advisory
//! service: location resolution, recommendation requests, agronomy questions
//! and the community tips feed.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
