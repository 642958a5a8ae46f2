//! API Routes
//!
//! Route handlers organized by functionality.

pub mod entries;
pub mod health;
pub mod jsonpath;
pub mod search;
pub mod stats;
pub mod webhook;
