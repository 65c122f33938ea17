//! Signed-link file drop: validated uploads, HMAC-authorized downloads.

pub mod api;
pub mod config;
pub mod content;
pub mod metrics;
pub mod server;
pub mod startup;
pub mod storage;
pub mod token;
pub mod utils;
