pub mod download;
pub mod error;
pub mod listing;
pub mod upload;

pub use error::ApiError;
