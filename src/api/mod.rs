pub mod ask;
pub mod error;
pub mod repos;

pub use error::ApiError;
