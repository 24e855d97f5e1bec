//! HTTP routing. Handlers decode the request, call one service method and
//! encode its result; all decisions live in [`crate::application`].

pub mod crops;
pub mod error;
pub mod records;

pub use error::parse_body;
