// Application layer - use cases and orchestration.
// Handlers in `api` and the CLI talk to these services only.

mod crops;
pub mod error;
mod records;
pub mod requests;

pub use crops::*;
pub use error::*;
pub use records::*;
