mod batch;
mod crop;
mod identity;
mod participant;
mod trade;

pub use batch::*;
pub use crop::*;
pub use identity::*;
pub use participant::*;
pub use trade::*;
