//! Gateway to the crop registry contract on an external ledger.

mod address;
mod client;
pub mod contract;
mod rpc;

pub use address::*;
pub use client::*;
pub use rpc::*;
