pub mod builder;
pub mod client;
pub mod errors;
pub mod interval;
pub mod model;

pub use client::*;
pub use errors::*;
pub use interval::*;
pub use model::*;
