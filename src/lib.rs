pub(crate) mod retry;

pub mod client;
pub use client::*;

pub mod domain;
pub use domain::*;
