#![warn(
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

mod account;
mod block;
mod delegate;
mod error;
mod fees;
mod json;
mod operation;
mod rights;
mod votes;

pub use account::*;
pub use block::*;
pub use delegate::*;
pub use error::*;
pub use fees::*;
pub use json::*;
pub use operation::*;
pub use rights::*;
pub use votes::*;
