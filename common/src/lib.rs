//! coinfeed Common Types
//!
//! Shared types used across coinfeed: price snapshots, catalog records,
//! response envelopes, the error taxonomy and timestamp layouts.

pub mod catalog;
pub mod error;
pub mod quote;
pub mod response;
pub mod time;

pub use catalog::*;
pub use error::*;
pub use quote::*;
pub use response::*;
pub use time::*;
