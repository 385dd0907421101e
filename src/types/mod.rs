//! Type definitions

pub mod error;
pub mod job;
pub mod voter;

pub use error::*;
pub use job::*;
pub use voter::*;
