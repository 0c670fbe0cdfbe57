//! PADDOCK Core - Schedule Types
//!
//! Pure data structures shared by every paddock crate: seasons, rounds and
//! their nested values, query filters, response shapes and the error
//! taxonomy. No I/O lives here.

pub mod entities;
pub mod enums;
pub mod error;
pub mod filter;
pub mod response;

pub use entities::*;
pub use enums::*;
pub use error::*;
pub use filter::*;
pub use response::*;
