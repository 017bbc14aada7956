//! Table-specific API implementations
//!
//! Each module provides a typed interface for one PostgREST resource.
//!
//! | Module | Table | Description |
//! |--------|-------|-------------|
//! | `destinations` | `ausfluege` | Excursion destinations with optional coordinates |

pub mod destinations;

pub use destinations::{Destination, DestinationsApi};
