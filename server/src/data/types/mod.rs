//! Shared data types
//!
//! Types used by the wire decoder, the metrics pipeline and the sinks.

mod enums;
mod point;
mod sample;

pub use enums::DataKind;
pub use point::{OutputPoint, PointError};
pub use sample::{DataSource, DecodedSample};
