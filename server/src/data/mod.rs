//! Data layer
//!
//! - `types` - Samples, data sources and points shared across the crate
//! - `typesdb` - Read-only type catalog loaded from collectd `types.db`
//! - `traits` - Sink trait used by the metrics pipeline
//! - `influx` - InfluxDB HTTP sink and line protocol encoding

pub mod influx;
pub mod traits;
pub mod types;
pub mod typesdb;

pub use influx::{InfluxSink, SinkError};
pub use traits::PointSink;
pub use types::{DataKind, DataSource, DecodedSample, OutputPoint, PointError};
pub use typesdb::{CatalogError, TypeCatalog};
