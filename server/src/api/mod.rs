//! Network ingestion
//!
//! - `collectd` - collectd binary protocol UDP listener

pub mod collectd;

pub use collectd::{CollectdListener, DecodeError, ListenerError};
