//! collectd listener and decoder errors

/// Malformed datagram; the whole packet is dropped
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated part header at offset {offset}")]
    TruncatedHeader { offset: usize },

    #[error("part 0x{part_type:04x} at offset {offset} declares invalid length {length}")]
    InvalidLength {
        part_type: u16,
        offset: usize,
        length: usize,
    },

    #[error("string part 0x{part_type:04x} is not NUL-terminated")]
    UnterminatedString { part_type: u16 },

    #[error("string part 0x{part_type:04x} is not valid UTF-8")]
    InvalidUtf8 { part_type: u16 },

    #[error("numeric part 0x{part_type:04x} has {length} payload bytes, expected 8")]
    InvalidNumeric { part_type: u16, length: usize },

    #[error("values part declares {count} values but carries {length} payload bytes")]
    ValuesLength { count: usize, length: usize },

    #[error("unknown data source type code {0}")]
    UnknownKind(u8),

    #[error("encrypted packets are not supported")]
    Encrypted,
}

/// Listener startup errors
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}
