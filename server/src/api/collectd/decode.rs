//! collectd binary protocol decoder
//!
//! A datagram is a sequence of parts, each `type: u16 BE`, `length: u16 BE`
//! (header included) followed by the payload. Identifier and time parts set
//! state that carries forward; every values part emits one sample per value
//! using the state seen so far.

use super::error::DecodeError;
use crate::data::types::{DataKind, DecodedSample};
use crate::utils::time::{hr_time_to_millis, secs_to_millis};

// =============================================================================
// Part Types
// =============================================================================

const PART_HOST: u16 = 0x0000;
const PART_TIME: u16 = 0x0001;
const PART_PLUGIN: u16 = 0x0002;
const PART_PLUGIN_INSTANCE: u16 = 0x0003;
const PART_TYPE: u16 = 0x0004;
const PART_TYPE_INSTANCE: u16 = 0x0005;
const PART_VALUES: u16 = 0x0006;
const PART_INTERVAL: u16 = 0x0007;
const PART_TIME_HR: u16 = 0x0008;
const PART_INTERVAL_HR: u16 = 0x0009;
const PART_SIGNATURE: u16 = 0x0200;
const PART_ENCRYPTION: u16 = 0x0210;

const PART_HEADER_LEN: usize = 4;
const NUMERIC_PAYLOAD_LEN: usize = 8;
const VALUE_LEN: usize = 8;

/// Identifier and time state carried between parts of one datagram
#[derive(Debug, Default)]
struct ValueListState {
    host: String,
    plugin: String,
    plugin_instance: String,
    type_name: String,
    type_instance: String,
    timestamp_ms: Option<i64>,
}

/// Decode one datagram into samples
///
/// `received_ms` stamps samples of value lists that arrive without a time part.
pub fn decode_packet(data: &[u8], received_ms: i64) -> Result<Vec<DecodedSample>, DecodeError> {
    let mut state = ValueListState::default();
    let mut samples = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        if data.len() - offset < PART_HEADER_LEN {
            return Err(DecodeError::TruncatedHeader { offset });
        }

        let part_type = u16::from_be_bytes([data[offset], data[offset + 1]]);
        let length = u16::from_be_bytes([data[offset + 2], data[offset + 3]]) as usize;
        if length < PART_HEADER_LEN || offset + length > data.len() {
            return Err(DecodeError::InvalidLength {
                part_type,
                offset,
                length,
            });
        }
        let payload = &data[offset + PART_HEADER_LEN..offset + length];

        match part_type {
            PART_HOST => state.host = read_string(part_type, payload)?,
            PART_PLUGIN => state.plugin = read_string(part_type, payload)?,
            PART_PLUGIN_INSTANCE => state.plugin_instance = read_string(part_type, payload)?,
            PART_TYPE => state.type_name = read_string(part_type, payload)?,
            PART_TYPE_INSTANCE => state.type_instance = read_string(part_type, payload)?,
            PART_TIME => {
                state.timestamp_ms = Some(secs_to_millis(read_numeric(part_type, payload)?));
            }
            PART_TIME_HR => {
                state.timestamp_ms = Some(hr_time_to_millis(read_numeric(part_type, payload)?));
            }
            PART_INTERVAL | PART_INTERVAL_HR => {
                read_numeric(part_type, payload)?;
            }
            PART_VALUES => {
                let timestamp_ms = state.timestamp_ms.unwrap_or(received_ms);
                read_values(payload, &state, timestamp_ms, &mut samples)?;
            }
            PART_SIGNATURE => {
                tracing::trace!("Skipping signature part");
            }
            PART_ENCRYPTION => return Err(DecodeError::Encrypted),
            other => {
                tracing::trace!(part_type = other, length, "Skipping unknown part");
            }
        }

        offset += length;
    }

    Ok(samples)
}

fn read_string(part_type: u16, payload: &[u8]) -> Result<String, DecodeError> {
    let Some((&0, content)) = payload.split_last() else {
        return Err(DecodeError::UnterminatedString { part_type });
    };
    std::str::from_utf8(content)
        .map(str::to_string)
        .map_err(|_| DecodeError::InvalidUtf8 { part_type })
}

fn read_numeric(part_type: u16, payload: &[u8]) -> Result<u64, DecodeError> {
    let bytes: [u8; NUMERIC_PAYLOAD_LEN] =
        payload.try_into().map_err(|_| DecodeError::InvalidNumeric {
            part_type,
            length: payload.len(),
        })?;
    Ok(u64::from_be_bytes(bytes))
}

fn read_values(
    payload: &[u8],
    state: &ValueListState,
    timestamp_ms: i64,
    samples: &mut Vec<DecodedSample>,
) -> Result<(), DecodeError> {
    if payload.len() < 2 {
        return Err(DecodeError::ValuesLength {
            count: 0,
            length: payload.len(),
        });
    }
    let count = u16::from_be_bytes([payload[0], payload[1]]) as usize;
    if payload.len() != 2 + count * (1 + VALUE_LEN) {
        return Err(DecodeError::ValuesLength {
            count,
            length: payload.len(),
        });
    }

    let kinds = &payload[2..2 + count];
    let values = &payload[2 + count..];

    samples.reserve(count);
    for (index, (&code, raw)) in kinds.iter().zip(values.chunks_exact(VALUE_LEN)).enumerate() {
        let kind = DataKind::from_wire(code).ok_or(DecodeError::UnknownKind(code))?;
        let mut bytes = [0u8; VALUE_LEN];
        bytes.copy_from_slice(raw);

        let value = match kind {
            DataKind::Gauge => f64::from_le_bytes(bytes),
            DataKind::Derive => i64::from_be_bytes(bytes) as f64,
            DataKind::Counter | DataKind::Absolute => u64::from_be_bytes(bytes) as f64,
        };

        samples.push(DecodedSample {
            host: state.host.clone(),
            plugin: state.plugin.clone(),
            plugin_instance: state.plugin_instance.clone(),
            type_name: state.type_name.clone(),
            type_instance: state.type_instance.clone(),
            value_index: index,
            kind,
            value,
            timestamp_ms,
        });
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_packets {
    //! Datagram builder shared by decoder and listener tests

    use super::*;

    #[derive(Default)]
    pub struct PacketBuilder {
        buf: Vec<u8>,
    }

    impl PacketBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        fn header(&mut self, part_type: u16, payload_len: usize) {
            self.buf.extend_from_slice(&part_type.to_be_bytes());
            self.buf
                .extend_from_slice(&((payload_len + PART_HEADER_LEN) as u16).to_be_bytes());
        }

        pub fn string(mut self, part_type: u16, value: &str) -> Self {
            self.header(part_type, value.len() + 1);
            self.buf.extend_from_slice(value.as_bytes());
            self.buf.push(0);
            self
        }

        pub fn numeric(mut self, part_type: u16, value: u64) -> Self {
            self.header(part_type, NUMERIC_PAYLOAD_LEN);
            self.buf.extend_from_slice(&value.to_be_bytes());
            self
        }

        pub fn raw(mut self, part_type: u16, payload: &[u8]) -> Self {
            self.header(part_type, payload.len());
            self.buf.extend_from_slice(payload);
            self
        }

        pub fn host(self, host: &str) -> Self {
            self.string(PART_HOST, host)
        }

        pub fn plugin(self, plugin: &str) -> Self {
            self.string(PART_PLUGIN, plugin)
        }

        pub fn plugin_instance(self, instance: &str) -> Self {
            self.string(PART_PLUGIN_INSTANCE, instance)
        }

        pub fn type_name(self, type_name: &str) -> Self {
            self.string(PART_TYPE, type_name)
        }

        pub fn type_instance(self, instance: &str) -> Self {
            self.string(PART_TYPE_INSTANCE, instance)
        }

        pub fn time_secs(self, secs: u64) -> Self {
            self.numeric(PART_TIME, secs)
        }

        pub fn time_hr(self, hr: u64) -> Self {
            self.numeric(PART_TIME_HR, hr)
        }

        pub fn interval_hr(self, hr: u64) -> Self {
            self.numeric(PART_INTERVAL_HR, hr)
        }

        pub fn values(mut self, values: &[(DataKind, f64)]) -> Self {
            let count = values.len();
            self.header(PART_VALUES, 2 + count * (1 + VALUE_LEN));
            self.buf.extend_from_slice(&(count as u16).to_be_bytes());
            for (kind, _) in values {
                self.buf.push(match kind {
                    DataKind::Counter => 0,
                    DataKind::Gauge => 1,
                    DataKind::Derive => 2,
                    DataKind::Absolute => 3,
                });
            }
            for (kind, value) in values {
                match kind {
                    DataKind::Gauge => self.buf.extend_from_slice(&value.to_le_bytes()),
                    DataKind::Derive => self.buf.extend_from_slice(&(*value as i64).to_be_bytes()),
                    DataKind::Counter | DataKind::Absolute => {
                        self.buf.extend_from_slice(&(*value as u64).to_be_bytes())
                    }
                }
            }
            self
        }

        pub fn build(self) -> Vec<u8> {
            self.buf
        }
    }
}
