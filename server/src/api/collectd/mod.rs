//! collectd UDP listener
//!
//! Receives collectd network plugin datagrams, decodes them and hands samples
//! to the pipeline one at a time. The hand-off channel is bounded, so a slow
//! pipeline stalls the listener instead of growing a queue.

mod decode;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub use decode::decode_packet;
pub use error::{DecodeError, ListenerError};

use crate::core::config::ListenerConfig;
use crate::data::types::DecodedSample;
use crate::utils::time::now_millis;

// =============================================================================
// Stats
// =============================================================================

/// Listener counters
#[derive(Debug, Default)]
pub struct ListenerStats {
    packets_received: AtomicU64,
    bytes_received: AtomicU64,
    packets_malformed: AtomicU64,
    samples_forwarded: AtomicU64,
}

/// Point-in-time copy of [`ListenerStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerStatsSnapshot {
    pub packets_received: u64,
    pub bytes_received: u64,
    pub packets_malformed: u64,
    pub samples_forwarded: u64,
}

impl ListenerStats {
    #[inline]
    fn packet_received(&self, bytes: u64) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    fn packet_malformed(&self) {
        self.packets_malformed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn sample_forwarded(&self) {
        self.samples_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ListenerStatsSnapshot {
        ListenerStatsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            packets_malformed: self.packets_malformed.load(Ordering::Relaxed),
            samples_forwarded: self.samples_forwarded.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Listener
// =============================================================================

pub struct CollectdListener {
    socket: UdpSocket,
    max_packet_size: usize,
    verbose: bool,
    stats: Arc<ListenerStats>,
}

impl CollectdListener {
    /// Bind the UDP socket
    pub async fn bind(config: &ListenerConfig, verbose: bool) -> Result<Self, ListenerError> {
        let address = config.bind_address();
        let socket = UdpSocket::bind(&address)
            .await
            .map_err(|source| ListenerError::Bind {
                address: address.clone(),
                source,
            })?;

        tracing::debug!(
            address = %address,
            max_packet_size = config.max_packet_size,
            "collectd UDP socket bound"
        );

        Ok(Self {
            socket,
            max_packet_size: config.max_packet_size,
            verbose,
            stats: Arc::new(ListenerStats::default()),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Shared handle to the listener counters
    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.stats)
    }

    /// Spawn the receive loop
    ///
    /// The loop ends on shutdown or when the pipeline drops its receiver.
    pub fn start(
        self,
        tx: mpsc::Sender<DecodedSample>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            // One spare byte so oversized datagrams are detectable
            let mut recv_buf = vec![0u8; self.max_packet_size + 1];

            loop {
                tokio::select! {
                    biased;
                    result = shutdown_rx.changed() => {
                        if result.is_err() || *shutdown_rx.borrow() {
                            tracing::debug!("collectd listener received shutdown");
                            break;
                        }
                    }
                    result = self.socket.recv_from(&mut recv_buf) => {
                        match result {
                            Ok((len, peer)) => {
                                if !self.process_packet(&recv_buf[..len], peer, &tx).await {
                                    tracing::debug!("Sample channel closed, stopping listener");
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "collectd UDP recv error");
                            }
                        }
                    }
                }
            }

            let stats = self.stats.snapshot();
            tracing::debug!(
                packets = stats.packets_received,
                bytes = stats.bytes_received,
                malformed = stats.packets_malformed,
                samples = stats.samples_forwarded,
                "collectd listener stopped"
            );
        })
    }

    /// Decode a datagram and forward its samples; `false` once the channel is closed
    async fn process_packet(
        &self,
        data: &[u8],
        peer: SocketAddr,
        tx: &mpsc::Sender<DecodedSample>,
    ) -> bool {
        if data.len() > self.max_packet_size {
            self.stats.packet_malformed();
            tracing::warn!(
                peer = %peer,
                max = self.max_packet_size,
                "collectd packet too large, dropping"
            );
            return true;
        }

        self.stats.packet_received(data.len() as u64);

        let samples = match decode_packet(data, now_millis()) {
            Ok(samples) => samples,
            Err(e) => {
                self.stats.packet_malformed();
                tracing::warn!(peer = %peer, error = %e, "Malformed collectd packet, dropping");
                return true;
            }
        };

        if self.verbose {
            tracing::trace!(
                peer = %peer,
                bytes = data.len(),
                samples = samples.len(),
                "Got a packet"
            );
        }

        for sample in samples {
            if tx.send(sample).await.is_err() {
                return false;
            }
            self.stats.sample_forwarded();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::decode::test_packets::PacketBuilder;
    use super::*;
    use crate::data::types::DataKind;
    use std::time::Duration;

    fn loopback_config() -> ListenerConfig {
        ListenerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_packet_size: 1452,
        }
    }

    async fn send_to(listener_addr: SocketAddr, packet: &[u8]) {
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(packet, listener_addr).await.unwrap();
    }

    #[tokio::test]
    async fn test_listener_forwards_samples() {
        let listener = CollectdListener::bind(&loopback_config(), false)
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = listener.stats();
        let (tx, mut rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let _handle = listener.start(tx, shutdown_rx);

        let packet = PacketBuilder::new()
            .host("h1")
            .time_secs(2)
            .plugin("interface")
            .plugin_instance("eth0")
            .type_name("if_octets")
            .values(&[(DataKind::Derive, 10.0), (DataKind::Derive, 20.0)])
            .build();
        send_to(addr, &packet).await;

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let second = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.value_index, 0);
        assert_eq!(first.value, 10.0);
        assert_eq!(second.value_index, 1);
        assert_eq!(second.timestamp_ms, 2000);
        assert_eq!(stats.snapshot().packets_received, 1);
    }

    #[tokio::test]
    async fn test_listener_drops_malformed_and_continues() {
        let listener = CollectdListener::bind(&loopback_config(), true)
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = listener.stats();
        let (tx, mut rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let _handle = listener.start(tx, shutdown_rx);

        send_to(addr, &[0x00, 0x00, 0x00, 0x40]).await;
        let good = PacketBuilder::new()
            .plugin("load")
            .type_name("load")
            .values(&[(DataKind::Gauge, 0.25)])
            .build();
        send_to(addr, &good).await;

        let sample = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sample.value, 0.25);
        assert_eq!(stats.snapshot().packets_malformed, 1);
    }

    #[tokio::test]
    async fn test_listener_stops_on_shutdown() {
        let listener = CollectdListener::bind(&loopback_config(), false)
            .await
            .unwrap();
        let (tx, _rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = listener.start(tx, shutdown_rx);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_listener_stops_when_channel_closed() {
        let listener = CollectdListener::bind(&loopback_config(), false)
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = listener.start(tx, shutdown_rx);
        drop(rx);

        let packet = PacketBuilder::new()
            .plugin("load")
            .type_name("load")
            .values(&[(DataKind::Gauge, 1.0)])
            .build();
        send_to(addr, &packet).await;

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_bind_error() {
        let first = CollectdListener::bind(&loopback_config(), false)
            .await
            .unwrap();
        let taken = ListenerConfig {
            port: first.local_addr().unwrap().port(),
            ..loopback_config()
        };
        let err = CollectdListener::bind(&taken, false).await.err().unwrap();
        assert!(matches!(err, ListenerError::Bind { .. }));
    }
}
