//! Centralized shutdown management

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::config::ShutdownConfig;

/// What the process should do once a signal arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Exit right away, pending points are lost
    Immediate,
    /// Let the pipeline make one final flush, bounded by the timeout
    Drain(Duration),
}

impl From<&ShutdownConfig> for ShutdownMode {
    fn from(config: &ShutdownConfig) -> Self {
        if config.drain {
            ShutdownMode::Drain(config.drain_timeout)
        } else {
            ShutdownMode::Immediate
        }
    }
}

/// Centralized shutdown service for coordinating process termination
#[derive(Clone)]
pub struct ShutdownService {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    mode: ShutdownMode,
}

impl ShutdownService {
    pub fn new(mode: ShutdownMode) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
            handles: Arc::new(Mutex::new(Vec::new())),
            mode,
        }
    }

    pub fn mode(&self) -> ShutdownMode {
        self.mode
    }

    /// Register a task whose completion is awaited when draining
    pub async fn register(&self, handle: JoinHandle<()>) {
        self.handles.lock().await.push(handle);
    }

    /// Subscribe to shutdown signal
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }

    /// Trigger shutdown
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Check if shutdown was triggered
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until shutdown has been triggered
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|&v| v).await;
    }

    /// Trigger shutdown and, in drain mode, wait for registered tasks
    ///
    /// Immediate mode returns as soon as the signal is broadcast. Drain mode
    /// waits for every registered task but never longer than the drain
    /// timeout. Returns `true` when all tasks finished in time.
    pub async fn shutdown(&self) -> bool {
        self.trigger();

        let timeout = match self.mode {
            ShutdownMode::Immediate => {
                tracing::debug!("Immediate shutdown, pending batch discarded");
                return false;
            }
            ShutdownMode::Drain(timeout) => timeout,
        };

        let handles = std::mem::take(&mut *self.handles.lock().await);
        tracing::debug!(
            count = handles.len(),
            timeout_ms = timeout.as_millis() as u64,
            "Draining background tasks"
        );

        match tokio::time::timeout(timeout, futures::future::join_all(handles)).await {
            Ok(_) => {
                tracing::debug!("All background tasks completed");
                true
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Timeout waiting for final flush"
                );
                false
            }
        }
    }

    /// Install OS signal handlers and auto-trigger on Ctrl+C/SIGTERM
    pub fn install_signal_handlers(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut signal) => {
                        signal.recv().await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to install SIGTERM handler");
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
                _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
            }

            service.trigger();
        });
    }
}
