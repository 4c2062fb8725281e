// src/supervisor/probe.rs

//! Readiness probes.
//!
//! A probe only decides *whether* the process became usable; how long the
//! supervisor is willing to wait is enforced outside of it with
//! `tokio::time::timeout`, so a probe that never succeeds simply never
//! returns.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::ProbeSection;
use crate::types::ProbeKind;

/// Future returned by [`ReadinessProbe::wait_ready`].
///
/// `'static` so the supervisor can keep it across loop iterations while it
/// keeps handling commands.
pub type ProbeFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

pub trait ReadinessProbe: Send + Sync {
    /// Resolve once the process is ready, or with an error if it can tell
    /// that it never will be.
    fn wait_ready(&self) -> ProbeFuture;
}

/// Polls a TCP connect until the process accepts connections.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: SocketAddr,
    interval: Duration,
}

impl TcpProbe {
    pub fn new(address: SocketAddr, interval: Duration) -> Self {
        Self { address, interval }
    }
}

impl ReadinessProbe for TcpProbe {
    fn wait_ready(&self) -> ProbeFuture {
        let address = self.address;
        let interval = self.interval;

        Box::pin(async move {
            info!(%address, "waiting for process to accept connections");
            let mut attempt: u64 = 0;
            loop {
                attempt += 1;
                match TcpStream::connect(address).await {
                    Ok(_) => {
                        info!(%address, attempt, "process is ready");
                        return Ok(());
                    }
                    Err(e) => {
                        debug!(%address, attempt, error = %e, "readiness probe failed, retrying");
                    }
                }
                sleep(interval).await;
            }
        })
    }
}

/// Considers the process ready as soon as it has been spawned.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateProbe;

impl ReadinessProbe for ImmediateProbe {
    fn wait_ready(&self) -> ProbeFuture {
        Box::pin(async { Ok(()) })
    }
}

pub fn probe_from_config(probe: &ProbeSection) -> Arc<dyn ReadinessProbe> {
    match probe.kind {
        ProbeKind::Tcp => Arc::new(TcpProbe::new(probe.address, probe.interval)),
        ProbeKind::None => Arc::new(ImmediateProbe),
    }
}
