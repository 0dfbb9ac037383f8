//! Network reachability check performed before every load.
//!
//! A desktop terminal has no single "network status" API, so the default
//! gate asks the question directly: can a TCP connection be opened to the
//! news service's host within a short timeout?  Anything that cannot be
//! determined (bad URL, DNS failure, refused connection) counts as
//! unreachable.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;
use url::Url;

/// Reports whether the network is currently usable.
///
/// Called once per load attempt on the owner thread, before any request is
/// issued.  Implementations must not retry.
pub trait ConnectivityGate {
    fn is_reachable(&self) -> bool;
}

/// Any `Fn() -> bool` is a gate, which keeps tests and ad-hoc gates short.
impl<F> ConnectivityGate for F
where
    F: Fn() -> bool,
{
    fn is_reachable(&self) -> bool {
        self()
    }
}

/// Probes the API host with a plain TCP connect.
pub struct TcpProbeGate {
    target: Option<(String, u16)>,
    timeout: Duration,
}

impl TcpProbeGate {
    /// Gate for the host and port of `base`.
    ///
    /// A URL without a host (or with an unknown scheme and no explicit port)
    /// produces a gate that always reports unreachable.
    pub fn for_url(base: &Url, timeout: Duration) -> Self {
        let target = base
            .host_str()
            .zip(base.port_or_known_default())
            .map(|(host, port)| (host.to_string(), port));

        Self { target, timeout }
    }
}

impl ConnectivityGate for TcpProbeGate {
    fn is_reachable(&self) -> bool {
        let Some((host, port)) = &self.target else {
            debug!("no probe target; treating network as unreachable");
            return false;
        };

        let addrs = match (host.as_str(), *port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!(%host, error = %e, "could not resolve probe host");
                return false;
            }
        };

        let reachable = addrs
            .into_iter()
            .any(|addr| TcpStream::connect_timeout(&addr, self.timeout).is_ok());

        debug!(%host, port, reachable, "connectivity probe finished");
        reachable
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
