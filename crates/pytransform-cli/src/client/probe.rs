//! TCP reachability probe for the worker endpoint.
//!
//! A successful connect means something is listening on the endpoint; it says
//! nothing about whether that process is a healthy worker. The transform
//! exchange remains the authoritative check.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use pytransform_config::ServiceEndpoint;
use tracing::trace;

use super::CLIENT_TARGET;

/// Returns whether any resolved address of `endpoint` accepts a connection
/// within `timeout`.
pub(crate) fn endpoint_is_reachable(endpoint: &ServiceEndpoint, timeout: Duration) -> bool {
    let addresses = match resolve(endpoint) {
        Ok(addresses) => addresses,
        Err(error) => {
            trace!(
                target: CLIENT_TARGET,
                endpoint = %endpoint,
                error = %error,
                "endpoint did not resolve"
            );
            return false;
        }
    };
    addresses.iter().any(|address| {
        match TcpStream::connect_timeout(address, timeout) {
            Ok(_) => true,
            Err(error) => {
                trace!(
                    target: CLIENT_TARGET,
                    %address,
                    error = %error,
                    "probe connect failed"
                );
                false
            }
        }
    })
}

fn resolve(endpoint: &ServiceEndpoint) -> io::Result<Vec<SocketAddr>> {
    // `localhost` may resolve to both loopback families; the worker
    // typically binds only one of them.
    let addresses: Vec<SocketAddr> = (endpoint.host(), endpoint.port())
        .to_socket_addrs()?
        .collect();
    if addresses.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "no resolved address",
        ));
    }
    Ok(addresses)
}
