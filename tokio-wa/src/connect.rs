//! TCP connection establishment.

use log::debug;
use tokio::net::TcpStream;

use crate::error::{ConnectorError, Error};

/// Connects to the first reachable `(host, port)` candidate, retrying the
/// whole list up to `attempts` times. All candidates failing on every
/// attempt is a connection error.
pub async fn connect_to_host(hosts: &[(String, u16)], attempts: usize) -> Result<TcpStream, Error> {
    for attempt in 1..=attempts {
        for (host, port) in hosts {
            debug!("connecting to {}:{} (attempt {})", host, port, attempt);
            match TcpStream::connect((host.as_str(), *port)).await {
                Ok(stream) => return Ok(stream),
                Err(e) => debug!("connection to {}:{} failed: {}", host, port, e),
            }
        }
    }
    Err(Error::Connection(ConnectorError::AllFailed))
}
