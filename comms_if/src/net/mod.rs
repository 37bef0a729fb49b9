//! # Network Module
//!
//! Side-channel commands are sent over short lived TCP connections: connect, write the whole
//! payload, close. No response is expected from the server.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};
use std::{
    io::Write,
    net::{AddrParseError, Shutdown, SocketAddr, TcpStream},
    time::Duration,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network endpoints of the side-channel servers on the vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Endpoint of the relay server as an IP literal and port, e.g. `"192.168.2.2:60000"`
    pub relay_endpoint: String,

    /// Endpoint of the camera server as an IP literal and port, e.g. `"192.168.2.2:5000"`
    pub camera_endpoint: String,

    /// Maximum time to wait for a connection or a write to complete.
    ///
    /// Units: milliseconds
    pub io_timeout_ms: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Endpoint {0} is not an IP address and port: {1}")]
    InvalidEndpoint(String, AddrParseError),

    #[error("Could not connect to {0}: {1}")]
    ConnectError(SocketAddr, std::io::Error),

    #[error("Could not write to {0}: {1}")]
    WriteError(SocketAddr, std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NetParams {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

impl Default for NetParams {
    fn default() -> Self {
        Self {
            relay_endpoint: "192.168.2.2:60000".into(),
            camera_endpoint: "192.168.2.2:5000".into(),
            io_timeout_ms: 1000,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Open a fresh connection to `endpoint`, write `payload`, and close the connection.
///
/// Both the connect and the write are bounded by `timeout`. Hostnames are rejected, since name
/// resolution can't be bounded.
pub fn send_oneshot(endpoint: &str, payload: &[u8], timeout: Duration) -> Result<(), NetError> {
    let addr: SocketAddr = endpoint
        .parse()
        .map_err(|e| NetError::InvalidEndpoint(endpoint.to_string(), e))?;

    let mut stream = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| NetError::ConnectError(addr, e))?;

    stream
        .set_write_timeout(Some(timeout))
        .map_err(|e| NetError::WriteError(addr, e))?;
    stream
        .write_all(payload)
        .and_then(|_| stream.flush())
        .map_err(|e| NetError::WriteError(addr, e))?;

    // The server reads until EOF, a failed shutdown just means it already went away
    stream.shutdown(Shutdown::Write).ok();

    trace!("Sent {} bytes to {}", payload.len(), addr);

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_send_oneshot() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).unwrap();
            buf
        });

        send_oneshot(&endpoint, &[1, 1], Duration::from_millis(500)).unwrap();

        assert_eq!(server.join().unwrap(), vec![1, 1]);
    }

    #[test]
    fn test_send_oneshot_refused() {
        // Bind then drop to get a port nothing is listening on
        let endpoint = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };

        assert!(matches!(
            send_oneshot(&endpoint, &[0, 0], Duration::from_millis(200)),
            Err(NetError::ConnectError(_, _))
        ));
    }

    #[test]
    fn test_send_oneshot_bad_endpoint() {
        for endpoint in &["not an endpoint", "localhost:5000", "192.168.2.2"] {
            assert!(matches!(
                send_oneshot(endpoint, &[0], Duration::from_millis(200)),
                Err(NetError::InvalidEndpoint(_, _))
            ));
        }
    }
}
