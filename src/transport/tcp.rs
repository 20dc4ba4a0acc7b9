//! TCP connection establishment

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

/// Open a TCP stream to the configured address.
///
/// Applies the connect timeout and disables Nagle's algorithm. The returned
/// stream is expected to be ready to carry query frames.
pub async fn connect_tcp(config: &Config) -> Result<TcpStream> {
    let addr = config.socket_addr();
    let stream = timeout(config.connect_timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::ConnectionTimeout(config.connect_timeout))??;

    stream.set_nodelay(true)?;
    debug!(addr = %addr, "tcp connection established");
    Ok(stream)
}
