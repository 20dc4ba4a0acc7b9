//! Connection and cursor configuration
//!
//! Addresses are parsed from `host`, `host:port` or `[v6addr]:port`.

use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DEFAULT_MAX_FRAME_LEN, DEFAULT_PORT};
use crate::cursor::PrefetchWindow;
use crate::error::{Error, Result};

/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Per-cursor options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorOptions {
    /// How far ahead of the consumer the cursor may fetch
    pub prefetch: PrefetchWindow,
    /// How long `next()` may wait for an in-flight response (None = forever)
    pub fetch_timeout: Option<Duration>,
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self {
            prefetch: PrefetchWindow::default(),
            fetch_timeout: None,
        }
    }
}

impl CursorOptions {
    /// Create default cursor options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prefetch window
    pub fn prefetch(mut self, window: PrefetchWindow) -> Self {
        self.prefetch = window;
        self
    }

    /// Set the fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Check the options for values that can never work
    pub fn validate(&self) -> Result<()> {
        if self.prefetch.is_empty() {
            return Err(Error::InvalidConfig(
                "prefetch window must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig(
                "fetch timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Connection configuration.
///
/// # Examples
///
/// ```rust
/// use reql_cursor::{Config, PrefetchWindow};
/// use std::time::Duration;
///
/// let config: Config = "db.internal:28015".parse().unwrap();
/// let config = config
///     .connect_timeout(Duration::from_secs(5))
///     .prefetch(PrefetchWindow::Rows(500));
/// assert_eq!(config.socket_addr(), "db.internal:28015");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to connect to
    pub host: String,
    /// Port to connect to
    pub port: u16,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Largest frame body accepted from the server
    pub max_frame_len: usize,
    /// Defaults for cursors opened on this connection
    pub cursor: CursorOptions,
}

impl Config {
    /// Create a new configuration
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            cursor: CursorOptions::default(),
        }
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the maximum accepted frame body length
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Set the default prefetch window
    pub fn prefetch(mut self, window: PrefetchWindow) -> Self {
        self.cursor.prefetch = window;
        self
    }

    /// Set the default fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.cursor.fetch_timeout = Some(timeout);
        self
    }

    /// Get the socket address string (host:port)
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::InvalidConfig("host is empty".to_string()));
        }
        if self.max_frame_len == 0 {
            return Err(Error::InvalidConfig(
                "max frame length must be non-zero".to_string(),
            ));
        }
        self.cursor.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT)
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidConfig("empty address".to_string()));
        }

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| Error::InvalidConfig(format!("unterminated '[' in {}", s)))?;
            match tail {
                "" => (host, None),
                _ => match tail.strip_prefix(':') {
                    Some(port) => (host, Some(port)),
                    None => {
                        return Err(Error::InvalidConfig(format!("unexpected '{}'", tail)))
                    }
                },
            }
        } else if s.parse::<Ipv6Addr>().is_ok() {
            // Bare IPv6 address; a port needs the bracketed form
            (s, None)
        } else {
            match s.rsplit_once(':') {
                Some((host, _)) if host.contains(':') => {
                    return Err(Error::InvalidConfig(format!(
                        "IPv6 address with a port must be bracketed: {}",
                        s
                    )))
                }
                Some((host, port)) => (host, Some(port)),
                None => (s, None),
            }
        };

        let port = match port {
            Some(port) => port
                .parse()
                .map_err(|_| Error::InvalidConfig(format!("invalid port: {}", port)))?,
            None => DEFAULT_PORT,
        };

        let config = Config::new(host, port);
        config.validate()?;
        Ok(config)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.socket_addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_port() {
        let config: Config = "localhost:28016".parse().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 28016);
    }

    #[test]
    fn test_parse_default_port() {
        let config: Config = "db.example.com".parse().unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.to_string(), "db.example.com:28015");
    }

    #[test]
    fn test_parse_ipv6() {
        let config: Config = "[::1]:29015".parse().unwrap();
        assert_eq!(config.host, "::1");
        assert_eq!(config.port, 29015);
        assert_eq!(config.socket_addr(), "[::1]:29015");

        let config: Config = "::1".parse().unwrap();
        assert_eq!(config.host, "::1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.socket_addr(), "[::1]:28015");

        let config: Config = "fe80::2:1".parse().unwrap();
        assert_eq!(config.host, "fe80::2:1");
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<Config>().is_err());
        assert!("host:notaport".parse::<Config>().is_err());
        assert!(":28015".parse::<Config>().is_err());
        assert!("[::1".parse::<Config>().is_err());
        assert!("::1:notaport".parse::<Config>().is_err());
        assert!("db::28015".parse::<Config>().is_err());
    }

    #[test]
    fn test_cursor_options_validation() {
        assert!(CursorOptions::default().validate().is_ok());
        assert!(CursorOptions::new()
            .prefetch(PrefetchWindow::Rows(0))
            .validate()
            .is_err());
        assert!(CursorOptions::new()
            .fetch_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .connect_timeout(Duration::from_secs(3))
            .max_frame_len(1024)
            .prefetch(PrefetchWindow::Batches(4))
            .fetch_timeout(Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.max_frame_len, 1024);
        assert_eq!(config.cursor.prefetch, PrefetchWindow::Batches(4));
        assert_eq!(config.cursor.fetch_timeout, Some(Duration::from_millis(250)));
    }
}
