//! TCP transport implementation.

use super::constant::DEFAULT_PORT;
use super::error::Error;
use super::transport::Transport as PakbusTransport;
use log::debug;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Mutex;
use std::time::Duration;

/// Connection options for [`Transport::connect`].
#[derive(Debug, Clone)]
pub struct Options {
    host: String,
    port: u16,
    timeout: Duration,
}

impl Options {
    /// `port` defaults to [`DEFAULT_PORT`] (6785), `timeout` to 30s, matching
    /// the reference client.
    pub fn new(host: &str) -> Options {
        Options {
            host: host.to_string(),
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_port(mut self, port: u16) -> Options {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Options {
        self.timeout = timeout;
        self
    }
}

/// A blocking TCP connection to a PakBus peer.
pub struct Transport {
    stream: Mutex<TcpStream>,
}

impl Transport {
    pub fn connect(options: Options) -> Result<Transport, Error> {
        let address = format!("{}:{}", options.host, options.port);
        let stream = TcpStream::connect(&address)?;
        stream.set_read_timeout(Some(options.timeout))?;
        stream.set_write_timeout(Some(options.timeout))?;
        debug!("connected to {}", address);
        Ok(Transport {
            stream: Mutex::new(stream),
        })
    }
}

impl PakbusTransport for Transport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let mut stream = self.stream.lock().map_err(|_| Error::Lock)?;
        stream.write_all(bytes)?;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        let mut stream = self.stream.lock().map_err(|_| Error::Lock)?;
        let mut b = [0u8; 1];
        match stream.read_exact(&mut b) {
            Ok(()) => Ok(b[0]),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
                Err(Error::Timeout)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn set_timeout(&mut self, secs: f64) -> Result<(), Error> {
        let stream = self.stream.lock().map_err(|_| Error::Lock)?;
        let duration = Duration::from_secs_f64(secs.max(0.0));
        stream.set_read_timeout(Some(duration))?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        let stream = self.stream.lock().map_err(|_| Error::Lock)?;
        stream.shutdown(std::net::Shutdown::Both)?;
        Ok(())
    }
}
