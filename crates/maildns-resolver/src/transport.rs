//! Blocking UDP and TCP exchange with the configured nameservers.

use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, UdpSocket};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Largest reply we are prepared to receive.
const MAX_REPLY_SIZE: usize = 65535;

/// Moves query bytes to a nameserver and reply bytes back.
pub trait Transport {
    /// Sends `query` over UDP and returns the matching reply.
    fn exchange_udp(&self, query: &[u8]) -> io::Result<Vec<u8>>;

    /// Sends `query` over TCP and returns the reply.
    fn exchange_tcp(&self, query: &[u8]) -> io::Result<Vec<u8>>;
}

/// Nameserver transport over plain UDP with TCP for truncated replies.
///
/// Every nameserver is tried in order, `attempts` rounds in total, each
/// try bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    nameservers: Vec<SocketAddr>,
    timeout: Duration,
    attempts: u32,
}

impl UdpTransport {
    /// Creates a transport for `nameservers`.
    pub fn new(nameservers: Vec<SocketAddr>, timeout: Duration, attempts: u32) -> Self {
        Self {
            nameservers,
            timeout,
            attempts: attempts.max(1),
        }
    }

    /// Returns the nameservers in the order they are tried.
    pub fn nameservers(&self) -> &[SocketAddr] {
        &self.nameservers
    }

    fn bind_udp(server: SocketAddr) -> io::Result<UdpSocket> {
        let (domain, local) = if server.is_ipv4() {
            (Domain::IPV4, IpAddr::V4(Ipv4Addr::UNSPECIFIED))
        } else {
            (Domain::IPV6, IpAddr::V6(Ipv6Addr::UNSPECIFIED))
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.bind(&SocketAddr::new(local, 0).into())?;
        socket.connect(&server.into())?;
        Ok(socket.into())
    }

    fn udp_once(&self, server: SocketAddr, query: &[u8]) -> io::Result<Vec<u8>> {
        let socket = Self::bind_udp(server)?;
        socket.send(query)?;

        let deadline = Instant::now() + self.timeout;
        let mut buf = vec![0u8; MAX_REPLY_SIZE];

        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Err(io::ErrorKind::TimedOut.into());
            }
            socket.set_read_timeout(Some(left))?;

            let len = socket.recv(&mut buf)?;
            if len >= 2 && query.len() >= 2 && buf[..2] == query[..2] {
                return Ok(buf[..len].to_vec());
            }
            trace!(%server, len, "discarding reply with foreign id");
        }
    }

    fn tcp_once(&self, server: SocketAddr, query: &[u8]) -> io::Result<Vec<u8>> {
        let length = u16::try_from(query.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "query too large for TCP"))?;

        let mut stream = TcpStream::connect_timeout(&server, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        stream.write_all(&length.to_be_bytes())?;
        stream.write_all(query)?;

        let mut len_buf = [0u8; 2];
        stream.read_exact(&mut len_buf)?;
        let mut reply = vec![0u8; usize::from(u16::from_be_bytes(len_buf))];
        stream.read_exact(&mut reply)?;
        Ok(reply)
    }
}

impl Transport for UdpTransport {
    fn exchange_udp(&self, query: &[u8]) -> io::Result<Vec<u8>> {
        let mut last_error = None;

        for attempt in 0..self.attempts {
            for &server in &self.nameservers {
                match self.udp_once(server, query) {
                    Ok(reply) => return Ok(reply),
                    Err(error) => {
                        debug!(%server, attempt, %error, "UDP query failed");
                        last_error = Some(error);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| io::ErrorKind::NotConnected.into()))
    }

    fn exchange_tcp(&self, query: &[u8]) -> io::Result<Vec<u8>> {
        let mut last_error = None;

        for &server in &self.nameservers {
            match self.tcp_once(server, query) {
                Ok(reply) => return Ok(reply),
                Err(error) => {
                    debug!(%server, %error, "TCP query failed");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| io::ErrorKind::NotConnected.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_udp_exchange_matches_id() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut buf = [0u8; 512];
            let (len, peer) = server.recv_from(&mut buf).unwrap();
            // a stray datagram first, then the real reply
            server.send_to(&[0xFF, 0xFF, 0, 0], peer).unwrap();
            let mut reply = buf[..len].to_vec();
            reply.push(0xAA);
            server.send_to(&reply, peer).unwrap();
        });

        let transport = UdpTransport::new(vec![addr], Duration::from_secs(2), 1);
        let reply = transport.exchange_udp(&[0x12, 0x34, 1, 2]).unwrap();
        assert_eq!(reply, vec![0x12, 0x34, 1, 2, 0xAA]);
        handle.join().unwrap();
    }

    #[test]
    fn test_udp_timeout() {
        // bound but never answers
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = silent.local_addr().unwrap();

        let transport = UdpTransport::new(vec![addr], Duration::from_millis(50), 2);
        assert!(transport.exchange_udp(&[0, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_tcp_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut len_buf = [0u8; 2];
            stream.read_exact(&mut len_buf).unwrap();
            let mut query = vec![0u8; usize::from(u16::from_be_bytes(len_buf))];
            stream.read_exact(&mut query).unwrap();
            stream.write_all(&len_buf).unwrap();
            stream.write_all(&query).unwrap();
        });

        let transport = UdpTransport::new(vec![addr], Duration::from_secs(2), 1);
        let reply = transport.exchange_tcp(&[9, 8, 7]).unwrap();
        assert_eq!(reply, vec![9, 8, 7]);
        handle.join().unwrap();
    }

    #[test]
    fn test_no_nameservers() {
        let transport = UdpTransport::new(Vec::new(), Duration::from_millis(10), 1);
        assert!(transport.exchange_udp(&[0, 0]).is_err());
        assert!(transport.exchange_tcp(&[0, 0]).is_err());
    }
}
