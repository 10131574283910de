//! Socket primitives for the three transports.

use std::{
    io::{self, Write},
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket},
    time::Duration,
};

use native_tls::{Certificate, TlsConnector, TlsStream};

use super::{Endpoint, Transport};

/// Additional trusted root supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RootCertificate {
    /// PEM-encoded certificate.
    Pem(Vec<u8>),
    /// DER-encoded certificate.
    Der(Vec<u8>),
}

impl RootCertificate {
    fn parse(&self) -> Result<Certificate, native_tls::Error> {
        match self {
            RootCertificate::Pem(bytes) => Certificate::from_pem(bytes),
            RootCertificate::Der(bytes) => Certificate::from_der(bytes),
        }
    }
}

/// TLS connection options (the security context of the encrypted transport).
#[derive(Clone, Debug, Default)]
pub struct TlsOptions {
    /// Domain presented during the handshake; defaults to the endpoint host.
    pub domain: Option<String>,
    /// Extra roots trusted alongside (or instead of) the system store.
    pub root_certificates: Vec<RootCertificate>,
    /// Trust only `root_certificates` when true.
    pub disable_built_in_roots: bool,
    /// Skip certificate validation when true (intended for tests).
    pub insecure_skip_verify: bool,
}

impl TlsOptions {
    /// Build a connector honouring these options.
    pub fn connector(&self) -> Result<TlsConnector, native_tls::Error> {
        let mut builder = TlsConnector::builder();
        for root in &self.root_certificates {
            builder.add_root_certificate(root.parse()?);
        }
        builder.disable_built_in_roots(self.disable_built_in_roots);
        if self.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build()
    }
}

/// Active socket connection state.
pub enum ActiveConnection {
    PlainTcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    Udp(UdpSocket),
}

impl ActiveConnection {
    /// Update the write timeout for the underlying socket.
    pub fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.set_write_timeout(Some(timeout)),
            ActiveConnection::Tls(stream) => stream.get_ref().set_write_timeout(Some(timeout)),
            ActiveConnection::Udp(socket) => socket.set_write_timeout(Some(timeout)),
        }
    }

    /// Write a full buffer to the socket.
    ///
    /// Datagram sockets send `buf` as a single datagram and fail if the
    /// kernel accepts fewer bytes.
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.write_all(buf),
            ActiveConnection::Tls(stream) => stream.write_all(buf),
            ActiveConnection::Udp(socket) => {
                let sent = socket.send(buf)?;
                if sent == buf.len() {
                    Ok(())
                } else {
                    Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("datagram truncated: sent {sent} of {} bytes", buf.len()),
                    ))
                }
            }
        }
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.flush(),
            ActiveConnection::Tls(stream) => stream.flush(),
            ActiveConnection::Udp(_) => Ok(()),
        }
    }
}

impl std::fmt::Debug for ActiveConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ActiveConnection::PlainTcp(_) => "PlainTcp",
            ActiveConnection::Tls(_) => "Tls",
            ActiveConnection::Udp(_) => "Udp",
        };
        f.debug_tuple("ActiveConnection").field(&kind).finish()
    }
}

fn socket_addrs(endpoint: &Endpoint) -> io::Result<Vec<SocketAddr>> {
    (endpoint.host.as_str(), endpoint.port)
        .to_socket_addrs()
        .map(|iter| iter.collect())
}

fn no_address(endpoint: &Endpoint) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no addresses resolved for {}:{}", endpoint.host, endpoint.port),
    )
}

fn connect_tcp(endpoint: &Endpoint, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in socket_addrs(endpoint)? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| no_address(endpoint)))
}

fn connect_udp(endpoint: &Endpoint) -> io::Result<UdpSocket> {
    let mut last_err = None;
    for addr in socket_addrs(endpoint)? {
        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        match UdpSocket::bind(local).and_then(|socket| socket.connect(addr).map(|()| socket)) {
            Ok(socket) => return Ok(socket),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| no_address(endpoint)))
}

/// Establish a connection to `endpoint`.
///
/// `tls` must be supplied for the encrypted transport; it is built once at
/// construction from the endpoint's [`TlsOptions`]. The TLS handshake is
/// bounded by `connect_timeout`, and `write_timeout` is applied to the
/// resulting socket.
pub fn connect_endpoint(
    endpoint: &Endpoint,
    tls: Option<&TlsConnector>,
    connect_timeout: Duration,
    write_timeout: Duration,
) -> io::Result<ActiveConnection> {
    let mut connection = match &endpoint.transport {
        Transport::EncryptedStream(options) => {
            let connector = tls.ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "missing TLS connector")
            })?;
            let stream = connect_tcp(endpoint, connect_timeout)?;
            stream.set_read_timeout(Some(connect_timeout))?;
            stream.set_write_timeout(Some(connect_timeout))?;
            let domain = options.domain.as_deref().unwrap_or(&endpoint.host);
            let stream = connector
                .connect(domain, stream)
                .map_err(io::Error::other)?;
            stream.get_ref().set_read_timeout(None)?;
            ActiveConnection::Tls(Box::new(stream))
        }
        Transport::PlainStream => ActiveConnection::PlainTcp(connect_tcp(endpoint, connect_timeout)?),
        Transport::PlainDatagram => ActiveConnection::Udp(connect_udp(endpoint)?),
    };
    connection.set_write_timeout(write_timeout)?;
    Ok(connection)
}
