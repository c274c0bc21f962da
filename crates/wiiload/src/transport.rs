//! Delivery of a transfer to the console over TCP.

use easyerr::{Error, ResultExt};
use std::{
    io::Write,
    net::{SocketAddr, SocketAddrV4, TcpStream},
    time::Duration,
};

/// Port the Wiiload receiver listens on.
pub const WIILOAD_PORT: u16 = 4299;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {target}")]
    Connect {
        target: SocketAddrV4,
        source: std::io::Error,
    },
    #[error("failed to send header")]
    Header { source: std::io::Error },
    #[error("failed to send payload")]
    Payload { source: std::io::Error },
}

/// Socket options applied to the connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timeouts {
    /// Connection timeout. If `None`, the OS default applies.
    pub connect: Option<Duration>,
    /// Timeout of each write. If `None`, writes block until done.
    pub write: Option<Duration>,
}

/// Opens a connection to the receiver at `target`.
pub fn connect(target: SocketAddrV4, timeouts: Timeouts) -> Result<TcpStream, TransportError> {
    let connected = match timeouts.connect {
        Some(timeout) => TcpStream::connect_timeout(&SocketAddr::V4(target), timeout),
        None => TcpStream::connect(target),
    };

    let stream = connected.map_err(|source| TransportError::Connect { target, source })?;
    stream
        .set_write_timeout(timeouts.write)
        .map_err(|source| TransportError::Connect { target, source })?;

    tracing::debug!("connected to {target}");
    Ok(stream)
}

/// Writes the header and then the payload. The payload is only written once the whole header
/// went through.
pub fn transmit<W: Write>(
    writer: &mut W,
    header: &[u8],
    payload: &[u8],
) -> Result<(), TransportError> {
    writer.write_all(header).context(TransportCtx::Header)?;
    tracing::debug!("sent {} bytes of header", header.len());

    writer.write_all(payload).context(TransportCtx::Payload)?;
    writer.flush().context(TransportCtx::Payload)?;
    tracing::debug!("sent {} bytes of payload", payload.len());

    Ok(())
}

/// Connects to `target` and transmits the header and payload over that single connection. The
/// connection is closed before returning, whether the transfer succeeded or not.
pub fn deliver(
    target: SocketAddrV4,
    timeouts: Timeouts,
    header: &[u8],
    payload: &[u8],
) -> Result<(), TransportError> {
    let mut stream = connect(target, timeouts)?;
    let result = transmit(&mut stream, header, payload);
    drop(stream);

    result
}

#[cfg(test)]
mod test {
    use super::{Timeouts, TransportError, deliver, transmit};
    use std::{
        io::{self, Read, Write},
        net::{Ipv4Addr, SocketAddrV4, TcpListener},
        time::Duration,
    };

    /// A writer which records every write and fails on the `fail_at`-th one.
    struct Recorder {
        writes: Vec<Vec<u8>>,
        fail_at: Option<usize>,
    }

    impl Recorder {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                writes: Vec::new(),
                fail_at,
            }
        }
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_at == Some(self.writes.len()) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"));
            }

            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn header_then_payload() {
        let mut recorder = Recorder::new(None);
        transmit(&mut recorder, &[1; 524], &[2, 3, 4]).unwrap();

        assert_eq!(recorder.writes.len(), 2);
        assert_eq!(recorder.writes[0], vec![1; 524]);
        assert_eq!(recorder.writes[1], vec![2, 3, 4]);
    }

    #[test]
    fn header_failure_skips_payload() {
        let mut recorder = Recorder::new(Some(0));
        let result = transmit(&mut recorder, &[1; 524], &[2, 3, 4]);

        assert!(matches!(result, Err(TransportError::Header { .. })));
        assert!(recorder.writes.is_empty());
    }

    #[test]
    fn payload_failure() {
        let mut recorder = Recorder::new(Some(1));
        let result = transmit(&mut recorder, &[1; 524], &[2, 3, 4]);

        assert!(matches!(result, Err(TransportError::Payload { .. })));
        assert_eq!(recorder.writes.len(), 1);
    }

    #[test]
    fn refused_connection() {
        // bind then drop a listener to get a port nobody listens on
        let port = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let target = SocketAddrV4::new(Ipv4Addr::LOCALHOST, port);

        match deliver(target, Timeouts::default(), &[0; 524], &[1]) {
            Err(TransportError::Connect { target: t, .. }) => assert_eq!(t, target),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn connection_is_closed_after_delivery() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let receiver = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            // only returns once the client closed the connection
            stream.read_to_end(&mut received).unwrap();
            received
        });

        let timeouts = Timeouts {
            connect: Some(Duration::from_secs(5)),
            write: Some(Duration::from_secs(5)),
        };
        let target = SocketAddrV4::new(Ipv4Addr::LOCALHOST, port);
        deliver(target, timeouts, b"head", b"body").unwrap();

        assert_eq!(receiver.join().unwrap(), b"headbody");
    }
}
