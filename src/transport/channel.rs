//! UDP datagram channels
//!
//! Point-to-point, connectionless and unacknowledged. Senders address a fixed
//! destination; receivers keep only frames from their expected sender. The
//! non-blocking calls are used from the tick loop so a quiet or failing
//! socket never stretches a tick.

use std::io::{self, ErrorKind};
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use super::frame::{Frame, FRAME_LEN};

/// Receive buffer size; anything longer than a frame is rejected anyway
const RECV_BUF_LEN: usize = 64;

/// Most datagrams read by one `drain_latest` call; the rest wait a tick
pub const MAX_DRAIN_PER_TICK: usize = 64;

/// Sends two-byte frames stamped with a fixed sender id
#[derive(Debug)]
pub struct FrameSender {
    socket: UdpSocket,
    dest: SocketAddr,
    sender_id: u8,
}

impl FrameSender {
    /// Bind a local socket that sends to `dest`
    pub async fn bind(
        local: SocketAddr,
        dest: SocketAddr,
        sender_id: u8,
    ) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| TransportError::Bind { addr: local, source })?;

        // try_send_to reports WouldBlock until the reactor has seen the
        // socket writable once
        socket.writable().await.map_err(TransportError::Send)?;

        info!(%local, %dest, sender_id, "frame sender ready");

        Ok(Self {
            socket,
            dest,
            sender_id,
        })
    }

    pub fn sender_id(&self) -> u8 {
        self.sender_id
    }

    pub fn dest(&self) -> SocketAddr {
        self.dest
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket.local_addr().map_err(TransportError::Send)
    }

    /// Send one frame without blocking
    pub fn send(&self, payload: u8) -> Result<(), TransportError> {
        let bytes = Frame::new(self.sender_id, payload).encode();
        match self.socket.try_send_to(&bytes, self.dest) {
            Ok(FRAME_LEN) => Ok(()),
            Ok(n) => Err(TransportError::ShortSend(n)),
            Err(e) => Err(TransportError::Send(e)),
        }
    }
}

/// Receives two-byte frames from one expected sender
#[derive(Debug)]
pub struct FrameReceiver {
    socket: UdpSocket,
    expected_id: u8,
    buf: [u8; RECV_BUF_LEN],
}

impl FrameReceiver {
    /// Bind the listening socket
    pub async fn bind(listen: SocketAddr, expected_id: u8) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(listen)
            .await
            .map_err(|source| TransportError::Bind {
                addr: listen,
                source,
            })?;

        info!(%listen, expected_id, "frame receiver listening");

        Ok(Self {
            socket,
            expected_id,
            buf: [0u8; RECV_BUF_LEN],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket.local_addr().map_err(TransportError::Receive)
    }

    /// Drain queued datagrams without blocking
    ///
    /// Returns the payload of the most recent accepted frame, or `None` if no
    /// acceptable frame was queued. Rejected datagrams are dropped. At most
    /// [`MAX_DRAIN_PER_TICK`] datagrams are read per call.
    pub fn drain_latest(&mut self) -> Result<Option<u8>, TransportError> {
        let socket = &self.socket;
        drain_queued(|buf| socket.try_recv_from(buf), &mut self.buf, self.expected_id)
    }

    /// Wait for the next accepted frame
    pub async fn recv(&mut self) -> Result<Frame, TransportError> {
        loop {
            let (len, peer) = self
                .socket
                .recv_from(&mut self.buf)
                .await
                .map_err(TransportError::Receive)?;

            match Frame::decode(&self.buf[..len], self.expected_id) {
                Ok(frame) => return Ok(frame),
                Err(e) => debug!(%peer, %e, "discarding datagram"),
            }
        }
    }
}

/// Read datagrams through `recv` until it would block or the cap is hit
///
/// A receive error after a frame was accepted keeps that frame.
fn drain_queued<F>(mut recv: F, buf: &mut [u8], expected_id: u8) -> Result<Option<u8>, TransportError>
where
    F: FnMut(&mut [u8]) -> io::Result<(usize, SocketAddr)>,
{
    let mut latest = None;
    for _ in 0..MAX_DRAIN_PER_TICK {
        match recv(buf) {
            Ok((len, peer)) => match Frame::decode(&buf[..len], expected_id) {
                Ok(frame) => latest = Some(frame.payload),
                Err(e) => debug!(%peer, %e, "discarding datagram"),
            },
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(latest),
            Err(e) if latest.is_some() => {
                warn!(%e, "receive failed mid-drain, keeping accepted frame");
                return Ok(latest);
            }
            Err(e) => return Err(TransportError::Receive(e)),
        }
    }

    debug!(limit = MAX_DRAIN_PER_TICK, "drain limit reached, rest left queued");
    Ok(latest)
}

/// Errors raised by the datagram channels
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to send frame: {0}")]
    Send(#[source] std::io::Error),

    #[error("short send: {0} of 2 bytes")]
    ShortSend(usize),

    #[error("failed to receive frame: {0}")]
    Receive(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::assert_ok;

    use super::*;
    use crate::transport::frame::{BUTTON_SOURCE_ID, MIDDLEWARE_ID};

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    async fn pair(sender_id: u8, expected_id: u8) -> (FrameSender, FrameReceiver) {
        let receiver = FrameReceiver::bind(loopback(), expected_id).await.unwrap();
        let dest = receiver.local_addr().unwrap();
        let sender = FrameSender::bind(loopback(), dest, sender_id).await.unwrap();
        (sender, receiver)
    }

    #[tokio::test]
    async fn test_send_and_recv_frame() {
        let (sender, mut receiver) = pair(MIDDLEWARE_ID, MIDDLEWARE_ID).await;
        assert_ok!(sender.send(0x01));

        let frame = receiver.recv().await.unwrap();
        assert_eq!(frame, Frame::new(MIDDLEWARE_ID, 0x01));
    }

    #[tokio::test]
    async fn test_send_right_after_bind() {
        let receiver = FrameReceiver::bind(loopback(), MIDDLEWARE_ID).await.unwrap();
        let dest = receiver.local_addr().unwrap();
        let sender = FrameSender::bind(loopback(), dest, MIDDLEWARE_ID).await.unwrap();

        // No await between bind and the first sends
        assert_ok!(sender.send(0x01));
        assert_ok!(sender.send(0x00));
    }

    #[tokio::test]
    async fn test_recv_skips_foreign_sender() {
        let mut receiver = FrameReceiver::bind(loopback(), BUTTON_SOURCE_ID).await.unwrap();
        let dest = receiver.local_addr().unwrap();

        let stranger = FrameSender::bind(loopback(), dest, MIDDLEWARE_ID).await.unwrap();
        let source = FrameSender::bind(loopback(), dest, BUTTON_SOURCE_ID).await.unwrap();
        assert_ok!(stranger.send(0x04));
        assert_ok!(source.send(0x10));

        let frame = receiver.recv().await.unwrap();
        assert_eq!(frame.payload, 0x10);
    }

    #[tokio::test]
    async fn test_drain_latest_on_empty_socket() {
        let (_sender, mut receiver) = pair(BUTTON_SOURCE_ID, BUTTON_SOURCE_ID).await;
        assert_eq!(receiver.drain_latest().unwrap(), None);
    }

    #[tokio::test]
    async fn test_drain_latest_keeps_newest_accepted() {
        let (sender, mut receiver) = pair(BUTTON_SOURCE_ID, BUTTON_SOURCE_ID).await;
        let dest = receiver.local_addr().unwrap();
        let raw = UdpSocket::bind(loopback()).await.unwrap();

        assert_ok!(sender.send(0x04));
        assert_ok!(sender.send(0x14));
        raw.send_to(&[MIDDLEWARE_ID, 0x00], dest).await.unwrap();
        raw.send_to(&[BUTTON_SOURCE_ID], dest).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(receiver.drain_latest().unwrap(), Some(0x14));
        assert_eq!(receiver.drain_latest().unwrap(), None);
    }

    #[tokio::test]
    async fn test_drain_latest_ignores_only_foreign_frames() {
        let (sender, mut receiver) = pair(MIDDLEWARE_ID, BUTTON_SOURCE_ID).await;
        assert_ok!(sender.send(0x04));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(receiver.drain_latest().unwrap(), None);
    }

    #[tokio::test]
    async fn test_drain_latest_is_capped_per_call() {
        let (sender, mut receiver) = pair(BUTTON_SOURCE_ID, BUTTON_SOURCE_ID).await;
        let total = MAX_DRAIN_PER_TICK + 6;
        for payload in 0..total {
            assert_ok!(sender.send(payload as u8));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        let first = receiver.drain_latest().unwrap();
        assert_eq!(first, Some((MAX_DRAIN_PER_TICK - 1) as u8));
        assert_eq!(receiver.drain_latest().unwrap(), Some((total - 1) as u8));
        assert_eq!(receiver.drain_latest().unwrap(), None);
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:4386".parse().unwrap()
    }

    /// Replays `script` as receive results, then would-block
    fn scripted(
        script: Vec<io::Result<Vec<u8>>>,
    ) -> impl FnMut(&mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let mut script = script.into_iter();
        move |buf: &mut [u8]| match script.next() {
            Some(Ok(bytes)) => {
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok((bytes.len(), peer()))
            }
            Some(Err(e)) => Err(e),
            None => Err(io::Error::from(ErrorKind::WouldBlock)),
        }
    }

    #[test]
    fn test_error_mid_drain_keeps_accepted_frame() {
        let mut buf = [0u8; RECV_BUF_LEN];
        let recv = scripted(vec![
            Ok(vec![BUTTON_SOURCE_ID, 0x04]),
            Err(io::Error::from(ErrorKind::ConnectionRefused)),
            Ok(vec![BUTTON_SOURCE_ID, 0x00]),
        ]);

        let latest = drain_queued(recv, &mut buf, BUTTON_SOURCE_ID).unwrap();
        assert_eq!(latest, Some(0x04));
    }

    #[test]
    fn test_error_before_any_frame_is_reported() {
        let mut buf = [0u8; RECV_BUF_LEN];
        let recv = scripted(vec![
            Ok(vec![MIDDLEWARE_ID, 0x04]),
            Err(io::Error::from(ErrorKind::ConnectionRefused)),
        ]);

        let err = drain_queued(recv, &mut buf, BUTTON_SOURCE_ID).unwrap_err();
        assert!(matches!(err, TransportError::Receive(e) if e.kind() == ErrorKind::ConnectionRefused));
    }

    #[test]
    fn test_flood_stops_at_drain_limit() {
        let mut buf = [0u8; RECV_BUF_LEN];
        let mut calls = 0usize;
        let recv = |buf: &mut [u8]| {
            buf[0] = BUTTON_SOURCE_ID;
            buf[1] = calls as u8;
            calls += 1;
            Ok((FRAME_LEN, peer()))
        };

        let latest = drain_queued(recv, &mut buf, BUTTON_SOURCE_ID).unwrap();
        assert_eq!(latest, Some((MAX_DRAIN_PER_TICK - 1) as u8));
        assert_eq!(calls, MAX_DRAIN_PER_TICK);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let receiver = FrameReceiver::bind(loopback(), BUTTON_SOURCE_ID).await.unwrap();
        let taken = receiver.local_addr().unwrap();

        let err = FrameReceiver::bind(taken, BUTTON_SOURCE_ID).await.unwrap_err();
        assert!(matches!(err, TransportError::Bind { addr, .. } if addr == taken));
    }
}
