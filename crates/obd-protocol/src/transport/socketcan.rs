//! Linux SocketCAN adapter

use crate::error::TransportError;
use crate::frame::CanFrame;
use crate::transport::CanBus;
use ::socketcan::{CanFrame as RawFrame, CanSocket, EmbeddedFrame, Frame, Socket, StandardId};
use std::io::ErrorKind;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Smallest read timeout handed to the socket; zero would mean "block forever"
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Raw CAN socket bound to one interface. Closed on drop.
pub struct SocketCanBus {
    channel: String,
    socket: CanSocket,
}

impl SocketCanBus {
    /// Open a raw CAN socket on `channel` (e.g. "can0", "vcan0")
    pub fn open(channel: &str) -> Result<Self, TransportError> {
        let socket = CanSocket::open(channel).map_err(|e| TransportError::Open {
            channel: channel.to_string(),
            reason: format!(
                "{} (check that the hardware is connected and the interface is up)",
                e
            ),
        })?;

        info!("Opened SocketCAN interface {}", channel);
        Ok(Self {
            channel: channel.to_string(),
            socket,
        })
    }
}

impl Drop for SocketCanBus {
    fn drop(&mut self) {
        info!("Closing SocketCAN interface {}", self.channel);
    }
}

impl CanBus for SocketCanBus {
    fn send(&mut self, frame: &CanFrame) -> Result<(), TransportError> {
        let id = StandardId::new(frame.id() as u16).ok_or_else(|| {
            TransportError::Send(format!("Invalid standard ID: 0x{:03X}", frame.id()))
        })?;
        let raw = RawFrame::new(id, frame.data())
            .ok_or_else(|| TransportError::Send("Failed to create CAN frame".to_string()))?;

        self.socket
            .write_frame(&raw)
            .map_err(|e| TransportError::Send(format!("{}: {}", self.channel, e)))?;

        trace!("TX {}", frame);
        Ok(())
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<CanFrame>, TransportError> {
        let deadline = Instant::now() + timeout;

        // Reads at least once, so a zero timeout polls what is already queued
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            self.socket
                .set_read_timeout(remaining.max(MIN_READ_TIMEOUT))
                .map_err(|e| TransportError::Receive(format!("set read timeout: {}", e)))?;

            match self.socket.read_frame() {
                Ok(RawFrame::Data(raw)) if !raw.is_extended() => {
                    let frame = CanFrame::new(raw.raw_id(), raw.data())
                        .map_err(|e| TransportError::Receive(e.to_string()))?;
                    trace!("RX {}", frame);
                    return Ok(Some(frame));
                }
                Ok(_) => {
                    debug!("Ignoring extended, remote or error frame on {}", self.channel);
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                }
                Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(None);
                }
                Err(e) => {
                    return Err(TransportError::Receive(format!("{}: {}", self.channel, e)));
                }
            }
        }
    }
}
