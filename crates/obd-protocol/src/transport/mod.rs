//! CAN Bus Transport
//!
//! The session talks to the bus through [`CanBus`]; adapters live in the
//! submodules.

mod sim;
#[cfg(all(target_os = "linux", feature = "socketcan"))]
mod socketcan;

pub use self::sim::SimulatedBus;
#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub use self::socketcan::SocketCanBus;

use crate::error::TransportError;
use crate::frame::CanFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// A connection to a CAN bus
pub trait CanBus {
    /// Write one frame to the bus
    fn send(&mut self, frame: &CanFrame) -> Result<(), TransportError>;

    /// Wait up to `timeout` for the next frame; `None` if nothing arrived.
    ///
    /// A zero timeout polls once without waiting.
    fn receive(&mut self, timeout: Duration) -> Result<Option<CanFrame>, TransportError>;
}

impl<B: CanBus + ?Sized> CanBus for Box<B> {
    fn send(&mut self, frame: &CanFrame) -> Result<(), TransportError> {
        (**self).send(frame)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<CanFrame>, TransportError> {
        (**self).receive(timeout)
    }
}

/// Kind of bus adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Linux SocketCAN raw socket
    #[serde(alias = "socketcan_native")]
    SocketCan,
    /// In-process simulated ECU
    Virtual,
}

impl Default for AdapterKind {
    fn default() -> Self {
        AdapterKind::SocketCan
    }
}

impl FromStr for AdapterKind {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "socketcan" | "socketcan_native" => Ok(AdapterKind::SocketCan),
            "virtual" => Ok(AdapterKind::Virtual),
            other => Err(TransportError::Unsupported(other.to_string())),
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterKind::SocketCan => f.write_str("socketcan"),
            AdapterKind::Virtual => f.write_str("virtual"),
        }
    }
}

/// Open a bus connection of the given kind on `channel`
pub fn open_bus(kind: AdapterKind, channel: &str) -> Result<Box<dyn CanBus>, TransportError> {
    info!(adapter = %kind, channel, "Opening CAN bus");
    match kind {
        #[cfg(all(target_os = "linux", feature = "socketcan"))]
        AdapterKind::SocketCan => Ok(Box::new(SocketCanBus::open(channel)?)),
        #[cfg(not(all(target_os = "linux", feature = "socketcan")))]
        AdapterKind::SocketCan => Err(TransportError::Unsupported(kind.to_string())),
        AdapterKind::Virtual => Ok(Box::new(SimulatedBus::with_vehicle())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_kind_parse() {
        assert_eq!("socketcan".parse::<AdapterKind>().unwrap(), AdapterKind::SocketCan);
        assert_eq!(
            "socketcan_native".parse::<AdapterKind>().unwrap(),
            AdapterKind::SocketCan
        );
        assert_eq!("Virtual".parse::<AdapterKind>().unwrap(), AdapterKind::Virtual);
        assert!("pcan".parse::<AdapterKind>().is_err());
    }

    #[test]
    fn test_open_virtual_bus() {
        let mut bus = open_bus(AdapterKind::Virtual, "vcan0").unwrap();
        assert!(bus.receive(Duration::from_millis(1)).unwrap().is_none());
    }
}
