//! OBD-II Error Types

use thiserror::Error;

/// Failures of the bus adapter itself. These abort a whole session.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Adapter could not be opened
    #[error("Unable to open CAN channel {channel}: {reason}")]
    Open { channel: String, reason: String },

    /// Frame could not be written to the bus
    #[error("CAN send failed: {0}")]
    Send(String),

    /// Frame could not be read from the bus
    #[error("CAN receive failed: {0}")]
    Receive(String),

    /// Adapter kind not available in this build
    #[error("CAN adapter '{0}' is not supported by this build")]
    Unsupported(String),

    /// Invalid adapter or addressing configuration
    #[error("Invalid bus configuration: {0}")]
    InvalidConfig(String),
}

/// Structural problems with a frame that claims to be an OBD-II response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Arbitration ID outside the response range
    #[error("Arbitration ID {0:03X} is not an OBD-II response ID")]
    WrongArbitrationId(u32),

    /// First payload byte does not describe the frame
    #[error("Malformed length byte {length:02X} in frame of {dlc} bytes")]
    MalformedLength { length: u8, dlc: u8 },

    /// Service byte is not the positive response to the request
    #[error("Unexpected service {actual:02X}, expected {expected:02X}")]
    WrongService { expected: u8, actual: u8 },

    /// ECU rejected the request
    #[error("Negative response to service {service:02X}: NRC {code:02X}")]
    NegativeResponse { service: u8, code: u8 },

    /// Response answers a different PID
    #[error("PID mismatch: expected {expected:02X}, got {actual:02X}")]
    PidMismatch { expected: u8, actual: u8 },

    /// Requested PID does not fit in a single byte
    #[error("PID {0:#X} does not fit in a single byte")]
    PidOutOfRange(u32),
}

/// Failures turning response bytes into a physical value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not enough data bytes for the PID formula
    #[error("PID {pid:02X} needs {required} data bytes, got {actual}")]
    PayloadTooShort {
        pid: u8,
        required: usize,
        actual: usize,
    },

    /// PID has no decode formula
    #[error("PID {0:02X} is not supported")]
    UnsupportedPid(u8),
}

/// Invalid CAN frame construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// More than eight data bytes
    #[error("CAN frame data is {0} bytes, maximum is 8")]
    TooLong(usize),

    /// Identifier does not fit in 11 bits
    #[error("Arbitration ID {0:#X} exceeds 11 bits")]
    IdOutOfRange(u32),
}

/// Outcome of a failed query
#[derive(Debug, Error)]
pub enum ObdError {
    /// Bus adapter failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No matching response before the deadline
    #[error("Timeout waiting for OBD response after {0}ms")]
    Timeout(u64),

    /// Malformed or mismatched response
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Response payload could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ObdError {
    /// Whether this error ends the whole session rather than a single query
    pub fn is_fatal(&self) -> bool {
        matches!(self, ObdError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_fatal() {
        assert!(ObdError::from(TransportError::Send("bus off".into())).is_fatal());
        assert!(!ObdError::Timeout(1000).is_fatal());
        assert!(!ObdError::from(DecodeError::UnsupportedPid(0x0C)).is_fatal());
        assert!(!ObdError::from(ProtocolError::PidMismatch {
            expected: 0x2F,
            actual: 0x1F
        })
        .is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = ProtocolError::WrongService {
            expected: 0x41,
            actual: 0x42,
        };
        assert_eq!(err.to_string(), "Unexpected service 42, expected 41");
        assert_eq!(
            ObdError::Timeout(250).to_string(),
            "Timeout waiting for OBD response after 250ms"
        );
    }
}
