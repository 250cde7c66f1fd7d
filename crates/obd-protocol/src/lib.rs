//! OBD-II Protocol Implementation
//!
//! This crate queries vehicle ECUs with OBD-II service 01 requests over
//! raw CAN (ISO 15765-4, 11-bit identifiers, single frames). It encodes
//! request frames, matches and validates responses, and decodes the
//! payload into typed readings.

mod error;
mod frame;
mod pid;
mod protocol;
mod session;
pub mod transport;

pub use error::{DecodeError, FrameError, ObdError, ProtocolError, TransportError};
pub use frame::{decode_response, encode_request, CanFrame, ObdResponse, PidRequest};
pub use pid::{ObdStandard, Pid, Reading};
pub use protocol::{is_response_id, Addressing};
pub use session::{PidOutcome, QueryState, Session, SessionConfig, Survey};
pub use transport::{open_bus, AdapterKind, CanBus, SimulatedBus};

/// OBD-II mode constants
pub mod mode {
    /// Current data
    pub const CURRENT_DATA: u8 = 0x01;
}
