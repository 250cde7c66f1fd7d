//! OBD-II over CAN Addressing
//!
//! ISO 15765-4 with 11-bit identifiers: requests go to the functional
//! broadcast ID or to a single ECU, responses come back on 0x7E8..=0x7EF.

use crate::error::TransportError;
use serde::{Deserialize, Serialize};

/// Functional (broadcast) request ID
pub const FUNCTIONAL_REQUEST_ID: u32 = 0x7DF;
/// Physical request ID of the first ECU
pub const PHYSICAL_REQUEST_BASE: u32 = 0x7E0;
/// First ECU response ID
pub const RESPONSE_ID_FIRST: u32 = 0x7E8;
/// Last ECU response ID
pub const RESPONSE_ID_LAST: u32 = 0x7EF;
/// Distance between a physical request ID and its response ID
pub const RESPONSE_ID_OFFSET: u32 = 0x08;

/// Added to a service ID in a positive response
pub const POSITIVE_RESPONSE_OFFSET: u8 = 0x40;
/// Service ID of a negative response
pub const NEGATIVE_RESPONSE: u8 = 0x7F;
/// Filler for unused request bytes
pub const PADDING_BYTE: u8 = 0x55;

/// Whether an arbitration ID belongs to an ECU response
pub fn is_response_id(id: u32) -> bool {
    (RESPONSE_ID_FIRST..=RESPONSE_ID_LAST).contains(&id)
}

/// How requests are addressed on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Addressing {
    /// Broadcast to every emissions-related ECU (0x7DF)
    Functional,
    /// Address a single ECU (0x7E0..=0x7E7)
    Physical { ecu: u8 },
}

impl Addressing {
    /// Physical addressing of ECU `ecu` (0..=7)
    pub fn physical(ecu: u8) -> Result<Self, TransportError> {
        let addressing = Addressing::Physical { ecu };
        addressing.validate()?;
        Ok(addressing)
    }

    /// Reject physical addresses outside the eight OBD-II ECU slots
    pub fn validate(&self) -> Result<(), TransportError> {
        match self {
            Addressing::Physical { ecu } if *ecu > 7 => Err(TransportError::InvalidConfig(
                format!("physical ECU address {} is outside 0..=7", ecu),
            )),
            _ => Ok(()),
        }
    }

    /// Arbitration ID used for requests
    pub fn request_id(&self) -> u32 {
        match self {
            Addressing::Functional => FUNCTIONAL_REQUEST_ID,
            Addressing::Physical { ecu } => PHYSICAL_REQUEST_BASE + u32::from(*ecu),
        }
    }

    /// Whether a response from `id` answers requests sent with this addressing
    pub fn accepts(&self, id: u32) -> bool {
        match self {
            Addressing::Functional => is_response_id(id),
            Addressing::Physical { .. } => id == self.request_id() + RESPONSE_ID_OFFSET,
        }
    }
}

impl Default for Addressing {
    fn default() -> Self {
        Addressing::Functional
    }
}
