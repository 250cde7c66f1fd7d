//! OBD-II PID Definitions and Response Decoding
//!
//! Defines the supported Mode 01 Parameter IDs (PIDs) and their decoding formulas.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported OBD-II PIDs for Mode 01 (current data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Pid {
    /// OBD standards this vehicle conforms to (0x1C)
    ObdStandard = 0x1C,
    /// Run time since engine start (0x1F)
    RunTimeSinceStart = 0x1F,
    /// Fuel tank level input (0x2F)
    FuelTankLevel = 0x2F,
}

impl Pid {
    /// Query order of a full survey
    pub const ALL: [Pid; 3] = [Pid::ObdStandard, Pid::FuelTankLevel, Pid::RunTimeSinceStart];

    /// Get the PID hex value
    pub fn as_hex(&self) -> u8 {
        *self as u8
    }

    /// Get the number of response bytes for this PID
    pub fn response_bytes(&self) -> usize {
        match self {
            Pid::RunTimeSinceStart => 2,
            Pid::ObdStandard | Pid::FuelTankLevel => 1,
        }
    }

    /// Human-readable name
    pub fn description(&self) -> &'static str {
        match self {
            Pid::ObdStandard => "OBD standard this vehicle conforms to",
            Pid::RunTimeSinceStart => "run time since engine start",
            Pid::FuelTankLevel => "fuel tank level",
        }
    }
}

impl TryFrom<u8> for Pid {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x1C => Ok(Pid::ObdStandard),
            0x1F => Ok(Pid::RunTimeSinceStart),
            0x2F => Ok(Pid::FuelTankLevel),
            other => Err(DecodeError::UnsupportedPid(other)),
        }
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:02X})", self.description(), self.as_hex())
    }
}

/// OBD standard reported by PID 0x1C.
///
/// Serialized as `{"code": 6, "name": "EOBD (Europe)"}`; only the code is
/// read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "StandardRepr", from = "StandardRepr")]
pub enum ObdStandard {
    ObdIiCarb,
    ObdEpa,
    ObdAndObdIi,
    ObdI,
    Eobd,
    EobdAndObdIi,
    EobdAndObd,
    EobdObdAndObdIi,
    Jobd,
    JobdAndObdIi,
    JobdAndEobd,
    JobdEobdAndObdIi,
    Emd,
    EmdPlus,
    HdObdC,
    HdObd,
    WwhObd,
    HdEobdI,
    HdEobdIN,
    HdEobdIi,
    HdEobdIiN,
    ObdBr1,
    ObdBr2,
    Kobd,
    IobdI,
    IobdIi,
    HdEobdVi,
    /// One of the reserved "not OBD compliant" codes
    NotCompliant(u8),
    /// Code newer than this table
    Unknown(u8),
}

impl ObdStandard {
    /// Map the raw byte to a standard; never fails
    pub fn from_code(code: u8) -> Self {
        use ObdStandard::*;
        match code {
            1 => ObdIiCarb,
            2 => ObdEpa,
            3 => ObdAndObdIi,
            4 => ObdI,
            5 | 14 | 15 | 16 | 22 | 27 => NotCompliant(code),
            6 => Eobd,
            7 => EobdAndObdIi,
            8 => EobdAndObd,
            9 => EobdObdAndObdIi,
            10 => Jobd,
            11 => JobdAndObdIi,
            12 => JobdAndEobd,
            13 => JobdEobdAndObdIi,
            17 => Emd,
            18 => EmdPlus,
            19 => HdObdC,
            20 => HdObd,
            21 => WwhObd,
            23 => HdEobdI,
            24 => HdEobdIN,
            25 => HdEobdIi,
            26 => HdEobdIiN,
            28 => ObdBr1,
            29 => ObdBr2,
            30 => Kobd,
            31 => IobdI,
            32 => IobdIi,
            33 => HdEobdVi,
            other => Unknown(other),
        }
    }

    /// Raw byte as reported by the vehicle
    pub fn code(&self) -> u8 {
        use ObdStandard::*;
        match *self {
            ObdIiCarb => 1,
            ObdEpa => 2,
            ObdAndObdIi => 3,
            ObdI => 4,
            Eobd => 6,
            EobdAndObdIi => 7,
            EobdAndObd => 8,
            EobdObdAndObdIi => 9,
            Jobd => 10,
            JobdAndObdIi => 11,
            JobdAndEobd => 12,
            JobdEobdAndObdIi => 13,
            Emd => 17,
            EmdPlus => 18,
            HdObdC => 19,
            HdObd => 20,
            WwhObd => 21,
            HdEobdI => 23,
            HdEobdIN => 24,
            HdEobdIi => 25,
            HdEobdIiN => 26,
            ObdBr1 => 28,
            ObdBr2 => 29,
            Kobd => 30,
            IobdI => 31,
            IobdIi => 32,
            HdEobdVi => 33,
            NotCompliant(code) | Unknown(code) => code,
        }
    }

    /// Full name of the standard
    pub fn name(&self) -> &'static str {
        use ObdStandard::*;
        match self {
            ObdIiCarb => "OBD-II as defined by the CARB",
            ObdEpa => "OBD as defined by the EPA",
            ObdAndObdIi => "OBD and OBD-II",
            ObdI => "OBD-I",
            Eobd => "EOBD (Europe)",
            EobdAndObdIi => "EOBD and OBD-II",
            EobdAndObd => "EOBD and OBD",
            EobdObdAndObdIi => "EOBD, OBD and OBD II",
            Jobd => "JOBD (Japan)",
            JobdAndObdIi => "JOBD and OBD II",
            JobdAndEobd => "JOBD and EOBD",
            JobdEobdAndObdIi => "JOBD, EOBD, and OBD II",
            Emd => "Engine Manufacturer Diagnostics (EMD)",
            EmdPlus => "Engine Manufacturer Diagnostics Enhanced (EMD+)",
            HdObdC => "Heavy Duty On-Board Diagnostics (Child/Partial) (HD OBD-C)",
            HdObd => "Heavy Duty On-Board Diagnostics (HD OBD)",
            WwhObd => "World Wide Harmonized OBD (WWH OBD)",
            HdEobdI => "Heavy Duty Euro OBD Stage I without NOx control (HD EOBD-I)",
            HdEobdIN => "Heavy Duty Euro OBD Stage I with NOx control (HD EOBD-I N)",
            HdEobdIi => "Heavy Duty Euro OBD Stage II without NOx control (HD EOBD-II)",
            HdEobdIiN => "Heavy Duty Euro OBD Stage II with NOx control (HD EOBD-II N)",
            ObdBr1 => "Brazil OBD Phase 1 (OBDBr-1)",
            ObdBr2 => "Brazil OBD Phase 2 (OBDBr-2)",
            Kobd => "Korean OBD (KOBD)",
            IobdI => "India OBD I (IOBD I)",
            IobdIi => "India OBD II (IOBD II)",
            HdEobdVi => "Heavy Duty Euro OBD Stage VI (HD EOBD-IV)",
            NotCompliant(_) => "Not OBD compliant",
            Unknown(_) => "Unknown OBD standard",
        }
    }
}

impl fmt::Display for ObdStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObdStandard::Unknown(code) => write!(f, "{} (code {})", self.name(), code),
            _ => f.write_str(self.name()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StandardRepr {
    code: u8,
    #[serde(default)]
    name: String,
}

impl From<ObdStandard> for StandardRepr {
    fn from(standard: ObdStandard) -> Self {
        Self {
            code: standard.code(),
            name: standard.to_string(),
        }
    }
}

impl From<StandardRepr> for ObdStandard {
    fn from(repr: StandardRepr) -> Self {
        ObdStandard::from_code(repr.code)
    }
}

/// A decoded physical value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Reading {
    /// OBD standard the vehicle conforms to
    ObdStandard(ObdStandard),
    /// Fuel tank level (0-100%)
    FuelLevelPercent(f64),
    /// Seconds since engine start
    RuntimeSeconds(u16),
}

impl Reading {
    /// Decode the payload of a response to `pid`
    pub fn decode(pid: Pid, payload: &[u8]) -> Result<Self, DecodeError> {
        let required = pid.response_bytes();
        if payload.len() < required {
            return Err(DecodeError::PayloadTooShort {
                pid: pid.as_hex(),
                required,
                actual: payload.len(),
            });
        }

        let reading = match pid {
            // Enumerated: A
            Pid::ObdStandard => Reading::ObdStandard(ObdStandard::from_code(payload[0])),
            // Fuel level: A * 100 / 255 (%)
            Pid::FuelTankLevel => {
                Reading::FuelLevelPercent((payload[0] as f64 * 100.0 / 255.0).clamp(0.0, 100.0))
            }
            // Run time: (A * 256) + B (s)
            Pid::RunTimeSinceStart => {
                Reading::RuntimeSeconds(u16::from_be_bytes([payload[0], payload[1]]))
            }
        };

        Ok(reading)
    }

    /// Decode the payload of a response to a raw PID code
    pub fn decode_raw(pid: u8, payload: &[u8]) -> Result<Self, DecodeError> {
        Self::decode(Pid::try_from(pid)?, payload)
    }

    /// PID this reading answers
    pub fn pid(&self) -> Pid {
        match self {
            Reading::ObdStandard(_) => Pid::ObdStandard,
            Reading::FuelLevelPercent(_) => Pid::FuelTankLevel,
            Reading::RuntimeSeconds(_) => Pid::RunTimeSinceStart,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::ObdStandard(standard) => write!(f, "{}", standard),
            Reading::FuelLevelPercent(percent) => write!(f, "{:.1} percent", percent),
            Reading::RuntimeSeconds(seconds) => write!(f, "{} seconds", seconds),
        }
    }
}
