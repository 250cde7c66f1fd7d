//! OBD-II Frame Codec
//!
//! Single-frame ISO 15765-4 layout used by service 01:
//!
//! ```text
//! byte 0   number of meaningful bytes that follow
//! byte 1   service (0x01 request, 0x41 response)
//! byte 2   PID
//! byte 3+  PID data (A, B, C, D), then padding
//! ```

use crate::error::{FrameError, ProtocolError};
use crate::mode;
use crate::pid::Pid;
use crate::protocol::{
    is_response_id, Addressing, NEGATIVE_RESPONSE, PADDING_BYTE, POSITIVE_RESPONSE_OFFSET,
};
use std::fmt;

/// Classic CAN payload size
pub const MAX_DATA_LEN: usize = 8;
/// Largest standard (11-bit) identifier
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Smallest valid length byte: service + PID
const MIN_RESPONSE_LEN: u8 = 2;
/// Largest valid length byte: service + PID + four data bytes
const MAX_RESPONSE_LEN: u8 = 6;

/// A classic CAN data frame with an 11-bit identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    arbitration_id: u32,
    data: [u8; MAX_DATA_LEN],
    dlc: u8,
}

impl CanFrame {
    /// Build a frame; `data` is zero-padded to eight bytes
    pub fn new(arbitration_id: u32, data: &[u8]) -> Result<Self, FrameError> {
        if arbitration_id > MAX_STANDARD_ID {
            return Err(FrameError::IdOutOfRange(arbitration_id));
        }
        if data.len() > MAX_DATA_LEN {
            return Err(FrameError::TooLong(data.len()));
        }

        let mut padded = [0u8; MAX_DATA_LEN];
        padded[..data.len()].copy_from_slice(data);

        Ok(Self {
            arbitration_id,
            data: padded,
            dlc: data.len() as u8,
        })
    }

    /// Arbitration ID
    pub fn id(&self) -> u32 {
        self.arbitration_id
    }

    /// Data length code
    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// The `dlc` valid data bytes
    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlc as usize]
    }
}

impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X} [{}]", self.arbitration_id, self.dlc)?;
        for byte in self.data() {
            write!(f, " {:02X}", byte)?;
        }
        Ok(())
    }
}

/// A service 01 request for one PID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PidRequest {
    pid: u8,
}

impl PidRequest {
    /// Request for a raw PID code
    pub fn new(pid: u8) -> Self {
        Self { pid }
    }

    /// Requested PID code
    pub fn pid(&self) -> u8 {
        self.pid
    }
}

impl From<Pid> for PidRequest {
    fn from(pid: Pid) -> Self {
        Self::new(pid.as_hex())
    }
}

impl TryFrom<u32> for PidRequest {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map(Self::new)
            .map_err(|_| ProtocolError::PidOutOfRange(value))
    }
}

/// Encode a "show current data" request frame
pub fn encode_request(request: PidRequest, addressing: Addressing) -> CanFrame {
    CanFrame {
        arbitration_id: addressing.request_id(),
        data: [
            0x02,
            mode::CURRENT_DATA,
            request.pid(),
            PADDING_BYTE,
            PADDING_BYTE,
            PADDING_BYTE,
            PADDING_BYTE,
            PADDING_BYTE,
        ],
        dlc: MAX_DATA_LEN as u8,
    }
}

/// A validated positive response to a service 01 request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObdResponse {
    service_id: u8,
    pid: u8,
    payload: Vec<u8>,
}

impl ObdResponse {
    /// Response service ID (always 0x41)
    pub fn service_id(&self) -> u8 {
        self.service_id
    }

    /// PID this response answers
    pub fn pid(&self) -> u8 {
        self.pid
    }

    /// PID data bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Data byte A
    pub fn a(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Data byte B
    pub fn b(&self) -> Option<u8> {
        self.payload.get(1).copied()
    }

    /// Data byte C
    pub fn c(&self) -> Option<u8> {
        self.payload.get(2).copied()
    }

    /// Data byte D
    pub fn d(&self) -> Option<u8> {
        self.payload.get(3).copied()
    }
}

/// Validate `frame` as the response to a request for `expected_pid`
pub fn decode_response(frame: &CanFrame, expected_pid: u8) -> Result<ObdResponse, ProtocolError> {
    if !is_response_id(frame.id()) {
        return Err(ProtocolError::WrongArbitrationId(frame.id()));
    }

    let data = frame.data();
    let length = data.first().copied().unwrap_or(0);
    if !(MIN_RESPONSE_LEN..=MAX_RESPONSE_LEN).contains(&length) || length >= frame.dlc() {
        return Err(ProtocolError::MalformedLength {
            length,
            dlc: frame.dlc(),
        });
    }

    let service = data[1];
    if service == NEGATIVE_RESPONSE {
        return Err(ProtocolError::NegativeResponse {
            service: data[2],
            code: data.get(3).copied().unwrap_or(0),
        });
    }

    let expected_service = mode::CURRENT_DATA + POSITIVE_RESPONSE_OFFSET;
    if service != expected_service {
        return Err(ProtocolError::WrongService {
            expected: expected_service,
            actual: service,
        });
    }

    let pid = data[2];
    if pid != expected_pid {
        return Err(ProtocolError::PidMismatch {
            expected: expected_pid,
            actual: pid,
        });
    }

    Ok(ObdResponse {
        service_id: service,
        pid,
        payload: data[3..=length as usize].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(data: &[u8]) -> CanFrame {
        CanFrame::new(0x7E8, data).unwrap()
    }

    #[test]
    fn test_frame_rejects_oversized_data() {
        assert_eq!(CanFrame::new(0x7DF, &[0; 9]), Err(FrameError::TooLong(9)));
        assert_eq!(
            CanFrame::new(0x800, &[0; 8]),
            Err(FrameError::IdOutOfRange(0x800))
        );
    }

    #[test]
    fn test_frame_pads_data() {
        let frame = CanFrame::new(0x7E8, &[0x03, 0x41, 0x2F]).unwrap();
        assert_eq!(frame.dlc(), 3);
        assert_eq!(frame.data(), &[0x03, 0x41, 0x2F]);
        assert_eq!(frame.to_string(), "7E8 [3] 03 41 2F");
    }

    #[test]
    fn test_encode_request_layout() {
        let frame = encode_request(Pid::FuelTankLevel.into(), Addressing::Functional);
        assert_eq!(frame.id(), 0x7DF);
        assert_eq!(frame.dlc(), 8);
        assert_eq!(
            frame.data(),
            &[0x02, 0x01, 0x2F, 0x55, 0x55, 0x55, 0x55, 0x55]
        );

        let physical = encode_request(PidRequest::new(0x1C), Addressing::Physical { ecu: 0 });
        assert_eq!(physical.id(), 0x7E0);
    }

    #[test]
    fn test_pid_request_range() {
        assert_eq!(PidRequest::try_from(0xFFu32).unwrap().pid(), 0xFF);
        assert_eq!(
            PidRequest::try_from(0x100u32),
            Err(ProtocolError::PidOutOfRange(0x100))
        );
    }

    #[test]
    fn test_request_response_round_trip() {
        for pid in Pid::ALL {
            let request = encode_request(pid.into(), Addressing::Functional);
            let requested = request.data()[2];
            let service = request.data()[1] + POSITIVE_RESPONSE_OFFSET;
            let reply = response(&[0x04, service, requested, 0x12, 0x34, 0x55, 0x55, 0x55]);

            let decoded = decode_response(&reply, pid.as_hex()).unwrap();
            assert_eq!(decoded.service_id(), 0x41);
            assert_eq!(decoded.pid(), pid.as_hex());
            assert_eq!(decoded.payload(), &[0x12, 0x34]);
        }
    }

    #[test]
    fn test_payload_letters() {
        let reply = response(&[0x06, 0x41, 0x1F, 0x0A, 0x0B, 0x0C, 0x0D, 0x00]);
        let decoded = decode_response(&reply, 0x1F).unwrap();
        assert_eq!(decoded.a(), Some(0x0A));
        assert_eq!(decoded.b(), Some(0x0B));
        assert_eq!(decoded.c(), Some(0x0C));
        assert_eq!(decoded.d(), Some(0x0D));
    }

    #[test]
    fn test_wrong_arbitration_id() {
        let frame = CanFrame::new(0x123, &[0x03, 0x41, 0x2F, 0x80]).unwrap();
        assert_eq!(
            decode_response(&frame, 0x2F),
            Err(ProtocolError::WrongArbitrationId(0x123))
        );
    }

    #[test]
    fn test_malformed_length() {
        // Length byte claims more bytes than the frame carries
        let short = response(&[0x05, 0x41, 0x2F, 0x80]);
        assert!(matches!(
            decode_response(&short, 0x2F),
            Err(ProtocolError::MalformedLength { length: 5, dlc: 4 })
        ));

        // ISO-TP first frame
        let first_frame = response(&[0x10, 0x14, 0x49, 0x02, 0x01, 0x31, 0x47, 0x31]);
        assert!(matches!(
            decode_response(&first_frame, 0x02),
            Err(ProtocolError::MalformedLength { .. })
        ));

        let empty = response(&[]);
        assert!(matches!(
            decode_response(&empty, 0x2F),
            Err(ProtocolError::MalformedLength { length: 0, dlc: 0 })
        ));
    }

    #[test]
    fn test_wrong_service() {
        let reply = response(&[0x03, 0x42, 0x2F, 0x80, 0x55, 0x55, 0x55, 0x55]);
        assert_eq!(
            decode_response(&reply, 0x2F),
            Err(ProtocolError::WrongService {
                expected: 0x41,
                actual: 0x42
            })
        );
    }

    #[test]
    fn test_negative_response() {
        let reply = response(&[0x03, 0x7F, 0x01, 0x12, 0x55, 0x55, 0x55, 0x55]);
        assert_eq!(
            decode_response(&reply, 0x2F),
            Err(ProtocolError::NegativeResponse {
                service: 0x01,
                code: 0x12
            })
        );
    }

    #[test]
    fn test_pid_mismatch() {
        let reply = response(&[0x04, 0x41, 0x1F, 0x00, 0x10, 0x55, 0x55, 0x55]);
        assert_eq!(
            decode_response(&reply, 0x2F),
            Err(ProtocolError::PidMismatch {
                expected: 0x2F,
                actual: 0x1F
            })
        );
    }
}
