//! Simulated ECU
//!
//! Answers service 01 requests from a fixed table without any hardware.
//! Used by the `virtual` adapter and by tests.

use crate::error::TransportError;
use crate::frame::{CanFrame, MAX_DATA_LEN};
use crate::mode;
use crate::pid::Pid;
use crate::protocol::{
    Addressing, POSITIVE_RESPONSE_OFFSET, RESPONSE_ID_FIRST, RESPONSE_ID_OFFSET,
};
use crate::transport::CanBus;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// In-process bus with simulated ECUs answering on 0x7E8..=0x7EF
#[derive(Debug, Default)]
pub struct SimulatedBus {
    /// (response ID, PID, data bytes), answered in insertion order
    responses: Vec<(u32, u8, Vec<u8>)>,
    /// Frames waiting to be received
    inbox: VecDeque<CanFrame>,
    /// Frames delivered together with the answers to the next request
    in_flight: Vec<CanFrame>,
    /// Every frame the session sent
    sent: Vec<CanFrame>,
    /// Reject all sends
    fail_sends: bool,
}

impl SimulatedBus {
    /// A bus with no ECU answering
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus whose ECU answers the three supported PIDs
    pub fn with_vehicle() -> Self {
        Self::new()
            // OBD-II as defined by the CARB
            .respond_to(Pid::ObdStandard.as_hex(), &[0x01])
            // 0x80 -> 50.2%
            .respond_to(Pid::FuelTankLevel.as_hex(), &[0x80])
            // 0x012C -> 300 s
            .respond_to(Pid::RunTimeSinceStart.as_hex(), &[0x01, 0x2C])
    }

    /// Let the first ECU (0x7E8) answer requests for `pid` with `data`
    pub fn respond_to(self, pid: u8, data: &[u8]) -> Self {
        self.respond_as(RESPONSE_ID_FIRST, pid, data)
    }

    /// Let the ECU responding on `response_id` answer requests for `pid`
    /// with `data` (at most four bytes)
    pub fn respond_as(mut self, response_id: u32, pid: u8, data: &[u8]) -> Self {
        let data: Vec<u8> = data.iter().copied().take(4).collect();
        match self
            .responses
            .iter_mut()
            .find(|(id, p, _)| *id == response_id && *p == pid)
        {
            Some(entry) => entry.2 = data,
            None => self.responses.push((response_id, pid, data)),
        }
        self
    }

    /// Make every send fail, as an unplugged adapter would
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    /// Queue a frame that is already on the bus
    pub fn push_frame(&mut self, frame: CanFrame) {
        self.inbox.push_back(frame);
    }

    /// Queue a frame that shows up right after the next request, ahead of
    /// the ECU answers
    pub fn push_on_send(&mut self, frame: CanFrame) {
        self.in_flight.push(frame);
    }

    /// Frames written to the bus so far
    pub fn sent(&self) -> &[CanFrame] {
        &self.sent
    }

    fn answers(&self, request: &CanFrame) -> Vec<CanFrame> {
        let data = request.data();
        if data.len() < 3 || data[1] != mode::CURRENT_DATA {
            return Vec::new();
        }
        let pid = data[2];
        let functional = request.id() == Addressing::Functional.request_id();

        self.responses
            .iter()
            .filter(|(id, p, _)| {
                *p == pid && (functional || *id == request.id() + RESPONSE_ID_OFFSET)
            })
            .filter_map(|(id, _, values)| {
                let mut payload = Vec::with_capacity(MAX_DATA_LEN);
                payload.push(values.len() as u8 + 2);
                payload.push(mode::CURRENT_DATA + POSITIVE_RESPONSE_OFFSET);
                payload.push(pid);
                payload.extend_from_slice(values);
                payload.resize(MAX_DATA_LEN, 0x00);
                CanFrame::new(*id, &payload).ok()
            })
            .collect()
    }
}

impl CanBus for SimulatedBus {
    fn send(&mut self, frame: &CanFrame) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Send("simulated adapter failure".to_string()));
        }

        self.sent.push(*frame);
        self.inbox.extend(self.in_flight.drain(..));

        let replies = self.answers(frame);
        if replies.is_empty() {
            debug!("Simulated ECUs ignore {}", frame);
        }
        for reply in replies {
            debug!("Simulated ECU replies {}", reply);
            self.inbox.push_back(reply);
        }
        Ok(())
    }

    fn receive(&mut self, _timeout: Duration) -> Result<Option<CanFrame>, TransportError> {
        Ok(self.inbox.pop_front())
    }
}
