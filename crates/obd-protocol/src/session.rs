//! OBD-II Session
//!
//! Owns the bus connection and runs one request/response cycle at a time.
//! OBD-II functional addressing allows a single outstanding request, so
//! queries are strictly sequential.

use crate::error::{ObdError, ProtocolError, TransportError};
use crate::frame::{decode_response, encode_request, ObdResponse, PidRequest};
use crate::pid::{Pid, Reading};
use crate::protocol::Addressing;
use crate::transport::CanBus;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Default time to wait for a response
const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Upper bound on frames discarded before a request on a busy bus
const MAX_STALE_FRAMES: usize = 64;

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Per-query response timeout in milliseconds
    pub timeout_ms: u64,
    /// Request addressing
    pub addressing: Addressing,
    /// Time to drain the bus between survey queries (0 disables)
    pub settle_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            addressing: Addressing::Functional,
            settle_ms: 0,
        }
    }
}

impl SessionConfig {
    /// Per-query response timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Progress of the current query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    /// No request outstanding
    Idle,
    /// Request sent, waiting for the matching response
    AwaitingResponse,
    /// Last query produced a value
    Decoded,
    /// Last query failed
    Failed,
}

/// Result of querying one PID during a survey
#[derive(Debug)]
pub struct PidOutcome {
    /// The queried PID
    pub pid: Pid,
    /// Decoded value or the reason there is none
    pub result: Result<Reading, ObdError>,
}

/// Results of querying every supported PID
#[derive(Debug, Default)]
pub struct Survey {
    outcomes: Vec<PidOutcome>,
}

impl Survey {
    /// Outcomes in query order
    pub fn outcomes(&self) -> &[PidOutcome] {
        &self.outcomes
    }

    /// Outcome for one PID
    pub fn get(&self, pid: Pid) -> Option<&PidOutcome> {
        self.outcomes.iter().find(|outcome| outcome.pid == pid)
    }

    /// Number of PIDs that produced a value
    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .count()
    }
}

/// A diagnostic session over an exclusively owned bus connection.
///
/// The bus is released when the session is closed or dropped.
pub struct Session<B: CanBus> {
    bus: B,
    config: SessionConfig,
    state: QueryState,
}

impl<B: CanBus> Session<B> {
    /// Start a session on `bus`
    pub fn new(bus: B, config: SessionConfig) -> Self {
        info!(
            request_id = format!("0x{:03X}", config.addressing.request_id()),
            timeout_ms = config.timeout_ms,
            "Starting OBD session"
        );
        Self {
            bus,
            config,
            state: QueryState::Idle,
        }
    }

    /// State of the most recent query
    pub fn state(&self) -> QueryState {
        self.state
    }

    /// The underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Query a supported PID and decode its value
    pub fn query(&mut self, pid: Pid) -> Result<Reading, ObdError> {
        let response = self.query_raw(pid.into())?;

        match Reading::decode(pid, response.payload()) {
            Ok(reading) => {
                debug!("PID {:02X} decoded: {}", pid.as_hex(), reading);
                Ok(reading)
            }
            Err(e) => {
                self.state = QueryState::Failed;
                Err(e.into())
            }
        }
    }

    /// Send a request and wait for the validated response
    pub fn query_raw(&mut self, request: PidRequest) -> Result<ObdResponse, ObdError> {
        self.state = QueryState::Idle;
        let frame = encode_request(request, self.config.addressing);
        debug!("Querying PID {:02X}: {}", request.pid(), frame);

        // Answers left over from an earlier query must not match this one
        if let Err(e) = self.discard_stale() {
            self.state = QueryState::Failed;
            return Err(e.into());
        }
        if let Err(e) = self.bus.send(&frame) {
            self.state = QueryState::Failed;
            return Err(e.into());
        }
        self.state = QueryState::AwaitingResponse;

        let result = self.await_response(request.pid());
        self.state = match result {
            Ok(_) => QueryState::Decoded,
            Err(_) => QueryState::Failed,
        };
        result
    }

    fn await_response(&mut self, pid: u8) -> Result<ObdResponse, ObdError> {
        let deadline = Instant::now() + self.config.timeout();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ObdError::Timeout(self.config.timeout_ms));
            }

            let Some(frame) = self.bus.receive(remaining)? else {
                return Err(ObdError::Timeout(self.config.timeout_ms));
            };

            if !self.config.addressing.accepts(frame.id()) {
                trace!("Skipping unrelated frame {}", frame);
                continue;
            }

            match decode_response(&frame, pid) {
                Ok(response) => return Ok(response),
                Err(ProtocolError::PidMismatch { actual, .. }) => {
                    debug!("Skipping late response for PID {:02X}: {}", actual, frame);
                }
                Err(e) => {
                    warn!("Rejecting response to PID {:02X}: {} ({})", pid, e, frame);
                    return Err(e.into());
                }
            }
        }
    }

    fn discard_stale(&mut self) -> Result<usize, TransportError> {
        let mut discarded = 0;
        while discarded < MAX_STALE_FRAMES {
            match self.bus.receive(Duration::ZERO)? {
                Some(frame) => {
                    trace!("Discarding stale {}", frame);
                    discarded += 1;
                }
                None => break,
            }
        }
        if discarded > 0 {
            debug!("Discarded {} stale frames before request", discarded);
        }
        Ok(discarded)
    }

    /// Discard every frame received within `duration`; returns how many were dropped
    pub fn settle(&mut self, duration: Duration) -> Result<usize, TransportError> {
        let deadline = Instant::now() + duration;
        let mut discarded = 0;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.bus.receive(remaining)? {
                Some(frame) => {
                    trace!("Discarding {}", frame);
                    discarded += 1;
                }
                None => break,
            }
        }

        if discarded > 0 {
            debug!("Discarded {} stale frames", discarded);
        }
        Ok(discarded)
    }

    /// Query every supported PID in order.
    ///
    /// Per-PID failures are recorded in the survey; only a transport
    /// failure aborts it.
    pub fn survey(&mut self) -> Result<Survey, TransportError> {
        let mut survey = Survey::default();
        let settle = Duration::from_millis(self.config.settle_ms);

        for (index, pid) in Pid::ALL.into_iter().enumerate() {
            if index > 0 && !settle.is_zero() {
                self.settle(settle)?;
            }

            match self.query(pid) {
                Err(ObdError::Transport(e)) => {
                    error!("Transport failure while querying {}: {}", pid, e);
                    return Err(e);
                }
                result => {
                    if let Err(ref e) = result {
                        warn!("Unable to read {}: {}", pid, e);
                    }
                    survey.outcomes.push(PidOutcome { pid, result });
                }
            }
        }

        info!(
            "Survey complete: {}/{} PIDs read",
            survey.success_count(),
            survey.outcomes.len()
        );
        Ok(survey)
    }

    /// End the session and release the bus
    pub fn close(self) {
        info!("Closing OBD session");
    }
}
