//! Continuing Response Fragmentation
//!
//! When a response payload exceeds the negotiated outbound budget, AVRCP
//! sends it across multiple PDUs tagged start/continue/end. The peer pulls
//! every fragment after the first with a Request Continuing Response command
//! and may abandon the sequence with Abort Continuing Response at any point.
//!
//! [`ContinuingResponse`] is the outbound side: one buffered payload and a
//! cursor, at most one sequence in flight per session. [`Reassembly`] is the
//! inbound side used by the controller role to stitch fragmented responses
//! back together before completing the original transaction.

use crate::AvrcpError;
use crate::constants::{MAX_CONTINUING_RESPONSE, MAX_REASSEMBLY_SIZE};
use crate::pdu::{CommandCode, PacketType};
use heapless::Vec;

/// Outbound fragmentation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum ContinuingState {
    /// No fragmented exchange outstanding
    Idle,
    /// A buffered payload is being drained fragment by fragment
    Sending,
}

/// Buffered response payload being emitted as a continuing sequence
#[derive(Debug)]
pub struct ContinuingResponse {
    buffer: Vec<u8, MAX_CONTINUING_RESPONSE>,
    cursor: usize,
    pdu_id: u8,
    code: CommandCode,
    state: ContinuingState,
}

impl ContinuingResponse {
    /// Create an idle manager
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
            pdu_id: 0,
            code: CommandCode::Stable,
            state: ContinuingState::Idle,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ContinuingState {
        self.state
    }

    /// PDU id of the buffered sequence (meaningful while `Sending`)
    #[must_use]
    pub const fn pdu_id(&self) -> u8 {
        self.pdu_id
    }

    /// Response code the fragments are sent with
    #[must_use]
    pub const fn code(&self) -> CommandCode {
        self.code
    }

    /// Buffer a payload and arm the sequence
    ///
    /// The caller sends the first fragment immediately afterwards via
    /// [`Self::next_fragment`]; the peer drives the rest.
    ///
    /// # Errors
    /// Returns `AvrcpError::AlreadyInProgress` if a sequence is outstanding
    /// (a caller programming error, fatal to this request only) and
    /// `AvrcpError::PayloadTooLarge` if the payload exceeds the buffer.
    pub fn begin(
        &mut self,
        pdu_id: u8,
        code: CommandCode,
        payload: &[u8],
    ) -> Result<(), AvrcpError> {
        if self.state == ContinuingState::Sending {
            return Err(AvrcpError::AlreadyInProgress);
        }

        self.buffer.clear();
        self.buffer
            .extend_from_slice(payload)
            .map_err(|()| AvrcpError::PayloadTooLarge)?;
        self.cursor = 0;
        self.pdu_id = pdu_id;
        self.code = code;
        self.state = ContinuingState::Sending;
        Ok(())
    }

    /// Advance the cursor and hand out the next fragment
    ///
    /// The first call yields a `Start` fragment, middle calls `Continue`,
    /// and the call draining the buffer yields `End` and returns the manager
    /// to idle.
    ///
    /// # Errors
    /// Returns `AvrcpError::InvalidContinuation` when no sequence is in
    /// progress or `pdu_id` does not match the buffered one; the session
    /// answers the peer with an invalid-parameter rejection in that case.
    pub fn next_fragment(
        &mut self,
        pdu_id: u8,
        budget: usize,
    ) -> Result<(PacketType, &[u8]), AvrcpError> {
        if self.state != ContinuingState::Sending || pdu_id != self.pdu_id || budget == 0 {
            return Err(AvrcpError::InvalidContinuation);
        }

        let remaining = self.buffer.len() - self.cursor;
        let take = remaining.min(budget);
        let packet_type = if self.cursor == 0 {
            PacketType::Start
        } else if take == remaining {
            PacketType::End
        } else {
            PacketType::Continue
        };

        let start = self.cursor;
        self.cursor += take;
        if self.cursor == self.buffer.len() {
            self.state = ContinuingState::Idle;
        }

        Ok((packet_type, &self.buffer[start..start + take]))
    }

    /// Abort the sequence on the peer's request, discarding the remainder
    ///
    /// # Errors
    /// Returns `AvrcpError::InvalidContinuation` when idle or when `pdu_id`
    /// does not match the buffered sequence
    pub fn abort(&mut self, pdu_id: u8) -> Result<(), AvrcpError> {
        if self.state != ContinuingState::Sending || pdu_id != self.pdu_id {
            return Err(AvrcpError::InvalidContinuation);
        }

        self.reset();
        Ok(())
    }

    /// Discard any buffered payload unconditionally (session teardown)
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.state = ContinuingState::Idle;
    }
}

impl Default for ContinuingResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Inbound fragment collector for the controller role
///
/// Start and continue fragments are appended as they arrive; the end
/// fragment completes the payload, which is then delivered to the original
/// response callback as if it had arrived whole.
#[derive(Debug)]
pub struct Reassembly {
    buffer: Vec<u8, MAX_REASSEMBLY_SIZE>,
    pdu_id: u8,
    active: bool,
}

impl Reassembly {
    /// Create an empty collector
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            pdu_id: 0,
            active: false,
        }
    }

    /// Whether a fragmented response is being collected
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Begin collecting from a start fragment
    ///
    /// # Errors
    /// Returns `AvrcpError::AlreadyInProgress` if a collection is active,
    /// `AvrcpError::BufferOverflow` if the fragment exceeds capacity
    pub fn start(&mut self, pdu_id: u8, params: &[u8]) -> Result<(), AvrcpError> {
        if self.active {
            return Err(AvrcpError::AlreadyInProgress);
        }

        self.buffer.clear();
        self.buffer
            .extend_from_slice(params)
            .map_err(|()| AvrcpError::BufferOverflow)?;
        self.pdu_id = pdu_id;
        self.active = true;
        Ok(())
    }

    /// Append a continue fragment
    ///
    /// # Errors
    /// Returns `AvrcpError::InvalidContinuation` for a fragment of a
    /// different PDU or without a preceding start fragment,
    /// `AvrcpError::BufferOverflow` past capacity
    pub fn append(&mut self, pdu_id: u8, params: &[u8]) -> Result<(), AvrcpError> {
        if !self.active || pdu_id != self.pdu_id {
            return Err(AvrcpError::InvalidContinuation);
        }

        self.buffer
            .extend_from_slice(params)
            .map_err(|()| AvrcpError::BufferOverflow)
    }

    /// Append the end fragment and return the complete payload
    ///
    /// A failed finish drops the partial payload; the sequence cannot be
    /// recovered once its end fragment was mismatched.
    ///
    /// # Errors
    /// Same conditions as [`Self::append`]
    pub fn finish(&mut self, pdu_id: u8, params: &[u8]) -> Result<&[u8], AvrcpError> {
        if let Err(e) = self.append(pdu_id, params) {
            self.clear();
            return Err(e);
        }
        self.active = false;
        Ok(&self.buffer)
    }

    /// Drop any partial payload
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.active = false;
    }
}

impl Default for Reassembly {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::AVRCP_GET_ELEMENT_ATTRIBUTES;

    const BUDGET: usize = 64;

    fn payload(len: usize) -> Vec<u8, MAX_CONTINUING_RESPONSE> {
        #[allow(clippy::cast_possible_truncation)]
        (0..len).map(|i| i as u8).collect()
    }

    #[test]
    fn test_three_fragments_concatenate_to_payload() {
        let mut continuing = ContinuingResponse::new();
        let data = payload(3 * BUDGET - 5);
        continuing
            .begin(AVRCP_GET_ELEMENT_ATTRIBUTES, CommandCode::Stable, &data)
            .unwrap();

        let mut collected: Vec<u8, MAX_CONTINUING_RESPONSE> = Vec::new();
        let mut types = [PacketType::Single; 3];
        for slot in &mut types {
            let (packet_type, fragment) = continuing
                .next_fragment(AVRCP_GET_ELEMENT_ATTRIBUTES, BUDGET)
                .unwrap();
            *slot = packet_type;
            collected.extend_from_slice(fragment).unwrap();
        }

        assert_eq!(
            types,
            [PacketType::Start, PacketType::Continue, PacketType::End]
        );
        assert_eq!(collected, data);
        assert_eq!(continuing.state(), ContinuingState::Idle);
    }

    #[test]
    fn test_abort_mid_sequence_returns_to_idle() {
        let mut continuing = ContinuingResponse::new();
        let data = payload(3 * BUDGET);
        continuing
            .begin(AVRCP_GET_ELEMENT_ATTRIBUTES, CommandCode::Stable, &data)
            .unwrap();
        continuing
            .next_fragment(AVRCP_GET_ELEMENT_ATTRIBUTES, BUDGET)
            .unwrap();

        continuing.abort(AVRCP_GET_ELEMENT_ATTRIBUTES).unwrap();
        assert_eq!(continuing.state(), ContinuingState::Idle);
        assert_eq!(
            continuing.next_fragment(AVRCP_GET_ELEMENT_ATTRIBUTES, BUDGET),
            Err(AvrcpError::InvalidContinuation)
        );
    }

    #[test]
    fn test_mismatched_pdu_id_is_invalid_continuation() {
        let mut continuing = ContinuingResponse::new();
        continuing
            .begin(AVRCP_GET_ELEMENT_ATTRIBUTES, CommandCode::Stable, &payload(200))
            .unwrap();

        assert_eq!(
            continuing.next_fragment(0x10, BUDGET),
            Err(AvrcpError::InvalidContinuation)
        );
        assert_eq!(continuing.abort(0x10), Err(AvrcpError::InvalidContinuation));
        // The buffered sequence is unaffected
        assert_eq!(continuing.state(), ContinuingState::Sending);
    }

    #[test]
    fn test_continuation_without_sequence_is_invalid() {
        let mut continuing = ContinuingResponse::new();
        assert_eq!(
            continuing.next_fragment(AVRCP_GET_ELEMENT_ATTRIBUTES, BUDGET),
            Err(AvrcpError::InvalidContinuation)
        );
        assert_eq!(
            continuing.abort(AVRCP_GET_ELEMENT_ATTRIBUTES),
            Err(AvrcpError::InvalidContinuation)
        );
    }

    #[test]
    fn test_second_begin_while_sending_is_a_caller_error() {
        let mut continuing = ContinuingResponse::new();
        continuing
            .begin(AVRCP_GET_ELEMENT_ATTRIBUTES, CommandCode::Stable, &payload(200))
            .unwrap();

        assert_eq!(
            continuing.begin(0x10, CommandCode::Stable, &payload(200)),
            Err(AvrcpError::AlreadyInProgress)
        );
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut continuing = ContinuingResponse::new();
        let data = [0u8; MAX_CONTINUING_RESPONSE];
        continuing
            .begin(AVRCP_GET_ELEMENT_ATTRIBUTES, CommandCode::Stable, &data)
            .unwrap();
        continuing.reset();

        let mut big: Vec<u8, 2048> = Vec::new();
        big.resize(MAX_CONTINUING_RESPONSE + 1, 0).unwrap();
        assert_eq!(
            continuing.begin(AVRCP_GET_ELEMENT_ATTRIBUTES, CommandCode::Stable, &big),
            Err(AvrcpError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_reassembly_roundtrip() {
        let mut reassembly = Reassembly::new();
        reassembly
            .start(AVRCP_GET_ELEMENT_ATTRIBUTES, &[1, 2, 3])
            .unwrap();
        reassembly
            .append(AVRCP_GET_ELEMENT_ATTRIBUTES, &[4, 5])
            .unwrap();
        let full = reassembly
            .finish(AVRCP_GET_ELEMENT_ATTRIBUTES, &[6])
            .unwrap();

        assert_eq!(full, &[1, 2, 3, 4, 5, 6]);
        assert!(!reassembly.is_active());
    }

    #[test]
    fn test_reassembly_rejects_foreign_fragment() {
        let mut reassembly = Reassembly::new();
        reassembly
            .start(AVRCP_GET_ELEMENT_ATTRIBUTES, &[1, 2, 3])
            .unwrap();

        assert_eq!(
            reassembly.append(0x10, &[4]),
            Err(AvrcpError::InvalidContinuation)
        );
        // A mismatched end fragment discards the partial payload
        assert_eq!(
            reassembly.finish(0x10, &[4]),
            Err(AvrcpError::InvalidContinuation)
        );
        assert!(!reassembly.is_active());
    }

    #[test]
    fn test_reassembly_requires_start() {
        let mut reassembly = Reassembly::new();
        assert_eq!(
            reassembly.append(AVRCP_GET_ELEMENT_ATTRIBUTES, &[1]),
            Err(AvrcpError::InvalidContinuation)
        );
    }
}
