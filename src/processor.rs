//! Processor Tasks - inbound frame and player event processing
//!
//! This module contains the async front end of the engine. The owning stack
//! feeds decoded AVCTP frames and local player events into static channels;
//! two processor loops drain them in order and drive the sessions of a
//! [`SessionSet`] under a mutex. Per-session ordering is preserved because
//! each channel is consumed by exactly one loop, and independent sessions
//! never share mutable state beyond the set itself.
//!
//! # Usage
//!
//! Run the processor as one Embassy task and feed it from the transport glue:
//!
//! ```rust,ignore
//! use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
//! use larkspur::processor::{self, InboundEvent, SessionSet};
//!
//! static SESSIONS: Mutex<CriticalSectionRawMutex, SessionSet<MyTransport, MyPlayer>> =
//!     Mutex::new(SessionSet::new());
//!
//! // In your Embassy spawner
//! spawner.spawn(avrcp_task(&SESSIONS)).unwrap();
//!
//! // From the AVCTP receive path
//! if let Some(event) = InboundEvent::control(handle, transaction, code, opcode, operands) {
//!     processor::submit_frame(event).await;
//! }
//!
//! // On disconnect
//! processor::submit_frame(InboundEvent::closed(handle)).await;
//! ```
//!
//! # Architecture
//!
//! * **Frame Processor**: drains inbound control and browsing frames and
//!   connection-closed markers
//! * **Player Event Processor**: drains local playback events and pushes
//!   changed notifications
//!
//! Both loops lock the set only for the duration of one frame or event, so
//! handler callbacks must not block.

use crate::AvrcpError;
use crate::constants::{EVENT_QUEUE_DEPTH, MAX_FRAME_SIZE, MAX_SESSIONS};
use crate::notification::PlayerEvent;
use crate::session::{AvctpTransport, Session};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use heapless::{FnvIndexMap, Vec};

/// One inbound AVCTP event, queued for the frame processor
///
/// Every variant names the connection handle of the session it belongs to;
/// handles are assigned by the owning stack when it inserts the session.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// Control channel frame: AV/C header fields plus operands
    Control {
        /// Connection handle of the target session
        handle: u16,
        /// AVCTP transaction label
        transaction: u8,
        /// Raw AV/C ctype byte
        code: u8,
        /// AV/C opcode
        opcode: u8,
        /// Operand bytes after the AV/C header
        operands: Vec<u8, MAX_FRAME_SIZE>,
    },
    /// Browsing channel frame, complete as received
    Browsing {
        /// Connection handle of the target session
        handle: u16,
        /// AVCTP transaction label
        transaction: u8,
        /// The raw browsing PDU
        frame: Vec<u8, MAX_FRAME_SIZE>,
    },
    /// The connection went away; shut the session down and drop it
    Closed {
        /// Connection handle of the dead session
        handle: u16,
    },
}

impl InboundEvent {
    /// Build a control frame entry, truncating nothing
    ///
    /// Returns `None` when the operands exceed the queue entry capacity;
    /// such a frame is oversized for the profile and dropped at the edge.
    #[must_use]
    pub fn control(
        handle: u16,
        transaction: u8,
        code: u8,
        opcode: u8,
        operands: &[u8],
    ) -> Option<Self> {
        let mut copy = Vec::new();
        copy.extend_from_slice(operands).ok()?;
        Some(Self::Control {
            handle,
            transaction,
            code,
            opcode,
            operands: copy,
        })
    }

    /// Build a browsing frame entry
    #[must_use]
    pub fn browsing(handle: u16, transaction: u8, frame: &[u8]) -> Option<Self> {
        let mut copy = Vec::new();
        copy.extend_from_slice(frame).ok()?;
        Some(Self::Browsing {
            handle,
            transaction,
            frame: copy,
        })
    }

    /// Build a connection-closed marker
    #[must_use]
    pub const fn closed(handle: u16) -> Self {
        Self::Closed { handle }
    }
}

/// Sessions of all connected peers, keyed by connection handle
///
/// The set itself does no connection management; the owning stack inserts a
/// session when a control channel comes up and submits
/// [`InboundEvent::Closed`] (or calls [`Self::remove`]) when it goes away.
pub struct SessionSet<T: AvctpTransport, C: 'static> {
    sessions: FnvIndexMap<u16, Session<T, C>, MAX_SESSIONS>,
}

impl<T: AvctpTransport, C: 'static> SessionSet<T, C> {
    /// Create an empty set
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sessions: FnvIndexMap::new(),
        }
    }

    /// Add a session for a newly connected peer
    ///
    /// # Errors
    /// Returns `AvrcpError::InvalidParameter` when the handle is already
    /// mapped and `AvrcpError::BufferOverflow` when the set is full
    pub fn insert(&mut self, handle: u16, session: Session<T, C>) -> Result<(), AvrcpError> {
        if self.sessions.contains_key(&handle) {
            return Err(AvrcpError::InvalidParameter);
        }
        self.sessions
            .insert(handle, session)
            .map(|_| ())
            .map_err(|_| AvrcpError::BufferOverflow)
    }

    /// The session for a connection handle
    #[must_use]
    pub fn get(&self, handle: u16) -> Option<&Session<T, C>> {
        self.sessions.get(&handle)
    }

    /// Mutable access to the session for a connection handle
    pub fn get_mut(&mut self, handle: u16) -> Option<&mut Session<T, C>> {
        self.sessions.get_mut(&handle)
    }

    /// Take a session out of the set
    ///
    /// The caller shuts the session down; removal itself fires no callbacks.
    pub fn remove(&mut self, handle: u16) -> Option<Session<T, C>> {
        self.sessions.remove(&handle)
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<T: AvctpTransport, C: 'static> Default for SessionSet<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) static FRAME_CHANNEL: Channel<CriticalSectionRawMutex, InboundEvent, EVENT_QUEUE_DEPTH> =
    Channel::new();

pub(crate) static PLAYER_EVENT_CHANNEL: Channel<
    CriticalSectionRawMutex,
    (u16, PlayerEvent),
    EVENT_QUEUE_DEPTH,
> = Channel::new();

/// Queue an inbound event, waiting for space
pub async fn submit_frame(event: InboundEvent) {
    FRAME_CHANNEL.sender().send(event).await;
}

/// Queue an inbound event without waiting
///
/// # Errors
/// Returns `AvrcpError::BufferOverflow` when the queue is full; the caller
/// applies transport-level flow control in that case
pub fn try_submit_frame(event: InboundEvent) -> Result<(), AvrcpError> {
    FRAME_CHANNEL
        .sender()
        .try_send(event)
        .map_err(|_| AvrcpError::BufferOverflow)
}

/// Queue a local player event for one session, waiting for space
pub async fn submit_player_event(handle: u16, event: PlayerEvent) {
    PLAYER_EVENT_CHANNEL.sender().send((handle, event)).await;
}

/// Queue a local player event without waiting
///
/// # Errors
/// Returns `AvrcpError::BufferOverflow` when the queue is full
pub fn try_submit_player_event(handle: u16, event: PlayerEvent) -> Result<(), AvrcpError> {
    PLAYER_EVENT_CHANNEL
        .sender()
        .try_send((handle, event))
        .map_err(|_| AvrcpError::BufferOverflow)
}

async fn frame_processor<T: AvctpTransport, C>(
    sessions: &Mutex<CriticalSectionRawMutex, SessionSet<T, C>>,
) -> ! {
    let receiver = FRAME_CHANNEL.receiver();

    loop {
        let event = receiver.receive().await;
        let mut set = sessions.lock().await;

        match &event {
            InboundEvent::Control {
                handle,
                transaction,
                code,
                opcode,
                operands,
            } => {
                let Some(session) = set.get_mut(*handle) else {
                    defmt::warn!("[PROCESSOR] frame for unknown handle {=u16}", *handle);
                    continue;
                };
                if let Err(e) = session.receive_control(*transaction, *code, *opcode, operands) {
                    defmt::warn!("[PROCESSOR] control frame error: {}", e);
                }
            }
            InboundEvent::Browsing {
                handle,
                transaction,
                frame,
            } => {
                let Some(session) = set.get_mut(*handle) else {
                    defmt::warn!("[PROCESSOR] frame for unknown handle {=u16}", *handle);
                    continue;
                };
                if let Err(e) = session.receive_browsing(*transaction, frame) {
                    defmt::warn!("[PROCESSOR] browsing frame error: {}", e);
                }
            }
            InboundEvent::Closed { handle } => {
                if let Some(mut session) = set.remove(*handle) {
                    session.shutdown();
                    defmt::debug!("[PROCESSOR] session {=u16} removed", *handle);
                }
            }
        }
    }
}

async fn player_event_processor<T: AvctpTransport, C>(
    sessions: &Mutex<CriticalSectionRawMutex, SessionSet<T, C>>,
) -> ! {
    let receiver = PLAYER_EVENT_CHANNEL.receiver();

    loop {
        let (handle, event) = receiver.receive().await;
        let mut set = sessions.lock().await;
        let Some(session) = set.get_mut(handle) else {
            defmt::warn!("[PROCESSOR] player event for unknown handle {=u16}", handle);
            continue;
        };

        if let Err(e) = session.player_event(&event) {
            defmt::warn!("[PROCESSOR] player event error: {}", e);
        }
    }
}

/// Run the engine's processor loops over a shared session set
pub async fn run<T: AvctpTransport, C>(
    sessions: &Mutex<CriticalSectionRawMutex, SessionSet<T, C>>,
) {
    embassy_futures::select::select(
        frame_processor(sessions),
        player_event_processor(sessions),
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullTransport;

    impl AvctpTransport for NullTransport {
        fn send_control(
            &mut self,
            _transaction: u8,
            _code: crate::pdu::CommandCode,
            _opcode: u8,
            _operands: &[u8],
        ) -> Result<(), AvrcpError> {
            Ok(())
        }
    }

    // The channels are global, so queue behavior is covered by one test to
    // keep orderings deterministic under the parallel test runner.
    #[test]
    fn test_frame_queue_roundtrip_and_backpressure() {
        let event = InboundEvent::control(0x0040, 1, 0x00, 0x7C, &[0x44, 0x00]).unwrap();
        for _ in 0..EVENT_QUEUE_DEPTH {
            try_submit_frame(event.clone()).unwrap();
        }
        assert!(matches!(
            try_submit_frame(event.clone()),
            Err(AvrcpError::BufferOverflow)
        ));

        for _ in 0..EVENT_QUEUE_DEPTH {
            let queued = FRAME_CHANNEL.try_receive().unwrap();
            match queued {
                InboundEvent::Control {
                    handle,
                    transaction,
                    opcode,
                    ..
                } => {
                    assert_eq!(handle, 0x0040);
                    assert_eq!(transaction, 1);
                    assert_eq!(opcode, 0x7C);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert!(FRAME_CHANNEL.try_receive().is_err());
    }

    #[test]
    fn test_oversized_operands_rejected_at_the_edge() {
        let oversized = [0u8; MAX_FRAME_SIZE + 1];
        assert!(InboundEvent::control(0, 0, 0x00, 0x00, &oversized).is_none());
        assert!(InboundEvent::browsing(0, 0, &oversized).is_none());
    }

    #[test]
    fn test_session_set_capacity_and_handles() {
        let mut set: SessionSet<NullTransport, ()> = SessionSet::new();
        assert!(set.is_empty());

        for handle in 0..MAX_SESSIONS as u16 {
            set.insert(handle, Session::new(NullTransport, 335, 335, 0x0104, ()))
                .unwrap();
        }
        assert_eq!(set.len(), MAX_SESSIONS);

        // Duplicate handle and full set are both refused
        assert!(matches!(
            set.insert(0, Session::new(NullTransport, 335, 335, 0x0104, ())),
            Err(AvrcpError::InvalidParameter)
        ));
        assert!(matches!(
            set.insert(99, Session::new(NullTransport, 335, 335, 0x0104, ())),
            Err(AvrcpError::BufferOverflow)
        ));

        let mut removed = set.remove(2).unwrap();
        removed.shutdown();
        assert_eq!(set.len(), MAX_SESSIONS - 1);
        assert!(set.get(2).is_none());
        assert!(set.get_mut(1).is_some());
    }
}
