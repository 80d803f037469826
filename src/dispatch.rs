//! Command Dispatch Tables
//!
//! This module implements the capability-driven dispatch of inbound commands:
//! vendor-dependent control PDUs are matched on (PDU id, command code) and
//! pass-through button commands on the physical operation id alone. Handlers
//! are installed as whole tables with an opaque user context; the dispatcher
//! frames and routes but never inspects payload semantics.

use crate::constants::MAX_CONTROL_RESPONSE;
use crate::pdu::{CommandCode, Status};
use heapless::Vec;

/// Verdict returned by a control handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// Success payload, sent with the registration's declared response code
    Respond(Vec<u8, MAX_CONTROL_RESPONSE>),
    /// Protocol-defined rejection forwarded to the peer
    Reject(Status),
    /// The collaborator answers later through a response-send primitive
    Deferred,
}

/// Control handler callback
///
/// Receives the transaction label, the PDU parameter bytes, and the shared
/// user context. Must not block; long-running work is answered later via
/// the session's response primitives after returning [`ControlOutcome::Deferred`].
pub type ControlHandlerFn<C> = fn(transaction: u8, params: &[u8], ctx: &mut C) -> ControlOutcome;

/// One control handler registration
#[derive(Debug)]
pub struct ControlHandler<C> {
    /// PDU id the handler answers
    pub pdu_id: u8,
    /// Command code the handler expects
    pub code: CommandCode,
    /// Response code used for success payloads
    pub response: CommandCode,
    /// Handler callback
    pub func: ControlHandlerFn<C>,
}

/// Result of dispatching a control command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlVerdict {
    /// Send a response with this code and payload
    Response(CommandCode, Vec<u8, MAX_CONTROL_RESPONSE>),
    /// Send a rejection carrying this status on the same transaction label
    Rejected(Status),
    /// No response now; the collaborator answers asynchronously
    Deferred,
}

/// Lookup table for vendor-dependent control commands
#[derive(Debug)]
pub struct ControlDispatch<C: 'static> {
    handlers: &'static [ControlHandler<C>],
}

impl<C> ControlDispatch<C> {
    /// Create an empty table
    #[must_use]
    pub const fn new() -> Self {
        Self { handlers: &[] }
    }

    /// Replace the active handler set
    pub fn register(&mut self, handlers: &'static [ControlHandler<C>]) {
        self.handlers = handlers;
    }

    /// Find the registration matching a PDU id and command code
    #[must_use]
    pub fn lookup(&self, pdu_id: u8, code: CommandCode) -> Option<&ControlHandler<C>> {
        self.handlers
            .iter()
            .find(|h| h.pdu_id == pdu_id && h.code == code)
    }

    /// Dispatch an inbound control command
    ///
    /// Commands and responses share the PDU id space, so the lookup matches
    /// on the command code as well; a miss is answered with an
    /// invalid-command rejection, never dropped.
    pub fn dispatch(
        &self,
        transaction: u8,
        pdu_id: u8,
        code: CommandCode,
        params: &[u8],
        ctx: &mut C,
    ) -> ControlVerdict {
        let Some(handler) = self.lookup(pdu_id, code) else {
            return ControlVerdict::Rejected(Status::InvalidCommand);
        };

        match (handler.func)(transaction, params, ctx) {
            ControlOutcome::Respond(payload) => ControlVerdict::Response(handler.response, payload),
            ControlOutcome::Reject(status) => ControlVerdict::Rejected(status),
            ControlOutcome::Deferred => ControlVerdict::Deferred,
        }
    }
}

impl<C> Default for ControlDispatch<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pass-through handler callback, invoked once per press and once per release
pub type PassthroughHandlerFn<C> = fn(pressed: bool, ctx: &mut C) -> bool;

/// One pass-through handler registration
#[derive(Debug)]
pub struct PassthroughHandler<C> {
    /// Physical operation id (7 bits)
    pub op: u8,
    /// Handler callback; returns whether the operation was accepted
    pub func: PassthroughHandlerFn<C>,
}

/// Lookup table for pass-through (button) commands
#[derive(Debug)]
pub struct PassthroughDispatch<C: 'static> {
    handlers: &'static [PassthroughHandler<C>],
}

impl<C> PassthroughDispatch<C> {
    /// Create an empty table
    #[must_use]
    pub const fn new() -> Self {
        Self { handlers: &[] }
    }

    /// Replace the active handler set
    pub fn register(&mut self, handlers: &'static [PassthroughHandler<C>]) {
        self.handlers = handlers;
    }

    /// Dispatch a press or release transition
    ///
    /// Returns whether the operation was accepted. A missing handler counts
    /// as not accepted; the session still acknowledges the command either
    /// way since pass-through never goes unanswered.
    pub fn dispatch(&self, op: u8, pressed: bool, ctx: &mut C) -> bool {
        self.handlers
            .iter()
            .find(|h| h.op == op)
            .is_some_and(|h| (h.func)(pressed, ctx))
    }
}

impl<C> Default for PassthroughDispatch<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{AVRCP_REGISTER_NOTIFICATION, PASSTHROUGH_PLAY};

    #[derive(Default)]
    struct Counters {
        control_calls: usize,
        last_params: Vec<u8, 16>,
        presses: usize,
        releases: usize,
    }

    fn notification_handler(_transaction: u8, params: &[u8], ctx: &mut Counters) -> ControlOutcome {
        ctx.control_calls += 1;
        ctx.last_params.clear();
        ctx.last_params.extend_from_slice(params).unwrap();
        let mut rsp = Vec::new();
        rsp.push(params[0]).unwrap();
        ControlOutcome::Respond(rsp)
    }

    fn rejecting_handler(_transaction: u8, _params: &[u8], _ctx: &mut Counters) -> ControlOutcome {
        ControlOutcome::Reject(Status::InvalidPlayerId)
    }

    fn play_handler(pressed: bool, ctx: &mut Counters) -> bool {
        if pressed {
            ctx.presses += 1;
        } else {
            ctx.releases += 1;
        }
        true
    }

    const CONTROL_TABLE: &[ControlHandler<Counters>] = &[
        ControlHandler {
            pdu_id: AVRCP_REGISTER_NOTIFICATION,
            code: CommandCode::Notify,
            response: CommandCode::Interim,
            func: notification_handler,
        },
        ControlHandler {
            pdu_id: 0x74,
            code: CommandCode::Control,
            response: CommandCode::Accepted,
            func: rejecting_handler,
        },
    ];

    #[test]
    fn test_registered_handler_invoked_once_with_params() {
        let mut dispatch: ControlDispatch<Counters> = ControlDispatch::new();
        dispatch.register(CONTROL_TABLE);
        let mut ctx = Counters::default();

        let params = [0x0D, 0x00, 0x00, 0x00, 0x00];
        let verdict = dispatch.dispatch(
            3,
            AVRCP_REGISTER_NOTIFICATION,
            CommandCode::Notify,
            &params,
            &mut ctx,
        );

        assert_eq!(ctx.control_calls, 1);
        assert_eq!(ctx.last_params, params);
        match verdict {
            ControlVerdict::Response(code, payload) => {
                assert_eq!(code, CommandCode::Interim);
                assert_eq!(payload.as_slice(), &[0x0D]);
            }
            other => panic!("unexpected verdict {other:?}"),
        }
    }

    #[test]
    fn test_unregistered_pdu_id_yields_invalid_command() {
        let mut dispatch: ControlDispatch<Counters> = ControlDispatch::new();
        dispatch.register(CONTROL_TABLE);
        let mut ctx = Counters::default();

        let verdict = dispatch.dispatch(0, 0x99, CommandCode::Control, &[], &mut ctx);
        assert_eq!(verdict, ControlVerdict::Rejected(Status::InvalidCommand));
        assert_eq!(ctx.control_calls, 0);
    }

    #[test]
    fn test_code_mismatch_yields_invalid_command() {
        let mut dispatch: ControlDispatch<Counters> = ControlDispatch::new();
        dispatch.register(CONTROL_TABLE);
        let mut ctx = Counters::default();

        // Registered as Notify; a Status command with the same id must miss
        let verdict = dispatch.dispatch(
            0,
            AVRCP_REGISTER_NOTIFICATION,
            CommandCode::Status,
            &[0x0D],
            &mut ctx,
        );
        assert_eq!(verdict, ControlVerdict::Rejected(Status::InvalidCommand));
    }

    #[test]
    fn test_handler_rejection_is_forwarded() {
        let mut dispatch: ControlDispatch<Counters> = ControlDispatch::new();
        dispatch.register(CONTROL_TABLE);
        let mut ctx = Counters::default();

        let verdict = dispatch.dispatch(0, 0x74, CommandCode::Control, &[], &mut ctx);
        assert_eq!(verdict, ControlVerdict::Rejected(Status::InvalidPlayerId));
    }

    #[test]
    fn test_passthrough_press_and_release() {
        const TABLE: &[PassthroughHandler<Counters>] = &[PassthroughHandler {
            op: PASSTHROUGH_PLAY,
            func: play_handler,
        }];
        let mut dispatch: PassthroughDispatch<Counters> = PassthroughDispatch::new();
        dispatch.register(TABLE);
        let mut ctx = Counters::default();

        assert!(dispatch.dispatch(PASSTHROUGH_PLAY, true, &mut ctx));
        assert!(dispatch.dispatch(PASSTHROUGH_PLAY, false, &mut ctx));
        assert_eq!(ctx.presses, 1);
        assert_eq!(ctx.releases, 1);
    }

    #[test]
    fn test_passthrough_without_handler_is_not_accepted() {
        let dispatch: PassthroughDispatch<Counters> = PassthroughDispatch::new();
        let mut ctx = Counters::default();
        assert!(!dispatch.dispatch(PASSTHROUGH_PLAY, true, &mut ctx));
    }
}
