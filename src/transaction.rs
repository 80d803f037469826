//! Transaction Label Registry
//!
//! This module tracks outstanding outbound requests by AVCTP transaction
//! label. Labels are drawn from the transport's four-bit label space, so at
//! most sixteen requests may be in flight per session; allocation failure is
//! backpressure the caller must absorb, never a peer-visible error.

use crate::AvrcpError;
use crate::constants::MAX_TRANSACTION_LABELS;
use crate::pdu::CommandCode;

/// Callback invoked when a response arrives for an outstanding request
///
/// Receives the response code, the PDU parameter bytes, and the session's
/// user context.
pub type ResponseCallback<C> = fn(code: CommandCode, params: &[u8], ctx: &mut C);

/// An outstanding request awaiting its response
#[derive(Debug)]
pub struct PendingTransaction<C> {
    /// Callback to invoke on completion
    pub callback: ResponseCallback<C>,
}

// Manual impls: the derive would demand `C: Copy` although only a fn
// pointer is stored.
impl<C> Clone for PendingTransaction<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for PendingTransaction<C> {}

/// Registry of in-flight transaction labels for one session
#[derive(Debug)]
pub struct TransactionRegistry<C> {
    entries: [Option<PendingTransaction<C>>; MAX_TRANSACTION_LABELS],
    next_hint: u8,
}

impl<C> TransactionRegistry<C> {
    /// Create an empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [None; MAX_TRANSACTION_LABELS],
            next_hint: 0,
        }
    }

    /// Allocate a free label for a new outbound request
    ///
    /// Labels are handed out round-robin from the last allocation point so a
    /// freed label is not immediately reused while its response may still be
    /// in flight.
    ///
    /// # Errors
    /// Returns `AvrcpError::NoFreeLabel` when all sixteen labels are in use
    #[allow(clippy::cast_possible_truncation)]
    pub fn allocate(&mut self, callback: ResponseCallback<C>) -> Result<u8, AvrcpError> {
        for offset in 0..MAX_TRANSACTION_LABELS {
            let label = (self.next_hint as usize + offset) % MAX_TRANSACTION_LABELS;
            if self.entries[label].is_none() {
                self.entries[label] = Some(PendingTransaction { callback });
                self.next_hint = ((label + 1) % MAX_TRANSACTION_LABELS) as u8;
                return Ok(label as u8);
            }
        }
        Err(AvrcpError::NoFreeLabel)
    }

    /// Insert an existing pending entry under a fresh label
    ///
    /// Used when a continuing response keeps the original completion callback
    /// alive across the follow-up request.
    ///
    /// # Errors
    /// Returns `AvrcpError::NoFreeLabel` when all labels are in use
    pub fn insert(&mut self, pending: PendingTransaction<C>) -> Result<u8, AvrcpError> {
        self.allocate(pending.callback)
    }

    /// Complete a transaction, removing and returning its entry
    ///
    /// Returns `None` for a stale or unknown label; the caller drops such a
    /// response silently per the protocol.
    pub fn complete(&mut self, label: u8) -> Option<PendingTransaction<C>> {
        self.entries
            .get_mut(label as usize)
            .and_then(core::option::Option::take)
    }

    /// Re-arm a label with its pending entry
    ///
    /// An interim notification response keeps its label open until the final
    /// changed push arrives.
    pub fn restore(&mut self, label: u8, pending: PendingTransaction<C>) {
        if let Some(slot) = self.entries.get_mut(label as usize) {
            *slot = Some(pending);
        }
    }

    /// Whether a label currently has an outstanding entry
    #[must_use]
    pub fn is_pending(&self, label: u8) -> bool {
        self.entries
            .get(label as usize)
            .is_some_and(core::option::Option::is_some)
    }

    /// Number of outstanding transactions
    #[must_use]
    pub fn pending(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Discard every outstanding entry without invoking callbacks
    ///
    /// Called at session teardown; an already-initiated command has no
    /// further effect once the session is gone.
    pub fn cancel_all(&mut self) {
        for entry in &mut self.entries {
            *entry = None;
        }
    }
}

impl<C> Default for TransactionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx;

    fn noop(_code: CommandCode, _params: &[u8], _ctx: &mut Ctx) {}

    #[test]
    fn test_allocated_labels_are_unique() {
        let mut registry: TransactionRegistry<Ctx> = TransactionRegistry::new();
        let mut seen = [false; MAX_TRANSACTION_LABELS];

        for _ in 0..MAX_TRANSACTION_LABELS {
            let label = registry.allocate(noop).unwrap();
            assert!(!seen[label as usize]);
            seen[label as usize] = true;
        }
    }

    #[test]
    fn test_exhaustion_and_reuse_after_complete() {
        let mut registry: TransactionRegistry<Ctx> = TransactionRegistry::new();
        for _ in 0..MAX_TRANSACTION_LABELS {
            registry.allocate(noop).unwrap();
        }

        assert_eq!(registry.allocate(noop), Err(AvrcpError::NoFreeLabel));

        assert!(registry.complete(5).is_some());
        assert_eq!(registry.allocate(noop), Ok(5));
        assert_eq!(registry.allocate(noop), Err(AvrcpError::NoFreeLabel));
    }

    #[test]
    fn test_stale_label_completes_to_none() {
        let mut registry: TransactionRegistry<Ctx> = TransactionRegistry::new();
        let label = registry.allocate(noop).unwrap();

        assert!(registry.complete(label).is_some());
        assert!(registry.complete(label).is_none());
        assert!(registry.complete(0x0F).is_none());
    }

    #[test]
    fn test_restore_keeps_label_pending() {
        let mut registry: TransactionRegistry<Ctx> = TransactionRegistry::new();
        let label = registry.allocate(noop).unwrap();

        let pending = registry.complete(label).unwrap();
        assert!(!registry.is_pending(label));

        registry.restore(label, pending);
        assert!(registry.is_pending(label));
        assert_eq!(registry.pending(), 1);
    }

    #[test]
    fn test_cancel_all_discards_everything() {
        let mut registry: TransactionRegistry<Ctx> = TransactionRegistry::new();
        for _ in 0..4 {
            registry.allocate(noop).unwrap();
        }

        registry.cancel_all();
        assert_eq!(registry.pending(), 0);
        for label in 0..4 {
            assert!(!registry.is_pending(label));
        }
    }

    #[test]
    fn test_round_robin_avoids_immediate_reuse() {
        let mut registry: TransactionRegistry<Ctx> = TransactionRegistry::new();
        let first = registry.allocate(noop).unwrap();
        registry.complete(first);

        // The freed label is skipped until the space wraps around
        let second = registry.allocate(noop).unwrap();
        assert_ne!(first, second);
    }
}
