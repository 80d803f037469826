#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![allow(dead_code, clippy::unused_async, clippy::too_many_lines)]

pub mod constants;
pub mod continuing;
pub mod dispatch;
pub mod notification;
pub mod pdu;
pub mod processor;
pub mod session;
pub mod transaction;

pub use dispatch::{ControlHandler, ControlOutcome, PassthroughHandler};
pub use notification::{Event, PlayerEvent};
pub use pdu::{CommandCode, PacketType, Status};
pub use session::{AvctpTransport, Session};
pub use transaction::ResponseCallback;

/// Engine errors surfaced to the owning stack
///
/// Peer-visible protocol failures are not errors: malformed commands are
/// answered with rejections on the wire and the entry point returns `Ok`.
/// These variants cover local conditions the caller has to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum AvrcpError {
    /// Frame or PDU failed structural validation
    MalformedPdu,
    /// All sixteen transaction labels are in flight; retry later
    NoFreeLabel,
    /// Continuation request without a matching sequence
    InvalidContinuation,
    /// A fragmented response is already outstanding
    AlreadyInProgress,
    /// Payload exceeds the continuing-response buffer or the length field
    PayloadTooLarge,
    /// A fixed-capacity buffer or queue is full
    BufferOverflow,
    /// Operation not available on this connection (no browsing channel)
    NotSupported,
    /// The session has been shut down
    SessionClosed,
    /// The transport failed to write a frame
    TransportError,
    /// Invalid argument from the local caller
    InvalidParameter,
}

// Host test builds need a logger symbol for the defmt statements to link
// against; frames go nowhere.
#[cfg(test)]
mod test_logger {
    #[defmt::global_logger]
    struct Logger;

    unsafe impl defmt::Logger for Logger {
        fn acquire() {}
        unsafe fn flush() {}
        unsafe fn release() {}
        unsafe fn write(_bytes: &[u8]) {}
    }

    defmt::timestamp!("{=u64}", 0);

    #[defmt::panic_handler]
    fn panic() -> ! {
        core::panic!()
    }
}
