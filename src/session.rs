//! AVRCP Session
//!
//! One [`Session`] is bound to one AVCTP connection and composes the whole
//! engine: PDU codec, transaction registry, dispatch tables, the
//! continuing-response manager, and the notification subscription manager.
//! Inbound frames are demultiplexed by logical channel and processed in
//! arrival order; the session is the only type external collaborators hold.
//!
//! The session never manages the connection itself. It consumes decoded
//! AVCTP frames handed in by the owning stack and writes outbound frames
//! through the [`AvctpTransport`] trait.

use crate::AvrcpError;
use crate::constants::{
    AVC_HEADER_LENGTH, AVRCP_ABORT_CONTINUING, AVRCP_GENERAL_REJECT, AVRCP_GET_CAPABILITIES,
    AVRCP_GET_CURRENT_PLAYER_VALUE, AVRCP_GET_ELEMENT_ATTRIBUTES, AVRCP_GET_PLAY_STATUS,
    AVRCP_GET_PLAYER_ATTRIBUTE_TEXT, AVRCP_LIST_PLAYER_ATTRIBUTES, AVRCP_REGISTER_NOTIFICATION,
    AVRCP_REQUEST_CONTINUING, AVRCP_SET_ABSOLUTE_VOLUME, AVRCP_SET_PLAYER_VALUE, IEEEID_BTSIG,
    MAX_FRAME_SIZE, OPCODE_PASSTHROUGH, OPCODE_VENDOR_DEPENDENT,
};
use crate::continuing::{ContinuingResponse, Reassembly};
use crate::dispatch::{
    ControlDispatch, ControlHandler, ControlVerdict, PassthroughDispatch, PassthroughHandler,
};
use crate::notification::{Event, NotificationManager, PlayerEvent};
use crate::pdu::{
    BrowsingPdu, CommandCode, PacketType, PassthroughFrame, Status, VendorPdu,
};
use crate::transaction::{PendingTransaction, ResponseCallback, TransactionRegistry};
use heapless::Vec;

/// Outbound side of the AVCTP connection owned by the surrounding stack
///
/// The transport frames the AV/C header (ctype, subunit, opcode) and the
/// AVCTP header (transaction label, C/R bit) itself; the engine supplies the
/// pieces and the operand bytes.
pub trait AvctpTransport {
    /// Write one control channel frame
    ///
    /// # Errors
    /// Returns `AvrcpError::TransportError` if the frame cannot be written
    fn send_control(
        &mut self,
        transaction: u8,
        code: CommandCode,
        opcode: u8,
        operands: &[u8],
    ) -> Result<(), AvrcpError>;

    /// Write one browsing channel frame
    ///
    /// # Errors
    /// Returns `AvrcpError::NotSupported` if no browsing channel exists
    fn send_browsing(&mut self, _transaction: u8, _frame: &[u8]) -> Result<(), AvrcpError> {
        Err(AvrcpError::NotSupported)
    }
}

/// Destroy callback, invoked exactly once when the session shuts down
pub type DestroyCallback<C> = fn(ctx: &mut C);

/// One AVRCP engine instance bound to one peer connection
pub struct Session<T: AvctpTransport, C: 'static> {
    transport: T,
    ctx: C,
    imtu: usize,
    omtu: usize,
    version: u16,
    control: ControlDispatch<C>,
    passthrough: PassthroughDispatch<C>,
    transactions: TransactionRegistry<C>,
    notifications: NotificationManager,
    continuing: ContinuingResponse,
    reassembly: Reassembly,
    destroy: Option<DestroyCallback<C>>,
    closed: bool,
}

impl<T: AvctpTransport, C: 'static> Session<T, C> {
    /// Create a session for an established connection
    ///
    /// `imtu` and `omtu` are the negotiated inbound and outbound maximum
    /// frame sizes of the control channel; `version` is the peer's AVRCP
    /// profile version from SDP.
    #[must_use]
    pub fn new(transport: T, imtu: usize, omtu: usize, version: u16, ctx: C) -> Self {
        Self {
            transport,
            ctx,
            imtu,
            omtu,
            version,
            control: ControlDispatch::new(),
            passthrough: PassthroughDispatch::new(),
            transactions: TransactionRegistry::new(),
            notifications: NotificationManager::new(),
            continuing: ContinuingResponse::new(),
            reassembly: Reassembly::new(),
            destroy: None,
            closed: false,
        }
    }

    /// Peer AVRCP profile version
    #[must_use]
    pub const fn version(&self) -> u16 {
        self.version
    }

    /// Shared user context
    pub const fn context(&self) -> &C {
        &self.ctx
    }

    /// Mutable access to the shared user context
    pub const fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// The owned transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the owned transport
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Replace the control handler table
    pub fn set_control_handlers(&mut self, handlers: &'static [ControlHandler<C>]) {
        self.control.register(handlers);
    }

    /// Replace the pass-through handler table
    pub fn set_passthrough_handlers(&mut self, handlers: &'static [PassthroughHandler<C>]) {
        self.passthrough.register(handlers);
    }

    /// Install the destroy callback fired at shutdown
    pub fn set_destroy_handler(&mut self, destroy: DestroyCallback<C>) {
        self.destroy = Some(destroy);
    }

    /// Tear the session down
    ///
    /// Cancels every pending transaction without invoking its callback,
    /// discards the continuing-response and reassembly buffers, drops all
    /// notification subscriptions, and fires the destroy callback once.
    /// Further entry points fail with `SessionClosed`.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }

        self.closed = true;
        self.transactions.cancel_all();
        self.continuing.reset();
        self.reassembly.clear();
        self.notifications.clear();
        if let Some(destroy) = self.destroy.take() {
            destroy(&mut self.ctx);
        }
        defmt::debug!("[SESSION] shut down");
    }

    fn ensure_open(&self) -> Result<(), AvrcpError> {
        if self.closed {
            Err(AvrcpError::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// Parameter bytes that fit one outbound vendor-dependent frame
    fn vendor_budget(&self) -> usize {
        self.omtu
            .saturating_sub(AVC_HEADER_LENGTH + VendorPdu::HEADER_SIZE)
            .min(MAX_FRAME_SIZE - VendorPdu::HEADER_SIZE)
    }

    /// Process one inbound control channel frame
    ///
    /// `code` is the raw AV/C ctype byte, `opcode` the AV/C opcode, and
    /// `operands` everything after the three-byte AV/C header. Frames for
    /// the same session must be handed in strictly in arrival order.
    ///
    /// # Errors
    /// Returns `AvrcpError::MalformedPdu` for an unknown ctype or an
    /// oversized frame (a connection-level concern for the owner),
    /// `AvrcpError::SessionClosed` after shutdown, and transport errors
    /// from writing the answer
    pub fn receive_control(
        &mut self,
        transaction: u8,
        code: u8,
        opcode: u8,
        operands: &[u8],
    ) -> Result<(), AvrcpError> {
        self.ensure_open()?;
        if operands.len() + AVC_HEADER_LENGTH > self.imtu {
            return Err(AvrcpError::MalformedPdu);
        }

        let Some(code) = CommandCode::from_u8(code) else {
            defmt::warn!("[SESSION] unknown ctype dropped");
            return Err(AvrcpError::MalformedPdu);
        };

        if code.is_response() {
            self.handle_response(transaction, code, opcode, operands)
        } else {
            match opcode {
                OPCODE_PASSTHROUGH => self.handle_passthrough(transaction, operands),
                OPCODE_VENDOR_DEPENDENT => self.handle_vendor(transaction, code, operands),
                _ => {
                    // Recognized by neither table; still answered
                    defmt::debug!("[SESSION] unsupported opcode {=u8}", opcode);
                    self.transport.send_control(
                        transaction,
                        CommandCode::NotImplemented,
                        opcode,
                        operands,
                    )
                }
            }
        }
    }

    /// Process one inbound browsing channel frame
    ///
    /// Browsing commands are dispatched through the control handler table
    /// (registered with code `Control`); a miss is answered with a General
    /// Reject PDU carrying the invalid-command status.
    ///
    /// # Errors
    /// Returns `AvrcpError::SessionClosed` after shutdown and transport
    /// errors from writing the answer
    pub fn receive_browsing(&mut self, transaction: u8, frame: &[u8]) -> Result<(), AvrcpError> {
        self.ensure_open()?;
        let pdu = match BrowsingPdu::decode(frame) {
            Ok(pdu) => pdu,
            Err(_) => return self.send_browsing_reject(transaction, Status::InvalidCommand),
        };

        let verdict =
            self.control
                .dispatch(transaction, pdu.pdu_id, CommandCode::Control, pdu.params, &mut self.ctx);
        match verdict {
            ControlVerdict::Response(_, payload) => {
                let mut buf = [0u8; MAX_FRAME_SIZE];
                let len = BrowsingPdu::encode(pdu.pdu_id, &payload, &mut buf)?;
                self.transport.send_browsing(transaction, &buf[..len])
            }
            ControlVerdict::Rejected(status) => self.send_browsing_reject(transaction, status),
            ControlVerdict::Deferred => Ok(()),
        }
    }

    fn handle_passthrough(&mut self, transaction: u8, operands: &[u8]) -> Result<(), AvrcpError> {
        let Ok(frame) = PassthroughFrame::decode(operands) else {
            defmt::warn!("[SESSION] malformed pass-through operands");
            return self.transport.send_control(
                transaction,
                CommandCode::NotImplemented,
                OPCODE_PASSTHROUGH,
                operands,
            );
        };

        let accepted = self.passthrough.dispatch(frame.op, frame.pressed, &mut self.ctx);
        let code = if accepted {
            CommandCode::Accepted
        } else {
            CommandCode::NotImplemented
        };
        // Pass-through is always acknowledged, echoing the operands
        self.transport
            .send_control(transaction, code, OPCODE_PASSTHROUGH, operands)
    }

    fn handle_vendor(
        &mut self,
        transaction: u8,
        code: CommandCode,
        operands: &[u8],
    ) -> Result<(), AvrcpError> {
        let Ok(vendor) = VendorPdu::decode(operands) else {
            return self.send_general_reject(transaction, Status::InvalidCommand);
        };
        if vendor.company_id != IEEEID_BTSIG {
            defmt::warn!("[SESSION] foreign company id");
            return self.send_general_reject(transaction, Status::InvalidCommand);
        }

        let pdu_id = vendor.pdu.pdu_id;
        let params = vendor.pdu.params;
        match pdu_id {
            AVRCP_REQUEST_CONTINUING => self.handle_request_continuing(transaction, params),
            AVRCP_ABORT_CONTINUING => self.handle_abort_continuing(transaction, params),
            AVRCP_REGISTER_NOTIFICATION if code == CommandCode::Notify => {
                self.handle_register_notification(transaction, params)
            }
            _ => self.dispatch_control(transaction, pdu_id, code, params),
        }
    }

    fn dispatch_control(
        &mut self,
        transaction: u8,
        pdu_id: u8,
        code: CommandCode,
        params: &[u8],
    ) -> Result<(), AvrcpError> {
        let verdict = self
            .control
            .dispatch(transaction, pdu_id, code, params, &mut self.ctx);
        match verdict {
            ControlVerdict::Response(rsp_code, payload) => {
                self.send_vendor_response(transaction, rsp_code, pdu_id, &payload)
            }
            ControlVerdict::Rejected(status) => self.send_rejection(transaction, pdu_id, status),
            ControlVerdict::Deferred => Ok(()),
        }
    }

    fn handle_register_notification(
        &mut self,
        transaction: u8,
        params: &[u8],
    ) -> Result<(), AvrcpError> {
        // Event id plus four interval bytes
        if params.len() < 5 {
            return self.send_rejection(
                transaction,
                AVRCP_REGISTER_NOTIFICATION,
                Status::InvalidParam,
            );
        }
        let Some(event) = Event::from_u8(params[0]) else {
            return self.send_rejection(
                transaction,
                AVRCP_REGISTER_NOTIFICATION,
                Status::InvalidParam,
            );
        };
        if let Err(status) = self.notifications.can_register(event) {
            defmt::debug!("[SESSION] duplicate registration for {}", event);
            return self.send_rejection(transaction, AVRCP_REGISTER_NOTIFICATION, status);
        }

        let interval = u32::from_be_bytes([params[1], params[2], params[3], params[4]]);
        let verdict = self.control.dispatch(
            transaction,
            AVRCP_REGISTER_NOTIFICATION,
            CommandCode::Notify,
            params,
            &mut self.ctx,
        );
        match verdict {
            ControlVerdict::Response(rsp_code, payload) => {
                if rsp_code == CommandCode::Interim {
                    if let Err(status) = self.notifications.register(event, interval, transaction) {
                        return self.send_rejection(
                            transaction,
                            AVRCP_REGISTER_NOTIFICATION,
                            status,
                        );
                    }
                }
                self.send_vendor_response(
                    transaction,
                    rsp_code,
                    AVRCP_REGISTER_NOTIFICATION,
                    &payload,
                )
            }
            ControlVerdict::Rejected(status) => {
                self.send_rejection(transaction, AVRCP_REGISTER_NOTIFICATION, status)
            }
            ControlVerdict::Deferred => Ok(()),
        }
    }

    fn handle_request_continuing(
        &mut self,
        transaction: u8,
        params: &[u8],
    ) -> Result<(), AvrcpError> {
        if params.len() != 1 {
            return self.send_rejection(
                transaction,
                AVRCP_REQUEST_CONTINUING,
                Status::InvalidParam,
            );
        }

        let target = params[0];
        let budget = self.vendor_budget();
        let code = self.continuing.code();
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let encoded = match self.continuing.next_fragment(target, budget) {
            Ok((packet_type, fragment)) => {
                Some(VendorPdu::encode(IEEEID_BTSIG, target, packet_type, fragment, &mut buf)?)
            }
            Err(_) => None,
        };
        match encoded {
            Some(len) => {
                self.transport
                    .send_control(transaction, code, OPCODE_VENDOR_DEPENDENT, &buf[..len])
            }
            None => {
                // Out-of-sequence continuation is answered, never ignored
                self.send_rejection(transaction, AVRCP_REQUEST_CONTINUING, Status::InvalidParam)
            }
        }
    }

    fn handle_abort_continuing(
        &mut self,
        transaction: u8,
        params: &[u8],
    ) -> Result<(), AvrcpError> {
        if params.len() != 1 {
            return self.send_rejection(transaction, AVRCP_ABORT_CONTINUING, Status::InvalidParam);
        }

        match self.continuing.abort(params[0]) {
            Ok(()) => self.send_vendor_response(
                transaction,
                CommandCode::Accepted,
                AVRCP_ABORT_CONTINUING,
                &[],
            ),
            Err(_) => {
                self.send_rejection(transaction, AVRCP_ABORT_CONTINUING, Status::InvalidParam)
            }
        }
    }

    fn handle_response(
        &mut self,
        transaction: u8,
        code: CommandCode,
        opcode: u8,
        operands: &[u8],
    ) -> Result<(), AvrcpError> {
        let Some(pending) = self.transactions.complete(transaction) else {
            // Stale or unknown label: a peer ordering anomaly, dropped
            defmt::debug!("[SESSION] response for unknown transaction {=u8}", transaction);
            return Ok(());
        };

        if opcode != OPCODE_VENDOR_DEPENDENT {
            (pending.callback)(code, operands, &mut self.ctx);
            return Ok(());
        }

        let Ok(vendor) = VendorPdu::decode(operands) else {
            defmt::warn!("[SESSION] malformed response dropped");
            return Ok(());
        };

        let pdu = vendor.pdu;
        match pdu.packet_type {
            PacketType::Single => {
                (pending.callback)(code, pdu.params, &mut self.ctx);
                if code == CommandCode::Interim {
                    // The label stays open awaiting the changed push
                    self.transactions.restore(transaction, pending);
                }
                Ok(())
            }
            PacketType::Start => {
                if let Err(_e) = self.reassembly.start(pdu.pdu_id, pdu.params) {
                    defmt::warn!("[SESSION] dropping oversized fragmented response");
                    return Ok(());
                }
                self.request_next_fragment(pdu.pdu_id, pending)
            }
            PacketType::Continue => {
                if let Err(_e) = self.reassembly.append(pdu.pdu_id, pdu.params) {
                    defmt::warn!("[SESSION] out-of-sequence fragment dropped");
                    self.reassembly.clear();
                    return Ok(());
                }
                self.request_next_fragment(pdu.pdu_id, pending)
            }
            PacketType::End => match self.reassembly.finish(pdu.pdu_id, pdu.params) {
                Ok(full) => {
                    (pending.callback)(code, full, &mut self.ctx);
                    Ok(())
                }
                Err(_) => {
                    // finish() already discarded the partial payload
                    defmt::warn!("[SESSION] end fragment without sequence dropped");
                    Ok(())
                }
            },
        }
    }

    /// Ask the peer for the next fragment, carrying the original completion
    /// callback over to a fresh transaction label
    fn request_next_fragment(
        &mut self,
        pdu_id: u8,
        pending: PendingTransaction<C>,
    ) -> Result<(), AvrcpError> {
        let label = match self.transactions.insert(pending) {
            Ok(label) => label,
            Err(e) => {
                defmt::warn!("[SESSION] no free label to continue response");
                self.reassembly.clear();
                return Err(e);
            }
        };

        let mut buf = [0u8; 16];
        let len = VendorPdu::encode(
            IEEEID_BTSIG,
            AVRCP_REQUEST_CONTINUING,
            PacketType::Single,
            &[pdu_id],
            &mut buf,
        )?;
        self.transport
            .send_control(label, CommandCode::Control, OPCODE_VENDOR_DEPENDENT, &buf[..len])
    }

    /// Send a response to an inbound vendor-dependent command
    ///
    /// Payloads exceeding the outbound budget are buffered and emitted as a
    /// continuing sequence; only the start fragment is sent here, the peer
    /// pulls the rest.
    ///
    /// # Errors
    /// Returns `AvrcpError::AlreadyInProgress` when another fragmented
    /// response is outstanding, `AvrcpError::SessionClosed` after shutdown,
    /// and transport errors from the write
    pub fn send_vendor_response(
        &mut self,
        transaction: u8,
        code: CommandCode,
        pdu_id: u8,
        params: &[u8],
    ) -> Result<(), AvrcpError> {
        self.ensure_open()?;
        let budget = self.vendor_budget();
        let mut buf = [0u8; MAX_FRAME_SIZE];

        if params.len() <= budget {
            let len = VendorPdu::encode(IEEEID_BTSIG, pdu_id, PacketType::Single, params, &mut buf)?;
            return self
                .transport
                .send_control(transaction, code, OPCODE_VENDOR_DEPENDENT, &buf[..len]);
        }

        self.continuing.begin(pdu_id, code, params)?;
        let (packet_type, fragment) = self.continuing.next_fragment(pdu_id, budget)?;
        let len = VendorPdu::encode(IEEEID_BTSIG, pdu_id, packet_type, fragment, &mut buf)?;
        self.transport
            .send_control(transaction, code, OPCODE_VENDOR_DEPENDENT, &buf[..len])
    }

    fn send_rejection(
        &mut self,
        transaction: u8,
        pdu_id: u8,
        status: Status,
    ) -> Result<(), AvrcpError> {
        defmt::debug!("[SESSION] rejecting pdu {=u8} with {}", pdu_id, status);
        let params = [status as u8];
        let mut buf = [0u8; 16];
        let len = VendorPdu::encode(IEEEID_BTSIG, pdu_id, PacketType::Single, &params, &mut buf)?;
        self.transport.send_control(
            transaction,
            CommandCode::Rejected,
            OPCODE_VENDOR_DEPENDENT,
            &buf[..len],
        )
    }

    fn send_general_reject(
        &mut self,
        transaction: u8,
        status: Status,
    ) -> Result<(), AvrcpError> {
        self.send_rejection(transaction, AVRCP_GENERAL_REJECT, status)
    }

    fn send_browsing_reject(
        &mut self,
        transaction: u8,
        status: Status,
    ) -> Result<(), AvrcpError> {
        let params = [status as u8];
        let mut buf = [0u8; 16];
        let len = BrowsingPdu::encode(AVRCP_GENERAL_REJECT, &params, &mut buf)?;
        self.transport.send_browsing(transaction, &buf[..len])
    }

    /// Send a vendor-dependent request and register its response callback
    ///
    /// # Errors
    /// Returns `AvrcpError::NoFreeLabel` when all transaction labels are in
    /// use (local backpressure, defer and retry),
    /// `AvrcpError::PayloadTooLarge` for params beyond one frame,
    /// `AvrcpError::SessionClosed` after shutdown
    pub fn send_vendor_request(
        &mut self,
        code: CommandCode,
        pdu_id: u8,
        params: &[u8],
        callback: ResponseCallback<C>,
    ) -> Result<u8, AvrcpError> {
        self.ensure_open()?;
        if params.len() > self.vendor_budget() {
            return Err(AvrcpError::PayloadTooLarge);
        }

        let label = self.transactions.allocate(callback)?;
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let result = VendorPdu::encode(IEEEID_BTSIG, pdu_id, PacketType::Single, params, &mut buf)
            .and_then(|len| {
                self.transport
                    .send_control(label, code, OPCODE_VENDOR_DEPENDENT, &buf[..len])
            });
        if let Err(e) = result {
            self.transactions.complete(label);
            return Err(e);
        }
        Ok(label)
    }

    /// Query the target's capabilities (company ids or supported events)
    ///
    /// # Errors
    /// See [`Self::send_vendor_request`]
    pub fn get_capabilities(
        &mut self,
        capability: u8,
        callback: ResponseCallback<C>,
    ) -> Result<u8, AvrcpError> {
        self.send_vendor_request(
            CommandCode::Status,
            AVRCP_GET_CAPABILITIES,
            &[capability],
            callback,
        )
    }

    /// Register for an asynchronous event notification
    ///
    /// The response callback fires once with the interim snapshot and again
    /// with the changed push; the transaction label is held open in between.
    ///
    /// # Errors
    /// See [`Self::send_vendor_request`]
    pub fn register_notification(
        &mut self,
        event: Event,
        interval: u32,
        callback: ResponseCallback<C>,
    ) -> Result<u8, AvrcpError> {
        let mut params: Vec<u8, 5> = Vec::new();
        params.push(event as u8).ok();
        params.extend_from_slice(&interval.to_be_bytes()).ok();
        self.send_vendor_request(
            CommandCode::Notify,
            AVRCP_REGISTER_NOTIFICATION,
            &params,
            callback,
        )
    }

    /// List the player application setting attributes the target supports
    ///
    /// # Errors
    /// See [`Self::send_vendor_request`]
    pub fn list_player_attributes(
        &mut self,
        callback: ResponseCallback<C>,
    ) -> Result<u8, AvrcpError> {
        self.send_vendor_request(CommandCode::Status, AVRCP_LIST_PLAYER_ATTRIBUTES, &[], callback)
    }

    /// Fetch display text for player application setting attributes
    ///
    /// # Errors
    /// Returns `AvrcpError::PayloadTooLarge` for more attributes than fit a
    /// frame; see [`Self::send_vendor_request`]
    pub fn get_player_attribute_text(
        &mut self,
        attributes: &[u8],
        callback: ResponseCallback<C>,
    ) -> Result<u8, AvrcpError> {
        let mut params: Vec<u8, 64> = Vec::new();
        params
            .push(u8::try_from(attributes.len()).map_err(|_| AvrcpError::PayloadTooLarge)?)
            .ok();
        params
            .extend_from_slice(attributes)
            .map_err(|()| AvrcpError::PayloadTooLarge)?;
        self.send_vendor_request(
            CommandCode::Status,
            AVRCP_GET_PLAYER_ATTRIBUTE_TEXT,
            &params,
            callback,
        )
    }

    /// Query the current values of player application setting attributes
    ///
    /// # Errors
    /// See [`Self::get_player_attribute_text`]
    pub fn get_current_player_value(
        &mut self,
        attributes: &[u8],
        callback: ResponseCallback<C>,
    ) -> Result<u8, AvrcpError> {
        let mut params: Vec<u8, 64> = Vec::new();
        params
            .push(u8::try_from(attributes.len()).map_err(|_| AvrcpError::PayloadTooLarge)?)
            .ok();
        params
            .extend_from_slice(attributes)
            .map_err(|()| AvrcpError::PayloadTooLarge)?;
        self.send_vendor_request(
            CommandCode::Status,
            AVRCP_GET_CURRENT_PLAYER_VALUE,
            &params,
            callback,
        )
    }

    /// Change player application setting values, as (attribute, value) pairs
    ///
    /// # Errors
    /// See [`Self::get_player_attribute_text`]
    pub fn set_player_value(
        &mut self,
        settings: &[(u8, u8)],
        callback: ResponseCallback<C>,
    ) -> Result<u8, AvrcpError> {
        let mut params: Vec<u8, 64> = Vec::new();
        params
            .push(u8::try_from(settings.len()).map_err(|_| AvrcpError::PayloadTooLarge)?)
            .ok();
        for (attribute, value) in settings {
            params.push(*attribute).map_err(|_| AvrcpError::PayloadTooLarge)?;
            params.push(*value).map_err(|_| AvrcpError::PayloadTooLarge)?;
        }
        self.send_vendor_request(CommandCode::Control, AVRCP_SET_PLAYER_VALUE, &params, callback)
    }

    /// Query playback position, track length, and play status
    ///
    /// # Errors
    /// See [`Self::send_vendor_request`]
    pub fn get_play_status(&mut self, callback: ResponseCallback<C>) -> Result<u8, AvrcpError> {
        self.send_vendor_request(CommandCode::Status, AVRCP_GET_PLAY_STATUS, &[], callback)
    }

    /// Fetch metadata attributes of the currently playing element
    ///
    /// An empty attribute list requests all attributes. Fragmented responses
    /// are reassembled transparently before the callback fires.
    ///
    /// # Errors
    /// See [`Self::get_player_attribute_text`]
    pub fn get_element_attributes(
        &mut self,
        attributes: &[u32],
        callback: ResponseCallback<C>,
    ) -> Result<u8, AvrcpError> {
        let mut params: Vec<u8, 64> = Vec::new();
        // Element identifier: 0 addresses the currently playing track
        params.extend_from_slice(&[0u8; 8]).ok();
        params
            .push(u8::try_from(attributes.len()).map_err(|_| AvrcpError::PayloadTooLarge)?)
            .ok();
        for attribute in attributes {
            params
                .extend_from_slice(&attribute.to_be_bytes())
                .map_err(|()| AvrcpError::PayloadTooLarge)?;
        }
        self.send_vendor_request(
            CommandCode::Status,
            AVRCP_GET_ELEMENT_ATTRIBUTES,
            &params,
            callback,
        )
    }

    /// Set the target's absolute volume (0..=0x7F)
    ///
    /// # Errors
    /// See [`Self::send_vendor_request`]
    pub fn set_volume(
        &mut self,
        volume: u8,
        callback: ResponseCallback<C>,
    ) -> Result<u8, AvrcpError> {
        self.send_vendor_request(
            CommandCode::Control,
            AVRCP_SET_ABSOLUTE_VOLUME,
            &[volume & 0x7F],
            callback,
        )
    }

    /// Answer an inbound Get Play Status command
    ///
    /// # Errors
    /// See [`Self::send_vendor_response`]
    pub fn get_play_status_rsp(
        &mut self,
        transaction: u8,
        position: u32,
        duration: u32,
        status: u8,
    ) -> Result<(), AvrcpError> {
        let mut params: Vec<u8, 9> = Vec::new();
        params.extend_from_slice(&duration.to_be_bytes()).ok();
        params.extend_from_slice(&position.to_be_bytes()).ok();
        params.push(status).ok();
        self.send_vendor_response(
            transaction,
            CommandCode::Stable,
            AVRCP_GET_PLAY_STATUS,
            &params,
        )
    }

    /// Answer an inbound Get Element Attributes command
    ///
    /// Oversized attribute payloads engage the continuing-response protocol.
    ///
    /// # Errors
    /// See [`Self::send_vendor_response`]
    pub fn get_element_attrs_rsp(
        &mut self,
        transaction: u8,
        params: &[u8],
    ) -> Result<(), AvrcpError> {
        self.send_vendor_response(
            transaction,
            CommandCode::Stable,
            AVRCP_GET_ELEMENT_ATTRIBUTES,
            params,
        )
    }

    /// Answer an inbound Register Notification command asynchronously
    ///
    /// Used by handlers that returned `Deferred`. An `Interim` code records
    /// the subscription so a later matching [`Self::player_event`] push can
    /// consume it; the first parameter byte must be the event id.
    ///
    /// # Errors
    /// Returns `AvrcpError::InvalidParameter` for an unknown event id or a
    /// duplicate registration; see [`Self::send_vendor_response`]
    pub fn register_notification_rsp(
        &mut self,
        transaction: u8,
        code: CommandCode,
        params: &[u8],
    ) -> Result<(), AvrcpError> {
        self.ensure_open()?;
        let Some(event) = params.first().copied().and_then(Event::from_u8) else {
            return Err(AvrcpError::InvalidParameter);
        };
        if code == CommandCode::Interim {
            self.notifications
                .register(event, 0, transaction)
                .map_err(|_| AvrcpError::InvalidParameter)?;
        }
        self.send_vendor_response(transaction, code, AVRCP_REGISTER_NOTIFICATION, params)
    }

    /// Push a local playback event to the subscribed peer
    ///
    /// Sends at most one changed notification, consuming the stored interim
    /// transaction label; without a subscriber the event is a no-op. An
    /// addressed-player change additionally invalidates every player-scoped
    /// subscription, completing each holder with an
    /// `AddressedPlayerChanged` rejection.
    ///
    /// # Errors
    /// Returns `AvrcpError::SessionClosed` after shutdown and transport
    /// errors from the writes
    pub fn player_event(&mut self, event: &PlayerEvent) -> Result<(), AvrcpError> {
        self.ensure_open()?;
        self.push_changed(event)?;

        if matches!(event, PlayerEvent::AddressedPlayerChanged { .. }) {
            let invalidated = self.notifications.invalidate_player_scoped();
            for (stale, label) in &invalidated {
                defmt::debug!("[SESSION] invalidating {} after player change", stale);
                self.send_rejection(
                    *label,
                    AVRCP_REGISTER_NOTIFICATION,
                    Status::AddressedPlayerChanged,
                )?;
            }
        }
        Ok(())
    }

    fn push_changed(&mut self, event: &PlayerEvent) -> Result<(), AvrcpError> {
        let Some(label) = self.notifications.take_changed(event.event()) else {
            defmt::debug!("[SESSION] no subscriber for {}", event.event());
            return Ok(());
        };

        let params = event.params();
        self.send_vendor_response(
            label,
            CommandCode::Changed,
            AVRCP_REGISTER_NOTIFICATION,
            &params,
        )
    }
}
