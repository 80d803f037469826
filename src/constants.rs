//! `Larkspur` Constants
//!
//! This module contains the wire-level identifiers and capacity limits used
//! throughout the `Larkspur` library: AVRCP PDU ids, capability ids,
//! pass-through operation ids, and the fixed buffer sizes of the engine.

/// AV/C opcode for vendor-dependent commands
pub const OPCODE_VENDOR_DEPENDENT: u8 = 0x00;

/// AV/C opcode for pass-through (button) commands
pub const OPCODE_PASSTHROUGH: u8 = 0x7C;

/// Bluetooth SIG company identifier carried in vendor-dependent frames
pub const IEEEID_BTSIG: u32 = 0x001958;

/// Get Capabilities PDU id
pub const AVRCP_GET_CAPABILITIES: u8 = 0x10;
/// List Player Application Setting Attributes PDU id
pub const AVRCP_LIST_PLAYER_ATTRIBUTES: u8 = 0x11;
/// List Player Application Setting Values PDU id
pub const AVRCP_LIST_PLAYER_VALUES: u8 = 0x12;
/// Get Current Player Application Setting Value PDU id
pub const AVRCP_GET_CURRENT_PLAYER_VALUE: u8 = 0x13;
/// Set Player Application Setting Value PDU id
pub const AVRCP_SET_PLAYER_VALUE: u8 = 0x14;
/// Get Player Application Setting Attribute Text PDU id
pub const AVRCP_GET_PLAYER_ATTRIBUTE_TEXT: u8 = 0x15;
/// Get Player Application Setting Value Text PDU id
pub const AVRCP_GET_PLAYER_VALUE_TEXT: u8 = 0x16;
/// Inform Displayable Character Set PDU id
pub const AVRCP_DISPLAYABLE_CHARSET: u8 = 0x17;
/// Inform Battery Status Of CT PDU id
pub const AVRCP_CT_BATTERY_STATUS: u8 = 0x18;
/// Get Element Attributes PDU id
pub const AVRCP_GET_ELEMENT_ATTRIBUTES: u8 = 0x20;
/// Get Play Status PDU id
pub const AVRCP_GET_PLAY_STATUS: u8 = 0x30;
/// Register Notification PDU id
pub const AVRCP_REGISTER_NOTIFICATION: u8 = 0x31;
/// Request Continuing Response PDU id
pub const AVRCP_REQUEST_CONTINUING: u8 = 0x40;
/// Abort Continuing Response PDU id
pub const AVRCP_ABORT_CONTINUING: u8 = 0x41;
/// Set Absolute Volume PDU id
pub const AVRCP_SET_ABSOLUTE_VOLUME: u8 = 0x50;
/// Set Browsed Player PDU id (browsing channel)
pub const AVRCP_SET_BROWSED_PLAYER: u8 = 0x70;
/// Get Folder Items PDU id (browsing channel)
pub const AVRCP_GET_FOLDER_ITEMS: u8 = 0x71;
/// Change Path PDU id (browsing channel)
pub const AVRCP_CHANGE_PATH: u8 = 0x72;
/// Get Item Attributes PDU id (browsing channel)
pub const AVRCP_GET_ITEM_ATTRIBUTES: u8 = 0x73;
/// Play Item PDU id
pub const AVRCP_PLAY_ITEM: u8 = 0x74;
/// Search PDU id (browsing channel)
pub const AVRCP_SEARCH: u8 = 0x80;
/// Add To Now Playing PDU id
pub const AVRCP_ADD_TO_NOW_PLAYING: u8 = 0x90;
/// General Reject PDU id
pub const AVRCP_GENERAL_REJECT: u8 = 0xA0;

/// Get Capabilities parameter requesting the company id list
pub const CAP_COMPANY_ID: u8 = 0x02;
/// Get Capabilities parameter requesting the supported events list
pub const CAP_EVENTS_SUPPORTED: u8 = 0x03;

/// Player application setting: equalizer on/off
pub const AVRCP_ATTRIBUTE_EQUALIZER: u8 = 0x01;
/// Player application setting: repeat mode
pub const AVRCP_ATTRIBUTE_REPEAT_MODE: u8 = 0x02;
/// Player application setting: shuffle
pub const AVRCP_ATTRIBUTE_SHUFFLE: u8 = 0x03;
/// Player application setting: scan
pub const AVRCP_ATTRIBUTE_SCAN: u8 = 0x04;

/// Pass-through operation: volume up
pub const PASSTHROUGH_VOLUME_UP: u8 = 0x41;
/// Pass-through operation: volume down
pub const PASSTHROUGH_VOLUME_DOWN: u8 = 0x42;
/// Pass-through operation: play
pub const PASSTHROUGH_PLAY: u8 = 0x44;
/// Pass-through operation: stop
pub const PASSTHROUGH_STOP: u8 = 0x45;
/// Pass-through operation: pause
pub const PASSTHROUGH_PAUSE: u8 = 0x46;
/// Pass-through operation: rewind
pub const PASSTHROUGH_REWIND: u8 = 0x48;
/// Pass-through operation: fast forward
pub const PASSTHROUGH_FAST_FORWARD: u8 = 0x49;
/// Pass-through operation: forward (next track)
pub const PASSTHROUGH_FORWARD: u8 = 0x4B;
/// Pass-through operation: backward (previous track)
pub const PASSTHROUGH_BACKWARD: u8 = 0x4C;

/// AVCTP transaction labels are 4 bits wide
pub const MAX_TRANSACTION_LABELS: usize = 16;

/// AV/C frame header length (ctype, subunit, opcode), framed by the transport
pub const AVC_HEADER_LENGTH: usize = 3;

/// Company id length inside vendor-dependent operands
pub const COMPANY_ID_LENGTH: usize = 3;

/// Largest single inbound AVCTP frame the engine accepts
pub const MAX_FRAME_SIZE: usize = 512;

/// Capacity of a buffered continuing response awaiting fragmentation
pub const MAX_CONTINUING_RESPONSE: usize = 1024;

/// Capacity of the inbound fragment reassembly buffer
pub const MAX_REASSEMBLY_SIZE: usize = 1024;

/// Largest response payload a control handler may produce in one call
pub const MAX_CONTROL_RESPONSE: usize = MAX_CONTINUING_RESPONSE;

/// Maximum number of simultaneous AVRCP sessions in a session set
pub const MAX_SESSIONS: usize = 4;

/// Depth of the inbound frame and player event channels
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// Number of distinct notification event types (power-of-two map capacity)
pub const MAX_NOTIFICATION_EVENTS: usize = 16;
