//! Notification Subscription Manager
//!
//! AVRCP notifications are one-shot subscriptions: the peer registers for an
//! event, immediately receives an interim snapshot on the same transaction
//! label, and the label stays open until the monitored condition changes,
//! when a single changed push consumes it. The peer must then re-register.
//!
//! A change of the addressed player invalidates every entry whose meaning is
//! scoped to the previous player; those holders are completed with an
//! `AddressedPlayerChanged` rejection instead of a stale value.

use crate::constants::MAX_NOTIFICATION_EVENTS;
use crate::pdu::Status;
use heapless::{FnvIndexMap, Vec};

/// AVRCP notification event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
#[repr(u8)]
pub enum Event {
    /// Playback status changed (playing, paused, ...)
    PlaybackStatusChanged = 0x01,
    /// Current track changed
    TrackChanged = 0x02,
    /// Playback reached the end of the track
    TrackReachedEnd = 0x03,
    /// Playback returned to the start of the track
    TrackReachedStart = 0x04,
    /// Playback position crossed the requested reporting interval
    PlaybackPosChanged = 0x05,
    /// Player application settings changed
    SettingsChanged = 0x08,
    /// The set of available players changed
    AvailablePlayersChanged = 0x0A,
    /// The addressed player changed
    AddressedPlayerChanged = 0x0B,
    /// The UID counter changed
    UidsChanged = 0x0C,
    /// Absolute volume changed
    VolumeChanged = 0x0D,
}

impl Event {
    /// Convert from raw wire value
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::PlaybackStatusChanged),
            0x02 => Some(Self::TrackChanged),
            0x03 => Some(Self::TrackReachedEnd),
            0x04 => Some(Self::TrackReachedStart),
            0x05 => Some(Self::PlaybackPosChanged),
            0x08 => Some(Self::SettingsChanged),
            0x0A => Some(Self::AvailablePlayersChanged),
            0x0B => Some(Self::AddressedPlayerChanged),
            0x0C => Some(Self::UidsChanged),
            0x0D => Some(Self::VolumeChanged),
            _ => None,
        }
    }

    /// Whether the event's meaning is scoped to the addressed player
    ///
    /// Scoped events lose their meaning when the addressed player changes
    /// and must be re-registered against the new player.
    #[must_use]
    pub const fn is_player_scoped(self) -> bool {
        matches!(
            self,
            Self::PlaybackStatusChanged
                | Self::TrackChanged
                | Self::TrackReachedEnd
                | Self::TrackReachedStart
                | Self::PlaybackPosChanged
        )
    }
}

/// Subscription state of one event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SubscriptionState {
    /// No registration outstanding
    Unregistered,
    /// Interim sent; the transaction label is held open for the change push
    Interim,
    /// Change push delivered; the peer has not re-registered yet
    Changed,
}

/// One event subscription
#[derive(Debug, Clone, Copy)]
struct NotificationEntry {
    state: SubscriptionState,
    /// Transaction label held open while `Interim`
    transaction: u8,
    /// Reporting interval in seconds; meaningful for playback position only
    interval: u32,
}

/// Per-session subscription table
#[derive(Debug, Default)]
pub struct NotificationManager {
    entries: FnvIndexMap<u8, NotificationEntry, MAX_NOTIFICATION_EVENTS>,
}

impl NotificationManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: FnvIndexMap::new(),
        }
    }

    /// Current state of an event subscription
    #[must_use]
    pub fn state(&self, event: Event) -> SubscriptionState {
        self.entries
            .get(&(event as u8))
            .map_or(SubscriptionState::Unregistered, |e| e.state)
    }

    /// Check whether a registration would be accepted
    ///
    /// # Errors
    /// Returns `Status::InvalidParam` for an event that is already in
    /// `Interim`; one outstanding registration per event type per session.
    pub fn can_register(&self, event: Event) -> Result<(), Status> {
        match self.state(event) {
            SubscriptionState::Interim => Err(Status::InvalidParam),
            _ => Ok(()),
        }
    }

    /// Record a registration whose interim response is being sent
    ///
    /// # Errors
    /// Returns `Status::InvalidParam` for a duplicate registration,
    /// `Status::InternalError` if the table is full (cannot happen with the
    /// full event id space mapped)
    pub fn register(&mut self, event: Event, interval: u32, transaction: u8) -> Result<(), Status> {
        self.can_register(event)?;
        self.entries
            .insert(
                event as u8,
                NotificationEntry {
                    state: SubscriptionState::Interim,
                    transaction,
                    interval,
                },
            )
            .map(|_| ())
            .map_err(|_| Status::InternalError)
    }

    /// Requested reporting interval of an outstanding registration
    ///
    /// Meaningful for [`Event::PlaybackPosChanged`] only; other events
    /// ignore the interval field of the register request.
    #[must_use]
    pub fn interval(&self, event: Event) -> Option<u32> {
        self.entries
            .get(&(event as u8))
            .filter(|e| e.state == SubscriptionState::Interim)
            .map(|e| e.interval)
    }

    /// Consume an interim subscription for its one-shot change push
    ///
    /// Returns the transaction label to push the changed response on, or
    /// `None` when nobody is subscribed. The entry moves to `Changed`;
    /// re-registration is required for further pushes.
    pub fn take_changed(&mut self, event: Event) -> Option<u8> {
        let entry = self.entries.get_mut(&(event as u8))?;
        if entry.state != SubscriptionState::Interim {
            return None;
        }

        entry.state = SubscriptionState::Changed;
        Some(entry.transaction)
    }

    /// Invalidate every player-scoped subscription
    ///
    /// Returns the (event, transaction label) pairs that were in `Interim`
    /// so the session can complete each with an `AddressedPlayerChanged`
    /// rejection. Invalidated entries are forced back to `Unregistered`.
    pub fn invalidate_player_scoped(&mut self) -> Vec<(Event, u8), 8> {
        let mut invalidated = Vec::new();
        for (&id, entry) in &mut self.entries {
            let Some(event) = Event::from_u8(id) else {
                continue;
            };
            if event.is_player_scoped() && entry.state == SubscriptionState::Interim {
                // Capacity 8 exceeds the five player-scoped events
                invalidated.push((event, entry.transaction)).ok();
                entry.state = SubscriptionState::Unregistered;
            }
        }
        invalidated
    }

    /// Drop every subscription (session teardown)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A local playback event to be pushed to a subscribed peer
///
/// Carries the event-specific payload in its typed form; the wire parameter
/// block (event id followed by the payload) is built by [`Self::params`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Playback status changed to the given play status value
    PlaybackStatusChanged(u8),
    /// Current track changed to the given element UID
    TrackChanged([u8; 8]),
    /// Playback reached the end of the current track
    TrackReachedEnd,
    /// Playback returned to the start of the current track
    TrackReachedStart,
    /// Playback position changed to the given offset in milliseconds
    PlaybackPosChanged(u32),
    /// Player application settings changed (attribute, value) pairs
    SettingsChanged(Vec<(u8, u8), 4>),
    /// The set of available players changed
    AvailablePlayersChanged,
    /// The addressed player changed
    AddressedPlayerChanged {
        /// New addressed player id
        player_id: u16,
        /// UID counter of the new player
        uid_counter: u16,
    },
    /// The UID counter changed
    UidsChanged(u16),
    /// Absolute volume changed (0..=0x7F)
    VolumeChanged(u8),
}

impl PlayerEvent {
    /// The notification event type this player event maps to
    #[must_use]
    pub const fn event(&self) -> Event {
        match self {
            Self::PlaybackStatusChanged(_) => Event::PlaybackStatusChanged,
            Self::TrackChanged(_) => Event::TrackChanged,
            Self::TrackReachedEnd => Event::TrackReachedEnd,
            Self::TrackReachedStart => Event::TrackReachedStart,
            Self::PlaybackPosChanged(_) => Event::PlaybackPosChanged,
            Self::SettingsChanged(_) => Event::SettingsChanged,
            Self::AvailablePlayersChanged => Event::AvailablePlayersChanged,
            Self::AddressedPlayerChanged { .. } => Event::AddressedPlayerChanged,
            Self::UidsChanged(_) => Event::UidsChanged,
            Self::VolumeChanged(_) => Event::VolumeChanged,
        }
    }

    /// Build the changed-notification parameter block: event id + payload
    #[must_use]
    pub fn params(&self) -> Vec<u8, 16> {
        let mut params = Vec::new();
        params.push(self.event() as u8).ok();
        match self {
            Self::PlaybackStatusChanged(status) => {
                params.push(*status).ok();
            }
            Self::TrackChanged(uid) => {
                params.extend_from_slice(uid).ok();
            }
            Self::PlaybackPosChanged(position) => {
                params.extend_from_slice(&position.to_be_bytes()).ok();
            }
            Self::SettingsChanged(pairs) => {
                #[allow(clippy::cast_possible_truncation)]
                params.push(pairs.len() as u8).ok();
                for (attribute, value) in pairs {
                    params.push(*attribute).ok();
                    params.push(*value).ok();
                }
            }
            Self::AddressedPlayerChanged {
                player_id,
                uid_counter,
            } => {
                params.extend_from_slice(&player_id.to_be_bytes()).ok();
                params.extend_from_slice(&uid_counter.to_be_bytes()).ok();
            }
            Self::UidsChanged(counter) => {
                params.extend_from_slice(&counter.to_be_bytes()).ok();
            }
            Self::VolumeChanged(volume) => {
                params.push(*volume & 0x7F).ok();
            }
            Self::TrackReachedEnd | Self::TrackReachedStart | Self::AvailablePlayersChanged => {}
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_take_changed_once() {
        let mut manager = NotificationManager::new();
        manager.register(Event::VolumeChanged, 0, 7).unwrap();
        assert_eq!(manager.state(Event::VolumeChanged), SubscriptionState::Interim);

        assert_eq!(manager.take_changed(Event::VolumeChanged), Some(7));
        assert_eq!(manager.state(Event::VolumeChanged), SubscriptionState::Changed);

        // One-shot: a second change finds no subscriber
        assert_eq!(manager.take_changed(Event::VolumeChanged), None);
    }

    #[test]
    fn test_interval_visible_while_interim() {
        let mut manager = NotificationManager::new();
        manager.register(Event::PlaybackPosChanged, 10, 2).unwrap();
        assert_eq!(manager.interval(Event::PlaybackPosChanged), Some(10));

        manager.take_changed(Event::PlaybackPosChanged).unwrap();
        assert_eq!(manager.interval(Event::PlaybackPosChanged), None);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut manager = NotificationManager::new();
        manager.register(Event::TrackChanged, 0, 1).unwrap();
        assert_eq!(
            manager.register(Event::TrackChanged, 0, 2),
            Err(Status::InvalidParam)
        );
    }

    #[test]
    fn test_reregistration_after_change_allowed() {
        let mut manager = NotificationManager::new();
        manager.register(Event::VolumeChanged, 0, 1).unwrap();
        manager.take_changed(Event::VolumeChanged).unwrap();

        manager.register(Event::VolumeChanged, 0, 9).unwrap();
        assert_eq!(manager.take_changed(Event::VolumeChanged), Some(9));
    }

    #[test]
    fn test_player_change_invalidates_scoped_entries_only() {
        let mut manager = NotificationManager::new();
        manager.register(Event::TrackChanged, 0, 1).unwrap();
        manager.register(Event::PlaybackStatusChanged, 0, 2).unwrap();
        manager.register(Event::PlaybackPosChanged, 5, 3).unwrap();
        manager.register(Event::VolumeChanged, 0, 4).unwrap();
        manager.register(Event::SettingsChanged, 0, 5).unwrap();

        let invalidated = manager.invalidate_player_scoped();
        assert_eq!(invalidated.len(), 3);
        assert!(invalidated.contains(&(Event::TrackChanged, 1)));
        assert!(invalidated.contains(&(Event::PlaybackStatusChanged, 2)));
        assert!(invalidated.contains(&(Event::PlaybackPosChanged, 3)));

        assert_eq!(manager.state(Event::TrackChanged), SubscriptionState::Unregistered);
        assert_eq!(manager.state(Event::VolumeChanged), SubscriptionState::Interim);
        assert_eq!(manager.state(Event::SettingsChanged), SubscriptionState::Interim);
    }

    #[test]
    fn test_event_scoping() {
        assert!(Event::TrackChanged.is_player_scoped());
        assert!(Event::PlaybackPosChanged.is_player_scoped());
        assert!(!Event::VolumeChanged.is_player_scoped());
        assert!(!Event::UidsChanged.is_player_scoped());
    }

    #[test]
    fn test_player_event_params() {
        assert_eq!(
            PlayerEvent::VolumeChanged(0x50).params().as_slice(),
            &[0x0D, 0x50]
        );
        assert_eq!(
            PlayerEvent::PlaybackStatusChanged(0x01).params().as_slice(),
            &[0x01, 0x01]
        );
        assert_eq!(
            PlayerEvent::TrackChanged([0, 0, 0, 0, 0, 0, 0, 9]).params().as_slice(),
            &[0x02, 0, 0, 0, 0, 0, 0, 0, 9]
        );
        assert_eq!(
            PlayerEvent::AddressedPlayerChanged {
                player_id: 0x0102,
                uid_counter: 0x0304,
            }
            .params()
            .as_slice(),
            &[0x0B, 0x01, 0x02, 0x03, 0x04]
        );
        assert_eq!(PlayerEvent::TrackReachedEnd.params().as_slice(), &[0x03]);
    }
}
