//! Shared state for room statuses and alert history

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::notifier::AlertRecord;
use crate::registry::RoomEntry;

/// Dashboard-visible status of a single room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub identity: String,
    pub display_name: String,
    pub is_live: bool,
    pub notification_dispatched: bool,
    pub evicted: bool,
    pub last_poll_epoch_ms: u64,
    pub consecutive_errors: u32,
}

impl RoomSnapshot {
    pub fn seed(entry: &RoomEntry) -> Self {
        Self {
            identity: entry.identity.clone(),
            display_name: entry.display_name.clone(),
            is_live: entry.is_live,
            notification_dispatched: entry.notification_dispatched,
            evicted: entry.evicted,
            last_poll_epoch_ms: 0,
            consecutive_errors: 0,
        }
    }
}

/// Shared state accessible by the engine and the dashboard
#[derive(Debug)]
pub struct SharedState {
    pub rooms: Vec<RoomSnapshot>,
    pub history: VecDeque<AlertRecord>,
    pub history_max_size: usize,
}

impl SharedState {
    pub fn new(rooms: Vec<RoomSnapshot>, history_max_size: usize) -> Self {
        Self {
            rooms,
            history: VecDeque::with_capacity(history_max_size),
            history_max_size,
        }
    }

    /// Refresh a room's snapshot after a successful poll
    pub fn update_room(&mut self, entry: &RoomEntry, now_ms: u64) {
        if let Some(snapshot) = self.rooms.iter_mut().find(|r| r.identity == entry.identity) {
            snapshot.display_name = entry.display_name.clone();
            snapshot.is_live = entry.is_live;
            snapshot.notification_dispatched = entry.notification_dispatched;
            snapshot.evicted = entry.evicted;
            snapshot.last_poll_epoch_ms = now_ms;
            snapshot.consecutive_errors = 0;
        }
    }

    /// Record a failed poll, returning the new consecutive error count
    pub fn record_room_error(&mut self, identity: &str, now_ms: u64) -> u32 {
        if let Some(snapshot) = self.rooms.iter_mut().find(|r| r.identity == identity) {
            snapshot.last_poll_epoch_ms = now_ms;
            snapshot.consecutive_errors += 1;
            snapshot.consecutive_errors
        } else {
            0
        }
    }

    pub fn mark_evicted(&mut self, identity: &str) {
        if let Some(snapshot) = self.rooms.iter_mut().find(|r| r.identity == identity) {
            snapshot.evicted = true;
        }
    }

    /// Add an alert record to history
    pub fn add_alert(&mut self, record: AlertRecord) {
        if self.history.len() >= self.history_max_size {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(rooms: Vec<RoomSnapshot>, history_max_size: usize) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(rooms, history_max_size)))
}
