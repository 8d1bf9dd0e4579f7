//! Room registry: the monitored rooms and their per-room mutable state

use regex::Regex;

use crate::config::{InclusionFilter, RoomGroup};
use crate::detector::Decision;
use crate::room_api::{RoomApiClient, RoomStatus};

/// One watched room. Mutated every poll cycle by the detector decision;
/// never removed during a run (eviction only marks it skipped).
#[derive(Debug, Clone)]
pub struct RoomEntry {
    pub identity: String,
    pub display_name: String,
    pub is_live: bool,
    /// Dedup flag: true once a fire has been acted on for the current live
    /// session; cleared only on reset
    pub notification_dispatched: bool,
    pub consecutive_not_found: u32,
    pub evicted: bool,
}

impl RoomEntry {
    fn new(status: RoomStatus) -> Self {
        Self {
            identity: status.identity,
            display_name: status.display_name,
            is_live: status.is_live,
            notification_dispatched: false,
            consecutive_not_found: 0,
            evicted: false,
        }
    }

    /// Apply a detector decision together with the status it was derived
    /// from. The display name tracks the latest fetch regardless of the
    /// decision.
    pub fn apply(&mut self, status: &RoomStatus, decision: Decision) {
        self.display_name = status.display_name.clone();
        self.consecutive_not_found = 0;
        match decision {
            Decision::Fire => {
                self.notification_dispatched = true;
                self.is_live = true;
            }
            Decision::Reset => {
                self.notification_dispatched = false;
                self.is_live = false;
            }
            Decision::Suppress | Decision::Noop => {}
        }
    }
}

/// Compiled inclusion filter
struct CompiledFilter {
    pattern: Regex,
    require_name_contains: String,
}

impl CompiledFilter {
    fn excludes(&self, identity: &str, display_name: &str) -> bool {
        self.pattern.is_match(identity) && !display_name.contains(&self.require_name_contains)
    }
}

fn compile_filters(filters: &[InclusionFilter]) -> crate::Result<Vec<CompiledFilter>> {
    filters
        .iter()
        .map(|f| {
            let pattern = Regex::new(&f.identity_pattern).map_err(|e| {
                crate::WatchError::Config(format!(
                    "Invalid filter pattern '{}': {}",
                    f.identity_pattern, e
                ))
            })?;
            Ok(CompiledFilter {
                pattern,
                require_name_contains: f.require_name_contains.clone(),
            })
        })
        .collect()
}

/// The set of monitored rooms, fixed after initialization
#[derive(Debug, Default)]
pub struct RoomRegistry {
    entries: Vec<RoomEntry>,
}

impl RoomRegistry {
    /// Build the registry from the configured groups. Each identity gets one
    /// seed fetch; rooms whose seed fetch fails are logged and dropped, and
    /// rooms excluded by a filter are skipped. No notification is dispatched
    /// here: a room found already live starts with a clear dedup flag and
    /// fires on the first polling pass.
    pub async fn initialize(
        groups: &[RoomGroup],
        filters: &[InclusionFilter],
        api: &RoomApiClient,
    ) -> crate::Result<Self> {
        let compiled = compile_filters(filters)?;
        let mut entries = Vec::new();

        for group in groups {
            for identity in &group.members {
                match api.fetch(identity).await {
                    Ok(status) => {
                        if let Some(filter) = compiled
                            .iter()
                            .find(|f| f.excludes(identity, &status.display_name))
                        {
                            tracing::info!(
                                "Excluding room '{}' ('{}'): name does not contain '{}'",
                                identity,
                                status.display_name,
                                filter.require_name_contains
                            );
                            continue;
                        }
                        tracing::debug!(
                            "Seeded room '{}' ('{}', live={}) from group '{}'",
                            identity,
                            status.display_name,
                            status.is_live,
                            group.name
                        );
                        entries.push(RoomEntry::new(status));
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Dropping room '{}' from group '{}': initial fetch failed: {}",
                            identity,
                            group.name,
                            e
                        );
                    }
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RoomEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> &RoomEntry {
        &self.entries[index]
    }

    pub fn entry_mut(&mut self, index: usize) -> &mut RoomEntry {
        &mut self.entries[index]
    }

    pub fn find(&self, identity: &str) -> Option<&RoomEntry> {
        self.entries.iter().find(|e| e.identity == identity)
    }

    /// Record a domain not-found outcome for one room. Returns true if this
    /// observation evicted the room under the given policy. State is
    /// otherwise untouched; a later successful fetch resets the counter.
    pub fn record_not_found(&mut self, index: usize, evict_after: Option<u32>) -> bool {
        let entry = &mut self.entries[index];
        entry.consecutive_not_found += 1;
        if let Some(threshold) = evict_after {
            if entry.consecutive_not_found >= threshold && !entry.evicted {
                entry.evicted = true;
                return true;
            }
        }
        false
    }
}
