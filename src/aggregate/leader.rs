//! Leader selection over the aggregate table
//!
//! The leader is the device with the greatest accumulated time across the two
//! scored activity states. Iteration order is the fixed device order, and
//! only a strictly greater score replaces the current leader, so the first
//! device wins ties. All-zero totals still yield a leader; only an empty
//! table (no known devices at all) yields none.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::AggregateTable;
use crate::devices::CatDevice;

/// State labels that count toward the leader score
pub const SCORED_STATES: [&str; 2] = ["Wander Time", "Moonwalk Time"];

/// A device's Wander + Moonwalk total, with missing labels defaulting to zero
pub fn leader_score(table: &AggregateTable, device: CatDevice) -> u64 {
    let Some(states) = table.get(device.id()) else {
        return 0;
    };
    SCORED_STATES
        .iter()
        .map(|label| states.get(*label).copied().unwrap_or(0))
        .sum()
}

/// Pick the current leader from an aggregate table
pub fn select_leader(table: &AggregateTable) -> Option<CatDevice> {
    let mut leader: Option<CatDevice> = None;
    let mut best: Option<u64> = None;

    for device in CatDevice::all() {
        if !table.contains_key(device.id()) {
            continue;
        }
        let score = leader_score(table, device);
        if best.map_or(true, |b| score > b) {
            best = Some(score);
            leader = Some(device);
        }
    }

    leader
}

/// Per-device scores alongside the winner, for the REST view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderBoard {
    /// Winning device id, if any device is known
    pub leader: Option<String>,

    /// Wander + Moonwalk total per device id
    pub scores: BTreeMap<String, u64>,
}

impl LeaderBoard {
    /// Build the board from an aggregate table
    pub fn from_table(table: &AggregateTable) -> Self {
        let scores = CatDevice::all()
            .into_iter()
            .filter(|d| table.contains_key(d.id()))
            .map(|d| (d.id().to_string(), leader_score(table, d)))
            .collect();

        Self {
            leader: select_leader(table).map(|d| d.id().to_string()),
            scores,
        }
    }
}
