use std::collections::HashMap;

use concord_core::{Address, Hash};
use serde::{Deserialize, Serialize};

use crate::error::ConsensusError;

/// Quorum value no tally can ever reach
pub const UNREACHABLE_QUORUM: u64 = u64::MAX;

/// Smallest quorum that is a strict majority of `total_members`
pub fn min_quorum(total_members: usize) -> u64 {
    total_members as u64 / 2 + 1
}

pub fn validate_quorum(quorum: u64, total_members: usize) -> Result<(), ConsensusError> {
    let min_quorum = min_quorum(total_members);
    if quorum < min_quorum {
        return Err(ConsensusError::QuorumTooSmall {
            min_quorum,
            received: quorum,
        });
    }
    Ok(())
}

/// A member's latest report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberState {
    pub last_report_ref_slot: u64,
    pub last_report_hash: Hash,
}

/// Ordered committee roster
///
/// Roster order drives fast lane rotation. Removal moves the last member into
/// the vacated position.
#[derive(Debug, Clone, Default)]
pub struct MemberSet {
    addresses: Vec<Address>,
    states: Vec<MemberState>,
    indices: HashMap<Address, usize>,
}

impl MemberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.indices.contains_key(address)
    }

    pub fn index_of(&self, address: &Address) -> Option<usize> {
        self.indices.get(address).copied()
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn get(&self, address: &Address) -> Option<&MemberState> {
        self.index_of(address).map(|index| &self.states[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &MemberState)> {
        self.addresses.iter().zip(self.states.iter())
    }

    /// Append a member, returning its roster index
    pub fn insert(&mut self, address: Address) -> Result<usize, ConsensusError> {
        if self.contains(&address) {
            return Err(ConsensusError::DuplicateMember(address));
        }
        if address.is_zero() {
            return Err(ConsensusError::AddressCannotBeZero);
        }
        let index = self.addresses.len();
        self.addresses.push(address);
        self.states.push(MemberState::default());
        self.indices.insert(address, index);
        Ok(index)
    }

    /// Remove a member, returning its last report state
    pub fn remove(&mut self, address: &Address) -> Result<MemberState, ConsensusError> {
        let index = self
            .indices
            .remove(address)
            .ok_or(ConsensusError::NonMember(*address))?;
        self.addresses.swap_remove(index);
        let state = self.states.swap_remove(index);
        if let Some(moved) = self.addresses.get(index) {
            self.indices.insert(*moved, index);
        }
        Ok(state)
    }

    pub(crate) fn state_at(&self, index: usize) -> &MemberState {
        &self.states[index]
    }

    pub(crate) fn record_report(&mut self, index: usize, ref_slot: u64, report: Hash) {
        self.states[index] = MemberState {
            last_report_ref_slot: ref_slot,
            last_report_hash: report,
        };
    }

    /// Number of members whose latest report for `ref_slot` is `report`
    pub fn support(&self, ref_slot: u64, report: &Hash) -> u64 {
        self.states
            .iter()
            .filter(|state| state.last_report_ref_slot == ref_slot && state.last_report_hash == *report)
            .count() as u64
    }

    /// Whether the member at `index` is in the fast lane of frame `frame_index`.
    ///
    /// The lane is a window of `quorum` consecutive roster positions starting
    /// at `frame_index mod len`, wrapping around the end of the roster. With a
    /// quorum covering the whole roster every member is in the lane.
    pub fn is_fast_lane(&self, index: usize, frame_index: u64, quorum: u64) -> bool {
        let total = self.len() as u64;
        if quorum >= total {
            return index < self.len();
        }
        let start = frame_index % total;
        let past_end = start + quorum;
        let index = index as u64;
        (start <= index && index < past_end) || index + total < past_end
    }

    pub fn fast_lane_members(&self, frame_index: u64, quorum: u64) -> Vec<Address> {
        self.addresses
            .iter()
            .enumerate()
            .filter(|(index, _)| self.is_fast_lane(*index, frame_index, quorum))
            .map(|(_, address)| *address)
            .collect()
    }
}
