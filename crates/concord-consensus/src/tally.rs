use concord_core::Hash;
use serde::{Deserialize, Serialize};

use crate::members::MemberSet;

/// A distinct report hash and how many members currently back it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVariant {
    pub hash: Hash,
    pub support: u64,
}

/// Per-frame vote bookkeeping
///
/// Variants are kept in first-seen order for the latest reported ref slot.
/// Support is always derived from the members' latest reports, so a member
/// that changes its vote or leaves the committee stops counting at once.
#[derive(Debug, Clone, Default)]
pub struct ReportTally {
    ref_slot: u64,
    variants: Vec<Hash>,
    consensus: Option<(u64, Hash)>,
}

impl ReportTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, ref_slot: u64, report: Hash) {
        if self.ref_slot != ref_slot {
            self.ref_slot = ref_slot;
            self.variants.clear();
        }
        if !self.variants.contains(&report) {
            self.variants.push(report);
        }
    }

    pub fn variants(&self, ref_slot: u64, members: &MemberSet) -> Vec<ReportVariant> {
        if self.ref_slot != ref_slot {
            return Vec::new();
        }
        self.variants
            .iter()
            .map(|hash| ReportVariant {
                hash: *hash,
                support: members.support(ref_slot, hash),
            })
            .collect()
    }

    /// First variant, in first-seen order, whose support meets `quorum`
    pub fn winner(&self, ref_slot: u64, quorum: u64, members: &MemberSet) -> Option<ReportVariant> {
        self.variants(ref_slot, members)
            .into_iter()
            .find(|variant| variant.support > 0 && variant.support >= quorum)
    }

    /// Hash last handed to the report processor for `ref_slot`
    pub fn consensus_for(&self, ref_slot: u64) -> Option<Hash> {
        match self.consensus {
            Some((slot, hash)) if slot == ref_slot => Some(hash),
            _ => None,
        }
    }

    pub fn set_consensus(&mut self, ref_slot: u64, report: Option<Hash>) {
        self.consensus = report.map(|hash| (ref_slot, hash));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_core::Address;

    const HASH_1: Hash = Hash::repeat_byte(0x11);
    const HASH_2: Hash = Hash::repeat_byte(0x22);

    fn members_with_votes(votes: &[(u64, Hash)]) -> (MemberSet, ReportTally) {
        let mut members = MemberSet::new();
        let mut tally = ReportTally::new();
        for (i, (ref_slot, hash)) in votes.iter().enumerate() {
            let index = members.insert(Address::from_low_u8(i as u8 + 1)).unwrap();
            members.record_report(index, *ref_slot, *hash);
            tally.record(*ref_slot, *hash);
        }
        (members, tally)
    }

    #[test]
    fn test_variants_in_first_seen_order() {
        let (members, tally) = members_with_votes(&[(10, HASH_2), (10, HASH_1), (10, HASH_2)]);
        let variants = tally.variants(10, &members);
        assert_eq!(
            variants,
            vec![
                ReportVariant { hash: HASH_2, support: 2 },
                ReportVariant { hash: HASH_1, support: 1 },
            ]
        );
        assert!(tally.variants(11, &members).is_empty());
    }

    #[test]
    fn test_new_ref_slot_resets_variants() {
        let (members, mut tally) = members_with_votes(&[(10, HASH_1)]);
        tally.record(20, HASH_2);
        assert!(tally.variants(10, &members).is_empty());
        assert_eq!(tally.variants(20, &members)[0].hash, HASH_2);
    }

    #[test]
    fn test_winner_requires_quorum() {
        let (members, tally) = members_with_votes(&[(10, HASH_1), (10, HASH_2), (10, HASH_1)]);
        assert_eq!(tally.winner(10, 3, &members), None);
        assert_eq!(
            tally.winner(10, 2, &members),
            Some(ReportVariant { hash: HASH_1, support: 2 })
        );
    }

    #[test]
    fn test_abandoned_variant_has_no_support() {
        let (mut members, tally) = members_with_votes(&[(10, HASH_1)]);
        members.record_report(0, 10, HASH_2);
        let variants = tally.variants(10, &members);
        assert_eq!(variants[0], ReportVariant { hash: HASH_1, support: 0 });
    }

    #[test]
    fn test_consensus_is_scoped_to_ref_slot() {
        let mut tally = ReportTally::new();
        tally.set_consensus(10, Some(HASH_1));
        assert_eq!(tally.consensus_for(10), Some(HASH_1));
        assert_eq!(tally.consensus_for(20), None);
        tally.set_consensus(10, None);
        assert_eq!(tally.consensus_for(10), None);
    }
}
