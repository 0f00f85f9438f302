// src/core/route.rs

//! Hop sequence extraction and route comparison.

use crate::core::models::{ComparisonResult, HopMap, HopSequence};

/// Projects a hop map onto its addresses, ordered by ascending hop number.
///
/// Unreached hops are kept: the `reached` flag does not truncate the sequence.
pub fn extract_sequence(hop_map: &HopMap) -> HopSequence {
    let mut hops: Vec<_> = hop_map.iter().collect();
    hops.sort_unstable_by_key(|(ttl, _)| **ttl);
    hops.into_iter()
        .map(|(_, hop)| hop.address.clone())
        .collect::<Vec<_>>()
        .into()
}

/// Ordered positional comparison. Any length or address mismatch is a divergence.
pub fn compare_routes(standard: HopSequence, target: HopSequence) -> ComparisonResult {
    if standard == target {
        ComparisonResult::Identical
    } else {
        ComparisonResult::Divergent { standard, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Hop;

    fn map(entries: &[(u8, &str, bool)]) -> HopMap {
        entries
            .iter()
            .map(|(ttl, addr, reached)| (*ttl, Hop::new(*addr, *reached)))
            .collect()
    }

    fn seq(addrs: &[&str]) -> HopSequence {
        addrs.iter().map(|a| a.to_string()).collect::<Vec<_>>().into()
    }

    #[test]
    fn extract_sorts_by_hop_number() {
        let hops = map(&[
            (5, "207.46.47.14", true),
            (1, "192.168.1.1", false),
            (3, "200.115.195.33", false),
        ]);
        let sequence = extract_sequence(&hops);
        assert_eq!(sequence, seq(&["192.168.1.1", "200.115.195.33", "207.46.47.14"]));
        assert_eq!(sequence.len(), hops.len());
    }

    #[test]
    fn extract_keeps_unreached_hops() {
        let hops = map(&[(1, "a", false), (2, "b", true), (3, "c", false)]);
        assert_eq!(extract_sequence(&hops), seq(&["a", "b", "c"]));
    }

    #[test]
    fn extract_handles_high_and_sparse_ttls() {
        let hops = map(&[(255, "z", true), (12, "m", false), (2, "b", false)]);
        assert_eq!(extract_sequence(&hops), seq(&["b", "m", "z"]));
    }

    #[test]
    fn extract_empty_map() {
        assert!(extract_sequence(&HopMap::new()).is_empty());
    }

    #[test]
    fn same_sequence_is_identical() {
        let a = seq(&["10.0.0.1", "10.0.0.2"]);
        assert_eq!(compare_routes(a.clone(), a), ComparisonResult::Identical);
        assert_eq!(compare_routes(seq(&[]), seq(&[])), ComparisonResult::Identical);
    }

    #[test]
    fn positional_mismatch_diverges() {
        let a = seq(&["A", "B", "C"]);
        let b = seq(&["A", "D", "C"]);
        assert_eq!(
            compare_routes(a.clone(), b.clone()),
            ComparisonResult::Divergent { standard: a, target: b }
        );
    }

    #[test]
    fn length_mismatch_diverges() {
        let a = seq(&["A", "B"]);
        let b = seq(&["A", "B", "C"]);
        assert!(matches!(compare_routes(a, b), ComparisonResult::Divergent { .. }));
    }

    #[test]
    fn reordering_diverges() {
        let a = seq(&["A", "B"]);
        let b = seq(&["B", "A"]);
        assert!(matches!(compare_routes(a, b), ComparisonResult::Divergent { .. }));
    }
}
