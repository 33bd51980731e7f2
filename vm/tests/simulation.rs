use std::collections::HashSet;

use proptest::prelude::*;
use vm::{
    run_sweep, simulate, Organization, PageNumber, ReplacementPolicy, Selection, SimulationConfig,
    SimulationRequest, StepEvent, TlbPolicy,
};

fn config(
    frame_count: usize,
    policy: ReplacementPolicy,
    organization: Organization,
) -> SimulationConfig {
    SimulationConfig {
        frame_count,
        policy,
        organization,
        ..SimulationConfig::default()
    }
}

#[test]
fn test_all_policies_match_single_runs() {
    let reference = [7, 0, 1, 2, 0, 3, 0, 4, 2, 3, 0, 3, 2, 1, 2, 0, 1, 7, 0, 1];
    let base = SimulationConfig {
        frame_count: 3,
        tlb_size: 2,
        ..SimulationConfig::default()
    };

    let swept = run_sweep(&reference, &base, Selection::All, Organization::Single.into()).unwrap();
    assert_eq!(swept.len(), ReplacementPolicy::VARIANTS.len());

    for (result, policy) in swept.iter().zip(ReplacementPolicy::VARIANTS) {
        let direct = simulate(&reference, &SimulationConfig { policy, ..base.clone() }).unwrap();
        assert_eq!(result, &direct, "{policy} differs when run in a sweep");
    }
}

#[test]
fn test_textbook_fault_counts() {
    let reference = [7, 0, 1, 2, 0, 3, 0, 4, 2, 3, 0, 3, 2, 1, 2, 0, 1, 7, 0, 1];
    let faults = |policy| {
        simulate(&reference, &config(3, policy, Organization::Single))
            .unwrap()
            .total_page_faults
    };

    assert_eq!(faults(ReplacementPolicy::Fifo), 15);
    assert_eq!(faults(ReplacementPolicy::Lru), 12);
    assert_eq!(faults(ReplacementPolicy::Optimal), 9);
}

#[test]
fn test_page_table_dump_shapes() {
    let reference = [3, 14, 27];
    let json = |organization| {
        let fifo = config(3, ReplacementPolicy::Fifo, organization);
        let result = simulate(&reference, &fifo).unwrap();
        serde_json::to_value(&result.page_table).unwrap()
    };

    assert_eq!(
        json(Organization::Single),
        serde_json::json!({ "single": { "3": 0, "14": 1, "27": 2 } })
    );
    assert_eq!(
        json(Organization::Multi),
        serde_json::json!({ "multi": { "0": { "3": 0 }, "1": { "14": 1 }, "2": { "27": 2 } } })
    );
    assert_eq!(
        json(Organization::Inverted),
        serde_json::json!({ "inverted": { "0": 3, "1": 14, "2": 27 } })
    );
}

#[test]
fn test_result_json_shape() {
    let request: SimulationRequest = serde_json::from_str(
        r#"{ "reference_stream": [1, 2, 1], "frame_count": 1, "policy": "lru", "tlb_size": 1 }"#,
    )
    .unwrap();
    let results = request.execute(&SimulationConfig::default()).unwrap();
    let value = serde_json::to_value(&results).unwrap();

    let first = &value[0];
    assert_eq!(first["organization"], "SINGLE");
    assert_eq!(first["algorithm"], "LRU");
    assert_eq!(first["total_page_faults"], 3);
    assert_eq!(first["total_hits"], 0);
    assert_eq!(first["tlb_misses"], 3);
    assert_eq!(first["final_memory_state"], serde_json::json!([1]));
    assert_eq!(
        first["history"][1],
        serde_json::json!({
            "step": 2,
            "page": 2,
            "memory": [2],
            "event": "fault",
            "action": "Replaced page 1 (frame 0)"
        })
    );
}

#[test]
fn test_malformed_request_json_is_rejected() {
    let parsed = serde_json::from_str::<SimulationRequest>(
        r#"{ "reference_stream": [1, "x"], "frame_count": 1, "policy": "lru" }"#,
    );
    assert!(parsed.is_err());
}

fn reference_strategy() -> impl Strategy<Value = Vec<PageNumber>> {
    prop::collection::vec(0usize..12, 0..60)
}

fn policy_strategy() -> impl Strategy<Value = ReplacementPolicy> {
    prop::sample::select(ReplacementPolicy::VARIANTS.to_vec())
}

fn organization_strategy() -> impl Strategy<Value = Organization> {
    prop::sample::select(Organization::VARIANTS.to_vec())
}

proptest! {
    #[test]
    fn prop_counts_add_up(
        reference in reference_strategy(),
        frames in 1usize..6,
        policy in policy_strategy(),
        organization in organization_strategy(),
        tlb_size in 0usize..4,
    ) {
        let result = simulate(&reference, &SimulationConfig {
            tlb_size,
            ..config(frames, policy, organization)
        }).unwrap();

        prop_assert_eq!(result.total_hits + result.total_page_faults, reference.len());
        prop_assert_eq!(result.tlb_hits + result.tlb_misses, reference.len());
        if reference.is_empty() {
            prop_assert_eq!(result.hit_ratio, 0.0);
            prop_assert_eq!(result.fault_ratio, 0.0);
        } else {
            prop_assert!((result.hit_ratio + result.fault_ratio - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_frames_hold_distinct_pages(
        reference in reference_strategy(),
        frames in 1usize..6,
        policy in policy_strategy(),
        organization in organization_strategy(),
    ) {
        let result = simulate(&reference, &config(frames, policy, organization)).unwrap();

        for record in &result.history {
            prop_assert_eq!(record.memory.len(), frames);
            let occupied: Vec<_> = record.memory.iter().flatten().collect();
            let distinct: HashSet<_> = occupied.iter().collect();
            prop_assert_eq!(occupied.len(), distinct.len());
            prop_assert!(record.memory.contains(&Some(record.page)));
        }
    }

    #[test]
    fn prop_organization_does_not_change_outcome(
        reference in reference_strategy(),
        frames in 1usize..6,
        policy in policy_strategy(),
    ) {
        let single = simulate(&reference, &config(frames, policy, Organization::Single)).unwrap();
        for organization in [Organization::Multi, Organization::Inverted] {
            let other = simulate(&reference, &config(frames, policy, organization)).unwrap();
            prop_assert_eq!(&single.history, &other.history);
            prop_assert_eq!(&single.final_memory_state, &other.final_memory_state);
        }
    }

    #[test]
    fn prop_replaying_history_is_deterministic(
        reference in reference_strategy(),
        frames in 1usize..6,
        policy in policy_strategy(),
        organization in organization_strategy(),
    ) {
        let cfg = config(frames, policy, organization);
        let first = simulate(&reference, &cfg).unwrap();
        let replayed = simulate(&first.reference_stream(), &cfg).unwrap();

        let snapshots = |r: &vm::SimulationResult| {
            r.history.iter().map(|s| s.memory.clone()).collect::<Vec<_>>()
        };
        prop_assert_eq!(snapshots(&first), snapshots(&replayed));
        prop_assert_eq!(first, replayed);
    }

    #[test]
    fn prop_optimal_never_worse(
        reference in reference_strategy(),
        frames in 1usize..6,
    ) {
        let single = |policy| config(frames, policy, Organization::Single);
        let optimal = simulate(&reference, &single(ReplacementPolicy::Optimal)).unwrap();
        for policy in ReplacementPolicy::VARIANTS {
            let other = simulate(&reference, &single(policy)).unwrap();
            prop_assert!(optimal.total_page_faults <= other.total_page_faults);
        }
    }

    #[test]
    fn prop_hits_only_on_resident_pages(
        reference in reference_strategy(),
        frames in 1usize..6,
        policy in policy_strategy(),
    ) {
        let result = simulate(&reference, &config(frames, policy, Organization::Single)).unwrap();

        let mut previous: Vec<Option<PageNumber>> = vec![None; frames];
        for record in &result.history {
            let was_resident = previous.contains(&Some(record.page));
            prop_assert_eq!(record.event == StepEvent::Hit, was_resident);
            previous = record.memory.clone();
        }
    }

    #[test]
    fn prop_single_entry_tlb_policies_agree(
        reference in prop::collection::vec(0usize..40, 0..40),
    ) {
        // With a single entry the two TLB policies are indistinguishable.
        let run = |tlb_policy| {
            simulate(&reference, &SimulationConfig {
                tlb_size: 1,
                tlb_policy,
                ..SimulationConfig::default()
            }).unwrap()
        };
        let fifo = run(TlbPolicy::Fifo);
        let lru = run(TlbPolicy::Lru);
        prop_assert_eq!(fifo.tlb_hits, lru.tlb_hits);
    }
}
