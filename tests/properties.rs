//! Property tests: round-trip and deep copy over arbitrary random pointers.

use proptest::prelude::*;
use std::sync::Arc;

use linked_graph_codec::{
    build_chain, chain, decode_list, deep_copy, encode_list, ListSerializer, ListSnapshot,
    NodeRef, SerializerConfig,
};

/// Payloads plus, per node, an optional random target index.
fn list_strategy() -> impl Strategy<Value = (Vec<String>, Vec<Option<usize>>)> {
    (1usize..40).prop_flat_map(|n| {
        (
            prop::collection::vec(".{0,12}", n),
            prop::collection::vec(prop::option::of(0..n), n),
        )
    })
}

fn build(values: &[String], randoms: &[Option<usize>]) -> Vec<NodeRef> {
    let nodes = build_chain(values.iter().cloned());
    for (node, target) in nodes.iter().zip(randoms) {
        node.set_random(target.map(|t| &nodes[t]));
    }
    nodes
}

proptest! {
    #[test]
    fn prop_round_trip_preserves_topology((values, randoms) in list_strategy()) {
        let nodes = build(&values, &randoms);
        let head = decode_list(&encode_list(&nodes[0]).unwrap()).unwrap();

        let original = ListSnapshot::capture(&nodes[0]);
        let decoded = ListSnapshot::capture(&head);
        prop_assert_eq!(&decoded, &original);
        prop_assert!(decoded.back_links_consistent);
    }

    #[test]
    fn prop_deep_copy_preserves_topology_with_new_nodes((values, randoms) in list_strategy()) {
        let nodes = build(&values, &randoms);
        let copy = deep_copy(&nodes[0]).unwrap();

        prop_assert_eq!(ListSnapshot::capture(&copy), ListSnapshot::capture(&nodes[0]));
        for copied in chain(&copy) {
            prop_assert!(nodes.iter().all(|n| !Arc::ptr_eq(n, &copied)));
        }
    }

    #[test]
    fn prop_parallel_matches_sequential((values, randoms) in list_strategy()) {
        let nodes = build(&values, &randoms);
        let parallel = ListSerializer::with_config(
            SerializerConfig::default().with_parallel_threshold(0),
        ).unwrap();
        let sequential = ListSerializer::with_config(
            SerializerConfig::default().with_parallel_threshold(usize::MAX),
        ).unwrap();

        let a = parallel.decode(&parallel.encode(&nodes[0]).unwrap()).unwrap();
        let b = sequential.decode(&sequential.encode(&nodes[0]).unwrap()).unwrap();
        prop_assert_eq!(ListSnapshot::capture(&a), ListSnapshot::capture(&b));
    }

    #[test]
    fn prop_truncation_never_yields_a_list(
        (values, randoms) in list_strategy(),
        cut in any::<prop::sample::Index>(),
    ) {
        let nodes = build(&values, &randoms);
        let buf = encode_list(&nodes[0]).unwrap();
        let len = cut.index(buf.len());
        prop_assert!(decode_list(&buf[..len]).is_err());
    }
}
