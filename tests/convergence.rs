//! Multi-router convergence scenarios, driven entirely in memory: routers
//! exchange advertisements through a delivery queue until no table changes,
//! then the resulting tables are checked against an independently computed
//! all-pairs shortest-path baseline.

use std::collections::{HashMap, VecDeque};

use dv_router::RouterId;
use dv_router::protocol::{Advertisement, Cost, Phase, RouterCore};

type Link = (&'static str, &'static str, u32);

fn build(nodes: &[&str], links: &[Link]) -> HashMap<RouterId, RouterCore> {
    let universe: Vec<RouterId> = nodes.iter().map(|s| s.to_string()).collect();

    let mut per_node: HashMap<&str, Vec<(RouterId, u32)>> = HashMap::new();
    for (a, b, cost) in links {
        per_node.entry(a).or_default().push((b.to_string(), *cost));
        per_node.entry(b).or_default().push((a.to_string(), *cost));
    }

    nodes
        .iter()
        .map(|name| {
            let links = per_node.remove(name).unwrap_or_default();
            (
                name.to_string(),
                RouterCore::new(name.to_string(), &universe, links),
            )
        })
        .collect()
}

/// Deliver advertisements until the network is quiescent. Every table
/// change triggers a re-broadcast to the sender's neighbors, mirroring the
/// triggered-update rule of the transport loop.
fn run_to_quiescence(cores: &mut HashMap<RouterId, RouterCore>) {
    let mut queue: VecDeque<(RouterId, Advertisement)> = VecDeque::new();

    for core in cores.values() {
        let adv = core.advertisement();
        for neighbor in core.neighbors() {
            queue.push_back((neighbor.clone(), adv.clone()));
        }
    }

    while let Some((to, adv)) = queue.pop_front() {
        let core = cores.get_mut(&to).expect("advertisement to unknown node");
        if core.apply_advertisement(adv) {
            let adv = core.advertisement();
            let neighbors: Vec<RouterId> = core.neighbors().cloned().collect();
            for neighbor in neighbors {
                queue.push_back((neighbor, adv.clone()));
            }
        }
    }
}

/// Floyd-Warshall over the undirected topology, as the oracle.
fn all_pairs_baseline(nodes: &[&str], links: &[Link]) -> HashMap<(String, String), u64> {
    const UNREACHED: u64 = u64::MAX / 2;

    let mut dist: HashMap<(String, String), u64> = HashMap::new();
    for a in nodes {
        for b in nodes {
            let d = if a == b { 0 } else { UNREACHED };
            dist.insert((a.to_string(), b.to_string()), d);
        }
    }
    for (a, b, cost) in links {
        let d = u64::from(*cost);
        dist.insert((a.to_string(), b.to_string()), d);
        dist.insert((b.to_string(), a.to_string()), d);
    }

    for k in nodes {
        for i in nodes {
            for j in nodes {
                let through = dist[&(i.to_string(), k.to_string())]
                    + dist[&(k.to_string(), j.to_string())];
                let key = (i.to_string(), j.to_string());
                if through < dist[&key] {
                    dist.insert(key, through);
                }
            }
        }
    }

    dist
}

fn assert_matches_baseline(nodes: &[&str], links: &[Link]) {
    let mut cores = build(nodes, links);
    run_to_quiescence(&mut cores);

    let baseline = all_pairs_baseline(nodes, links);
    for (name, core) in &cores {
        assert!(
            core.is_converged(),
            "router {} not converged after quiescence",
            name
        );
        for dest in nodes {
            let expected = baseline[&(name.clone(), dest.to_string())];
            let actual = core.table().cost(&dest.to_string());
            assert_eq!(
                actual,
                Cost::Finite(expected as u32),
                "router {} cost to {}",
                name,
                dest
            );
        }
    }
}

#[test]
fn triangle_routes_through_cheaper_two_hop_path() {
    let nodes = ["A", "B", "C"];
    let links = [("A", "B", 1), ("B", "C", 1), ("A", "C", 5)];

    let mut cores = build(&nodes, &links);
    run_to_quiescence(&mut cores);

    let a_to_c = cores["A"].table().get(&"C".to_string()).unwrap();
    assert_eq!(a_to_c.next_hop, "B");
    assert_eq!(a_to_c.cost, Cost::Finite(2));

    assert_matches_baseline(&nodes, &links);
}

#[test]
fn line_topology_matches_all_pairs_baseline() {
    assert_matches_baseline(
        &["A", "B", "C", "D", "E", "F"],
        &[
            ("A", "B", 3),
            ("B", "C", 1),
            ("C", "D", 7),
            ("D", "E", 2),
            ("E", "F", 4),
        ],
    );
}

#[test]
fn mesh_with_redundant_paths_matches_baseline() {
    assert_matches_baseline(
        &["A", "B", "C", "D", "E", "F"],
        &[
            ("A", "B", 2),
            ("A", "C", 5),
            ("B", "C", 1),
            ("B", "D", 2),
            ("C", "E", 1),
            ("D", "E", 3),
            ("D", "F", 1),
            ("E", "F", 4),
        ],
    );
}

#[test]
fn self_routes_stay_fixed_through_convergence() {
    let nodes = ["A", "B", "C", "D"];
    let links = [("A", "B", 1), ("B", "C", 2), ("C", "D", 1), ("A", "D", 9)];

    let mut cores = build(&nodes, &links);
    run_to_quiescence(&mut cores);

    for (name, core) in &cores {
        let own = core.table().get(name).unwrap();
        assert_eq!(&own.next_hop, name);
        assert_eq!(own.cost, Cost::Finite(0));
    }
}

#[test]
fn nobody_is_converged_before_any_exchange() {
    let cores = build(&["A", "B", "C"], &[("A", "B", 1), ("B", "C", 1)]);
    for core in cores.values() {
        assert!(!core.is_converged());
    }
}

#[test]
fn flood_counters_climb_until_a_router_shuts_down() {
    let nodes = ["A", "B", "C", "D", "E", "F"];
    let links = [
        ("A", "B", 1),
        ("B", "C", 1),
        ("C", "D", 1),
        ("D", "E", 1),
        ("E", "F", 1),
    ];
    let mut cores = build(&nodes, &links);
    run_to_quiescence(&mut cores);

    // Walk the flood down the line: the root emits counter 0, each relay
    // adds one, and whoever would emit 6 goes silent and shuts down.
    let mut counter = cores.get_mut("A").unwrap().initiate_flood();
    assert_eq!(counter, 0);

    for relay in ["B", "C", "D", "E", "F"] {
        let core = cores.get_mut(relay).unwrap();
        match core.relay_flood(counter) {
            Some(next) => {
                assert_eq!(next, counter + 1);
                assert_eq!(core.phase(), Phase::Flooding);
                counter = next;
            }
            None => panic!("router {} shut down before the bound", relay),
        }
    }
    assert_eq!(counter, 5);

    // The message comes back to E carrying 5: its outgoing counter would
    // be 6, so it sends nothing and terminates.
    let e = cores.get_mut("E").unwrap();
    assert_eq!(e.relay_flood(counter), None);
    assert_eq!(e.phase(), Phase::Shutdown);
}
