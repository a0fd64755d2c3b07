//! End-to-end checks of the analyzer against realistic topologies.

use servicemap_core::{
    Criticality, HealthStatus, ServiceNode, ServiceRelationship, TopologySnapshot,
};
use servicemap_graph::{edge_weight, CriticalPath, TopologyAnalyzer};

/// A small e-commerce topology:
///
/// ```text
/// gateway -> orders -> payments -> ledger
///         -> catalog -> search     ^
///            orders  -> inventory -+ (inventory -> ledger)
/// ```
fn shop() -> TopologySnapshot {
    let nodes = vec![
        ServiceNode::new("gateway", "gateway").with_criticality(Criticality::High),
        ServiceNode::new("orders", "service").with_criticality(Criticality::Critical),
        ServiceNode::new("payments", "service").with_criticality(Criticality::Critical),
        ServiceNode::new("ledger", "database"),
        ServiceNode::new("catalog", "service").with_criticality(Criticality::Medium),
        ServiceNode::new("search", "service").with_criticality(Criticality::Low),
        ServiceNode::new("inventory", "service"),
    ];

    let edges = vec![
        ServiceRelationship::new("r1", "gateway", "orders", "http")
            .with_latency(40.0)
            .with_traffic_volume(1200.0),
        ServiceRelationship::new("r2", "orders", "payments", "grpc")
            .with_latency(120.0)
            .with_error_rate(0.02),
        ServiceRelationship::new("r3", "payments", "ledger", "sql").with_latency(15.0),
        ServiceRelationship::new("r4", "gateway", "catalog", "http").with_latency(25.0),
        ServiceRelationship::new("r5", "catalog", "search", "http"),
        ServiceRelationship::new("r6", "orders", "inventory", "grpc").with_latency(30.0),
        ServiceRelationship::new("r7", "inventory", "ledger", "sql"),
        // Dangling: the catalog has no "audit" service
        ServiceRelationship::new("r8", "ledger", "audit", "kafka"),
    ];

    TopologySnapshot::new(nodes, edges)
}

fn ring() -> TopologySnapshot {
    TopologySnapshot::new(
        ["a", "b", "c"]
            .iter()
            .map(|id| ServiceNode::new(*id, "service"))
            .collect(),
        vec![
            ServiceRelationship::new("ab", "a", "b", "http"),
            ServiceRelationship::new("bc", "b", "c", "http"),
            ServiceRelationship::new("ca", "c", "a", "http"),
        ],
    )
}

#[test]
fn dangling_edges_are_dropped() {
    let analyzer = TopologyAnalyzer::new(&shop());
    assert_eq!(analyzer.graph().node_count(), 7);
    assert_eq!(analyzer.graph().edge_count(), 7);
    assert!(analyzer.graph().edge_by_id("r8").is_none());
}

#[test]
fn shortest_path_endpoints_and_cost() {
    let analyzer = TopologyAnalyzer::new(&shop());
    let path = analyzer.find_shortest_path("gateway", "ledger").unwrap();

    assert_eq!(path.nodes.first().map(String::as_str), Some("gateway"));
    assert_eq!(path.nodes.last().map(String::as_str), Some("ledger"));
    // Inventory route is cheaper than payments (latency + errors)
    assert_eq!(path.nodes, vec!["gateway", "orders", "inventory", "ledger"]);

    let graph = analyzer.graph();
    let recomputed: f64 = path
        .nodes
        .windows(2)
        .map(|pair| edge_weight(graph.edge_between(&pair[0], &pair[1]).unwrap()))
        .sum();
    assert!((path.cost - recomputed).abs() < 1e-9);
    assert_eq!(path.hops, 3);
}

#[test]
fn all_paths_are_simple_and_bounded() {
    let analyzer = TopologyAnalyzer::new(&shop());
    let paths = analyzer.find_all_paths("gateway", "ledger", 10).unwrap();

    assert_eq!(paths.len(), 2);
    for path in &paths {
        assert!(path.hops <= 10);
        let mut seen = std::collections::HashSet::new();
        assert!(path.nodes.iter().all(|id| seen.insert(id)));
        assert_eq!(path.nodes[0], "gateway");
        assert_eq!(path.nodes[path.nodes.len() - 1], "ledger");
    }

    assert!(analyzer.find_all_paths("gateway", "ledger", 2).unwrap().is_empty());
    assert!(analyzer.find_all_paths("ledger", "gateway", 10).unwrap().is_empty());
}

#[test]
fn ring_is_one_cycle() {
    let analyzer = TopologyAnalyzer::new(&ring());
    assert_eq!(analyzer.detect_cycles(), vec![vec!["a", "b", "c"]]);

    let shop = TopologyAnalyzer::new(&shop());
    assert!(shop.detect_cycles().is_empty());
}

#[test]
fn levels_from_gateway() {
    let analyzer = TopologyAnalyzer::new(&shop());
    let levels = analyzer.dependency_levels();

    assert_eq!(levels[&0], vec!["gateway"]);
    assert_eq!(levels[&1], vec!["catalog", "orders"]);
    assert_eq!(levels[&2], vec!["search", "inventory", "payments"]);
    assert_eq!(levels[&3], vec!["ledger"]);
}

#[test]
fn critical_path_exact_then_approximate() {
    let analyzer = TopologyAnalyzer::new(&shop());
    match analyzer.find_critical_path().unwrap() {
        CriticalPath::Exact { nodes, length } => {
            assert_eq!(nodes, vec!["gateway", "orders", "payments", "ledger"]);
            assert!(length > 0.0);
        }
        other => panic!("expected exact path, got {:?}", other),
    }

    let cyclic = TopologyAnalyzer::new(&ring());
    let fallback = cyclic.find_critical_path().unwrap();
    assert!(!fallback.is_exact());
    assert_eq!(fallback.nodes().len(), 3);
}

#[test]
fn dependency_analysis_composes_parts() {
    let analyzer = TopologyAnalyzer::new(&shop());
    let analysis = analyzer.analyze_dependencies().unwrap();

    assert!(analysis.cycles.is_empty());
    assert_eq!(analysis.levels, analyzer.dependency_levels());
    assert_eq!(
        analysis.critical_dependencies,
        analyzer.find_critical_dependencies().unwrap()
    );
    assert_eq!(analysis.bottlenecks, analyzer.find_bottlenecks().unwrap());

    // Every edge touching orders or payments is critical.
    let ids: Vec<&str> = analysis
        .critical_dependencies
        .iter()
        .map(|d| d.id.as_str())
        .collect();
    for id in ["r1", "r2", "r3", "r6"] {
        assert!(ids.contains(&id), "missing {}", id);
    }

    let centrality = analyzer.centrality().unwrap();
    assert!(centrality.iter().all(|(_, score)| score >= 0.0));
    // Seven services: the cutoff is the top score itself, so nothing beats it.
    assert!(analysis.bottlenecks.is_empty());
    assert_eq!(centrality.ranked()[0].0, "orders");
}

#[test]
fn impact_of_orders() {
    let analyzer = TopologyAnalyzer::new(&shop());
    let impact = analyzer.analyze_impact("orders").unwrap();

    assert_eq!(impact.direct_impact, vec!["inventory", "payments"]);
    assert_eq!(impact.indirect_impact, vec!["ledger"]);
    assert_eq!(impact.total_affected, 3);
    assert_eq!(impact.critical_path.len(), 3);
    assert_eq!(impact.critical_path[0], "orders");
    // CRITICAL source: 10 + 1.5 + (3 + 10 + 3) * 0.2 = 14.7 -> 29
    assert_eq!(impact.risk_score, 29);
}

#[test]
fn risk_score_for_unhealthy_critical_source() {
    let mut nodes = vec![ServiceNode::new("core", "service")
        .with_criticality(Criticality::Critical)
        .with_health(HealthStatus::Unhealthy)];
    let mut edges = Vec::new();
    for i in 0..4 {
        let id = format!("dep{}", i);
        nodes.push(ServiceNode::new(&id, "service").with_criticality(Criticality::Medium));
        edges.push(ServiceRelationship::new(format!("e{}", i), "core", &id, "http"));
    }

    let analyzer = TopologyAnalyzer::new(&TopologySnapshot::new(nodes, edges));
    let impact = analyzer.analyze_impact("core").unwrap();

    let expected = ((10.0 + (4.0f64 * 0.5).min(10.0) + 4.0 * 5.0 * 0.2) * 1.5 * 2.0)
        .round()
        .min(100.0);
    assert_eq!(impact.risk_score as f64, expected);
}

#[test]
fn impact_is_idempotent_and_matches_fresh_computation() {
    let analyzer = TopologyAnalyzer::new(&shop());

    let first = analyzer.analyze_impact("gateway").unwrap();
    let second = analyzer.analyze_impact("gateway").unwrap();
    assert_eq!(first, second);
    assert_eq!(analyzer.cache_stats().hits, 1);

    analyzer.clear_cache();
    let fresh = analyzer.analyze_impact("gateway").unwrap();
    assert_eq!(first, fresh);
}

#[test]
fn update_graph_never_serves_stale_results() {
    let mut analyzer = TopologyAnalyzer::new(&shop());
    assert!(analyzer.find_shortest_path("gateway", "ledger").is_some());
    assert_eq!(analyzer.analyze_impact("gateway").unwrap().total_affected, 6);

    analyzer.update_graph(&ring());

    assert!(analyzer.find_shortest_path("gateway", "ledger").is_none());
    assert!(analyzer.analyze_impact("gateway").is_err());
    assert_eq!(analyzer.analyze_impact("a").unwrap().total_affected, 2);
}

#[test]
fn concurrent_readers_share_cache() {
    let shared = TopologyAnalyzer::new(&shop()).into_shared();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                let analyzer = shared.read().unwrap();
                analyzer.analyze_impact("orders").unwrap().risk_score
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 29);
    }

    let analyzer = shared.read().unwrap();
    assert_eq!(analyzer.cache_stats().hits + analyzer.cache_stats().misses, 4);
}
