//! Cycle detection via strongly connected components.
//!
//! A reported cycle is an SCC with more than one member: a group of
//! services that can all reach each other. It is not necessarily a
//! single simple loop through every member.

use crate::graph::{NodeId, ServiceGraph};

const UNVISITED: usize = usize::MAX;

impl ServiceGraph {
    /// Computes every strongly connected component, singletons included.
    ///
    /// Iterative Tarjan: each work-stack frame holds a node and its
    /// position in the successor list, mirroring the recursive version's
    /// call stack. Components come out in completion order.
    pub fn strongly_connected_components(&self) -> Vec<Vec<NodeId>> {
        let count = self.node_count();
        let mut index = vec![UNVISITED; count];
        let mut lowlink = vec![0usize; count];
        let mut on_stack = vec![false; count];
        let mut stack: Vec<NodeId> = Vec::new();
        let mut counter = 0usize;
        let mut components = Vec::new();

        for root in self.node_indexes() {
            if index[root.index()] != UNVISITED {
                continue;
            }

            index[root.index()] = counter;
            lowlink[root.index()] = counter;
            counter += 1;
            stack.push(root);
            on_stack[root.index()] = true;

            let mut work: Vec<(NodeId, usize)> = vec![(root, 0)];

            while let Some(frame) = work.last_mut() {
                let node = frame.0;
                let successors = self.successors(node);

                if frame.1 < successors.len() {
                    let next = successors[frame.1];
                    frame.1 += 1;

                    if index[next.index()] == UNVISITED {
                        index[next.index()] = counter;
                        lowlink[next.index()] = counter;
                        counter += 1;
                        stack.push(next);
                        on_stack[next.index()] = true;
                        work.push((next, 0));
                    } else if on_stack[next.index()] {
                        lowlink[node.index()] = lowlink[node.index()].min(index[next.index()]);
                    }
                    continue;
                }

                // All successors done: close this frame.
                work.pop();

                if lowlink[node.index()] == index[node.index()] {
                    let mut component = Vec::new();
                    while let Some(member) = stack.pop() {
                        on_stack[member.index()] = false;
                        component.push(member);
                        if member == node {
                            break;
                        }
                    }
                    components.push(component);
                }

                if let Some(&(parent, _)) = work.last() {
                    lowlink[parent.index()] = lowlink[parent.index()].min(lowlink[node.index()]);
                }
            }
        }

        components
    }

    /// Returns every cyclic group of services, members ordered by id.
    ///
    /// Single-node components are never reported, so a service with an
    /// edge to itself is not a cycle here.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        self.strongly_connected_components()
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut ids: Vec<String> = component
                    .into_iter()
                    .map(|index| self.id_of(index).to_string())
                    .collect();
                ids.sort();
                ids
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use servicemap_core::{ServiceNode, ServiceRelationship, TopologySnapshot};

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> ServiceGraph {
        ServiceGraph::from_snapshot(&TopologySnapshot::new(
            nodes.iter().map(|id| ServiceNode::new(*id, "service")).collect(),
            edges
                .iter()
                .enumerate()
                .map(|(i, (s, t))| ServiceRelationship::new(format!("e{}", i), *s, *t, "http"))
                .collect(),
        ))
    }

    #[test]
    fn test_dag_has_no_cycles() {
        let g = graph(&["a", "b", "c", "d"], &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
        assert!(g.detect_cycles().is_empty());
    }

    #[test]
    fn test_three_node_ring() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(g.detect_cycles(), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_two_separate_cycles() {
        let g = graph(
            &["a", "b", "c", "x", "y"],
            &[("a", "b"), ("b", "a"), ("b", "c"), ("x", "y"), ("y", "x"), ("c", "x")],
        );

        let mut cycles = g.detect_cycles();
        cycles.sort();
        assert_eq!(cycles, vec![vec!["a", "b"], vec!["x", "y"]]);
    }

    #[test]
    fn test_self_loop_not_reported() {
        let g = graph(&["a", "b"], &[("a", "a"), ("a", "b")]);
        assert!(g.detect_cycles().is_empty());
        // Still its own component
        assert_eq!(g.strongly_connected_components().len(), 2);
    }

    #[test]
    fn test_scc_is_group_not_simple_cycle() {
        // Figure eight through b: a <-> b <-> c
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "a"), ("b", "c"), ("c", "b")]);
        assert_eq!(g.detect_cycles(), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let ids: Vec<String> = (0..20_000).map(|i| format!("n{:05}", i)).collect();
        let nodes: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut edges: Vec<(&str, &str)> = nodes.windows(2).map(|w| (w[0], w[1])).collect();
        edges.push((nodes[nodes.len() - 1], nodes[0]));

        let g = graph(&nodes, &edges);
        let cycles = g.detect_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 20_000);
    }
}
