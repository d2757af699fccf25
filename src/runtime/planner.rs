/// Execution order planner
///
/// Turns a workflow's node list and connection list into a linear execution
/// order with Kahn's algorithm over a petgraph DiGraph. Planning never fails:
/// nodes caught in a cycle (or only reachable through one) are appended in
/// declaration order and reported in [`ExecutionPlan::unordered`].

use crate::workflow::types::{Connection, NodeSpec};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};

/// Planned execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Every declared node id exactly once
    pub order: Vec<String>,
    /// Suffix of `order` that the topological pass could not place
    pub unordered: Vec<String>,
}

impl ExecutionPlan {
    /// True if the cycle fallback had to append nodes
    pub fn has_fallback(&self) -> bool {
        !self.unordered.is_empty()
    }
}

/// Compute the execution order
///
/// Ties are broken by declaration order; successors are released in the
/// order their edges were declared. Connections naming unknown nodes are
/// skipped. A repeated node id is planned once, at its first declaration.
pub fn plan(nodes: &[NodeSpec], connections: &[Connection]) -> ExecutionPlan {
    let mut graph: DiGraph<&str, ()> = DiGraph::with_capacity(nodes.len(), connections.len());
    let mut node_id_to_index: HashMap<&str, NodeIndex> = HashMap::with_capacity(nodes.len());

    for node in nodes {
        if !node_id_to_index.contains_key(node.id.as_str()) {
            let index = graph.add_node(node.id.as_str());
            node_id_to_index.insert(node.id.as_str(), index);
        }
    }

    if connections.is_empty() {
        return ExecutionPlan {
            order: graph.node_weights().map(|id| id.to_string()).collect(),
            unordered: Vec::new(),
        };
    }

    for connection in connections {
        match (
            node_id_to_index.get(connection.from.as_str()),
            node_id_to_index.get(connection.to.as_str()),
        ) {
            (Some(&from), Some(&to)) => {
                graph.add_edge(from, to, ());
            }
            _ => tracing::debug!(
                "⏭️ Skipping connection {} -> {} (unknown node)",
                connection.from,
                connection.to
            ),
        }
    }

    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|index| graph.edges_directed(index, Direction::Incoming).count())
        .collect();
    let mut queue: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|index| in_degree[index.index()] == 0)
        .collect();

    let mut placed = vec![false; graph.node_count()];
    let mut order = Vec::with_capacity(graph.node_count());

    while let Some(current) = queue.pop_front() {
        placed[current.index()] = true;
        order.push(graph[current].to_string());

        let mut outgoing: Vec<_> = graph.edges_directed(current, Direction::Outgoing).collect();
        outgoing.sort_by_key(|edge| edge.id().index());
        for edge in outgoing {
            let target = edge.target();
            in_degree[target.index()] -= 1;
            if in_degree[target.index()] == 0 {
                queue.push_back(target);
            }
        }
    }

    let unordered: Vec<String> = graph
        .node_indices()
        .filter(|index| !placed[index.index()])
        .map(|index| graph[index].to_string())
        .collect();
    order.extend(unordered.iter().cloned());

    ExecutionPlan { order, unordered }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(ids: &[&str]) -> Vec<NodeSpec> {
        ids.iter()
            .map(|id| NodeSpec {
                id: id.to_string(),
                node_type: "integration".into(),
                ..NodeSpec::default()
            })
            .collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<Connection> {
        pairs.iter().map(|(from, to)| Connection::new(*from, *to)).collect()
    }

    fn position(order: &[String], id: &str) -> usize {
        order.iter().position(|candidate| candidate == id).unwrap()
    }

    /// Small deterministic generator so graph tests need no extra crate
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: usize) -> usize {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((self.0 >> 33) % bound as u64) as usize
        }
    }

    #[test]
    fn no_connections_keeps_declaration_order() {
        let plan = plan(&nodes(&["c", "a", "b"]), &[]);
        assert_eq!(plan.order, vec!["c", "a", "b"]);
        assert!(!plan.has_fallback());
    }

    #[test]
    fn chain_runs_in_edge_order() {
        let plan = plan(&nodes(&["c", "b", "a"]), &edges(&[("a", "b"), ("b", "c")]));
        assert_eq!(plan.order, vec!["a", "b", "c"]);
    }

    #[test]
    fn diamond_breaks_ties_by_declaration_then_edge_order() {
        let plan = plan(
            &nodes(&["root", "left", "right", "sink", "lonely"]),
            &edges(&[("root", "right"), ("root", "left"), ("left", "sink"), ("right", "sink")]),
        );
        assert_eq!(plan.order, vec!["root", "lonely", "right", "left", "sink"]);
    }

    #[test]
    fn generated_dags_yield_topological_orders() {
        let mut rng = Lcg(0x5eed);
        for _ in 0..200 {
            let count = 1 + rng.next(12);
            let ids: Vec<String> = (0..count).map(|i| format!("n{}", i)).collect();

            // edges only go from lower to higher rank, so the graph is acyclic
            let mut connections = Vec::new();
            for _ in 0..rng.next(count * 2 + 1) {
                let a = rng.next(count);
                let b = rng.next(count);
                if a < b {
                    connections.push(Connection::new(ids[a].clone(), ids[b].clone()));
                }
            }

            let mut declared = ids.clone();
            for i in (1..declared.len()).rev() {
                let j = rng.next(i + 1);
                declared.swap(i, j);
            }
            let declared: Vec<&str> = declared.iter().map(String::as_str).collect();

            let plan = plan(&nodes(&declared), &connections);
            assert!(!plan.has_fallback());
            assert_eq!(plan.order.len(), count);
            for connection in &connections {
                assert!(position(&plan.order, &connection.from) < position(&plan.order, &connection.to));
            }
        }
    }

    #[test]
    fn cycles_still_schedule_every_node_once() {
        let plan = plan(
            &nodes(&["a", "b", "c", "d"]),
            &edges(&[("a", "b"), ("b", "c"), ("c", "b"), ("c", "d")]),
        );
        assert_eq!(plan.order, vec!["a", "b", "c", "d"]);
        assert_eq!(plan.unordered, vec!["b", "c", "d"]);
        assert!(plan.has_fallback());
    }

    #[test]
    fn self_loop_is_appended() {
        let plan = plan(&nodes(&["x", "y"]), &edges(&[("x", "x")]));
        assert_eq!(plan.order, vec!["y", "x"]);
        assert_eq!(plan.unordered, vec!["x"]);
    }

    #[test]
    fn dangling_connections_are_ignored() {
        let plan = plan(&nodes(&["b", "a"]), &edges(&[("a", "b"), ("ghost", "a"), ("b", "nowhere")]));
        assert_eq!(plan.order, vec!["a", "b"]);
        assert!(!plan.has_fallback());
    }

    #[test]
    fn duplicate_ids_are_planned_once() {
        let plan = plan(&nodes(&["a", "b", "a"]), &edges(&[("b", "a")]));
        assert_eq!(plan.order, vec!["b", "a"]);
    }

    #[test]
    fn empty_workflow_plans_nothing() {
        assert_eq!(plan(&[], &edges(&[("a", "b")])), ExecutionPlan::default());
    }
}
