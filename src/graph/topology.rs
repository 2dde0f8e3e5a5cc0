use super::definition::{FlowGraph, GraphNode};
use crate::error::GraphError;
use ahash::AHashMap;
use std::collections::VecDeque;

impl FlowGraph {
    /// Checks that node ids are unique, that every edge connects existing
    /// nodes and that the graph is acyclic.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.topological_order().map(|_| ())
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes with an edge into `id`, in edge declaration order.
    pub fn upstream(&self, id: &str) -> Vec<&GraphNode> {
        self.edges
            .iter()
            .filter(|e| e.target == id)
            .filter_map(|e| self.node(&e.source))
            .collect()
    }

    /// Nodes with an edge out of `id`, in edge declaration order.
    pub fn downstream(&self, id: &str) -> Vec<&GraphNode> {
        self.edges
            .iter()
            .filter(|e| e.source == id)
            .filter_map(|e| self.node(&e.target))
            .collect()
    }

    /// Nodes without upstream dependencies.
    pub fn roots(&self) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.target == n.id))
            .collect()
    }

    /// Nodes nothing depends on.
    pub fn terminals(&self) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.source == n.id))
            .collect()
    }

    /// Orders the nodes so that every node comes after all of its upstream nodes.
    ///
    /// Ties are broken by declaration order, so the result is stable for a given graph.
    pub fn topological_order(&self) -> Result<Vec<&GraphNode>, GraphError> {
        let mut index: AHashMap<&str, usize> = AHashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.id.as_str(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut in_degree = vec![0usize; self.nodes.len()];
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            let source = position(&index, &edge.source, &edge.target)?;
            let target = position(&index, &edge.target, &edge.source)?;
            outgoing[source].push(target);
            in_degree[target] += 1;
        }

        let mut queue: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(current) = queue.pop_front() {
            order.push(&self.nodes[current]);
            for &next in &outgoing[current] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() < self.nodes.len() {
            // Anything left with a positive in-degree sits on (or behind) a cycle.
            let stuck = in_degree
                .iter()
                .position(|&d| d > 0)
                .map(|i| self.nodes[i].id.clone())
                .unwrap_or_default();
            return Err(GraphError::CycleDetected(stuck));
        }
        Ok(order)
    }
}

fn position(index: &AHashMap<&str, usize>, id: &str, from: &str) -> Result<usize, GraphError> {
    match index.get(id) {
        Some(&i) => Ok(i),
        None => Err(GraphError::NodeNotFound {
            missing_node_id: id.to_string(),
            source_node_id: from.to_string(),
        }),
    }
}
