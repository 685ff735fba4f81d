//! Tree — the reconstructed cell lineage
//!
//! A rooted, directed `petgraph` graph: edges point from ancestor to
//! descendant and carry a branch length (0.0 until a downstream estimator
//! fills them in). Leaves are labelled with original sample ids.

mod topology;

pub(crate) use topology::{collapse_unifurcations, leaves_below, postorder};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Inferred ancestor
    Internal,
    /// Observed sample
    Leaf(String),
}

impl TreeNode {
    pub fn label(&self) -> Option<&str> {
        match self {
            TreeNode::Internal => None,
            TreeNode::Leaf(name) => Some(name),
        }
    }
}

/// Rooted lineage tree with no unifurcations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    graph: StableDiGraph<TreeNode, f64>,
    root: NodeIndex,
    /// Sample meta data carried over from the character matrix
    meta_data: Option<serde_json::Value>,
}

impl Tree {
    /// Wrap a built graph, splicing out any unifurcation first
    pub(crate) fn from_graph(
        mut graph: StableDiGraph<TreeNode, f64>,
        root: NodeIndex,
        meta_data: Option<serde_json::Value>,
    ) -> Self {
        let root = collapse_unifurcations(&mut graph, root);
        Self {
            graph,
            root,
            meta_data,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.graph.node_weight(index)
    }

    /// Read-only view of the underlying graph
    pub fn graph(&self) -> &StableDiGraph<TreeNode, f64> {
        &self.graph
    }

    pub fn meta_data(&self) -> Option<&serde_json::Value> {
        self.meta_data.as_ref()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Children in creation order
    pub fn children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(index, Direction::Incoming)
            .next()
    }

    pub fn is_leaf(&self, index: NodeIndex) -> bool {
        matches!(self.graph.node_weight(index), Some(TreeNode::Leaf(_)))
    }

    /// Edges as (parent, child, branch length)
    pub fn edges(&self) -> Vec<(NodeIndex, NodeIndex, f64)> {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), *e.weight()))
            .collect()
    }

    /// Leaves in pre-order
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.preorder()
            .into_iter()
            .filter(|&n| self.is_leaf(n))
            .collect()
    }

    /// Leaf labels in pre-order
    pub fn leaf_labels(&self) -> Vec<&str> {
        self.leaves()
            .into_iter()
            .filter_map(|n| self.graph[n].label())
            .collect()
    }

    pub fn internal_nodes(&self) -> Vec<NodeIndex> {
        self.preorder()
            .into_iter()
            .filter(|&n| !self.is_leaf(n))
            .collect()
    }

    /// Labels of every leaf below a node
    pub fn leaves_under(&self, index: NodeIndex) -> Vec<&str> {
        leaves_below(&self.graph, index)
            .into_iter()
            .filter_map(|n| self.graph[n].label())
            .collect()
    }

    /// Find the leaf carrying a sample id
    pub fn find_leaf(&self, sample: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&n| self.graph[n].label() == Some(sample))
    }

    /// Largest number of edges between the root and a leaf
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for child in self.graph.neighbors_directed(node, Direction::Outgoing) {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }

    /// Whether any internal node has exactly one child
    pub fn has_unifurcations(&self) -> bool {
        self.graph.node_indices().any(|n| {
            !self.is_leaf(n)
                && self
                    .graph
                    .neighbors_directed(n, Direction::Outgoing)
                    .count()
                    == 1
        })
    }

    fn preorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            order.push(node);
            let children = self.children(node);
            stack.extend(children.into_iter().rev());
        }
        order
    }

    /// Newick rendering of topology and leaf labels, children in creation
    /// order
    pub fn to_newick(&self) -> String {
        format!("{};", self.render(false))
    }

    /// SHA-256 of the topology with children in canonical (sorted) order, so
    /// two trees hash equal exactly when they are the same leaf-labelled
    /// topology
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.render(true).as_bytes());
        hex::encode(hasher.finalize())
    }

    fn render(&self, canonical: bool) -> String {
        let mut rendered: HashMap<NodeIndex, String> = HashMap::new();
        for node in postorder(&self.graph, self.root) {
            let text = match &self.graph[node] {
                TreeNode::Leaf(name) => newick_label(name),
                TreeNode::Internal => {
                    let mut parts: Vec<String> = self
                        .children(node)
                        .into_iter()
                        .filter_map(|c| rendered.remove(&c))
                        .collect();
                    if canonical {
                        parts.sort();
                    }
                    format!("({})", parts.join(","))
                }
            };
            rendered.insert(node, text);
        }
        rendered.remove(&self.root).unwrap_or_default()
    }
}

/// Leaf label as a Newick token; labels with delimiters, whitespace or
/// quotes are single-quoted with embedded quotes doubled
fn newick_label(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.chars().any(|c| {
            c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | ',' | ':' | ';' | '\'')
        });
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}
