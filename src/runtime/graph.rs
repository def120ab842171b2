use std::collections::{HashMap, HashSet, VecDeque};
use crate::dsl::{TaskConfig, TaskType};
use crate::runtime::task::TaskResult;

pub type NodeIndex = usize;

pub const NOT_EXECUTED: &str = "Not executed";

/// One reference name in the execution graph, pairing its definition with
/// every attempt recorded for it.
#[derive(Debug, Clone)]
pub struct Node {
    reference: String,
    task_type: TaskType,
    config: Option<TaskConfig>,
    results: Vec<TaskResult>,
    dynamic: bool,
    parents: Vec<NodeIndex>,
    children: Vec<NodeIndex>,
}

impl Node {
    pub fn reference_name(&self) -> &str {
        &self.reference
    }

    pub fn task_type(&self) -> &TaskType {
        &self.task_type
    }

    pub fn config(&self) -> Option<&TaskConfig> {
        self.config.as_ref()
    }

    /// All attempts, oldest first.
    pub fn results(&self) -> &[TaskResult] {
        &self.results
    }

    /// The attempt shown as the node's status: the last one fetched.
    pub fn current(&self) -> Option<&TaskResult> {
        self.results.last()
    }

    pub fn is_executed(&self) -> bool {
        !self.results.is_empty()
    }

    /// True for nodes that only exist because a fork spawned them at runtime.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn status_label(&self) -> &str {
        self.current()
            .map(|r| r.status.as_str())
            .unwrap_or(NOT_EXECUTED)
    }
}

/// Immutable execution DAG. Built by [`crate::compiler::core::DagBuilder`].
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, NodeIndex>,
}

impl Graph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn contains(&self, reference: &str) -> bool {
        self.index.contains_key(reference)
    }

    pub(crate) fn index_of(&self, reference: &str) -> Option<NodeIndex> {
        self.index.get(reference).copied()
    }

    /// Inserts a node. Callers check for an existing reference first, so a
    /// collision here is a builder bug.
    pub(crate) fn insert(&mut self, reference: &str, task_type: TaskType, config: Option<TaskConfig>, dynamic: bool) -> NodeIndex {
        let idx = self.nodes.len();
        let previous = self.index.insert(reference.to_string(), idx);
        assert!(previous.is_none(), "reference {} mapped to two graph nodes", reference);
        self.nodes.push(Node {
            reference: reference.to_string(),
            task_type,
            config,
            results: Vec::new(),
            dynamic,
            parents: Vec::new(),
            children: Vec::new(),
        });
        idx
    }

    pub(crate) fn link(&mut self, parent: NodeIndex, child: NodeIndex) {
        if self.nodes[parent].children.contains(&child) {
            return;
        }
        self.nodes[parent].children.push(child);
        self.nodes[child].parents.push(parent);
    }

    pub(crate) fn attach(&mut self, idx: NodeIndex, result: TaskResult) {
        self.nodes[idx].results.push(result);
    }

    fn resolve(&self, indices: &[NodeIndex]) -> Vec<&Node> {
        indices.iter().map(|&i| &self.nodes[i]).collect()
    }

    // --- Query facade ---

    /// Nodes without parents, in insertion order.
    pub fn root_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.parents.is_empty()).collect()
    }

    pub fn node_for(&self, reference: &str) -> Option<&Node> {
        self.index_of(reference).map(|i| &self.nodes[i])
    }

    pub fn all_nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, reference: &str) -> Vec<&Node> {
        self.node_for(reference)
            .map(|n| self.resolve(&n.children))
            .unwrap_or_default()
    }

    pub fn parents(&self, reference: &str) -> Vec<&Node> {
        self.node_for(reference)
            .map(|n| self.resolve(&n.parents))
            .unwrap_or_default()
    }

    /// The node this one was first attached under. A join reached from
    /// several branches reports its first branch; use [`Graph::parents`]
    /// for all of them.
    pub fn parent(&self, reference: &str) -> Option<&Node> {
        let node = self.node_for(reference)?;
        node.parents.first().map(|&i| &self.nodes[i])
    }

    pub fn ancestors(&self, reference: &str) -> Vec<&Node> {
        self.walk(reference, |n| n.parents.as_slice())
    }

    pub fn descendants(&self, reference: &str) -> Vec<&Node> {
        self.walk(reference, |n| n.children.as_slice())
    }

    /// Breadth-first walk excluding the start node.
    fn walk<'a>(&'a self, reference: &str, next: impl Fn(&'a Node) -> &'a [NodeIndex]) -> Vec<&'a Node> {
        let Some(start) = self.index_of(reference) else {
            return Vec::new();
        };
        let mut seen = HashSet::from([start]);
        let mut queue: VecDeque<NodeIndex> = next(&self.nodes[start]).iter().copied().collect();
        let mut out = Vec::new();
        while let Some(idx) = queue.pop_front() {
            if !seen.insert(idx) {
                continue;
            }
            out.push(&self.nodes[idx]);
            queue.extend(next(&self.nodes[idx]).iter().copied());
        }
        out
    }

    /// Kahn's algorithm over the child edges.
    pub fn is_acyclic(&self) -> bool {
        let mut in_degree: Vec<usize> = self.nodes.iter().map(|n| n.parents.len()).collect();
        let mut ready: Vec<NodeIndex> = (0..self.nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut visited = 0;
        while let Some(idx) = ready.pop() {
            visited += 1;
            for &child in &self.nodes[idx].children {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    ready.push(child);
                }
            }
        }
        visited == self.nodes.len()
    }
}
