use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};
use crate::dsl::{TaskConfig, TaskShape, TaskType, WorkflowDef};
use crate::runtime::execution::ExecutionAndTasks;
use crate::runtime::graph::{Graph, NodeIndex};
use crate::runtime::task::TaskResult;

/// Builds the execution [`Graph`] from a workflow definition and the task
/// results of one fetch cycle.
pub struct DagBuilder<'a> {
    graph: Graph,
    forked_task_defs: Option<&'a BTreeMap<String, TaskConfig>>,
    /// Fork node (static or dynamic) -> the join that closes it.
    fork_joins: HashMap<NodeIndex, NodeIndex>,
}

impl<'a> DagBuilder<'a> {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            forked_task_defs: None,
            fork_joins: HashMap::new(),
        }
    }

    /// Definitions used for nodes that only exist at runtime.
    pub fn with_forked_task_defs(mut self, defs: &'a BTreeMap<String, TaskConfig>) -> Self {
        self.forked_task_defs = Some(defs);
        self
    }

    pub fn from_definition_only(definition: &WorkflowDef) -> Graph {
        Self::new().build(definition, &[])
    }

    pub fn from_definition_and_resolved_tasks(definition: &WorkflowDef, tasks: &[TaskResult]) -> Graph {
        Self::new().build(definition, tasks)
    }

    /// Uses the definition embedded in the execution record, falling back to
    /// `definition` when the server omitted it.
    pub fn from_execution_and_tasks(snapshot: &ExecutionAndTasks, definition: Option<&WorkflowDef>) -> Graph {
        let empty = WorkflowDef::default();
        let definition = snapshot.execution.workflow_definition.as_ref()
            .or(definition)
            .unwrap_or_else(|| {
                warn!(workflow_id = %snapshot.execution.workflow_id, "no workflow definition available");
                &empty
            });
        DagBuilder::new()
            .with_forked_task_defs(&snapshot.forked_task_defs)
            .build(definition, &snapshot.tasks)
    }

    pub fn build(mut self, definition: &WorkflowDef, tasks: &[TaskResult]) -> Graph {
        self.expand_sequence(&definition.tasks, Vec::new());
        let skeleton = self.graph.len();
        self.attach_results(tasks);
        info!(
            workflow = %definition.name,
            nodes = self.graph.len(),
            dynamic = self.graph.len() - skeleton,
            results = tasks.len(),
            "graph built"
        );
        self.graph
    }

    /// Expands `tasks` in declared order, wiring the first one under every
    /// node in `entry`. Returns the nodes the next task should hang off.
    fn expand_sequence(&mut self, tasks: &[TaskConfig], entry: Vec<NodeIndex>) -> Vec<NodeIndex> {
        let mut exits = entry;
        let mut open_fork: Option<NodeIndex> = None;

        for config in tasks {
            let reference = config.task_reference_name.as_str();
            if reference.is_empty() || self.graph.contains(reference) {
                warn!(reference = %reference, task = %config.name, "skipping task with empty or duplicate reference name");
                continue;
            }

            let idx = self.graph.insert(reference, config.task_type.clone(), Some(config.clone()), false);
            for &parent in &exits {
                self.graph.link(parent, idx);
            }

            if let Some(fork) = open_fork.take() {
                if config.task_type == TaskType::Join {
                    self.fork_joins.insert(fork, idx);
                }
            }

            exits = match config.shape() {
                TaskShape::Leaf | TaskShape::SubWorkflow(_) => vec![idx],
                TaskShape::DynamicFork => {
                    open_fork = Some(idx);
                    vec![idx]
                }
                TaskShape::Fork(branches) => {
                    open_fork = Some(idx);
                    self.expand_branches(idx, &branches)
                }
                TaskShape::Cases(branches) => self.expand_branches(idx, &branches),
                TaskShape::Loop(body) => self.expand_sequence(body, vec![idx]),
            };
        }
        exits
    }

    fn expand_branches(&mut self, owner: NodeIndex, branches: &[&[TaskConfig]]) -> Vec<NodeIndex> {
        if branches.is_empty() {
            debug!(reference = %self.graph.all_nodes()[owner].reference_name(), "composite task without branches");
            return vec![owner];
        }
        let mut tails = Vec::new();
        for branch in branches {
            for tail in self.expand_sequence(branch, vec![owner]) {
                if !tails.contains(&tail) {
                    tails.push(tail);
                }
            }
        }
        tails
    }

    /// Attaches results to their nodes. Results without a static node are
    /// placed under their resolved fork parent; nested dynamic forks may need
    /// several passes because a child can arrive before its parent.
    fn attach_results(&mut self, tasks: &[TaskResult]) {
        let mut pending: Vec<&TaskResult> = Vec::new();
        for task in tasks {
            if task.reference_task_name.is_empty() {
                debug!(task_id = %task.task_id, "ignoring task result without reference name");
                continue;
            }
            match self.graph.index_of(&task.reference_task_name) {
                Some(idx) => self.graph.attach(idx, task.clone()),
                None => pending.push(task),
            }
        }

        loop {
            let before = pending.len();
            let mut deferred = Vec::new();
            for task in pending {
                if let Some(idx) = self.graph.index_of(&task.reference_task_name) {
                    self.graph.attach(idx, task.clone());
                    continue;
                }
                match task.parent_task_reference_name.as_deref().and_then(|p| self.graph.index_of(p)) {
                    Some(parent) => {
                        let idx = self.insert_runtime_node(task, Some(parent));
                        self.graph.attach(idx, task.clone());
                    }
                    None => deferred.push(task),
                }
            }
            pending = deferred;
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }

        for task in pending {
            if let Some(idx) = self.graph.index_of(&task.reference_task_name) {
                self.graph.attach(idx, task.clone());
                continue;
            }
            warn!(
                reference = %task.reference_task_name,
                parent = ?task.parent_task_reference_name,
                "task result has no place in the definition, adding as root"
            );
            let idx = self.insert_runtime_node(task, None);
            self.graph.attach(idx, task.clone());
        }
    }

    /// Adds a node for a result the definition does not declare. Under a
    /// fork it is also wired to the join that closes that fork.
    fn insert_runtime_node(&mut self, task: &TaskResult, parent: Option<NodeIndex>) -> NodeIndex {
        let config = self.forked_task_defs
            .and_then(|defs| defs.get(&task.reference_task_name))
            .cloned();
        let task_type = config.as_ref()
            .map(|c| c.task_type.clone())
            .unwrap_or_else(|| task.task_type.clone());

        let idx = self.graph.insert(&task.reference_task_name, task_type, config, parent.is_some());
        if let Some(parent) = parent {
            self.graph.link(parent, idx);
            if let Some(&join) = self.fork_joins.get(&parent) {
                self.graph.link(idx, join);
            }
        }
        idx
    }
}

impl Default for DagBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::builder::{simple, WorkflowDefBuilder};
    use crate::runtime::task::TaskStatus;

    #[test]
    fn test_linear_chain() {
        let def = WorkflowDefBuilder::new("linear").simple("a").simple("b").simple("c").build();
        let graph = DagBuilder::from_definition_only(&def);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.root_nodes()[0].reference_name(), "a");
        assert_eq!(graph.parent("c").unwrap().reference_name(), "b");
        assert!(graph.is_acyclic());
    }

    #[test]
    fn test_duplicate_definition_reference_is_skipped() {
        let def = WorkflowDefBuilder::new("dup").simple("a").simple("b").simple("a").simple("c").build();
        let graph = DagBuilder::from_definition_only(&def);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.parent("c").unwrap().reference_name(), "b");
        assert!(graph.is_acyclic());
    }

    #[test]
    fn test_empty_loop_body_passes_through() {
        let mut looped = TaskConfig::new("loop", "loop1", TaskType::DoWhile);
        looped.loop_over = None;
        let def = WorkflowDefBuilder::new("loop").task(looped).task(simple("after")).build();
        let graph = DagBuilder::from_definition_only(&def);
        assert_eq!(graph.parent("after").unwrap().reference_name(), "loop1");
    }

    #[test]
    fn test_static_fork_records_its_join() {
        let def = WorkflowDefBuilder::new("fork")
            .fork_join("fork1", vec![vec![simple("a")]])
            .join("join1")
            .build();
        let builder = {
            let mut b = DagBuilder::new();
            b.expand_sequence(&def.tasks, Vec::new());
            b
        };
        let fork = builder.graph.index_of("fork1").unwrap();
        let join = builder.graph.index_of("join1").unwrap();
        assert_eq!(builder.fork_joins.get(&fork), Some(&join));
    }

    #[test]
    fn test_result_without_reference_is_ignored() {
        let def = WorkflowDefBuilder::new("w").simple("a").build();
        let tasks = vec![TaskResult::new("1", "", TaskType::Simple, TaskStatus::Completed)];
        let graph = DagBuilder::from_definition_and_resolved_tasks(&def, &tasks);
        assert_eq!(graph.len(), 1);
        assert!(!graph.node_for("a").unwrap().is_executed());
    }
}
