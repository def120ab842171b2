pub mod builder;

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};

string_enum! {
    /// Task type tag. Definitions use FORK_JOIN / FORK_JOIN_DYNAMIC, while
    /// runtime records report any fork as FORK and simple tasks under their
    /// own task-definition name.
    pub enum TaskType {
        Simple => "SIMPLE",
        ForkJoin => "FORK_JOIN",
        ForkJoinDynamic => "FORK_JOIN_DYNAMIC",
        Fork => "FORK",
        Join => "JOIN",
        Decision => "DECISION",
        Switch => "SWITCH",
        SubWorkflow => "SUB_WORKFLOW",
        DoWhile => "DO_WHILE",
        Terminate => "TERMINATE",
    }
}

impl TaskType {
    pub fn is_fork(&self) -> bool {
        matches!(self, TaskType::Fork | TaskType::ForkJoin | TaskType::ForkJoinDynamic)
    }
}

/// Workflow definition as served by the metadata API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDef {
    pub name: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubWorkflowParam {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

/// One task position within a workflow definition.
///
/// Nested configuration is optional on the wire; a composite task whose
/// nested lists are missing is treated as having no branches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfig {
    pub name: String,
    pub task_reference_name: String,
    #[serde(rename = "type", default = "default_task_type")]
    pub task_type: TaskType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub input_parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_tasks: Option<Vec<Vec<TaskConfig>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_cases: Option<BTreeMap<String, Vec<TaskConfig>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_case: Option<Vec<TaskConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_over: Option<Vec<TaskConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_workflow_param: Option<SubWorkflowParam>,
}

fn default_task_type() -> TaskType {
    TaskType::Simple
}

/// Structural view of a task config, one case per construct the graph
/// builder has to expand.
#[derive(Debug)]
pub enum TaskShape<'a> {
    Leaf,
    /// Static fork: every branch starts from the fork node.
    Fork(Vec<&'a [TaskConfig]>),
    /// Children are only known at runtime.
    DynamicFork,
    /// Decision/switch cases, default case last.
    Cases(Vec<&'a [TaskConfig]>),
    Loop(&'a [TaskConfig]),
    SubWorkflow(Option<&'a SubWorkflowParam>),
}

impl TaskConfig {
    pub fn new(name: &str, reference: &str, task_type: TaskType) -> Self {
        Self {
            name: name.to_string(),
            task_reference_name: reference.to_string(),
            task_type,
            description: None,
            input_parameters: Map::new(),
            fork_tasks: None,
            decision_cases: None,
            default_case: None,
            loop_over: None,
            sub_workflow_param: None,
        }
    }

    pub fn shape(&self) -> TaskShape<'_> {
        match self.task_type {
            TaskType::ForkJoin | TaskType::Fork => TaskShape::Fork(
                self.fork_tasks
                    .iter()
                    .flatten()
                    .map(|branch| branch.as_slice())
                    .collect(),
            ),
            TaskType::ForkJoinDynamic => TaskShape::DynamicFork,
            TaskType::Decision | TaskType::Switch => {
                let mut cases: Vec<&[TaskConfig]> = self.decision_cases
                    .iter()
                    .flat_map(|cases| cases.values())
                    .map(|branch| branch.as_slice())
                    .collect();
                if let Some(default) = &self.default_case {
                    cases.push(default.as_slice());
                }
                TaskShape::Cases(cases)
            }
            TaskType::DoWhile => TaskShape::Loop(self.loop_over.as_deref().unwrap_or(&[])),
            TaskType::SubWorkflow => TaskShape::SubWorkflow(self.sub_workflow_param.as_ref()),
            _ => TaskShape::Leaf,
        }
    }
}
