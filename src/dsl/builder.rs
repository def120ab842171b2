use crate::dsl::{SubWorkflowParam, TaskConfig, TaskType, WorkflowDef};
use std::collections::BTreeMap;
use serde_json::Value;

/// Fluent builder for workflow definitions, mainly for tests and fixtures.
pub struct WorkflowDefBuilder {
    name: String,
    version: u32,
    description: Option<String>,
    pub tasks: Vec<TaskConfig>,
}

impl WorkflowDefBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: 1,
            description: None,
            tasks: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn task(mut self, config: TaskConfig) -> Self {
        self.tasks.push(config);
        self
    }

    pub fn simple(self, reference: &str) -> Self {
        self.task(simple(reference))
    }

    pub fn join(self, reference: &str) -> Self {
        self.task(TaskConfig::new(reference, reference, TaskType::Join))
    }

    pub fn fork_join(self, reference: &str, branches: Vec<Vec<TaskConfig>>) -> Self {
        self.task(fork_join(reference, branches))
    }

    pub fn dynamic_fork(self, reference: &str) -> Self {
        self.task(TaskConfig::new(reference, reference, TaskType::ForkJoinDynamic))
    }

    pub fn decision(self, reference: &str, cases: Vec<(&str, Vec<TaskConfig>)>, default_case: Vec<TaskConfig>) -> Self {
        self.task(decision(reference, cases, default_case))
    }

    pub fn do_while(self, reference: &str, body: Vec<TaskConfig>) -> Self {
        self.task(do_while(reference, body))
    }

    pub fn sub_workflow(self, reference: &str, workflow_name: &str) -> Self {
        self.task(sub_workflow(reference, workflow_name))
    }

    pub fn build(self) -> WorkflowDef {
        WorkflowDef {
            name: self.name,
            version: self.version,
            description: self.description,
            tasks: self.tasks,
        }
    }
}

pub fn simple(reference: &str) -> TaskConfig {
    TaskConfig::new(reference, reference, TaskType::Simple)
}

pub fn simple_with_input(reference: &str, key: &str, value: impl Into<Value>) -> TaskConfig {
    let mut config = simple(reference);
    config.input_parameters.insert(key.to_string(), value.into());
    config
}

pub fn fork_join(reference: &str, branches: Vec<Vec<TaskConfig>>) -> TaskConfig {
    let mut config = TaskConfig::new(reference, reference, TaskType::ForkJoin);
    config.fork_tasks = Some(branches);
    config
}

pub fn decision(reference: &str, cases: Vec<(&str, Vec<TaskConfig>)>, default_case: Vec<TaskConfig>) -> TaskConfig {
    let mut config = TaskConfig::new(reference, reference, TaskType::Decision);
    config.decision_cases = Some(
        cases.into_iter()
            .map(|(case, tasks)| (case.to_string(), tasks))
            .collect::<BTreeMap<_, _>>(),
    );
    config.default_case = Some(default_case);
    config
}

pub fn do_while(reference: &str, body: Vec<TaskConfig>) -> TaskConfig {
    let mut config = TaskConfig::new(reference, reference, TaskType::DoWhile);
    config.loop_over = Some(body);
    config
}

pub fn sub_workflow(reference: &str, workflow_name: &str) -> TaskConfig {
    let mut config = TaskConfig::new(reference, reference, TaskType::SubWorkflow);
    config.sub_workflow_param = Some(SubWorkflowParam {
        name: workflow_name.to_string(),
        version: None,
    });
    config
}
