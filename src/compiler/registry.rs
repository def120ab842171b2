use std::collections::HashMap;
use crate::runtime::task::TaskResult;

/// Task results bucketed by reference name.
///
/// Buckets keep fetch order. Results with an empty reference name are not
/// indexed.
#[derive(Debug, Default)]
pub struct TaskRegistry<'a> {
    buckets: HashMap<&'a str, Vec<&'a TaskResult>>,
}

impl<'a> TaskRegistry<'a> {
    pub fn index(tasks: &'a [TaskResult]) -> Self {
        let mut buckets: HashMap<&'a str, Vec<&'a TaskResult>> = HashMap::new();
        for task in tasks {
            if task.reference_task_name.is_empty() {
                continue;
            }
            buckets.entry(task.reference_task_name.as_str()).or_default().push(task);
        }
        Self { buckets }
    }

    pub fn get(&self, reference: &str) -> &[&'a TaskResult] {
        self.buckets.get(reference).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.buckets.contains_key(reference)
    }
}
