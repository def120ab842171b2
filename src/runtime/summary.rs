use serde_json::Value;
use crate::dsl::{TaskConfig, TaskType};
use crate::runtime::graph::{Node, NOT_EXECUTED};
use crate::runtime::task::{TaskResult, TaskStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryValue {
    Text(String),
    Number(i64),
    /// Epoch milliseconds.
    DateMs(i64),
    DurationMs(i64),
}

impl std::fmt::Display for SummaryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryValue::Text(s) => f.write_str(s),
            SummaryValue::Number(n) | SummaryValue::DateMs(n) => write!(f, "{}", n),
            SummaryValue::DurationMs(ms) => write!(f, "{}ms", ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: SummaryValue,
}

fn row(label: &'static str, value: SummaryValue) -> SummaryRow {
    SummaryRow { label, value }
}

fn text(s: impl Into<String>) -> SummaryValue {
    SummaryValue::Text(s.into())
}

/// Key/value rows describing a node for the task detail panel.
pub fn node_summary(node: &Node, now_ms: i64) -> Vec<SummaryRow> {
    task_summary(node.config(), node.task_type(), node.reference_name(), node.current(), now_ms)
}

/// Rows for one task position. Type, name and reference fall back to the
/// definition so unexecuted tasks still render.
pub fn task_summary(
    config: Option<&TaskConfig>,
    task_type: &TaskType,
    reference: &str,
    result: Option<&TaskResult>,
    now_ms: i64,
) -> Vec<SummaryRow> {
    let name = config.map(|c| c.name.as_str()).unwrap_or(reference);
    let mut rows = vec![
        row("Task Type", text(config.map(|c| &c.task_type).unwrap_or(task_type).as_str())),
        row("Status", text(result.map(|r| r.status.as_str()).unwrap_or(NOT_EXECUTED))),
        row("Task Name", text(name)),
    ];

    let display_ref = result
        .map(|r| r.reference_task_name.as_str())
        .filter(|r| !r.is_empty())
        .or_else(|| result.and_then(|r| r.alias_for_ref.as_deref()))
        .unwrap_or(reference);
    rows.push(row("Task Reference", text(display_ref)));

    let Some(result) = result else {
        if let Some(param) = config.and_then(|c| c.sub_workflow_param.as_ref()) {
            rows.push(row("Subworkflow Definition", text(param.name.as_str())));
        }
        return rows;
    };

    if let Some(domain) = &result.domain {
        rows.push(row("Domain", text(domain.as_str())));
    }
    if !result.task_id.is_empty() {
        rows.push(row("Task Execution ID", text(result.task_id.as_str())));
    }
    rows.push(row("Retry Count", SummaryValue::Number(result.retry_count as i64)));
    if let Some(t) = result.scheduled_at() {
        rows.push(row("Scheduled Time", SummaryValue::DateMs(t)));
    }
    if let Some(t) = result.started_at() {
        rows.push(row("Start Time", SummaryValue::DateMs(t)));
    }
    if let Some(t) = result.ended_at() {
        rows.push(row("End Time", SummaryValue::DateMs(t)));
    }
    if let Some(d) = result.duration_ms() {
        rows.push(row("Duration", SummaryValue::DurationMs(d)));
    }
    if let (Some(start), TaskStatus::InProgress) = (result.started_at(), &result.status) {
        rows.push(row("Current Elapsed Time", SummaryValue::DurationMs(now_ms - start)));
    }
    if let Some(reason) = &result.reason_for_incompletion {
        rows.push(row("Reason for Incompletion", text(reason.as_str())));
    }
    if let Some(worker) = &result.worker_id {
        rows.push(row("Worker", text(worker.as_str())));
    }
    if result.task_type == TaskType::Decision {
        let case = result.output_data.get("caseOutput")
            .and_then(|v| v.get(0))
            .map(value_text)
            .unwrap_or_default();
        rows.push(row("Evaluated Case", text(case)));
    }

    let is_sub_workflow = config.map(|c| c.task_type == TaskType::SubWorkflow)
        .unwrap_or(result.task_type == TaskType::SubWorkflow);
    if is_sub_workflow {
        let sub_name = result.input_data.get("subWorkflowName")
            .and_then(Value::as_str)
            .or_else(|| config.and_then(|c| c.sub_workflow_param.as_ref()).map(|p| p.name.as_str()));
        if let Some(sub_name) = sub_name {
            rows.push(row("Subworkflow Definition", text(sub_name)));
        }
        if let Some(id) = &result.sub_workflow_id {
            rows.push(row("Subworkflow ID", text(id.as_str())));
        }
    }

    rows
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
