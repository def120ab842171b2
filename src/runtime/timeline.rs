use crate::runtime::task::{TaskResult, TaskStatus};

/// One bar of the execution timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSpan {
    pub task_id: String,
    pub reference: String,
    pub status: TaskStatus,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Still running: `end_ms` is the render time, not a recorded end.
    pub open: bool,
}

impl TimelineSpan {
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

/// Spans for every started task, ordered by start time (ties keep fetch order).
pub fn timeline(tasks: &[TaskResult], now_ms: i64) -> Vec<TimelineSpan> {
    let mut spans: Vec<TimelineSpan> = tasks.iter()
        .filter_map(|task| {
            let start_ms = task.started_at()?;
            let (end_ms, open) = match task.ended_at() {
                Some(end) => (end.max(start_ms), false),
                // Finished without a recorded end (e.g. canceled): zero-width.
                None if task.status.is_terminal() => (start_ms, false),
                None => (now_ms.max(start_ms), true),
            };
            Some(TimelineSpan {
                task_id: task.task_id.clone(),
                reference: task.reference_task_name.clone(),
                status: task.status.clone(),
                start_ms,
                end_ms,
                open,
            })
        })
        .collect();
    spans.sort_by_key(|s| s.start_ms);
    spans
}

/// Earliest start and latest end across the spans.
pub fn bounds(spans: &[TimelineSpan]) -> Option<(i64, i64)> {
    let start = spans.iter().map(|s| s.start_ms).min()?;
    let end = spans.iter().map(|s| s.end_ms).max()?;
    Some((start, end))
}
