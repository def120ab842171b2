use flowlens::compiler::loader;
use flowlens::dsl::builder::{simple, WorkflowDefBuilder};
use std::fs;

#[test]
fn test_load_yaml_workflow_def() {
    let yaml_content = r#"
name: "order_flow"
version: 2
tasks:
  - name: "validate"
    taskReferenceName: "validate"
    type: "SIMPLE"
  - name: "fork1"
    taskReferenceName: "fork1"
    type: "FORK_JOIN"
    forkTasks:
      - - name: "a"
          taskReferenceName: "a"
          type: "SIMPLE"
      - - name: "b"
          taskReferenceName: "b"
          type: "SIMPLE"
  - name: "join1"
    taskReferenceName: "join1"
    type: "JOIN"
"#;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("order_flow.yaml");
    fs::write(&file_path, yaml_content).expect("Failed to write temp file");

    let loaded = loader::load_workflow_def(&file_path).expect("Failed to load definition");

    let expected = WorkflowDefBuilder::new("order_flow")
        .version(2)
        .simple("validate")
        .fork_join("fork1", vec![vec![simple("a")], vec![simple("b")]])
        .join("join1")
        .build();

    assert_eq!(loaded, expected);
}

#[test]
fn test_load_json_workflow_def() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("def.json");
    fs::write(&file_path, r#"{"name":"w","tasks":[{"name":"a","taskReferenceName":"a","type":"SIMPLE"}]}"#)
        .expect("Failed to write temp file");

    let loaded = loader::load_workflow_def(&file_path).expect("Failed to load definition");
    assert_eq!(loaded, WorkflowDefBuilder::new("w").version(0).simple("a").build());
}

#[test]
fn test_load_fixture() {
    let yaml_content = r#"
executions:
  - workflowId: "wf-1"
    workflowName: "order_flow"
    status: "RUNNING"
    tasks:
      - taskId: "t1"
        referenceTaskName: "validate"
        taskType: "SIMPLE"
        status: "COMPLETED"
definitions:
  - name: "order_flow"
    version: 1
    tasks: []
"#;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("fixture.yaml");
    fs::write(&file_path, yaml_content).expect("Failed to write temp file");

    let fixture = loader::load_fixture(&file_path).expect("Failed to load fixture");
    assert_eq!(fixture.executions.len(), 1);
    assert_eq!(fixture.executions[0].tasks[0].reference_task_name, "validate");
    assert_eq!(fixture.definitions[0].name, "order_flow");
}

#[test]
fn test_missing_file_reports_path() {
    let err = loader::load_workflow_def(std::path::Path::new("/nonexistent/def.yaml")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/def.yaml"));
}
