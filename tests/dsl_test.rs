use flowlens::dsl::builder::{simple, simple_with_input, WorkflowDefBuilder};
use flowlens::dsl::{TaskShape, TaskType};
use serde_json::json;

#[test]
fn test_build_fork_join_definition() {
    let def = WorkflowDefBuilder::new("order_flow")
        .version(3)
        .description("checkout")
        .fork_join("fork1", vec![vec![simple("a")], vec![simple("b"), simple("c")]])
        .join("join1")
        .build();

    assert_eq!(def.name, "order_flow");
    assert_eq!(def.version, 3);
    assert_eq!(def.tasks.len(), 2);

    // 检查 Fork 分支
    match def.tasks[0].shape() {
        TaskShape::Fork(branches) => {
            assert_eq!(branches.len(), 2);
            assert_eq!(branches[1][1].task_reference_name, "c");
        }
        other => panic!("unexpected shape {:?}", other),
    }
    assert_eq!(def.tasks[1].task_type, TaskType::Join);
}

#[test]
fn test_decision_default_case_is_last() {
    let def = WorkflowDefBuilder::new("routing")
        .decision(
            "route",
            vec![("express", vec![simple("fast")]), ("bulk", vec![simple("slow")])],
            vec![simple("fallback")],
        )
        .build();

    match def.tasks[0].shape() {
        TaskShape::Cases(cases) => {
            assert_eq!(cases.len(), 3);
            assert_eq!(cases[2][0].task_reference_name, "fallback");
        }
        other => panic!("unexpected shape {:?}", other),
    }
}

#[test]
fn test_definition_serializes_in_server_format() {
    let def = WorkflowDefBuilder::new("w")
        .task(simple_with_input("a", "url", "https://api.example.com"))
        .sub_workflow("child", "child_flow")
        .build();

    let value = serde_json::to_value(&def).expect("serialize");
    assert_eq!(value["tasks"][0]["taskReferenceName"], json!("a"));
    assert_eq!(value["tasks"][0]["inputParameters"]["url"], json!("https://api.example.com"));
    assert_eq!(value["tasks"][1]["type"], json!("SUB_WORKFLOW"));
    assert_eq!(value["tasks"][1]["subWorkflowParam"]["name"], json!("child_flow"));
    assert!(value["tasks"][0].get("forkTasks").is_none());
}
