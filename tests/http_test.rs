use flowlens::client::http::HttpApi;
use flowlens::client::ExecutionApi;
use flowlens::config::ClientConfig;
use flowlens::dsl::TaskType;
use flowlens::runtime::execution::WorkflowStatus;
use flowlens::runtime::inspector::Inspector;
use flowlens::Error;
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

fn api_for(server: &Server) -> HttpApi {
    let cfg = ClientConfig {
        base_url: format!("{}/api", server.url()),
        ..ClientConfig::default()
    };
    HttpApi::new(&cfg).expect("client")
}

#[tokio::test]
async fn test_execution_and_tasks_decode() {
    let mut server = Server::new_async().await;
    let _execution = server
        .mock("GET", "/api/v2/execution/wf-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({
            "workflowId": "wf-1",
            "workflowName": "orders",
            "workflowVersion": 3,
            "status": "RUNNING",
            "startTime": 1000
        }).to_string())
        .create_async()
        .await;
    let _tasks = server
        .mock("GET", "/api/v2/execution/wf-1/tasks")
        .with_status(200)
        .with_body(json!([
            { "taskId": "t1", "referenceTaskName": "a", "taskType": "SIMPLE", "status": "COMPLETED", "startTime": 1100 },
            { "taskId": "t2", "referenceTaskName": "b", "taskType": "HTTP", "status": "SCHEDULED" }
        ]).to_string())
        .create_async()
        .await;

    let api = api_for(&server);
    let execution = api.execution("wf-1").await.expect("execution");
    let tasks = api.tasks("wf-1").await.expect("tasks");

    assert_eq!(execution.workflow_version, 3);
    assert_eq!(execution.status, WorkflowStatus::Running);
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].start_time, 1100);
    assert_eq!(tasks[1].task_type, TaskType::Other("HTTP".to_string()));
    assert_eq!(tasks[1].end_time, 0);
}

#[tokio::test]
async fn test_fork_input_carries_task_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2/execution/wf-1/task/dyn1/input")
        .match_query(Matcher::UrlEncoded("taskId".into(), "t7".into()))
        .with_status(200)
        .with_body(json!({ "forkedTasks": ["c1", "c2"], "other": 1 }).to_string())
        .create_async()
        .await;

    let input = api_for(&server).fork_input("wf-1", "dyn1", "t7").await.expect("fork input");

    assert_eq!(input.forked_tasks, vec!["c1", "c2"]);
    assert!(input.forked_task_defs.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_not_found_is_mapped() {
    let mut server = Server::new_async().await;
    let _execution = server
        .mock("GET", "/api/v2/execution/missing")
        .with_status(404)
        .create_async()
        .await;
    let _definition = server
        .mock("GET", "/api/metadata/workflow/orders")
        .match_query(Matcher::UrlEncoded("version".into(), "2".into()))
        .with_status(404)
        .create_async()
        .await;

    let api = api_for(&server);

    assert!(matches!(api.execution("missing").await, Err(Error::ExecutionNotFound(id)) if id == "missing"));
    assert!(matches!(api.workflow_def("orders", Some(2)).await, Err(Error::DefinitionNotFound(_))));
}

#[tokio::test]
async fn test_server_error_keeps_status_and_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/execution/wf-1/variables")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let err = api_for(&server).variables("wf-1").await.unwrap_err();

    match err {
        Error::Status { status, body, url } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
            assert!(url.ends_with("/api/v2/execution/wf-1/variables"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/execution/wf-1/tasks")
        .with_status(200)
        .with_body("{not json")
        .create_async()
        .await;

    let err = api_for(&server).tasks("wf-1").await.unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_configured_headers_are_sent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2/execution/wf-1/output")
        .match_header("x-authorization", "token-1")
        .with_status(200)
        .with_body(json!({ "done": true }).to_string())
        .create_async()
        .await;

    let mut cfg = ClientConfig {
        base_url: format!("{}/api", server.url()),
        ..ClientConfig::default()
    };
    cfg.headers.insert("X-Authorization".to_string(), "token-1".to_string());
    let output = HttpApi::new(&cfg).expect("client").output("wf-1").await.expect("output");

    assert_eq!(output["done"], json!(true));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_inspector_over_http_resolves_forks() {
    let mut server = Server::new_async().await;
    let _execution = server
        .mock("GET", "/api/v2/execution/wf-9")
        .with_status(200)
        .with_body(json!({
            "workflowId": "wf-9",
            "workflowName": "fan-out",
            "status": "COMPLETED",
            "workflowDefinition": {
                "name": "fan-out",
                "version": 1,
                "tasks": [
                    { "name": "dyn", "taskReferenceName": "dyn1", "type": "FORK_JOIN_DYNAMIC" },
                    { "name": "join", "taskReferenceName": "join1", "type": "JOIN" }
                ]
            }
        }).to_string())
        .create_async()
        .await;
    let _tasks = server
        .mock("GET", "/api/v2/execution/wf-9/tasks")
        .with_status(200)
        .with_body(json!([
            { "taskId": "t1", "referenceTaskName": "dyn1", "taskType": "FORK", "status": "COMPLETED" },
            { "taskId": "t2", "referenceTaskName": "c1", "taskType": "SIMPLE", "status": "COMPLETED" },
            { "taskId": "t3", "referenceTaskName": "join1", "taskType": "JOIN", "status": "COMPLETED" }
        ]).to_string())
        .create_async()
        .await;
    let fork = server
        .mock("GET", "/api/v2/execution/wf-9/task/dyn1/input")
        .match_query(Matcher::UrlEncoded("taskId".into(), "t1".into()))
        .with_status(200)
        .with_body(json!({ "forkedTasks": ["c1"] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let inspector = Inspector::new(Arc::new(api_for(&server)));
    let (snapshot, graph) = inspector.execution_graph("wf-9").await.expect("fetch cycle failed");

    assert_eq!(snapshot.tasks[1].parent_task_reference_name.as_deref(), Some("dyn1"));
    assert_eq!(graph.parent("c1").unwrap().reference_name(), "dyn1");
    assert!(graph.node_for("c1").unwrap().is_dynamic());
    assert_eq!(graph.parents("join1").len(), 2);
    fork.assert_async().await;
}

#[tokio::test]
async fn test_task_endpoints_pass_task_id() {
    let mut server = Server::new_async().await;
    let task = server
        .mock("GET", "/api/v2/execution/wf-1/task/charge")
        .match_query(Matcher::UrlEncoded("taskId".into(), "t2".into()))
        .with_status(200)
        .with_body(json!({
            "taskId": "t2", "referenceTaskName": "charge", "taskType": "SIMPLE",
            "status": "FAILED", "retryCount": 1
        }).to_string())
        .create_async()
        .await;
    let input = server
        .mock("GET", "/api/v2/execution/wf-1/task/charge/input")
        .match_query(Matcher::UrlEncoded("taskId".into(), "t2".into()))
        .with_status(200)
        .with_body(json!({ "amount": 12 }).to_string())
        .create_async()
        .await;
    let output = server
        .mock("GET", "/api/v2/execution/wf-1/task/charge/output")
        .match_query(Matcher::UrlEncoded("taskId".into(), "t2".into()))
        .with_status(200)
        .with_body(json!({ "error": "declined" }).to_string())
        .create_async()
        .await;

    let api = api_for(&server);
    let result = api.task("wf-1", "charge", Some("t2")).await.expect("task");
    let task_input = api.task_input("wf-1", "charge", Some("t2")).await.expect("task input");
    let task_output = api.task_output("wf-1", "charge", Some("t2")).await.expect("task output");

    assert_eq!(result.retry_count, 1);
    assert_eq!(task_input["amount"], json!(12));
    assert_eq!(task_output["error"], json!("declined"));
    task.assert_async().await;
    input.assert_async().await;
    output.assert_async().await;
}

#[tokio::test]
async fn test_task_without_id_sends_no_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2/execution/wf-1/task/charge/output")
        .match_query(Matcher::Missing)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let output = api_for(&server).task_output("wf-1", "charge", None).await.expect("task output");

    assert!(output.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_workflow_input_decodes() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/execution/wf-1/input")
        .with_status(200)
        .with_body(json!({ "orderId": "o-7" }).to_string())
        .create_async()
        .await;

    let input = api_for(&server).input("wf-1").await.expect("input");

    assert_eq!(input["orderId"], json!("o-7"));
}
