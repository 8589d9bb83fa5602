use super::*;

#[test]
fn test_task_status_wire_names() {
    assert_eq!(
        serde_json::to_value(TaskStatus::NotFound).unwrap(),
        serde_json::json!("not-found")
    );
    assert_eq!(
        serde_json::to_value(TaskStatus::Pending).unwrap(),
        serde_json::json!("pending")
    );
}

#[test]
fn test_outcome_into_response() {
    let outcome = TaskOutcome {
        result: Some(serde_json::json!(true)),
        message: String::new(),
        status_code: 200,
    };
    assert!(outcome.is_success());
    let response: ApiResponse<bool> = outcome.into_response().unwrap();
    assert_eq!(response, ApiResponse::success(true));
}

#[test]
fn test_failed_outcome_keeps_message() {
    let outcome = TaskOutcome {
        result: None,
        message: "Unknown asset FOO provided".to_string(),
        status_code: 400,
    };
    assert!(!outcome.is_success());
    let response: ApiResponse<bool> = outcome.into_response().unwrap();
    assert_eq!(response.into_result(), Err("Unknown asset FOO provided".to_string()));
}
