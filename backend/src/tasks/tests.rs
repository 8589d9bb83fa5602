use super::*;
use std::time::Duration;
use tokio::sync::oneshot;

fn ok_outcome(value: serde_json::Value) -> TaskOutcome {
    TaskOutcome {
        result: Some(value),
        message: String::new(),
        status_code: 200,
    }
}

/// 完了するまで問い合わせる
async fn wait_finished(manager: &TaskManager, task_id: TaskId) -> TaskResult {
    for _ in 0..200 {
        let result = manager.query(task_id).await;
        if result.status != TaskStatus::Pending {
            return result;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {task_id} did not finish");
}

#[tokio::test]
async fn test_pending_then_completed_once() {
    let manager = TaskManager::new();
    let (tx, rx) = oneshot::channel::<()>();
    let task_id = manager
        .spawn("test", async move {
            rx.await.ok();
            ok_outcome(serde_json::json!(true))
        })
        .await;

    let pending = manager.query(task_id).await;
    assert_eq!(pending.status, TaskStatus::Pending);
    assert!(pending.outcome.is_none());
    assert_eq!(manager.list().await.pending, vec![task_id]);

    tx.send(()).unwrap();
    let done = wait_finished(&manager, task_id).await;
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.outcome, Some(ok_outcome(serde_json::json!(true))));

    // 結果は一度だけ
    assert_eq!(manager.query(task_id).await.status, TaskStatus::NotFound);
}

#[tokio::test]
async fn test_failed_outcome() {
    let manager = TaskManager::new();
    let task_id = manager
        .spawn("test", async {
            TaskOutcome {
                result: None,
                message: "Unknown asset FOO provided".to_string(),
                status_code: 400,
            }
        })
        .await;

    let done = wait_finished(&manager, task_id).await;
    assert_eq!(done.status, TaskStatus::Failed);
    assert_eq!(done.outcome.unwrap().status_code, 400);
}

#[tokio::test]
async fn test_panicking_job_is_failed() {
    let manager = TaskManager::new();
    let task_id = manager
        .spawn("test", async {
            if TaskStatus::Pending != TaskStatus::Completed {
                panic!("boom");
            }
            ok_outcome(serde_json::json!(null))
        })
        .await;

    let done = wait_finished(&manager, task_id).await;
    assert_eq!(done.status, TaskStatus::Failed);
    assert_eq!(done.outcome.unwrap().status_code, 500);
}

#[tokio::test]
async fn test_ids_are_unique_and_tasks_independent() {
    let manager = TaskManager::new();
    let mut ids = Vec::new();
    for i in 0..10u64 {
        let id = manager
            .spawn("test", async move {
                tokio::time::sleep(Duration::from_millis(10 * (10 - i))).await;
                ok_outcome(serde_json::json!(i))
            })
            .await;
        ids.push(id);
    }
    let mut sorted = ids.clone();
    sorted.dedup();
    assert_eq!(sorted.len(), 10);

    for (i, id) in ids.into_iter().enumerate() {
        let done = wait_finished(&manager, id).await;
        assert_eq!(done.outcome.unwrap().result, Some(serde_json::json!(i)));
    }
}

#[tokio::test]
async fn test_cancel_pending_task() {
    let manager = TaskManager::new();
    let (tx, rx) = oneshot::channel::<()>();
    let task_id = manager
        .spawn("test", async move {
            rx.await.ok();
            ok_outcome(serde_json::json!(true))
        })
        .await;

    assert!(manager.cancel(task_id).await);
    assert!(!manager.cancel(task_id).await);
    assert_eq!(manager.query(task_id).await.status, TaskStatus::NotFound);

    // 中断されたジョブは受信側を落としている
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(tx.send(()).is_err());
    assert!(manager.list().await.pending.is_empty());
}

#[tokio::test]
async fn test_list_separates_pending_and_completed() {
    let manager = TaskManager::new();
    let done_id = manager
        .spawn("test", async { ok_outcome(serde_json::json!(1)) })
        .await;
    let (_tx, rx) = oneshot::channel::<()>();
    let pending_id = manager
        .spawn("test", async move {
            rx.await.ok();
            ok_outcome(serde_json::json!(2))
        })
        .await;

    for _ in 0..200 {
        if manager.list().await.completed.contains(&done_id) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let list = manager.list().await;
    assert_eq!(list.completed, vec![done_id]);
    assert_eq!(list.pending, vec![pending_id]);
}

#[tokio::test]
async fn test_unclaimed_result_expires() {
    let manager = TaskManager::with_result_ttl(Duration::from_millis(20));
    let first = manager
        .spawn("test", async { ok_outcome(serde_json::json!(1)) })
        .await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    // 次の操作のついでに期限切れの結果が捨てられる
    let second = manager
        .spawn("test", async { ok_outcome(serde_json::json!(2)) })
        .await;
    assert_eq!(manager.query(first).await.status, TaskStatus::NotFound);

    let done = wait_finished(&manager, second).await;
    assert_eq!(done.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_result_kept_within_ttl() {
    let manager = TaskManager::with_result_ttl(Duration::from_secs(60));
    let task_id = manager
        .spawn("test", async { ok_outcome(serde_json::json!(1)) })
        .await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(manager.list().await.completed, vec![task_id]);
    assert_eq!(
        wait_finished(&manager, task_id).await.status,
        TaskStatus::Completed
    );
}
