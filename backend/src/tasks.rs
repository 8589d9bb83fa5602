//! 非同期クエリのタスク管理
//!
//! `async_query: true` の操作はここで tokio タスクとして走り、呼び出し側は
//! タスク ID で状態を問い合わせる。完了した結果は一度だけ受け渡され、
//! 取りに来られないまま保持期間を過ぎたものは捨てられる。

use crate::logging::*;
use humantime::parse_duration;
use pricebook_common::config;
use pricebook_common::tasks::{TaskId, TaskList, TaskOutcome, TaskResult, TaskStatus};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// 誰にも取りに来られなかった結果を保持する期間
const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(60 * 60);

enum TaskEntry {
    Pending(AbortHandle),
    Finished(TaskOutcome, Instant),
}

pub struct TaskManager {
    next_id: AtomicU64,
    tasks: Arc<Mutex<HashMap<TaskId, TaskEntry>>>,
    result_ttl: Duration,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::with_result_ttl(DEFAULT_RESULT_TTL)
    }
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result_ttl(result_ttl: Duration) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            result_ttl,
        }
    }

    /// 結果の保持期間は `TASK_RESULT_TTL`（humantime 形式）
    pub fn from_config() -> Self {
        let ttl = config::get("TASK_RESULT_TTL")
            .ok()
            .and_then(|v| parse_duration(&v).ok())
            .unwrap_or(DEFAULT_RESULT_TTL);
        Self::with_result_ttl(ttl)
    }

    /// 保持期間を過ぎた完了済みの結果を捨てる
    fn prune_expired(&self, tasks: &mut HashMap<TaskId, TaskEntry>) {
        let ttl = self.result_ttl;
        let before = tasks.len();
        tasks.retain(|_, entry| match entry {
            TaskEntry::Finished(_, finished_at) => finished_at.elapsed() < ttl,
            TaskEntry::Pending(_) => true,
        });
        let expired = before - tasks.len();
        if expired > 0 {
            let log = DEFAULT.new(o!("function" => "TaskManager::prune_expired"));
            debug!(log, "dropped unclaimed results"; "count" => expired);
        }
    }

    /// 操作を起動してすぐに ID を返す
    pub async fn spawn<F>(&self, name: &'static str, job: F) -> TaskId
    where
        F: Future<Output = TaskOutcome> + Send + 'static,
    {
        let task_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let log = DEFAULT.new(o!(
            "function" => "TaskManager::spawn",
            "task" => name,
            "task_id" => task_id,
        ));

        // 登録が終わるまでロックを握り、完了処理が先に走らないようにする
        let mut tasks = self.tasks.lock().await;
        self.prune_expired(&mut tasks);
        let registry = self.tasks.clone();
        let task_log = log.clone();
        let handle = tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(job).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => TaskOutcome {
                    result: None,
                    message: format!("Task {name} panicked"),
                    status_code: 500,
                },
            };
            let mut tasks = registry.lock().await;
            // 取り消し済みなら結果は捨てる
            if let Some(entry) = tasks.get_mut(&task_id) {
                info!(task_log, "finished"; "status_code" => outcome.status_code);
                *entry = TaskEntry::Finished(outcome, Instant::now());
            } else {
                debug!(task_log, "finished after cancellation");
            }
        });
        tasks.insert(task_id, TaskEntry::Pending(handle.abort_handle()));
        debug!(log, "spawned");
        task_id
    }

    /// 完了済みなら結果を取り出して登録を消す
    pub async fn query(&self, task_id: TaskId) -> TaskResult {
        let mut tasks = self.tasks.lock().await;
        self.prune_expired(&mut tasks);
        match tasks.remove(&task_id) {
            None => TaskResult {
                status: TaskStatus::NotFound,
                outcome: None,
            },
            Some(TaskEntry::Pending(handle)) => {
                tasks.insert(task_id, TaskEntry::Pending(handle));
                TaskResult {
                    status: TaskStatus::Pending,
                    outcome: None,
                }
            }
            Some(TaskEntry::Finished(outcome, _)) => {
                let status = if outcome.is_success() {
                    TaskStatus::Completed
                } else {
                    TaskStatus::Failed
                };
                TaskResult {
                    status,
                    outcome: Some(outcome),
                }
            }
        }
    }

    pub async fn list(&self) -> TaskList {
        let mut tasks = self.tasks.lock().await;
        self.prune_expired(&mut tasks);
        let mut list = TaskList::default();
        for (task_id, entry) in tasks.iter() {
            match entry {
                TaskEntry::Pending(_) => list.pending.push(*task_id),
                TaskEntry::Finished(..) => list.completed.push(*task_id),
            }
        }
        list.pending.sort_unstable();
        list.completed.sort_unstable();
        list
    }

    /// 実行中なら中断し、完了済みなら結果を破棄する。未知の ID なら false。
    pub async fn cancel(&self, task_id: TaskId) -> bool {
        let log = DEFAULT.new(o!(
            "function" => "TaskManager::cancel",
            "task_id" => task_id,
        ));
        let removed = self.tasks.lock().await.remove(&task_id);
        match removed {
            Some(TaskEntry::Pending(handle)) => {
                handle.abort();
                info!(log, "aborted");
                true
            }
            Some(TaskEntry::Finished(..)) => {
                info!(log, "discarded finished result");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests;
