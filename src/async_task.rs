use crate::api::{Mutation, OrgUnitApi, TreeSnapshot, TreeStatus};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    FetchTree { generation: u64, status: TreeStatus },
    Mutate { mutation: Mutation },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    TreeLoaded {
        generation: u64,
        snapshot: TreeSnapshot,
    },
    TreeLoadFailed {
        generation: u64,
        message: String,
    },
    MutationApplied {
        mutation: Mutation,
    },
    MutationFailed {
        mutation: Mutation,
        message: String,
    },
}

/// Run one task against the API. Errors become user-facing messages here.
pub async fn execute(api: &dyn OrgUnitApi, task: Task) -> TaskResult {
    match task {
        Task::FetchTree { generation, status } => match api.fetch_tree(status).await {
            Ok(snapshot) => TaskResult::TreeLoaded {
                generation,
                snapshot,
            },
            Err(e) => {
                log::warn!("Tree fetch #{} failed: {}", generation, e);
                TaskResult::TreeLoadFailed {
                    generation,
                    message: e.user_message(),
                }
            }
        },
        Task::Mutate { mutation } => match api.mutate(mutation.clone()).await {
            Ok(()) => TaskResult::MutationApplied { mutation },
            Err(e) => {
                log::warn!("Mutation {:?} failed: {}", mutation, e);
                TaskResult::MutationFailed {
                    mutation,
                    message: e.user_message(),
                }
            }
        },
    }
}

/// Receive tasks until the channel closes or `alive` is cancelled.
///
/// Each task runs on its own tokio task so a slow fetch never blocks a
/// mutation. Results that complete after cancellation are dropped.
pub async fn run_worker(
    mut task_receiver: mpsc::Receiver<Task>,
    result_sender: mpsc::Sender<TaskResult>,
    api: Arc<dyn OrgUnitApi>,
    alive: CancellationToken,
) {
    loop {
        let task = tokio::select! {
            _ = alive.cancelled() => break,
            task = task_receiver.recv() => match task {
                Some(task) => task,
                None => break,
            },
        };

        log::debug!("Worker: starting {:?}", task);
        let api = api.clone();
        let result_sender = result_sender.clone();
        let alive = alive.clone();
        tokio::spawn(async move {
            let result = execute(api.as_ref(), task).await;
            if alive.is_cancelled() {
                log::debug!("Worker: navigator gone, dropping {:?}", result);
                return;
            }
            if result_sender.send(result).await.is_err() {
                log::error!("Worker: result channel closed");
            }
        });
    }
    log::debug!("Worker: stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockOrgUnitApi;
    use crate::error::NavigatorError;
    use crate::tree::{NodeId, TreeNode};
    use futures::FutureExt;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn spawn_worker(
        api: MockOrgUnitApi,
    ) -> (
        mpsc::Sender<Task>,
        mpsc::Receiver<TaskResult>,
        CancellationToken,
    ) {
        let (task_sender, task_receiver) = mpsc::channel(8);
        let (result_sender, result_receiver) = mpsc::channel(8);
        let alive = CancellationToken::new();
        tokio::spawn(run_worker(
            task_receiver,
            result_sender,
            Arc::new(api),
            alive.clone(),
        ));
        (task_sender, result_receiver, alive)
    }

    #[tokio::test]
    async fn test_fetch_delivers_snapshot_with_generation() {
        let mut api = MockOrgUnitApi::new();
        api.expect_fetch_tree()
            .withf(|status| *status == TreeStatus::All)
            .times(1)
            .returning(|_| {
                async { Ok(TreeSnapshot::new(vec![TreeNode::organization("1", "Acme")])) }.boxed()
            });
        let (tasks, mut results, _alive) = spawn_worker(api);

        tasks
            .send(Task::FetchTree {
                generation: 3,
                status: TreeStatus::All,
            })
            .await
            .unwrap();

        match results.recv().await.unwrap() {
            TaskResult::TreeLoaded { generation, snapshot } => {
                assert_eq!(generation, 3);
                assert_eq!(snapshot.roots[0].title, "Acme");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mutation_failure_carries_user_message() {
        let mut api = MockOrgUnitApi::new();
        api.expect_mutate().times(1).returning(|_| {
            async {
                Err(NavigatorError::Http {
                    status: 403,
                    message: "forbidden".into(),
                })
            }
            .boxed()
        });
        let (tasks, mut results, _alive) = spawn_worker(api);
        let mutation = Mutation::Deactivate { id: NodeId::from("9") };

        tasks
            .send(Task::Mutate {
                mutation: mutation.clone(),
            })
            .await
            .unwrap();

        assert_eq!(
            results.recv().await.unwrap(),
            TaskResult::MutationFailed {
                mutation,
                message: "Insufficient rights for this action".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_mutation_success() {
        let mut api = MockOrgUnitApi::new();
        api.expect_mutate()
            .withf(|m| matches!(m, Mutation::Rename { name, .. } if name == "Ops"))
            .times(1)
            .returning(|_| async { Ok(()) }.boxed());
        let (tasks, mut results, _alive) = spawn_worker(api);
        let mutation = Mutation::Rename {
            id: NodeId::from("5"),
            name: "Ops".into(),
        };

        tasks
            .send(Task::Mutate {
                mutation: mutation.clone(),
            })
            .await
            .unwrap();

        assert_eq!(
            results.recv().await.unwrap(),
            TaskResult::MutationApplied { mutation }
        );
    }

    #[tokio::test]
    async fn test_results_dropped_after_cancel() {
        let started = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());

        let mut api = MockOrgUnitApi::new();
        {
            let started = started.clone();
            let gate = gate.clone();
            api.expect_fetch_tree().times(1).returning(move |_| {
                started.notify_one();
                let gate = gate.clone();
                async move {
                    gate.notified().await;
                    Ok(TreeSnapshot::default())
                }
                .boxed()
            });
        }
        let (tasks, mut results, alive) = spawn_worker(api);

        tasks
            .send(Task::FetchTree {
                generation: 1,
                status: TreeStatus::Active,
            })
            .await
            .unwrap();
        started.notified().await;

        alive.cancel();
        gate.notify_one();

        let outcome = tokio::time::timeout(Duration::from_secs(5), results.recv())
            .await
            .expect("worker should shut down");
        assert_eq!(outcome, None);
    }
}
