use futures::future::{BoxFuture, FutureExt};
use org_navigator::api::{Mutation, OrgUnitApi, TreeSnapshot, TreeStatus};
use org_navigator::app::App;
use org_navigator::async_task::{run_worker, Task, TaskResult};
use org_navigator::config::Config;
use org_navigator::error::{NavigatorError, Result};
use org_navigator::main_lib::handle_task_result;
use org_navigator::tree::{NodeId, TreeNode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Fetches return a tree titled after the call number. The first fetch waits
/// on `gate` so a later fetch can overtake it.
struct ScriptedApi {
    calls: AtomicUsize,
    gate: Arc<Notify>,
    fail_mutations: bool,
}

impl ScriptedApi {
    fn new(fail_mutations: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Arc::new(Notify::new()),
            fail_mutations,
        }
    }
}

impl OrgUnitApi for ScriptedApi {
    fn fetch_tree(&self, _status: TreeStatus) -> BoxFuture<'static, Result<TreeSnapshot>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let gate = self.gate.clone();
        async move {
            if call == 1 {
                gate.notified().await;
            }
            Ok(TreeSnapshot::new(vec![TreeNode::organization(
                "root",
                format!("Fetch {}", call),
            )]))
        }
        .boxed()
    }

    fn mutate(&self, _mutation: Mutation) -> BoxFuture<'static, Result<()>> {
        let fail = self.fail_mutations;
        async move {
            if fail {
                Err(NavigatorError::Http {
                    status: 403,
                    message: "forbidden".into(),
                })
            } else {
                Ok(())
            }
        }
        .boxed()
    }
}

async fn recv(receiver: &mut mpsc::Receiver<TaskResult>) -> TaskResult {
    timeout(Duration::from_secs(5), receiver.recv())
        .await
        .expect("worker timed out")
        .expect("worker closed the channel")
}

#[tokio::test]
async fn test_overtaken_fetch_is_discarded() {
    let api = Arc::new(ScriptedApi::new(false));
    let gate = api.gate.clone();
    let (task_sender, task_receiver) = mpsc::channel(8);
    let (result_sender, mut result_receiver) = mpsc::channel(8);
    let alive = CancellationToken::new();
    tokio::spawn(run_worker(task_receiver, result_sender, api, alive.clone()));

    let mut app = App::new(&Config::default());
    task_sender.send(app.request_reload()).await.unwrap();
    // wait until the first fetch is parked on the gate
    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    task_sender.send(app.request_reload()).await.unwrap();

    let second = recv(&mut result_receiver).await;
    assert!(matches!(second, TaskResult::TreeLoaded { generation: 2, .. }));
    handle_task_result(&mut app, second);
    assert_eq!(app.navigator.index().title("root"), Some("Fetch 2"));

    gate.notify_one();
    let first = recv(&mut result_receiver).await;
    assert!(matches!(first, TaskResult::TreeLoaded { generation: 1, .. }));
    assert_eq!(handle_task_result(&mut app, first), None);
    assert_eq!(app.navigator.index().title("root"), Some("Fetch 2"));

    alive.cancel();
}

#[tokio::test]
async fn test_cancelled_worker_drops_late_results() {
    let api = Arc::new(ScriptedApi::new(false));
    let gate = api.gate.clone();
    let (task_sender, task_receiver) = mpsc::channel(8);
    let (result_sender, mut result_receiver) = mpsc::channel(8);
    let alive = CancellationToken::new();
    let worker = tokio::spawn(run_worker(task_receiver, result_sender, api, alive.clone()));

    task_sender
        .send(Task::FetchTree {
            generation: 1,
            status: TreeStatus::All,
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    alive.cancel();
    gate.notify_one();
    timeout(Duration::from_secs(5), worker).await.unwrap().unwrap();

    let next = timeout(Duration::from_secs(5), result_receiver.recv())
        .await
        .unwrap();
    assert_eq!(next, None);
}

#[tokio::test]
async fn test_failed_mutation_reports_a_friendly_message() {
    let api = Arc::new(ScriptedApi::new(true));
    let (task_sender, task_receiver) = mpsc::channel(8);
    let (result_sender, mut result_receiver) = mpsc::channel(8);
    let alive = CancellationToken::new();
    tokio::spawn(run_worker(task_receiver, result_sender, api, alive.clone()));

    let mutation = Mutation::Deactivate {
        id: NodeId::from("root"),
    };
    task_sender
        .send(Task::Mutate {
            mutation: mutation.clone(),
        })
        .await
        .unwrap();

    assert_eq!(
        recv(&mut result_receiver).await,
        TaskResult::MutationFailed {
            mutation,
            message: "Insufficient rights for this action".to_string(),
        }
    );
    alive.cancel();
}

#[tokio::test]
async fn test_applied_mutation_triggers_a_reload() {
    let api = Arc::new(ScriptedApi::new(false));
    // release the first fetch immediately
    api.gate.notify_one();
    let (task_sender, task_receiver) = mpsc::channel(8);
    let (result_sender, mut result_receiver) = mpsc::channel(8);
    let alive = CancellationToken::new();
    tokio::spawn(run_worker(task_receiver, result_sender, api, alive.clone()));

    let mut app = App::new(&Config::default());
    task_sender
        .send(Task::Mutate {
            mutation: Mutation::Rename {
                id: NodeId::from("root"),
                name: "Renamed".into(),
            },
        })
        .await
        .unwrap();

    let applied = recv(&mut result_receiver).await;
    let follow_up = handle_task_result(&mut app, applied).expect("reload after mutation");
    task_sender.send(follow_up).await.unwrap();

    let loaded = recv(&mut result_receiver).await;
    handle_task_result(&mut app, loaded);
    assert!(app.navigator.is_loaded());
    assert_eq!(app.ui.status_message, "Loaded 1 units");
    alive.cancel();
}
