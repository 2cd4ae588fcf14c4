//! Daemon request specs
//!
//! Start the daemon over a temporary state directory and talk to it through
//! its socket.

use crate::prelude::*;
use crate::prelude::assert_eq;
use ordo_core::{Config, StatusClass};
use ordo_daemon::protocol::{self, DEFAULT_TIMEOUT};
use ordo_daemon::{DaemonState, Request, Response};
use tempfile::TempDir;
use tokio::net::UnixStream;
use tokio::task::JoinHandle;

struct Daemon {
    _dir: TempDir,
    config: Config,
    task: JoinHandle<DaemonState>,
}

impl Daemon {
    async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config {
            state_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        config.ingest.batch_size = 2;

        let mut daemon = ordo_daemon::startup(&config).await.unwrap();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    accepted = daemon.listener.accept() => {
                        let (stream, _) = accepted.unwrap();
                        daemon.serve(stream);
                    }
                    _ = daemon.server.shutdown_requested() => break,
                }
            }
            daemon
        });

        Self {
            _dir: dir,
            config,
            task,
        }
    }

    async fn send(&self, request: Request) -> Response {
        let stream = UnixStream::connect(self.config.socket_path()).await.unwrap();
        protocol::call(stream, &request, DEFAULT_TIMEOUT).await.unwrap()
    }

    async fn item(&self, request: Request) -> Item {
        match self.send(request).await {
            Response::Item { item } => item,
            other => panic!("expected item, got {other:?}"),
        }
    }

    async fn stop(self) -> Vec<EventRecord> {
        assert_eq!(self.send(Request::Shutdown).await, Response::ShuttingDown);
        let mut daemon = self.task.await.unwrap();
        daemon.shutdown().await.unwrap();
        assert!(!self.config.socket_path().exists());

        ordo_storage::SqliteEventSink::open(&self.config.sink_path())
            .unwrap()
            .records()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn full_item_lifecycle_over_the_socket() {
    let daemon = Daemon::start().await;

    let a = daemon
        .item(Request::Create {
            project_id: DEFAULT,
            item: ItemDraft::new("A"),
        })
        .await;
    let b = daemon
        .item(Request::Create {
            project_id: DEFAULT,
            item: ItemDraft::new("B"),
        })
        .await;
    assert_eq!((a.priority, b.priority), (1, 2));

    let deltas = daemon
        .send(Request::Reorder {
            project_id: DEFAULT,
            id: b.id,
            new_rank: 1,
        })
        .await;
    assert_eq!(
        deltas,
        Response::Deltas {
            deltas: vec![RankDelta::new(a.id, 2), RankDelta::new(b.id, 1)]
        }
    );

    let fetched = daemon
        .item(Request::Get {
            project_id: DEFAULT,
            id: a.id,
        })
        .await;
    assert_eq!(fetched.priority, 2);

    let removed = daemon
        .item(Request::Remove {
            project_id: DEFAULT,
            id: a.id,
        })
        .await;
    assert!(removed.removed);

    let Response::Page { page } = daemon
        .send(Request::List {
            page: Pagination::default(),
        })
        .await
    else {
        panic!("expected page");
    };
    assert_eq!((page.meta.total, page.meta.removed), (2, 1));

    let records = daemon.stop().await;
    let logged: Vec<(i64, u8)> = records.iter().map(|r| (r.id.0, r.removed)).collect();
    assert_eq!(logged, vec![(1, 0), (2, 0), (1, 1)]);
}

#[tokio::test]
async fn errors_carry_status_class() {
    let daemon = Daemon::start().await;

    let Response::Error { error } = daemon
        .send(Request::Get {
            project_id: DEFAULT,
            id: ItemId(404),
        })
        .await
    else {
        panic!("expected error");
    };
    assert_eq!(error.status, StatusClass::NotFound);

    let Response::Error { error } = daemon
        .send(Request::Create {
            project_id: DEFAULT,
            item: ItemDraft::new(""),
        })
        .await
    else {
        panic!("expected error");
    };
    assert_eq!(error.status, StatusClass::BadRequest);
    assert_eq!(error.code, ErrorKind::Validation.code());

    daemon.stop().await;
}

#[tokio::test]
async fn status_reports_ingest_progress() {
    let daemon = Daemon::start().await;
    for name in ["A", "B", "C"] {
        daemon
            .item(Request::Create {
                project_id: DEFAULT,
                item: ItemDraft::new(name),
            })
            .await;
    }

    let mut ingest = None;
    for _ in 0..200 {
        let Response::Status { ingest: stats, cache, .. } = daemon.send(Request::Status).await
        else {
            panic!("expected status");
        };
        assert_eq!(cache, "memory");
        if stats.batches_written == 1 && stats.buffered == 1 {
            ingest = Some(stats);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    let ingest = ingest.expect("ingest progress");
    assert_eq!(ingest.events_written, 2);

    assert_eq!(daemon.stop().await.len(), 3);
}
