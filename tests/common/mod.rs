//! Shared utilities for integration testing.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use identity_router::config::RouterConfig;
use identity_router::store::{MembershipSession, MembershipStore, StoreError};
use identity_router::{HttpServer, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// In-memory membership store that records every query it answers.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, HashSet<String>>>>,
    queries: Arc<Mutex<Vec<String>>>,
    unavailable: Arc<AtomicBool>,
    stalled: Arc<AtomicBool>,
    failing_table: Arc<Mutex<Option<String>>>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, table: &str, identity: &str) -> &Self {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .insert(identity.to_string());
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every membership query hang until the caller gives up.
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    pub fn fail_table(&self, table: &str) {
        *self.failing_table.lock().unwrap() = Some(table.to_string());
    }

    /// Tables queried so far, in order.
    pub fn queried(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn reset_queries(&self) {
        self.queries.lock().unwrap().clear();
    }
}

pub struct MemorySession(MemoryStore);

impl MembershipStore for MemoryStore {
    type Session = MemorySession;

    async fn open_session(&self) -> Result<MemorySession, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(MemorySession(self.clone()))
    }
}

impl MembershipSession for MemorySession {
    async fn count_members(&mut self, table: &str, identity: &str) -> Result<i64, StoreError> {
        self.0.queries.lock().unwrap().push(table.to_string());

        if self.0.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        if self.0.failing_table.lock().unwrap().as_deref() == Some(table) {
            return Err(StoreError::Query(format!("relation \"{table}\" does not exist").into()));
        }

        let tables = self.0.tables.lock().unwrap();
        Ok(tables
            .get(table)
            .map_or(0, |members| i64::from(members.contains(identity))))
    }
}

/// Document root with one directory per destination:
///
/// ```text
/// dir.1/page.html       "default page"
/// dir.1/sub/index.html  "default sub"
/// dir.1/my sub/index.html "default spaced"
/// dir.2/page.html       "t1 page"
/// dir.3/page.html       "t2 page"
/// ```
pub fn document_root() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "dir.1/page.html", "default page");
    write(root.path(), "dir.1/sub/index.html", "default sub");
    write(root.path(), "dir.1/my sub/index.html", "default spaced");
    write(root.path(), "dir.2/page.html", "t1 page");
    write(root.path(), "dir.3/page.html", "t2 page");
    root
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Config for location `/dir`, default `/dir.1`, rules `t1 → /dir.2`, `t2 → /dir.3`.
pub fn router_config(document_root: &Path) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.database.url = "sqlite::memory:".into();
    config.rewrite.location = "/dir".into();
    config.rewrite.default_destination = "/dir.1".into();
    config.rewrite.tables = "t1 /dir.2 t2 /dir.3".into();
    config.rewrite.document_root = document_root.to_path_buf();
    config
}

/// A running router bound to an ephemeral port.
pub struct TestRouter {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<RouterConfig>,
}

#[allow(dead_code)]
impl TestRouter {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestRouter {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the router in the background and wait until it accepts connections.
pub async fn start_router(config: RouterConfig, store: MemoryStore) -> TestRouter {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config, Arc::new(store)).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    TestRouter {
        addr,
        shutdown,
        updates,
    }
}

/// HTTP client that never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
