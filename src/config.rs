// Process-level configuration (C8), loaded from environment variables with
// documented defaults for everything so a bare `ZFLOW_LISTEN_ADDR=...` is
// enough to run.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::executor::mock::MockExecutor;
use crate::executor::memory::InMemoryExecutor;
use crate::executor::Executor;
use crate::kv::memory::InMemoryKv;
use crate::kv::KvStore;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// KV backend selection. Only `Memory` is implemented here; `Cassandra` is
/// accepted so operators can name the intended production backend in
/// config, but there is no driver behind it in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Cassandra,
}

impl Backend {
    fn from_env_value(v: &str) -> Result<Self> {
        match v {
            "memory" => Ok(Backend::Memory),
            "cassandra" => Ok(Backend::Cassandra),
            other => Err(Error::decode(format!(
                "ZFLOW_BACKEND: unknown backend {other:?}, expected \"memory\" or \"cassandra\""
            ))),
        }
    }
}

/// Executor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    Mock,
    Memory,
}

impl ExecutorKind {
    fn from_env_value(v: &str) -> Result<Self> {
        match v {
            "mock" => Ok(ExecutorKind::Mock),
            "memory" => Ok(ExecutorKind::Memory),
            other => Err(Error::decode(format!(
                "ZFLOW_EXECUTOR: unknown executor {other:?}, expected \"mock\" or \"memory\""
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub backend: Backend,
    pub executor_kind: ExecutorKind,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            backend: Backend::Memory,
            executor_kind: ExecutorKind::Memory,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    /// Builds a `Config` from environment variables, falling back to
    /// `Config::default()` for anything unset. Malformed values are decode
    /// errors, not silent fallbacks, so a typo'd env var fails startup
    /// loudly rather than running with an unintended setting.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let listen_addr = std::env::var("ZFLOW_LISTEN_ADDR").unwrap_or(defaults.listen_addr);

        let backend = match std::env::var("ZFLOW_BACKEND") {
            Ok(v) => Backend::from_env_value(&v)?,
            Err(_) => defaults.backend,
        };

        let executor_kind = match std::env::var("ZFLOW_EXECUTOR") {
            Ok(v) => ExecutorKind::from_env_value(&v)?,
            Err(_) => defaults.executor_kind,
        };

        let request_timeout_secs = match std::env::var("ZFLOW_REQUEST_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .map_err(|_| Error::decode(format!("ZFLOW_REQUEST_TIMEOUT_SECS: {v:?} is not a valid u64")))?,
            Err(_) => defaults.request_timeout_secs,
        };

        let max_body_bytes = match std::env::var("ZFLOW_MAX_BODY_BYTES") {
            Ok(v) => v
                .parse()
                .map_err(|_| Error::decode(format!("ZFLOW_MAX_BODY_BYTES: {v:?} is not a valid usize")))?,
            Err(_) => defaults.max_body_bytes,
        };

        Ok(Self {
            listen_addr,
            backend,
            executor_kind,
            request_timeout_secs,
            max_body_bytes,
        })
    }

    /// Instantiates the KV store named by `self.backend`. Fails fast for
    /// `Cassandra`: the driver is an external collaborator this crate does
    /// not ship.
    pub fn build_kv_store(&self) -> Result<Arc<dyn KvStore>> {
        match self.backend {
            Backend::Memory => Ok(Arc::new(InMemoryKv::new())),
            Backend::Cassandra => Err(Error::decode(
                "ZFLOW_BACKEND=cassandra selected but no Cassandra driver is linked into this build",
            )),
        }
    }

    /// Instantiates the executor named by `self.executor_kind`, backed by
    /// `store`.
    pub fn build_executor(&self, store: Arc<dyn KvStore>) -> Arc<dyn Executor> {
        match self.executor_kind {
            ExecutorKind::Mock => Arc::new(MockExecutor::new()),
            ExecutorKind::Memory => Arc::new(InMemoryExecutor::new(store)),
        }
    }
}
