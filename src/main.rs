// zflow server: loads configuration from the environment, builds the KV
// store and executor it names, restarts any persisted flows, and serves
// the HTTP façade.

use zflow::api::ApiServer;
use zflow::config::Config;
use zflow::templates::TemplateRegistry;

#[tokio::main]
async fn main() -> zflow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    tracing::info!(listen_addr = %config.listen_addr, backend = ?config.backend, executor = ?config.executor_kind, "starting zflow");

    let store = config.build_kv_store()?;
    let executor = config.build_executor(store.clone());
    let templates = std::sync::Arc::new(TemplateRegistry::new(store));

    executor.restart_all().await.map_err(zflow::Error::Executor)?;

    let server = ApiServer::new(executor, templates, &config);
    server.run(&config.listen_addr).await
}
