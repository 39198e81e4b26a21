//! Application state wiring all services together.
//!
//! Services are generic over the repository trait; AppState pins them to the
//! SQLite implementation. The chat service and the dispatcher share one
//! repository instance.

use std::path::PathBuf;
use std::sync::Arc;

use mindforge_core::chat::service::ChatService;
use mindforge_core::dispatch::Dispatcher;
use mindforge_core::llm::registry::ProviderRegistry;
use mindforge_infra::config::{apply_env_overrides, load_global_config};
use mindforge_infra::llm::build_registry;
use mindforge_infra::sqlite::chat::SqliteChatRepository;
use mindforge_infra::sqlite::pool::{DatabasePool, database_url};
use mindforge_infra::sqlite::user::SqliteUserRepository;
use mindforge_types::config::GlobalConfig;

pub type ConcreteChatService = ChatService<SqliteChatRepository>;
pub type ConcreteDispatcher = Dispatcher<SqliteChatRepository>;

/// Shared application state, used by both CLI commands and REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub dispatcher: Arc<ConcreteDispatcher>,
    pub users: Arc<SqliteUserRepository>,
    pub config: Arc<GlobalConfig>,
    pub db_pool: DatabasePool,
    pub data_dir: PathBuf,
    pub started_at: std::time::Instant,
}

impl AppState {
    /// Load config, open the database and build the provider registry.
    pub async fn init(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let mut config = load_global_config(&data_dir).await;
        apply_env_overrides(&mut config);

        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let registry = build_registry(&config)?;

        tracing::info!(data_dir = %data_dir.display(), "application state ready");
        Ok(Self::assemble(config, db_pool, registry, data_dir))
    }

    /// Wire services from already-opened parts.
    pub fn assemble(
        config: GlobalConfig,
        db_pool: DatabasePool,
        registry: ProviderRegistry,
        data_dir: PathBuf,
    ) -> Self {
        let chat_repo = Arc::new(SqliteChatRepository::new(db_pool.clone()));
        let dispatcher = Dispatcher::new(Arc::clone(&chat_repo), Arc::new(registry), &config.dispatch);

        Self {
            chat_service: Arc::new(ChatService::new(chat_repo)),
            dispatcher: Arc::new(dispatcher),
            users: Arc::new(SqliteUserRepository::new(db_pool.clone())),
            config: Arc::new(config),
            db_pool,
            data_dir,
            started_at: std::time::Instant::now(),
        }
    }
}
