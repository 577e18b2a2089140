//! Application state - shared across all handlers.

use std::sync::Arc;

use postline_core::content::ContentService;
use postline_core::ports::{
    BlogPostRepository, ContentGenerator, LabelRepository, PostRepository, UserRepository,
};
use postline_infra::InMemoryStore;
use postline_infra::database::DatabaseConfig;

#[cfg(feature = "postgres")]
use migration::{Migrator, MigratorTrait};
#[cfg(feature = "postgres")]
use postline_infra::database::{
    DatabaseConnections, PostgresBlogPostRepository, PostgresLabelRepository,
    PostgresPostRepository, PostgresUserRepository,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub labels: Arc<dyn LabelRepository>,
    pub blogs: Arc<dyn BlogPostRepository>,
    pub content: Arc<ContentService>,
}

impl AppState {
    /// Build the state on PostgreSQL when configured, otherwise on the in-memory store.
    pub async fn new(
        db_config: Option<&DatabaseConfig>,
        generator: Arc<dyn ContentGenerator>,
    ) -> anyhow::Result<Self> {
        #[cfg(feature = "postgres")]
        if let Some(config) = db_config {
            let connections = DatabaseConnections::init(config).await?;
            let db = connections.main;

            Migrator::up(&db, None).await?;
            tracing::info!("Database schema is up to date");

            tracing::info!("Application state initialized (postgres)");
            return Ok(Self::from_parts(
                Arc::new(PostgresUserRepository::new(db.clone())),
                Arc::new(PostgresPostRepository::new(db.clone())),
                Arc::new(PostgresLabelRepository::new(db.clone())),
                Arc::new(PostgresBlogPostRepository::new(db)),
                generator,
            ));
        }

        #[cfg(not(feature = "postgres"))]
        if db_config.is_some() {
            tracing::warn!("DATABASE_URL is set but the postgres feature is disabled");
        }

        tracing::warn!("DATABASE_URL not set. Running in-memory; data is lost on restart.");
        Ok(Self::in_memory(generator))
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(generator: Arc<dyn ContentGenerator>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::from_parts(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            generator,
        )
    }

    fn from_parts(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        labels: Arc<dyn LabelRepository>,
        blogs: Arc<dyn BlogPostRepository>,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        let content = Arc::new(ContentService::new(
            generator,
            posts.clone(),
            blogs.clone(),
        ));

        Self {
            users,
            posts,
            labels,
            blogs,
            content,
        }
    }
}
