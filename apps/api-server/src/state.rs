//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::BlogService;
use blog_infra::database::DatabaseConfig;
use blog_infra::memory::InMemoryStore;

#[cfg(feature = "postgres")]
use blog_infra::database::{DatabaseConnections, PostgresPostRepository, PostgresUserRepository};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    /// Backing store name, `postgres` or `memory`.
    pub storage: &'static str,
}

impl AppState {
    /// Build the state on PostgreSQL when it is configured and reachable,
    /// otherwise on the in-memory store.
    pub async fn new(db_config: Option<&DatabaseConfig>, auto_migrate: bool) -> Self {
        #[cfg(feature = "postgres")]
        {
            if let Some(config) = db_config {
                match DatabaseConnections::init(config).await {
                    Ok(connections) => match Self::on_postgres(connections, auto_migrate).await {
                        Ok(state) => {
                            tracing::info!("Application state initialized (postgres)");
                            return state;
                        }
                        Err(e) => {
                            tracing::error!(
                                "Failed to apply migrations: {}. Using in-memory fallback.",
                                e
                            );
                        }
                    },
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        {
            let _ = (db_config, auto_migrate);
            tracing::info!("Running without postgres feature - using in-memory repository");
        }

        tracing::info!("Application state initialized (in-memory)");
        Self::in_memory(InMemoryStore::new())
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            blog: BlogService::new(Arc::new(store.posts()), Arc::new(store.users())),
            storage: "memory",
        }
    }

    /// Serve from `connections`, bringing the schema up to date first when
    /// `auto_migrate` is set. A schema that fails to migrate is never served.
    #[cfg(feature = "postgres")]
    async fn on_postgres(
        connections: DatabaseConnections,
        auto_migrate: bool,
    ) -> Result<Self, migration::DbErr> {
        use migration::{Migrator, MigratorTrait};

        if auto_migrate {
            Migrator::up(&connections.main, None).await?;
            tracing::info!("Database migrations applied");
        }

        let posts = PostgresPostRepository::new(connections.main.clone());
        let users = PostgresUserRepository::new(connections.main);
        Ok(Self {
            blog: BlogService::new(Arc::new(posts), Arc::new(users)),
            storage: "postgres",
        })
    }
}
