//! Application bootstrap: database, module registry and HTTP server.

use anyhow::Context;
use axum::Router;
use libris_db::Database;
use libris_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Everything the service needs at runtime, wired but not yet serving.
pub struct App {
    settings: Settings,
    db: Database,
    registry: ModuleRegistry,
}

impl App {
    /// Open the configured database and register every module.
    pub fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let db = Database::open(&settings.database.path)
            .with_context(|| format!("failed to open database '{}'", settings.database.path))?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &db, &settings);

        tracing::info!(
            env = ?settings.environment,
            db = %settings.database.path,
            modules = registry.modules().len(),
            "libris bootstrap complete"
        );

        Ok(Self {
            settings,
            db,
            registry,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Apply pending migrations; returns how many ran.
    pub fn migrate(&self) -> anyhow::Result<usize> {
        let migrations = self.registry.collect_migrations();
        let applied = self
            .db
            .migrate(&migrations)
            .context("failed to apply migrations")?;
        tracing::info!(applied, total = migrations.len(), "migrations complete");
        Ok(applied)
    }

    pub fn router(&self) -> Router {
        libris_http::build_router(&self.registry, &self.settings)
    }

    pub fn openapi(&self) -> serde_json::Value {
        libris_http::router::openapi_document(&self.registry)
    }

    /// Migrate, run module lifecycles and serve until shutdown.
    pub async fn serve(self) -> anyhow::Result<()> {
        self.migrate()?;

        let ctx = InitCtx {
            settings: &self.settings,
            db: &self.db,
        };
        self.registry.init_modules(&ctx).await?;
        self.registry.start_modules(&ctx).await?;

        let served = libris_http::start_server(&self.registry, &self.settings).await;

        self.registry.stop_modules().await?;
        served
    }
}
