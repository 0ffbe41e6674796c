use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use std::path::Path;

pub mod scan;
pub mod user;

/// Access layer over the VeggieScan database (users and scan history).
///
/// All methods are `async fn` on top of SeaORM; SQLite is the default
/// backend.
pub struct VeggieStore {
    pub(crate) db: DatabaseConnection,
}

impl VeggieStore {
    /// Connect, enable WAL for SQLite and run pending migrations.
    ///
    /// - `db_url`: full connection URL, e.g. `sqlite://data/veggiescan.db?mode=rwc`
    /// - `data_dir`: created if missing so the SQLite file has a home
    pub async fn new(db_url: &str, data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db = Database::connect(db_url).await?;

        if db_url.starts_with("sqlite:") {
            db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        }

        Migrator::up(&db, None).await?;
        tracing::info!(db_url = %db_url, "Initialized VeggieScan store");

        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Round-trip to the database, used by health endpoints.
    pub async fn ping(&self) -> Result<()> {
        self.db.ping().await?;
        Ok(())
    }
}
