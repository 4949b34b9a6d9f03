use async_trait::async_trait;
use pg_escape::quote_identifier;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use quasar_utils::error::Error;
use quasar_utils::QuasarResult;

use crate::config::database::DatabaseUrl;
use crate::sync::traits::SchemaAdmin;

/// Unified destination table. Created if absent, never altered.
const MIGRATION: &str = "
    CREATE TABLE IF NOT EXISTS navigation_aids (
        id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
        source_schema text NOT NULL,
        source_key text NOT NULL,
        source_fidn bigint NOT NULL,
        source_object_type text NOT NULL,
        scale_band text NOT NULL,
        geom geometry(Point, 4326) NOT NULL,
        structure_type text NOT NULL,
        mark_category text NOT NULL,
        lateral_side text,
        name text,
        shape text,
        colors text[],
        color_pattern text,
        topmark_shape text,
        topmark_color text,
        has_light boolean NOT NULL DEFAULT false,
        light_characteristic text,
        light_color text,
        light_range_nm numeric,
        light_elevation_m numeric,
        properties jsonb NOT NULL DEFAULT '{}'::jsonb
    );
    CREATE UNIQUE INDEX IF NOT EXISTS navigation_aids_source_key_idx
        ON navigation_aids (source_key);
";

/// Connections kept open at most. A run is sequential, so a handful covers
/// it plus the odd live test holding one.
const POOL_SIZE: usize = 4;

/// PostgreSQL/PostGIS handle shared by the sync stage (schema drops), the
/// source reader and the upsert writer. Every operation checks a connection
/// out of the pool, so a dropped connection is replaced on next use.
#[derive(Clone)]
pub struct Store {
    pool: Pool,
}

impl Store {
    /// Build the pool without connecting.
    pub fn new(url: &DatabaseUrl) -> QuasarResult<Self> {
        let pg_config: tokio_postgres::Config = url.expose().parse()?;
        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(POOL_SIZE)
            .build()
            .map_err(|e| Error::PoolError(format!("pool creation failed: {e}")))?;
        Ok(Self { pool })
    }

    /// Build the pool and check the database is reachable.
    pub async fn connect(url: &DatabaseUrl) -> QuasarResult<Self> {
        let store = Self::new(url)?;
        store.client().await?;
        tracing::debug!(database = %url, "connected to postgres");
        Ok(store)
    }

    /// Create `navigation_aids` and its natural-key index if they do not exist.
    pub async fn migrate(&self) -> QuasarResult<()> {
        self.client().await?.batch_execute(MIGRATION).await?;
        Ok(())
    }

    /// A pooled connection; returned to the pool when dropped.
    pub async fn client(&self) -> QuasarResult<Object> {
        self.pool.get().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to check out a postgres connection");
            Error::PoolError(e.to_string())
        })
    }
}

pub(crate) fn drop_schema_sql(schema: &str) -> String {
    format!("DROP SCHEMA IF EXISTS {} CASCADE", quote_identifier(schema))
}

#[async_trait]
impl SchemaAdmin for Store {
    async fn drop_schema(&self, schema: &str) -> QuasarResult<()> {
        self.client().await?.batch_execute(&drop_schema_sql(schema)).await?;
        Ok(())
    }
}
