// orm.rs
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::libs::config::ConnectionConfig;
use crate::libs::error::Result;
use crate::libs::executor::{ExecOutcome, Executor, Record};
use crate::libs::model::Model;
use crate::libs::schema::{AttributeDefinition, DeclareOptions};

/// Owns the connection pool and hands out models bound to it.
#[derive(Clone)]
pub struct OrmStruct {
    pub config: ConnectionConfig,
    pool: MySqlPool,
}

impl OrmStruct {
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.connection_limit)
            .connect_with(options)
            .await?;

        tracing::info!(
            event = "database_connected",
            host = %config.host,
            database = %config.database,
            pool_size = config.connection_limit
        );
        Ok(Self { config, pool })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Declare an entity on this pool, syncing its table per `options`.
    pub async fn define<I, K>(
        &self,
        name: impl Into<String>,
        attributes: I,
        options: DeclareOptions,
    ) -> Result<Model<MySqlPool>>
    where
        I: IntoIterator<Item = (K, AttributeDefinition)>,
        K: Into<String>,
    {
        Model::declare(self.pool.clone(), name, attributes, options).await
    }

    // -------- Execute raw SQL --------
    pub async fn raw(&self, sql: &str) -> Result<ExecOutcome> {
        self.pool.execute(sql).await
    }

    pub async fn raw_query(&self, sql: &str) -> Result<Vec<Record>> {
        self.pool.fetch_all(sql).await
    }
}
