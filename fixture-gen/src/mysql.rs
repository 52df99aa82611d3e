use async_trait::async_trait;
use log::{debug, info};
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::query::Query;
use sqlx::{MySql, Transaction};

use crate::config::MySqlConfig;
use crate::error::FixtureError;
use crate::store::{RelationalRow, RelationalStore, SqlValue};

/// The relational target, held over a single connection for the whole run
pub struct MySqlStore {
    pool: MySqlPool,
    transaction: Option<Transaction<'static, MySql>>,
}

impl MySqlStore {
    /// # Errors
    /// Errors when the server is unreachable or rejects the credentials
    pub async fn connect(config: &MySqlConfig) -> Result<Self, FixtureError> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        info!(
            "Connected to MySQL at {}:{}/{}",
            config.host, config.port, config.database
        );
        Ok(MySqlStore {
            pool,
            transaction: None,
        })
    }
}

fn bind<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Text(text) => query.bind(text.as_str()),
        SqlValue::Int(int) => query.bind(*int),
        SqlValue::Decimal(decimal) => query.bind(*decimal),
        SqlValue::Bool(boolean) => query.bind(*boolean),
        SqlValue::Timestamp(timestamp) => query.bind(*timestamp),
    }
}

#[async_trait]
impl RelationalStore for MySqlStore {
    async fn insert(&mut self, row: &RelationalRow) -> Result<(), FixtureError> {
        let transaction = match self.transaction.take() {
            Some(transaction) => transaction,
            None => self.pool.begin().await?,
        };
        let transaction = self.transaction.insert(transaction);

        let sql = row.to_sql();
        let query = row.values.iter().fold(sqlx::query(&sql), bind);
        query.execute(&mut **transaction).await?;
        debug!("Queued insert into {}", row.table);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), FixtureError> {
        if let Some(transaction) = self.transaction.take() {
            transaction.commit().await?;
        }
        Ok(())
    }

    async fn close(self) -> Result<(), FixtureError> {
        // an open transaction rolls back when dropped
        drop(self.transaction);
        self.pool.close().await;
        info!("Closed MySQL connection");
        Ok(())
    }
}
