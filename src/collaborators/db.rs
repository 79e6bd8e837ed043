//! Relational store collaborator (§6.4): `execute`/`fetchOne`/`fetchAll`
//! over the external `users`/`users_stats`/`ip_user`/`hw_user`/`ban_logs`/
//! `users_relationships`/`bancho_settings` tables (§6.5). This core never
//! models those tables as entities — schema ownership and migrations are
//! explicitly out of scope (§1 Non-goals) — so queries are raw SQL routed
//! through SeaORM's statement API and decoded generically via `JsonValue`.

use axum::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, JsonValue, Statement, Value};

use crate::error::CollaboratorError;

#[async_trait]
pub trait RelationalStore: Send + Sync {
    async fn execute(&self, query: &str, args: Vec<Value>) -> Result<u64, CollaboratorError>;
    async fn fetch_one(
        &self,
        query: &str,
        args: Vec<Value>,
    ) -> Result<Option<JsonValue>, CollaboratorError>;
    async fn fetch_all(
        &self,
        query: &str,
        args: Vec<Value>,
    ) -> Result<Vec<JsonValue>, CollaboratorError>;
}

pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RelationalStore for SeaOrmStore {
    async fn execute(&self, query: &str, args: Vec<Value>) -> Result<u64, CollaboratorError> {
        let stmt = Statement::from_sql_and_values(DbBackend::MySql, query, args);
        let result = self.db.execute(stmt).await?;
        Ok(result.last_insert_id())
    }

    async fn fetch_one(
        &self,
        query: &str,
        args: Vec<Value>,
    ) -> Result<Option<JsonValue>, CollaboratorError> {
        let stmt = Statement::from_sql_and_values(DbBackend::MySql, query, args);
        Ok(JsonValue::find_by_statement(stmt).one(&self.db).await?)
    }

    async fn fetch_all(
        &self,
        query: &str,
        args: Vec<Value>,
    ) -> Result<Vec<JsonValue>, CollaboratorError> {
        let stmt = Statement::from_sql_and_values(DbBackend::MySql, query, args);
        Ok(JsonValue::find_by_statement(stmt).all(&self.db).await?)
    }
}

/// Opens the MySQL connection pool. Schema is assumed pre-existing;
/// deliberately no `Migrator::up` call (Non-goals: no schema migrations).
pub async fn connect(config: &crate::config::MysqlConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let mut options = sea_orm::ConnectOptions::new(config.connection_string());
    options.max_connections(config.pool_size);
    sea_orm::Database::connect(options).await
}
