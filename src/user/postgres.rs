//! PostgreSQL user store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};

use crate::user::{Password, Status, StoreError, StoreResult, User, UserId, UserStore};

const SELECT_USER: &str = r#"
    SELECT id, name, username, password, token, status, created_at, birthday
    FROM users
"#;

/// User record as stored in the database.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub password: String,
    pub token: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub birthday: Option<NaiveDate>,
}

impl TryFrom<UserRecord> for User {
    type Error = StoreError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let status = record
            .status
            .parse::<Status>()
            .map_err(|err| StoreError::Corrupted(err.to_string()))?;

        Ok(User {
            id: Some(record.id),
            name: record.name,
            username: record.username,
            password: Password::new(record.password),
            token: record.token,
            status,
            created_at: record.created_at,
            birthday: record.birthday,
        })
    }
}

/// PostgreSQL user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new [`PgUserStore`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, user: &User) -> StoreResult<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (name, username, password, token, status, created_at, birthday)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, username, password, token, status, created_at, birthday
            "#,
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(user.password.as_str())
        .bind(&user.token)
        .bind(user.status.as_str())
        .bind(user.created_at)
        .bind(user.birthday)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| conflict_or_sql(err, &user.username))
    }

    async fn update(&self, id: UserId, user: &User) -> StoreResult<UserRecord> {
        // `created_at` and `token` are immutable after creation.
        sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET name = $2, username = $3, password = $4, status = $5, birthday = $6
            WHERE id = $1
            RETURNING id, name, username, password, token, status, created_at, birthday
            "#,
        )
        .bind(id)
        .bind(&user.name)
        .bind(&user.username)
        .bind(user.password.as_str())
        .bind(user.status.as_str())
        .bind(user.birthday)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| conflict_or_sql(err, &user.username))?
        .ok_or(StoreError::NotFound(id))
    }
}

/// Map unique violations (SQLSTATE 23505) to [`StoreError::Conflict`].
fn conflict_or_sql(err: sqlx::Error, username: &str) -> StoreError {
    let unique_violation = err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());

    if unique_violation {
        StoreError::Conflict {
            username: username.to_owned(),
        }
    } else {
        StoreError::Sql(err)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_all(&self) -> StoreResult<Vec<User>> {
        let query = format!("{SELECT_USER} ORDER BY id");

        sqlx::query_as::<_, UserRecord>(&query)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let query = format!("{SELECT_USER} WHERE id = $1");

        sqlx::query_as::<_, UserRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let query = format!("{SELECT_USER} WHERE username = $1");

        sqlx::query_as::<_, UserRecord>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn save(&self, user: User) -> StoreResult<User> {
        let record = match user.id {
            Some(id) => self.update(id, &user).await?,
            None => self.insert(&user).await?,
        };

        User::try_from(record)
    }

    async fn set_status(&self, id: UserId, status: Status) -> StoreResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET status = $2
            WHERE id = $1
            RETURNING id, name, username, password, token, status, created_at, birthday
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        User::try_from(record)
    }

    async fn flush(&self) -> StoreResult<()> {
        // Every statement runs in autocommit mode.
        Ok(())
    }
}
