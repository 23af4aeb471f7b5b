use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, Object, Pool, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::Row;
use tracing::{error, info, warn};

use super::PollRepository;
use crate::{
    config::DatabaseConfig,
    error::ApiError,
    models::{Choice, CreateChoiceRequest, CreateQuestionRequest, Question},
};

const QUESTION_COLUMNS: &str = "id, question_text, pub_date";
const CHOICE_COLUMNS: &str = "id, question_id, choice_text, votes";

/// PostgreSQL-backed repository holding a deadpool connection pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Builds the pool and checks that a connection can be made.
    pub async fn new(config: DatabaseConfig) -> Result<Self, ApiError> {
        info!("Creating PostgreSQL connection pool for host: {}:{}", config.host, config.port);

        let pool = Self::create_pool(config)?;

        let db = Database { pool };
        db.test_connection().await?;

        Ok(db)
    }

    fn create_pool(config: DatabaseConfig) -> Result<Pool, ApiError> {
        let mut pg_config = Config::new();

        pg_config.host = Some(config.host);
        pg_config.port = Some(config.port);
        pg_config.dbname = Some(config.database);
        pg_config.user = Some(config.username);
        pg_config.password = Some(config.password);
        pg_config.connect_timeout = Some(config.connection_timeout);

        pg_config.ssl_mode = Some(match config.ssl_mode.as_str() {
            "disable" => deadpool_postgres::SslMode::Disable,
            "prefer" => deadpool_postgres::SslMode::Prefer,
            "require" => deadpool_postgres::SslMode::Require,
            other => {
                warn!("Unknown SSL mode '{}', defaulting to 'prefer'", other);
                deadpool_postgres::SslMode::Prefer
            }
        });

        pg_config.manager = Some(deadpool_postgres::ManagerConfig {
            recycling_method: deadpool_postgres::RecyclingMethod::Fast,
        });

        pg_config.pool = Some(deadpool_postgres::PoolConfig::new(config.max_connections as usize));

        let tls_connector = TlsConnector::builder()
            .build()
            .map_err(|e| {
                error!("Failed to create TLS connector: {}", e);
                ApiError::Database(format!("TLS connector creation failed: {}", e))
            })?;
        let tls = MakeTlsConnector::new(tls_connector);

        pg_config.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| {
                error!("Failed to create connection pool: {}", e);
                ApiError::Database(format!("Connection pool creation failed: {}", e))
            })
    }

    async fn get_connection(&self) -> Result<Object, ApiError> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Creates the question and choice tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), ApiError> {
        info!("Running database migrations");

        let client = self.get_connection().await?;

        let statements = [
            (
                "polls_question table",
                r#"
                CREATE TABLE IF NOT EXISTS polls_question (
                    id SERIAL PRIMARY KEY,
                    question_text VARCHAR(200) NOT NULL,
                    pub_date TIMESTAMPTZ NOT NULL
                )
                "#,
            ),
            (
                "polls_question pub_date index",
                "CREATE INDEX IF NOT EXISTS idx_polls_question_pub_date ON polls_question(pub_date DESC)",
            ),
            (
                "polls_choice table",
                r#"
                CREATE TABLE IF NOT EXISTS polls_choice (
                    id SERIAL PRIMARY KEY,
                    question_id INTEGER NOT NULL REFERENCES polls_question(id) ON DELETE CASCADE,
                    choice_text VARCHAR(200) NOT NULL,
                    votes INTEGER NOT NULL DEFAULT 0 CHECK (votes >= 0)
                )
                "#,
            ),
            (
                "polls_choice question_id index",
                "CREATE INDEX IF NOT EXISTS idx_polls_choice_question_id ON polls_choice(question_id)",
            ),
        ];

        for (name, sql) in statements {
            client.execute(sql, &[])
                .await
                .map_err(|e| {
                    error!("Failed to create {}: {}", name, e);
                    ApiError::Database(format!("Migration of {} failed: {}", name, e))
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn test_connection(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[])
            .await
            .map_err(|e| {
                error!("Database connection test failed: {}", e);
                ApiError::Database(format!("Connection test failed: {}", e))
            })?;

        info!("Database connection test successful");
        Ok(())
    }
}

fn question_from_row(row: &Row) -> Question {
    Question {
        id: row.get(0),
        question_text: row.get(1),
        pub_date: row.get(2),
    }
}

fn choice_from_row(row: &Row) -> Choice {
    Choice {
        id: row.get(0),
        question_id: row.get(1),
        choice_text: row.get(2),
        votes: row.get(3),
    }
}

#[async_trait]
impl PollRepository for Database {
    async fn list_recent(
        &self,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Question>, ApiError> {
        let client = self.get_connection().await?;

        // LIMIT NULL means no limit in PostgreSQL
        let limit = limit.map(|l| l as i64);
        let query = format!(
            "SELECT {} FROM polls_question WHERE pub_date <= $1 ORDER BY pub_date DESC, id DESC LIMIT $2",
            QUESTION_COLUMNS
        );

        let rows = client.query(query.as_str(), &[&now, &limit])
            .await
            .map_err(ApiError::from)?;

        Ok(rows.iter().map(question_from_row).collect())
    }

    async fn get_by_id(&self, question_id: i32) -> Result<Question, ApiError> {
        let client = self.get_connection().await?;
        let query = format!("SELECT {} FROM polls_question WHERE id = $1", QUESTION_COLUMNS);

        let row = client.query_opt(query.as_str(), &[&question_id])
            .await
            .map_err(ApiError::from)?;

        row.as_ref()
            .map(question_from_row)
            .ok_or_else(|| ApiError::NotFound(format!("Question with id {}", question_id)))
    }

    async fn choices_for(&self, question_id: i32) -> Result<Vec<Choice>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "SELECT {} FROM polls_choice WHERE question_id = $1 ORDER BY id ASC",
            CHOICE_COLUMNS
        );

        let rows = client.query(query.as_str(), &[&question_id])
            .await
            .map_err(ApiError::from)?;

        Ok(rows.iter().map(choice_from_row).collect())
    }

    async fn create_question(&self, request: CreateQuestionRequest) -> Result<Question, ApiError> {
        request.validate().map_err(ApiError::Validation)?;

        let question_text = request.get_normalized_question_text();
        let client = self.get_connection().await?;

        let query = format!(
            "INSERT INTO polls_question (question_text, pub_date) VALUES ($1, $2) RETURNING {}",
            QUESTION_COLUMNS
        );

        let row = client.query_one(query.as_str(), &[&question_text, &request.pub_date])
            .await
            .map_err(ApiError::from)?;

        let question = question_from_row(&row);
        info!("Created question with id: {}", question.id);
        Ok(question)
    }

    async fn add_choice(
        &self,
        question_id: i32,
        request: CreateChoiceRequest,
    ) -> Result<Choice, ApiError> {
        request.validate().map_err(ApiError::Validation)?;

        let choice_text = request.get_normalized_choice_text();
        let client = self.get_connection().await?;

        let query = format!(
            "INSERT INTO polls_choice (question_id, choice_text, votes) VALUES ($1, $2, $3) RETURNING {}",
            CHOICE_COLUMNS
        );

        // A missing question surfaces as a foreign key violation, mapped to NotFound
        let row = client.query_one(query.as_str(), &[&question_id, &choice_text, &request.votes])
            .await
            .map_err(ApiError::from)?;

        let choice = choice_from_row(&row);
        info!("Created choice with id: {} for question: {}", choice.id, question_id);
        Ok(choice)
    }

    async fn delete_question(&self, question_id: i32) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        // Choices go with it through ON DELETE CASCADE
        let rows_affected = client.execute("DELETE FROM polls_question WHERE id = $1", &[&question_id])
            .await
            .map_err(ApiError::from)?;

        if rows_affected == 0 {
            Err(ApiError::NotFound(format!("Question with id {}", question_id)))
        } else {
            info!("Deleted question with id: {}", question_id);
            Ok(())
        }
    }

    async fn count_questions(&self) -> Result<i64, ApiError> {
        let client = self.get_connection().await?;

        let row = client.query_one("SELECT COUNT(*) FROM polls_question", &[])
            .await
            .map_err(ApiError::from)?;

        Ok(row.get(0))
    }

    async fn health_check(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[])
            .await
            .map_err(|e| {
                error!("Database health check failed: {}", e);
                ApiError::Database(format!("Health check failed: {}", e))
            })?;

        Ok(())
    }
}
