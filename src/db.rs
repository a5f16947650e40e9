use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AssignmentDocument, UserDocument};

/// Read access to users and their assignments.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_user(&self, email: &str) -> Result<Option<UserDocument>, AppError>;

    /// All assignments for `email`, in the order the store yields them.
    async fn find_assignments(&self, email: &str) -> Result<Vec<AssignmentDocument>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find_user(&self, email: &str) -> Result<Option<UserDocument>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, full_name, created_at FROM burnout.users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserDocument {
            id: row.get::<Uuid, _>("id").to_string(),
            email: row.get("email"),
            full_name: row.get("full_name"),
            created_at: row.get("created_at"),
        }))
    }

    async fn find_assignments(&self, email: &str) -> Result<Vec<AssignmentDocument>, AppError> {
        let records = sqlx::query(
            "SELECT id, user_email, course_name, title, due_at, points \
             FROM burnout.assignments \
             WHERE user_email = $1 \
             ORDER BY created_at, source_key",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        let mut assignments = Vec::with_capacity(records.len());
        for row in records {
            assignments.push(AssignmentDocument {
                id: row.get::<Uuid, _>("id").to_string(),
                user_email: row.get("user_email"),
                course_name: row.get("course_name"),
                title: row.get("title"),
                due_at: row.get("due_at"),
                points: row.get("points"),
            });
        }

        Ok(assignments)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_user(pool: &PgPool, email: &str, full_name: Option<&str>) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO burnout.users (id, email, full_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET full_name = COALESCE(EXCLUDED.full_name, burnout.users.full_name)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(full_name)
    .execute(pool)
    .await?;
    Ok(())
}

async fn insert_assignment(
    pool: &PgPool,
    source_key: &str,
    email: &str,
    course_name: Option<&str>,
    title: Option<&str>,
    due_at: Option<&str>,
    points: Option<f64>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO burnout.assignments
        (id, user_email, course_name, title, due_at, points, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(course_name)
    .bind(title)
    .bind(due_at)
    .bind(points)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Demo student with coursework spread around the current week.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let email = "avery.lee@example.edu";
    upsert_user(pool, email, Some("Avery Lee")).await?;

    let today = Utc::now().date_naive();
    let assignments = [
        ("seed-001", "Calculus II", "Quiz 4: Series", 0, Some(20.0)),
        ("seed-002", "Organic Chemistry", "Lab Report 3", 0, Some(50.0)),
        ("seed-003", "World History", "Reading Response", 1, None),
        ("seed-004", "Calculus II", "Problem Set 7", 2, Some(30.0)),
        ("seed-005", "Organic Chemistry", "Midterm Exam", 3, Some(150.0)),
        ("seed-006", "Intro to Psychology", "Research Summary", 3, Some(40.0)),
        ("seed-007", "World History", "Essay Draft", 9, Some(100.0)),
    ];

    for (source_key, course, title, days_ahead, points) in assignments {
        let due = (today + Duration::days(days_ahead))
            .format("%Y-%m-%d 23:59:00")
            .to_string();
        insert_assignment(pool, source_key, email, Some(course), Some(title), Some(&due), points)
            .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        email: String,
        full_name: Option<String>,
        course_name: Option<String>,
        title: Option<String>,
        due_at: Option<String>,
        points: Option<f64>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        upsert_user(pool, &row.email, row.full_name.as_deref()).await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let added = insert_assignment(
            pool,
            &source_key,
            &row.email,
            row.course_name.as_deref(),
            row.title.as_deref(),
            row.due_at.as_deref(),
            row.points,
        )
        .await?;

        if added {
            inserted += 1;
        }
    }

    Ok(inserted)
}

#[cfg(test)]
pub mod memory {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// In-memory store for pipeline and route tests.
    #[derive(Default)]
    pub struct MemoryStore {
        pub users: Vec<UserDocument>,
        pub assignments: Vec<AssignmentDocument>,
        pub offline: AtomicBool,
    }

    impl MemoryStore {
        fn check_online(&self) -> Result<(), AppError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(AppError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn find_user(&self, email: &str) -> Result<Option<UserDocument>, AppError> {
            self.check_online()?;
            Ok(self.users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_assignments(&self, email: &str) -> Result<Vec<AssignmentDocument>, AppError> {
            self.check_online()?;
            Ok(self
                .assignments
                .iter()
                .filter(|a| a.user_email == email)
                .cloned()
                .collect())
        }

        async fn ping(&self) -> Result<(), AppError> {
            self.check_online()
        }
    }
}
