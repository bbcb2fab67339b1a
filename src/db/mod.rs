use chrono::{DateTime, Utc};

use crate::domain::{
    CreateDocument, CreateMetrics, CreateSection, CreateUser, DashboardMetrics, DocumentId,
    DocumentSectionListing, SectionId, UserId, VisitorStat,
};
use crate::error::{Error, Result};

pub mod visitors;

pub use visitors::{aggregate, lookback_window, query_daily_visitors};

#[cfg(feature = "postgres")]
pub type Pool = sqlx::PgPool;
#[cfg(feature = "postgres")]
pub type PoolOptions = sqlx::postgres::PgPoolOptions;

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub type Pool = sqlx::SqlitePool;
#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub type PoolOptions = sqlx::sqlite::SqlitePoolOptions;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

pub async fn create_pool(url: &str) -> Result<Pool> {
    create_pool_with(url, DEFAULT_MAX_CONNECTIONS).await
}

pub async fn create_pool_with(url: &str, max_connections: u32) -> Result<Pool> {
    let pool = PoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    #[cfg(feature = "postgres")]
    {
        let sql = include_str!("../../migrations/postgres/001_initial.sql");
        sqlx::raw_sql(sql).execute(pool).await?;
    }

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    {
        let sql = include_str!("../../migrations/sqlite/001_initial.sql");
        sqlx::raw_sql(sql).execute(pool).await?;
    }

    Ok(())
}

// Visitor stats

/// Counts are stored as 64-bit integers on both backends; a negative one
/// is rejected before it reaches the table.
fn stored_count(stat: &VisitorStat) -> Result<i64> {
    if stat.visitor_count < 0 {
        return Err(Error::MalformedRow(format!(
            "negative visitor count {} for {} on {}",
            stat.visitor_count, stat.device_type, stat.date
        )));
    }
    Ok(stat.visitor_count)
}

/// Insert or overwrite the count stored for a `(date, device_type)` pair
pub async fn upsert_visitor_stat(pool: &Pool, stat: &VisitorStat) -> Result<()> {
    let count = stored_count(stat)?;

    #[cfg(feature = "postgres")]
    sqlx::query(
        r#"INSERT INTO visitor_stats (date, device_type, visitor_count)
           VALUES ($1, $2, $3)
           ON CONFLICT (date, device_type) DO UPDATE SET visitor_count = EXCLUDED.visitor_count"#,
    )
    .bind(stat.date)
    .bind(stat.device_type.as_str())
    .bind(count)
    .execute(pool)
    .await?;

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    sqlx::query(
        r#"INSERT INTO visitor_stats (date, device_type, visitor_count)
           VALUES (?, ?, ?)
           ON CONFLICT (date, device_type) DO UPDATE SET visitor_count = excluded.visitor_count"#,
    )
    .bind(stat.date.format(visitors::SQLITE_TIMESTAMP_FORMAT).to_string())
    .bind(stat.device_type.as_str())
    .bind(count)
    .execute(pool)
    .await?;

    Ok(())
}

// Dashboard metrics

/// Most recent KPI snapshot, `None` when nothing was ever recorded
pub async fn latest_metrics(pool: &Pool) -> Result<Option<DashboardMetrics>> {
    #[cfg(feature = "postgres")]
    let row: Option<MetricsRow> = sqlx::query_as(
        r#"SELECT recorded_at, total_revenue::FLOAT8 AS total_revenue,
           new_customers::BIGINT AS new_customers, active_accounts::BIGINT AS active_accounts,
           growth_rate::FLOAT8 AS growth_rate
           FROM dashboard_metrics ORDER BY recorded_at DESC, id DESC LIMIT 1"#,
    )
    .fetch_optional(pool)
    .await?;

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    let row: Option<MetricsRow> = sqlx::query_as(
        r#"SELECT recorded_at, total_revenue, new_customers, active_accounts, growth_rate
           FROM dashboard_metrics ORDER BY recorded_at DESC, id DESC LIMIT 1"#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

pub async fn insert_metrics(pool: &Pool, input: CreateMetrics) -> Result<()> {
    let recorded_at = input.recorded_at.unwrap_or_else(Utc::now);

    #[cfg(feature = "postgres")]
    sqlx::query(
        r#"INSERT INTO dashboard_metrics (recorded_at, total_revenue, new_customers,
           active_accounts, growth_rate)
           VALUES ($1, $2::FLOAT8::NUMERIC(12, 2), $3, $4, $5::FLOAT8::NUMERIC(5, 2))"#,
    )
    .bind(recorded_at)
    .bind(input.total_revenue)
    .bind(input.new_customers.map(|v| v as i32))
    .bind(input.active_accounts.map(|v| v as i32))
    .bind(input.growth_rate)
    .execute(pool)
    .await?;

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    sqlx::query(
        r#"INSERT INTO dashboard_metrics (recorded_at, total_revenue, new_customers,
           active_accounts, growth_rate)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(recorded_at.to_rfc3339())
    .bind(input.total_revenue)
    .bind(input.new_customers)
    .bind(input.active_accounts)
    .bind(input.growth_rate)
    .execute(pool)
    .await?;

    Ok(())
}

// Users, documents and sections

pub async fn create_user(pool: &Pool, input: CreateUser) -> Result<UserId> {
    let id = UserId::new();
    let now = Utc::now();

    #[cfg(feature = "postgres")]
    sqlx::query(
        r#"INSERT INTO users (id, name, email, avatar_url, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $5)"#,
    )
    .bind(id.0)
    .bind(&input.name)
    .bind(input.email.to_lowercase())
    .bind(&input.avatar_url)
    .bind(now)
    .execute(pool)
    .await?;

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    sqlx::query(
        r#"INSERT INTO users (id, name, email, avatar_url, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(id.0.to_string())
    .bind(&input.name)
    .bind(input.email.to_lowercase())
    .bind(&input.avatar_url)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn create_document(pool: &Pool, input: CreateDocument) -> Result<DocumentId> {
    let id = DocumentId::new();
    let now = Utc::now();

    #[cfg(feature = "postgres")]
    sqlx::query(
        r#"INSERT INTO documents (id, title, owner_id, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $4)"#,
    )
    .bind(id.0)
    .bind(&input.title)
    .bind(input.owner_id.map(|u| u.0))
    .bind(now)
    .execute(pool)
    .await?;

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    sqlx::query(
        r#"INSERT INTO documents (id, title, owner_id, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(id.0.to_string())
    .bind(&input.title)
    .bind(input.owner_id.map(|u| u.0.to_string()))
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn create_section(pool: &Pool, input: CreateSection) -> Result<SectionId> {
    let id = SectionId::new();
    let now = Utc::now();

    #[cfg(feature = "postgres")]
    sqlx::query(
        r#"INSERT INTO document_sections (id, document_id, header, section_type, status,
           target, "limit", reviewer_id, "order", created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)"#,
    )
    .bind(id.0)
    .bind(input.document_id.0)
    .bind(&input.header)
    .bind(input.section_type.map(|t| t.as_str()))
    .bind(input.status.as_str())
    .bind(input.target.map(|v| v as i32))
    .bind(input.limit.map(|v| v as i32))
    .bind(input.reviewer_id.map(|u| u.0))
    .bind(input.order)
    .bind(now)
    .execute(pool)
    .await?;

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    sqlx::query(
        r#"INSERT INTO document_sections (id, document_id, header, section_type, status,
           target, "limit", reviewer_id, "order", created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(id.0.to_string())
    .bind(input.document_id.0.to_string())
    .bind(&input.header)
    .bind(input.section_type.map(|t| t.as_str()))
    .bind(input.status.as_str())
    .bind(input.target)
    .bind(input.limit)
    .bind(input.reviewer_id.map(|u| u.0.to_string()))
    .bind(input.order)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Document sections in display order, with the reviewer's name joined in
pub async fn list_document_sections(pool: &Pool) -> Result<Vec<DocumentSectionListing>> {
    #[cfg(feature = "postgres")]
    let rows: Vec<SectionRow> = sqlx::query_as(
        r#"SELECT s.id, s.header, s.section_type, s.status, s.target::BIGINT AS target,
           s."limit"::BIGINT AS "limit", u.name AS reviewer_name, s."order" AS "order"
           FROM document_sections s
           LEFT JOIN users u ON s.reviewer_id = u.id
           ORDER BY s."order" ASC, s.id"#,
    )
    .fetch_all(pool)
    .await?;

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    let rows: Vec<SectionRow> = sqlx::query_as(
        r#"SELECT s.id, s.header, s.section_type, s.status, s.target,
           s."limit" AS "limit", u.name AS reviewer_name, s."order" AS "order"
           FROM document_sections s
           LEFT JOIN users u ON s.reviewer_id = u.id
           ORDER BY s."order" ASC, s.id"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

// Teams and projects only exist to give the schema realistic content

pub async fn create_team(pool: &Pool, name: &str) -> Result<uuid::Uuid> {
    let id = uuid::Uuid::new_v4();
    let now = Utc::now();

    #[cfg(feature = "postgres")]
    sqlx::query("INSERT INTO teams (id, name, created_at, updated_at) VALUES ($1, $2, $3, $3)")
        .bind(id)
        .bind(name)
        .bind(now)
        .execute(pool)
        .await?;

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    sqlx::query("INSERT INTO teams (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(pool)
        .await?;

    Ok(id)
}

pub async fn add_team_member(
    pool: &Pool,
    team_id: uuid::Uuid,
    user_id: UserId,
    role: &str,
) -> Result<()> {
    let now = Utc::now();

    #[cfg(feature = "postgres")]
    sqlx::query(
        r#"INSERT INTO team_members (user_id, team_id, role, joined_at)
           VALUES ($1, $2, $3, $4) ON CONFLICT (user_id, team_id) DO NOTHING"#,
    )
    .bind(user_id.0)
    .bind(team_id)
    .bind(role)
    .bind(now)
    .execute(pool)
    .await?;

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    sqlx::query(
        r#"INSERT INTO team_members (user_id, team_id, role, joined_at)
           VALUES (?, ?, ?, ?) ON CONFLICT (user_id, team_id) DO NOTHING"#,
    )
    .bind(user_id.0.to_string())
    .bind(team_id.to_string())
    .bind(role)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_project(
    pool: &Pool,
    name: &str,
    description: Option<&str>,
) -> Result<uuid::Uuid> {
    let id = uuid::Uuid::new_v4();
    let now = Utc::now();

    #[cfg(feature = "postgres")]
    sqlx::query(
        r#"INSERT INTO projects (id, name, description, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $4)"#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(now)
    .execute(pool)
    .await?;

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    sqlx::query(
        r#"INSERT INTO projects (id, name, description, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(id.to_string())
    .bind(name)
    .bind(description)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Wipe every table, children first
pub async fn clear_all(pool: &Pool) -> Result<()> {
    for table in [
        "team_members",
        "document_sections",
        "visitor_stats",
        "dashboard_metrics",
        "documents",
        "users",
        "teams",
        "projects",
    ] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(pool)
            .await?;
    }
    Ok(())
}

// Row types for SQLx mapping - PostgreSQL versions
#[cfg(feature = "postgres")]
#[derive(sqlx::FromRow)]
struct MetricsRow {
    recorded_at: DateTime<Utc>,
    total_revenue: Option<f64>,
    new_customers: Option<i64>,
    active_accounts: Option<i64>,
    growth_rate: Option<f64>,
}

#[cfg(feature = "postgres")]
impl From<MetricsRow> for DashboardMetrics {
    fn from(row: MetricsRow) -> Self {
        Self {
            recorded_at: Some(row.recorded_at),
            total_revenue: row.total_revenue,
            new_customers: row.new_customers,
            active_accounts: row.active_accounts,
            growth_rate: row.growth_rate,
        }
    }
}

#[cfg(feature = "postgres")]
#[derive(sqlx::FromRow)]
struct SectionRow {
    id: uuid::Uuid,
    header: String,
    section_type: Option<String>,
    status: Option<String>,
    target: Option<i64>,
    limit: Option<i64>,
    reviewer_name: Option<String>,
    order: i32,
}

#[cfg(feature = "postgres")]
impl From<SectionRow> for DocumentSectionListing {
    fn from(row: SectionRow) -> Self {
        Self {
            id: SectionId(row.id),
            header: row.header,
            section_type: row.section_type.unwrap_or_else(|| "Unknown".to_string()),
            status: row.status.unwrap_or_else(|| "Not Started".to_string()),
            target: row.target.unwrap_or(0),
            limit: row.limit.unwrap_or(0),
            reviewer: row.reviewer_name,
            order: row.order,
        }
    }
}

// Row types for SQLx mapping - SQLite versions (UUIDs and timestamps stored as TEXT)
#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
#[derive(sqlx::FromRow)]
struct MetricsRow {
    recorded_at: String,
    total_revenue: Option<f64>,
    new_customers: Option<i64>,
    active_accounts: Option<i64>,
    growth_rate: Option<f64>,
}

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
impl From<MetricsRow> for DashboardMetrics {
    fn from(row: MetricsRow) -> Self {
        Self {
            recorded_at: DateTime::parse_from_rfc3339(&row.recorded_at)
                .map(|d| d.with_timezone(&Utc))
                .ok(),
            total_revenue: row.total_revenue,
            new_customers: row.new_customers,
            active_accounts: row.active_accounts,
            growth_rate: row.growth_rate,
        }
    }
}

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
#[derive(sqlx::FromRow)]
struct SectionRow {
    id: String,
    header: String,
    section_type: Option<String>,
    status: Option<String>,
    target: Option<i64>,
    limit: Option<i64>,
    reviewer_name: Option<String>,
    order: i32,
}

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
impl From<SectionRow> for DocumentSectionListing {
    fn from(row: SectionRow) -> Self {
        Self {
            id: SectionId(row.id.parse().unwrap_or_default()),
            header: row.header,
            section_type: row.section_type.unwrap_or_else(|| "Unknown".to_string()),
            status: row.status.unwrap_or_else(|| "Not Started".to_string()),
            target: row.target.unwrap_or(0),
            limit: row.limit.unwrap_or(0),
            reviewer: row.reviewer_name,
            order: row.order,
        }
    }
}

#[cfg(all(test, feature = "sqlite", not(feature = "postgres")))]
mod tests {
    use super::*;
    use crate::domain::{DeviceType, SectionStatus, SectionType};
    use chrono::{Duration, NaiveDate};

    async fn test_pool() -> Pool {
        let pool = create_pool_with("sqlite::memory:", 1).await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let pool = test_pool().await;
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
    }

    #[test]
    fn test_stored_count() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let large = VisitorStat::daily(day, DeviceType::Desktop, 5_000_000_000);
        assert_eq!(stored_count(&large).unwrap(), 5_000_000_000);

        let negative = VisitorStat::daily(day, DeviceType::Mobile, -1);
        assert!(matches!(stored_count(&negative), Err(Error::MalformedRow(_))));
    }

    #[tokio::test]
    async fn test_upsert_keeps_counts_past_32_bits() {
        let pool = test_pool().await;
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let count = i64::from(u32::MAX) + 7;

        upsert_visitor_stat(&pool, &VisitorStat::daily(day, DeviceType::Desktop, count))
            .await
            .unwrap();
        let series = query_daily_visitors(&pool, day, day).await.unwrap();
        assert_eq!(series[0].desktop, count);

        let negative = VisitorStat::daily(day, DeviceType::Desktop, -5);
        assert!(upsert_visitor_stat(&pool, &negative).await.is_err());
        let series = query_daily_visitors(&pool, day, day).await.unwrap();
        assert_eq!(series[0].desktop, count);
    }

    #[tokio::test]
    async fn test_latest_metrics_none_when_empty() {
        let pool = test_pool().await;
        assert!(latest_metrics(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_metrics_picks_most_recent() {
        let pool = test_pool().await;
        let now = Utc::now();

        insert_metrics(
            &pool,
            CreateMetrics {
                recorded_at: Some(now - Duration::days(1)),
                total_revenue: Some(100.0),
                new_customers: Some(1),
                active_accounts: Some(2),
                growth_rate: Some(0.5),
            },
        )
        .await
        .unwrap();
        insert_metrics(
            &pool,
            CreateMetrics {
                recorded_at: Some(now),
                total_revenue: Some(1250.5),
                new_customers: Some(1234),
                active_accounts: Some(45678),
                growth_rate: Some(4.5),
            },
        )
        .await
        .unwrap();

        let latest = latest_metrics(&pool).await.unwrap().unwrap();
        assert_eq!(latest.total_revenue, Some(1250.5));
        assert_eq!(latest.new_customers, Some(1234));
        assert_eq!(latest.active_accounts, Some(45678));
        assert_eq!(latest.growth_rate, Some(4.5));
        assert!(latest.recorded_at.is_some());
    }

    #[tokio::test]
    async fn test_list_document_sections_ordered_with_reviewer() {
        let pool = test_pool().await;

        let reviewer = create_user(
            &pool,
            CreateUser {
                name: "Eddie Lake".to_string(),
                email: "Eddie@Example.com".to_string(),
                avatar_url: None,
            },
        )
        .await
        .unwrap();
        let document = create_document(
            &pool,
            CreateDocument {
                title: "Proposal".to_string(),
                owner_id: Some(reviewer),
            },
        )
        .await
        .unwrap();

        create_section(
            &pool,
            CreateSection {
                document_id: document,
                header: "Table of contents".to_string(),
                section_type: Some(SectionType::TableOfContents),
                status: SectionStatus::Done,
                target: Some(29),
                limit: Some(24),
                reviewer_id: None,
                order: 1,
            },
        )
        .await
        .unwrap();
        create_section(
            &pool,
            CreateSection {
                document_id: document,
                header: "Cover page".to_string(),
                section_type: None,
                status: SectionStatus::InProcess,
                target: None,
                limit: Some(5),
                reviewer_id: Some(reviewer),
                order: 0,
            },
        )
        .await
        .unwrap();

        let sections = list_document_sections(&pool).await.unwrap();
        assert_eq!(sections.len(), 2);

        assert_eq!(sections[0].header, "Cover page");
        assert_eq!(sections[0].section_type, "Unknown");
        assert_eq!(sections[0].status, "In Process");
        assert_eq!(sections[0].target, 0);
        assert_eq!(sections[0].limit, 5);
        assert_eq!(sections[0].reviewer.as_deref(), Some("Eddie Lake"));

        assert_eq!(sections[1].header, "Table of contents");
        assert_eq!(sections[1].section_type, "Table of contents");
        assert!(sections[1].reviewer.is_none());
    }

    #[tokio::test]
    async fn test_user_email_unique_case_insensitive() {
        let pool = test_pool().await;
        let input = CreateUser {
            name: "A".to_string(),
            email: "same@example.com".to_string(),
            avatar_url: None,
        };
        create_user(&pool, input.clone()).await.unwrap();

        let dup = CreateUser {
            email: "SAME@example.com".to_string(),
            ..input
        };
        assert!(create_user(&pool, dup).await.is_err());
    }

    #[tokio::test]
    async fn test_team_membership_idempotent() {
        let pool = test_pool().await;
        let user = create_user(
            &pool,
            CreateUser {
                name: "Member".to_string(),
                email: "member@example.com".to_string(),
                avatar_url: None,
            },
        )
        .await
        .unwrap();
        let team = create_team(&pool, "Alpha Team").await.unwrap();

        add_team_member(&pool, team, user, "Member").await.unwrap();
        add_team_member(&pool, team, user, "Lead").await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team_members")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_clear_all_empties_tables() {
        let pool = test_pool().await;
        create_project(&pool, "Apollo", Some("demo")).await.unwrap();
        create_team(&pool, "Bravo Team").await.unwrap();

        clear_all(&pool).await.unwrap();

        let projects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&pool)
            .await
            .unwrap();
        let teams: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(projects, 0);
        assert_eq!(teams, 0);
    }
}
