pub mod seed;
pub use seed::seed_data;

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::env;
use std::str::FromStr;

use crate::models::{HistoricalMatch, Venue};

pub async fn create_pool() -> Result<SqlitePool> {
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/goalline.db".to_string());

    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(&database_url);

    if let Some(parent) = std::path::Path::new(file_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
    }

    let options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Called from the CLI where no pool exists yet.
pub async fn init_database() -> Result<()> {
    let pool = create_pool().await?;
    init_database_with_pool(&pool).await
}

/// Called from the server so schema creation shares the main pool.
pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matches_historical (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            league TEXT NOT NULL,
            season TEXT,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            total_goals INTEGER NOT NULL,
            home_shots INTEGER,
            away_shots INTEGER,
            over_25_odds REAL,
            under_25_odds REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_hist_home_date ON matches_historical(home_team, date)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_hist_away_date ON matches_historical(away_team, date)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_hist_league_date ON matches_historical(league, date)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database initialized successfully");
    Ok(())
}

pub async fn insert_historical_match(pool: &SqlitePool, m: &HistoricalMatch) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO matches_historical
        (date, league, season, home_team, away_team, home_goals, away_goals, total_goals,
         home_shots, away_shots, over_25_odds, under_25_odds)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(m.date)
    .bind(&m.league)
    .bind(&m.season)
    .bind(&m.home_team)
    .bind(&m.away_team)
    .bind(m.home_goals)
    .bind(m.away_goals)
    .bind(m.total_goals)
    .bind(m.home_shots)
    .bind(m.away_shots)
    .bind(m.over_25_odds)
    .bind(m.under_25_odds)
    .execute(pool)
    .await?;

    Ok(())
}

/// Matches where `team` played at the given venue, strictly before
/// `before_date`, most recent first.
pub async fn matches_for_team(
    pool: &SqlitePool,
    team: &str,
    venue: Venue,
    before_date: NaiveDate,
    limit: i64,
) -> Result<Vec<HistoricalMatch>> {
    let query = match venue {
        Venue::Home => {
            "SELECT * FROM matches_historical WHERE home_team = ? AND date < ? ORDER BY date DESC LIMIT ?"
        }
        Venue::Away => {
            "SELECT * FROM matches_historical WHERE away_team = ? AND date < ? ORDER BY date DESC LIMIT ?"
        }
    };

    let matches = sqlx::query_as::<_, HistoricalMatch>(query)
        .bind(team)
        .bind(before_date)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(matches)
}

/// Meetings between the two teams in either home/away order, strictly before
/// `before_date`, most recent first.
pub async fn matches_between(
    pool: &SqlitePool,
    team_a: &str,
    team_b: &str,
    before_date: NaiveDate,
    limit: i64,
) -> Result<Vec<HistoricalMatch>> {
    let matches = sqlx::query_as::<_, HistoricalMatch>(
        r#"
        SELECT * FROM matches_historical
        WHERE ((home_team = ? AND away_team = ?)
            OR (home_team = ? AND away_team = ?))
            AND date < ?
        ORDER BY date DESC
        LIMIT ?
        "#,
    )
    .bind(team_a)
    .bind(team_b)
    .bind(team_b)
    .bind(team_a)
    .bind(before_date)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(matches)
}

pub async fn matches_for_league(
    pool: &SqlitePool,
    league: &str,
    before_date: NaiveDate,
    limit: i64,
) -> Result<Vec<HistoricalMatch>> {
    let matches = sqlx::query_as::<_, HistoricalMatch>(
        "SELECT * FROM matches_historical WHERE league = ? AND date < ? ORDER BY date DESC LIMIT ?",
    )
    .bind(league)
    .bind(before_date)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(matches)
}

pub async fn count_historical_matches(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matches_historical")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
