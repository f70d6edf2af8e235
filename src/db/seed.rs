use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::db::insert_historical_match;
use crate::models::HistoricalMatch;

/// Demo Premier League results, expressed as days before today so the
/// recent-form windows always have data regardless of when the seed runs.
/// Scorelines are fixed, so repeated seeding from a fresh database yields
/// identical features and predictions.
const RESULTS: [(i64, &str, &str, i64, i64); 36] = [
    // Most recent round
    (3, "Arsenal", "Everton", 3, 1),
    (3, "Manchester City", "Chelsea", 2, 2),
    (4, "Liverpool", "Newcastle", 2, 0),
    (4, "Brighton", "Tottenham", 1, 3),
    // One week back
    (10, "Chelsea", "Liverpool", 1, 2),
    (10, "Tottenham", "Arsenal", 2, 2),
    (11, "Everton", "Manchester City", 0, 3),
    (11, "Newcastle", "Brighton", 2, 1),
    // Two weeks back
    (17, "Arsenal", "Newcastle", 2, 0),
    (17, "Liverpool", "Brighton", 3, 1),
    (18, "Manchester City", "Tottenham", 4, 1),
    (18, "Chelsea", "Everton", 2, 1),
    // Three weeks back
    (24, "Brighton", "Chelsea", 2, 2),
    (24, "Newcastle", "Manchester City", 1, 1),
    (25, "Arsenal", "Liverpool", 2, 1),
    (25, "Tottenham", "Everton", 3, 0),
    // Four weeks back
    (31, "Everton", "Newcastle", 1, 1),
    (31, "Liverpool", "Manchester City", 2, 2),
    (32, "Chelsea", "Tottenham", 0, 2),
    (32, "Arsenal", "Brighton", 4, 0),
    // Five weeks back
    (38, "Manchester City", "Arsenal", 1, 1),
    (38, "Newcastle", "Chelsea", 3, 1),
    (39, "Brighton", "Everton", 2, 0),
    (39, "Tottenham", "Liverpool", 1, 2),
    // Six weeks back
    (45, "Arsenal", "Chelsea", 3, 1),
    (45, "Everton", "Liverpool", 0, 2),
    (46, "Manchester City", "Brighton", 3, 0),
    (46, "Newcastle", "Tottenham", 2, 2),
    // Older head-to-head history
    (120, "Chelsea", "Arsenal", 2, 2),
    (121, "Liverpool", "Tottenham", 4, 2),
    (122, "Brighton", "Newcastle", 0, 1),
    (123, "Manchester City", "Everton", 2, 0),
    (200, "Arsenal", "Chelsea", 2, 1),
    (201, "Tottenham", "Manchester City", 0, 4),
    (280, "Chelsea", "Arsenal", 1, 3),
    (281, "Liverpool", "Everton", 2, 0),
];

/// Insert the demo dataset. Returns the number of rows inserted.
pub async fn seed_data(pool: &SqlitePool) -> Result<u32> {
    let today = Utc::now().date_naive();
    let mut inserted = 0u32;

    for (days_ago, home, away, home_goals, away_goals) in RESULTS {
        let m = HistoricalMatch::new(
            today - Duration::days(days_ago),
            "Premier League",
            home,
            away,
            home_goals,
            away_goals,
        );
        insert_historical_match(pool, &m).await?;
        inserted += 1;
    }

    tracing::info!("Seeded {} historical matches", inserted);
    Ok(inserted)
}
