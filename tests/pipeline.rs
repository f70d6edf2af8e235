use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

use goalline_backend::db::{init_database_with_pool, insert_historical_match, seed_data};
use goalline_backend::models::HistoricalMatch;
use goalline_backend::services::{
    engineer_features, head_to_head, recent_form, ModelFile, ModelService, PredictionEngine,
    PredictionError, VenueMode, FEATURE_NAMES, FORM_WINDOW,
};

async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    init_database_with_pool(&pool).await.unwrap();
    pool
}

async fn loaded_model() -> Arc<ModelService> {
    let model = Arc::new(ModelService::new());
    model
        .install(ModelFile {
            version: "test_v1".to_string(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            coefficients: vec![
                0.2, 0.1, 0.01, 0.18, 0.07, 0.2, 0.12, 0.01, 0.14, 0.09, 0.08, 0.02, 0.25, 0.16,
                0.03, 0.02, -0.84, 0.62,
            ],
            intercept: -1.5,
        })
        .await
        .unwrap();
    model
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

async fn insert(pool: &SqlitePool, date: NaiveDate, home: &str, away: &str, hg: i64, ag: i64) {
    let m = HistoricalMatch::new(date, "Premier League", home, away, hg, ag);
    insert_historical_match(pool, &m).await.unwrap();
}

#[tokio::test]
async fn empty_history_degrades_to_documented_defaults() {
    let pool = test_pool().await;

    let features = engineer_features(
        &pool,
        "Debut FC",
        "Newcomers United",
        "Brand New League",
        d(2026, 3, 1),
        None,
        None,
    )
    .await
    .unwrap();

    assert_eq!(features.home_avg_scored, 0.0);
    assert_eq!(features.home_avg_conceded, 0.0);
    assert_eq!(features.home_games_played, 0.0);
    assert_eq!(features.away_avg_scored, 0.0);
    assert_eq!(features.h2h_games, 0.0);
    assert_eq!(features.league_avg_goals, 2.5);
    assert_eq!(features.over_25_odds, 2.0);
    assert_eq!(features.under_25_odds, 2.0);

    // The full pipeline still produces a prediction for debut fixtures.
    let engine = PredictionEngine::new(loaded_model().await);
    let prediction = engine
        .generate(
            &pool,
            "Debut FC",
            "Newcomers United",
            "Brand New League",
            d(2026, 3, 1),
            None,
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        prediction.over_25_probability + prediction.under_25_probability,
        1.0
    );
}

#[tokio::test]
async fn supplied_odds_pass_through_unchanged() {
    let pool = test_pool().await;

    let features = engineer_features(
        &pool,
        "Arsenal",
        "Chelsea",
        "Premier League",
        d(2026, 1, 10),
        Some(1.85),
        Some(2.05),
    )
    .await
    .unwrap();

    assert_eq!(features.over_25_odds, 1.85);
    assert_eq!(features.under_25_odds, 2.05);
}

#[tokio::test]
async fn form_window_truncates_to_most_recent() {
    let pool = test_pool().await;

    // Seven home matches; the two oldest score differently and must be
    // excluded by the window.
    for day in 1..=5 {
        insert(&pool, d(2026, 2, day), "Arsenal", "Everton", 2, 1).await;
    }
    insert(&pool, d(2026, 1, 5), "Arsenal", "Everton", 9, 9).await;
    insert(&pool, d(2026, 1, 6), "Arsenal", "Everton", 9, 9).await;

    let form = recent_form(&pool, "Arsenal", d(2026, 3, 1), VenueMode::Home, FORM_WINDOW)
        .await
        .unwrap();

    assert_eq!(form.games_played, 5);
    assert_eq!(form.avg_scored, 2.0);
    assert_eq!(form.avg_conceded, 1.0);
}

#[tokio::test]
async fn form_excludes_matches_on_the_cutoff_date() {
    let pool = test_pool().await;

    insert(&pool, d(2026, 3, 1), "Arsenal", "Everton", 5, 5).await;
    insert(&pool, d(2026, 2, 20), "Arsenal", "Everton", 1, 0).await;

    let form = recent_form(&pool, "Arsenal", d(2026, 3, 1), VenueMode::Home, FORM_WINDOW)
        .await
        .unwrap();

    // Strictly-before cutoff: the same-day match must not leak in.
    assert_eq!(form.games_played, 1);
    assert_eq!(form.avg_scored, 1.0);
}

#[tokio::test]
async fn all_venue_merge_takes_most_recent_across_venues() {
    let pool = test_pool().await;

    // Home matches (Arsenal score 3, concede 0): three recent, two stale.
    for day in [28, 26, 24] {
        insert(&pool, d(2026, 2, day), "Arsenal", "Everton", 3, 0).await;
    }
    insert(&pool, d(2026, 1, 3), "Arsenal", "Everton", 3, 0).await;
    insert(&pool, d(2026, 1, 2), "Arsenal", "Everton", 3, 0).await;

    // Away matches (Arsenal score 1, concede 2): two recent, three stale.
    for day in [27, 25] {
        insert(&pool, d(2026, 2, day), "Brighton", "Arsenal", 2, 1).await;
    }
    for day in [6, 5, 4] {
        insert(&pool, d(2026, 1, day), "Brighton", "Arsenal", 2, 1).await;
    }

    let form = recent_form(&pool, "Arsenal", d(2026, 3, 1), VenueMode::All, FORM_WINDOW)
        .await
        .unwrap();

    // The true five most recent are 3 home + 2 away, not the five most
    // recent from either venue alone.
    assert_eq!(form.games_played, 5);
    assert!((form.avg_scored - (3.0 * 3.0 + 2.0 * 1.0) / 5.0).abs() < 1e-9);
    assert!((form.avg_conceded - (3.0 * 0.0 + 2.0 * 2.0) / 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn head_to_head_is_symmetric_and_venue_blind() {
    let pool = test_pool().await;

    insert(&pool, d(2026, 2, 1), "Arsenal", "Chelsea", 3, 1).await;
    insert(&pool, d(2026, 1, 1), "Chelsea", "Arsenal", 2, 2).await;
    insert(&pool, d(2025, 12, 1), "Arsenal", "Chelsea", 0, 1).await;
    // Noise: matches against other opponents must not count.
    insert(&pool, d(2026, 2, 10), "Arsenal", "Everton", 5, 0).await;

    let ab = head_to_head(&pool, "Arsenal", "Chelsea", d(2026, 3, 1), FORM_WINDOW)
        .await
        .unwrap();
    let ba = head_to_head(&pool, "Chelsea", "Arsenal", d(2026, 3, 1), FORM_WINDOW)
        .await
        .unwrap();

    assert_eq!(ab, ba);
    assert_eq!(ab.games_played, 3);
    assert!((ab.avg_goals - 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn pipeline_is_deterministic_for_identical_inputs() {
    let pool = test_pool().await;
    seed_data(&pool).await.unwrap();

    let engine = PredictionEngine::new(loaded_model().await);
    let date = chrono::Utc::now().date_naive() + chrono::Duration::days(1);

    let first = engine
        .generate(
            &pool,
            "Arsenal",
            "Chelsea",
            "Premier League",
            date,
            None,
            Some(1.85),
            Some(2.05),
        )
        .await
        .unwrap();
    let second = engine
        .generate(
            &pool,
            "Arsenal",
            "Chelsea",
            "Premier League",
            date,
            None,
            Some(1.85),
            Some(2.05),
        )
        .await
        .unwrap();

    assert_eq!(first.over_25_probability, second.over_25_probability);
    assert_eq!(first.under_25_probability, second.under_25_probability);
    assert_eq!(first.confidence_score, second.confidence_score);
    assert_eq!(first.confidence_level, second.confidence_level);
    assert_eq!(first.key_factors, second.key_factors);

    assert_eq!(first.over_25_probability + first.under_25_probability, 1.0);
    assert!((0.0..=1.0).contains(&first.confidence_score));
    assert!(first.key_factors.len() <= 5);
    assert_eq!(first.fixture_id, second.fixture_id);
}

#[tokio::test]
async fn synthesized_fixture_id_is_deterministic() {
    let pool = test_pool().await;
    let engine = PredictionEngine::new(loaded_model().await);

    let prediction = engine
        .generate(
            &pool,
            "Arsenal",
            "Chelsea",
            "Premier League",
            d(2026, 1, 10),
            None,
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(prediction.fixture_id, "match_Arsenal_Chelsea_20260110");
}

#[tokio::test]
async fn unloaded_model_is_a_precondition_failure() {
    let pool = test_pool().await;
    let engine = PredictionEngine::new(Arc::new(ModelService::new()));

    let err = engine
        .generate(
            &pool,
            "Arsenal",
            "Chelsea",
            "Premier League",
            d(2026, 1, 10),
            None,
            None,
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PredictionError>(),
        Some(PredictionError::ModelNotLoaded)
    ));
}
