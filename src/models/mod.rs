use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A finished match from the historical store. Read-only to the prediction
/// pipeline; rows are keyed by calendar date, not kickoff time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoricalMatch {
    pub id: i64,
    pub date: NaiveDate,
    pub league: String,
    pub season: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: i64,
    pub away_goals: i64,
    pub total_goals: i64,
    pub home_shots: Option<i64>,
    pub away_shots: Option<i64>,
    pub over_25_odds: Option<f64>,
    pub under_25_odds: Option<f64>,
}

impl HistoricalMatch {
    /// `total_goals` is always derived from the scoreline here so the
    /// invariant cannot drift from the inputs.
    pub fn new(
        date: NaiveDate,
        league: &str,
        home_team: &str,
        away_team: &str,
        home_goals: i64,
        away_goals: i64,
    ) -> Self {
        Self {
            id: 0,
            date,
            league: league.to_string(),
            season: None,
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_goals,
            away_goals,
            total_goals: home_goals + away_goals,
            home_shots: None,
            away_shots: None,
            over_25_odds: None,
            under_25_odds: None,
        }
    }
}

/// Which side of the pitch a team occupied when querying its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Home,
    Away,
}

/// Scoring and conceding averages over a team's recent window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FormSummary {
    pub avg_scored: f64,
    pub avg_conceded: f64,
    pub games_played: u32,
}

impl FormSummary {
    pub fn empty() -> Self {
        Self {
            avg_scored: 0.0,
            avg_conceded: 0.0,
            games_played: 0,
        }
    }
}

/// Recent total-goals average between an unordered pair of teams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadToHeadSummary {
    pub avg_goals: f64,
    pub games_played: u32,
}

impl HeadToHeadSummary {
    pub fn empty() -> Self {
        Self {
            avg_goals: 0.0,
            games_played: 0,
        }
    }
}

/// League-wide scoring baseline over the most recent window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeagueContextSummary {
    pub avg_goals: f64,
}

/// Completed over/under 2.5 prediction for one fixture. Immutable after
/// construction except for the bookmaker odds fields, which a caller may
/// attach when it has fresher market data than the request carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub fixture_id: String,
    pub date: NaiveDate,
    pub league: String,
    pub home_team: String,
    pub away_team: String,

    pub over_25_probability: f64,
    pub under_25_probability: f64,

    pub confidence_score: f64,
    pub confidence_level: String,

    pub key_factors: Vec<String>,

    pub bookmaker_over_25_odds: Option<f64>,
    pub bookmaker_under_25_odds: Option<f64>,
    pub odds_updated_at: Option<DateTime<Utc>>,

    pub model_version: String,
    pub generated_at: DateTime<Utc>,
}

/// Upcoming fixture as reported by the odds provider.
#[derive(Debug, Clone, Serialize)]
pub struct Fixture {
    pub fixture_id: String,
    pub date: DateTime<Utc>,
    pub league: String,
    pub home_team: String,
    pub away_team: String,
}

/// Over/under 2.5 market prices for one fixture from one bookmaker.
#[derive(Debug, Clone, Serialize)]
pub struct MatchOdds {
    pub over_25_odds: f64,
    pub under_25_odds: f64,
    pub bookmaker: String,
    pub last_update: Option<DateTime<Utc>>,
}

// API Response types
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}
