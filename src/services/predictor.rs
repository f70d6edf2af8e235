use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::models::Prediction;
use crate::services::features::{engineer_features, MatchFeatures};
use crate::services::model::{ModelService, PredictionError};

/// Cap on the number of explanatory factors per prediction.
const MAX_KEY_FACTORS: usize = 5;

/// Distance from a coin flip, scaled to [0, 1]. 0 means the model sees a
/// 50/50 match, 1 means certainty either way.
pub fn confidence_score(over_probability: f64) -> f64 {
    (over_probability - 0.5).abs() * 2.0
}

/// Discrete tier for a confidence score. Boundaries are half-open with the
/// lower bound inclusive: exactly 0.3 is Medium, exactly 0.6 is High,
/// exactly 0.85 is Very High.
pub fn confidence_level(score: f64) -> &'static str {
    if score < 0.3 {
        "Low"
    } else if score < 0.6 {
        "Medium"
    } else if score < 0.85 {
        "High"
    } else {
        "Very High"
    }
}

/// Human-readable factors behind a prediction. Rules fire in a fixed
/// priority order, which is also the display order; fewer than five firing
/// rules yields fewer factors, never padding.
pub fn key_factors(features: &MatchFeatures, home_team: &str, away_team: &str) -> Vec<String> {
    let mut factors = Vec::new();

    if features.home_home_avg_scored >= 2.0 {
        factors.push(format!(
            "{} averaging {:.1} goals/game at home (last 5)",
            home_team, features.home_home_avg_scored
        ));
    }

    if features.away_away_avg_conceded >= 1.5 {
        factors.push(format!(
            "{} conceding {:.1} goals/game away (last 5)",
            away_team, features.away_away_avg_conceded
        ));
    }

    if features.h2h_games >= 3.0 && features.h2h_avg_goals >= 2.5 {
        factors.push(format!(
            "Last {} H2H matches averaged {:.1} total goals",
            features.h2h_games as i64, features.h2h_avg_goals
        ));
    }

    if features.league_avg_goals >= 2.7 {
        factors.push(format!(
            "League averaging {:.1} goals/game (high-scoring)",
            features.league_avg_goals
        ));
    }

    if features.total_avg_scored >= 3.0 {
        factors.push(format!(
            "Combined attack averaging {:.1} goals/game",
            features.total_avg_scored
        ));
    }

    factors.truncate(MAX_KEY_FACTORS);
    factors
}

/// Orchestrates one prediction request: features, classifier, confidence,
/// key factors. Strictly sequential and fail-fast; no partial `Prediction`
/// is ever returned.
pub struct PredictionEngine {
    model: Arc<ModelService>,
}

impl PredictionEngine {
    pub fn new(model: Arc<ModelService>) -> Self {
        Self { model }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn generate(
        &self,
        pool: &SqlitePool,
        home_team: &str,
        away_team: &str,
        league: &str,
        match_date: NaiveDate,
        fixture_id: Option<String>,
        over_25_odds: Option<f64>,
        under_25_odds: Option<f64>,
    ) -> Result<Prediction> {
        // Loaded-model check up front: an unloaded classifier is a
        // precondition failure, never something to lazily fix mid-request.
        let feature_names = self
            .model
            .feature_names()
            .await
            .ok_or(PredictionError::ModelNotLoaded)?;
        let model_version = self
            .model
            .version()
            .await
            .ok_or(PredictionError::ModelNotLoaded)?;

        let fixture_id = fixture_id.unwrap_or_else(|| {
            // Collision-prone but deterministic; production callers supply
            // the provider's fixture id instead.
            format!(
                "match_{}_{}_{}",
                home_team,
                away_team,
                match_date.format("%Y%m%d")
            )
        });

        let features = engineer_features(
            pool,
            home_team,
            away_team,
            league,
            match_date,
            over_25_odds,
            under_25_odds,
        )
        .await?;

        let vector = features.vector_for(&feature_names)?;
        let (under_prob, over_prob) = self.model.predict_proba(&vector).await?;

        let confidence = confidence_score(over_prob);
        let factors = key_factors(&features, home_team, away_team);

        tracing::info!(
            "Prediction {}: {} vs {}: over {:.1}%, confidence {:.2} ({})",
            fixture_id,
            home_team,
            away_team,
            over_prob * 100.0,
            confidence,
            confidence_level(confidence)
        );

        Ok(Prediction {
            fixture_id,
            date: match_date,
            league: league.to_string(),
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            over_25_probability: over_prob,
            under_25_probability: under_prob,
            confidence_score: confidence,
            confidence_level: confidence_level(confidence).to_string(),
            key_factors: factors,
            bookmaker_over_25_odds: over_25_odds,
            bookmaker_under_25_odds: under_25_odds,
            odds_updated_at: None,
            model_version,
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_zero_only_at_coin_flip() {
        assert_eq!(confidence_score(0.5), 0.0);
        assert!(confidence_score(0.51) > 0.0);
        assert_eq!(confidence_score(1.0), 1.0);
        assert_eq!(confidence_score(0.0), 1.0);
    }

    #[test]
    fn tier_boundaries_are_lower_inclusive() {
        assert_eq!(confidence_level(0.0), "Low");
        assert_eq!(confidence_level(0.29999), "Low");
        assert_eq!(confidence_level(0.3), "Medium");
        assert_eq!(confidence_level(0.59999), "Medium");
        assert_eq!(confidence_level(0.6), "High");
        assert_eq!(confidence_level(0.84999), "High");
        assert_eq!(confidence_level(0.85), "Very High");
        assert_eq!(confidence_level(1.0), "Very High");
    }

    fn quiet_features() -> MatchFeatures {
        MatchFeatures {
            home_avg_scored: 1.0,
            home_avg_conceded: 1.0,
            home_games_played: 5.0,
            home_home_avg_scored: 1.0,
            home_home_avg_conceded: 1.0,
            away_avg_scored: 1.0,
            away_avg_conceded: 1.0,
            away_games_played: 5.0,
            away_away_avg_scored: 1.0,
            away_away_avg_conceded: 1.0,
            h2h_avg_goals: 2.0,
            h2h_games: 2.0,
            league_avg_goals: 2.5,
            total_avg_scored: 2.0,
            goal_diff_home: 0.0,
            goal_diff_away: 0.0,
            over_25_odds: 2.0,
            under_25_odds: 2.0,
        }
    }

    #[test]
    fn no_rule_fires_for_a_quiet_fixture() {
        assert!(key_factors(&quiet_features(), "Fulham", "Brentford").is_empty());
    }

    #[test]
    fn factors_follow_rule_priority_order() {
        let mut features = quiet_features();
        features.home_home_avg_scored = 2.4;
        features.away_away_avg_conceded = 1.8;
        features.h2h_games = 4.0;
        features.h2h_avg_goals = 3.25;
        features.league_avg_goals = 2.9;
        features.total_avg_scored = 3.6;

        let factors = key_factors(&features, "Arsenal", "Chelsea");
        assert_eq!(factors.len(), 5);
        assert_eq!(factors[0], "Arsenal averaging 2.4 goals/game at home (last 5)");
        assert_eq!(factors[1], "Chelsea conceding 1.8 goals/game away (last 5)");
        assert_eq!(factors[2], "Last 4 H2H matches averaged 3.2 total goals");
        assert_eq!(factors[3], "League averaging 2.9 goals/game (high-scoring)");
        assert_eq!(factors[4], "Combined attack averaging 3.6 goals/game");
    }

    #[test]
    fn h2h_rule_needs_both_sample_and_average() {
        let mut features = quiet_features();
        features.h2h_games = 2.0;
        features.h2h_avg_goals = 4.0;
        assert!(key_factors(&features, "A", "B").is_empty());

        features.h2h_games = 3.0;
        features.h2h_avg_goals = 2.4;
        assert!(key_factors(&features, "A", "B").is_empty());

        features.h2h_avg_goals = 2.5;
        let factors = key_factors(&features, "A", "B");
        assert_eq!(factors, vec!["Last 3 H2H matches averaged 2.5 total goals"]);
    }
}
