//! Feature engineering for the over/under 2.5 goals classifier.
//!
//! All calculators degrade to documented defaults when history is sparse:
//! a team with no qualifying matches gets zero averages, a league with no
//! matches falls back to the 2.5 goals prior. Missing odds become the
//! neutral 2.0/2.0 placeholder. None of these are errors; only store
//! failures propagate.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use statrs::statistics::Statistics;

use crate::db::{matches_between, matches_for_league, matches_for_team};
use crate::models::{FormSummary, HeadToHeadSummary, LeagueContextSummary, Venue};
use crate::services::model::PredictionError;

/// Recent-form and head-to-head windows (matches).
pub const FORM_WINDOW: i64 = 5;
/// League baseline window (matches).
pub const LEAGUE_CONTEXT_WINDOW: i64 = 100;
/// Smoothing prior when a league has no history. Deliberately not zero:
/// a zero baseline would bias the classifier toward "under".
pub const LEAGUE_AVG_PRIOR: f64 = 2.5;
/// Even-odds placeholder when no bookmaker prices were supplied.
pub const NEUTRAL_ODDS: f64 = 2.0;

/// Venue filter for form calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueMode {
    Home,
    Away,
    All,
}

/// A team's scoring/conceding averages over its last `window` matches
/// strictly before `as_of_date`.
///
/// For `VenueMode::All` the two venue sub-queries are fetched separately,
/// merged, re-sorted by date and truncated. Either sub-list alone could
/// starve the merge of the true most-recent matches, so both must be
/// over-provisioned to `window` before truncation.
pub async fn recent_form(
    pool: &SqlitePool,
    team: &str,
    as_of_date: NaiveDate,
    venue_mode: VenueMode,
    window: i64,
) -> Result<FormSummary> {
    let (scored, conceded): (Vec<f64>, Vec<f64>) = match venue_mode {
        VenueMode::Home => {
            let matches = matches_for_team(pool, team, Venue::Home, as_of_date, window).await?;
            matches
                .iter()
                .map(|m| (m.home_goals as f64, m.away_goals as f64))
                .unzip()
        }
        VenueMode::Away => {
            let matches = matches_for_team(pool, team, Venue::Away, as_of_date, window).await?;
            matches
                .iter()
                .map(|m| (m.away_goals as f64, m.home_goals as f64))
                .unzip()
        }
        VenueMode::All => {
            let home = matches_for_team(pool, team, Venue::Home, as_of_date, window).await?;
            let away = matches_for_team(pool, team, Venue::Away, as_of_date, window).await?;

            let mut merged: Vec<_> = home.into_iter().chain(away).collect();
            merged.sort_by(|a, b| b.date.cmp(&a.date));
            merged.truncate(window as usize);

            // Attribute goals by the side the team actually occupied in each
            // match, not by which sub-query produced it.
            merged
                .iter()
                .map(|m| {
                    if m.home_team == team {
                        (m.home_goals as f64, m.away_goals as f64)
                    } else {
                        (m.away_goals as f64, m.home_goals as f64)
                    }
                })
                .unzip()
        }
    };

    if scored.is_empty() {
        return Ok(FormSummary::empty());
    }

    Ok(FormSummary {
        avg_scored: scored.iter().copied().mean(),
        avg_conceded: conceded.iter().copied().mean(),
        games_played: scored.len() as u32,
    })
}

/// Average total goals over the last `window` meetings between the two
/// teams, regardless of who played home. Symmetric in its team arguments.
pub async fn head_to_head(
    pool: &SqlitePool,
    team_a: &str,
    team_b: &str,
    as_of_date: NaiveDate,
    window: i64,
) -> Result<HeadToHeadSummary> {
    let matches = matches_between(pool, team_a, team_b, as_of_date, window).await?;

    if matches.is_empty() {
        return Ok(HeadToHeadSummary::empty());
    }

    let totals: Vec<f64> = matches.iter().map(|m| m.total_goals as f64).collect();

    Ok(HeadToHeadSummary {
        avg_goals: totals.iter().copied().mean(),
        games_played: matches.len() as u32,
    })
}

/// League-wide average total goals over the league's most recent window.
pub async fn league_context(
    pool: &SqlitePool,
    league: &str,
    as_of_date: NaiveDate,
    window: i64,
) -> Result<LeagueContextSummary> {
    let matches = matches_for_league(pool, league, as_of_date, window).await?;

    if matches.is_empty() {
        return Ok(LeagueContextSummary {
            avg_goals: LEAGUE_AVG_PRIOR,
        });
    }

    let totals: Vec<f64> = matches.iter().map(|m| m.total_goals as f64).collect();

    Ok(LeagueContextSummary {
        avg_goals: totals.iter().copied().mean(),
    })
}

/// Feature names in training order. The classifier artifact declares the
/// same list; `MatchFeatures::vector_for` cross-checks the two at request
/// time and fails fast on any mismatch.
pub const FEATURE_NAMES: [&str; 18] = [
    "home_avg_scored",
    "home_avg_conceded",
    "home_games_played",
    "home_home_avg_scored",
    "home_home_avg_conceded",
    "away_avg_scored",
    "away_avg_conceded",
    "away_games_played",
    "away_away_avg_scored",
    "away_away_avg_conceded",
    "h2h_avg_goals",
    "h2h_games",
    "league_avg_goals",
    "total_avg_scored",
    "goal_diff_home",
    "goal_diff_away",
    "over_25_odds",
    "under_25_odds",
];

/// The full feature set for one fixture, with field order fixed at compile
/// time instead of assembled dynamically by name.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MatchFeatures {
    pub home_avg_scored: f64,
    pub home_avg_conceded: f64,
    pub home_games_played: f64,
    pub home_home_avg_scored: f64,
    pub home_home_avg_conceded: f64,

    pub away_avg_scored: f64,
    pub away_avg_conceded: f64,
    pub away_games_played: f64,
    pub away_away_avg_scored: f64,
    pub away_away_avg_conceded: f64,

    pub h2h_avg_goals: f64,
    pub h2h_games: f64,

    pub league_avg_goals: f64,

    pub total_avg_scored: f64,
    pub goal_diff_home: f64,
    pub goal_diff_away: f64,

    pub over_25_odds: f64,
    pub under_25_odds: f64,
}

impl MatchFeatures {
    pub fn value(&self, name: &str) -> Option<f64> {
        let v = match name {
            "home_avg_scored" => self.home_avg_scored,
            "home_avg_conceded" => self.home_avg_conceded,
            "home_games_played" => self.home_games_played,
            "home_home_avg_scored" => self.home_home_avg_scored,
            "home_home_avg_conceded" => self.home_home_avg_conceded,
            "away_avg_scored" => self.away_avg_scored,
            "away_avg_conceded" => self.away_avg_conceded,
            "away_games_played" => self.away_games_played,
            "away_away_avg_scored" => self.away_away_avg_scored,
            "away_away_avg_conceded" => self.away_away_avg_conceded,
            "h2h_avg_goals" => self.h2h_avg_goals,
            "h2h_games" => self.h2h_games,
            "league_avg_goals" => self.league_avg_goals,
            "total_avg_scored" => self.total_avg_scored,
            "goal_diff_home" => self.goal_diff_home,
            "goal_diff_away" => self.goal_diff_away,
            "over_25_odds" => self.over_25_odds,
            "under_25_odds" => self.under_25_odds,
            _ => return None,
        };
        Some(v)
    }

    /// Project the features into the order the classifier was trained with.
    /// An unknown name means the artifact and this build disagree about the
    /// feature schema; that is a hard error, not a zero-fill.
    pub fn vector_for(&self, feature_names: &[String]) -> Result<Vec<f64>, PredictionError> {
        feature_names
            .iter()
            .map(|name| {
                self.value(name)
                    .ok_or_else(|| PredictionError::UnknownFeature(name.clone()))
            })
            .collect()
    }
}

/// Compute every feature for one fixture. Performs five read-only store
/// queries; never fails for missing history, only for store errors.
pub async fn engineer_features(
    pool: &SqlitePool,
    home_team: &str,
    away_team: &str,
    league: &str,
    match_date: NaiveDate,
    over_25_odds: Option<f64>,
    under_25_odds: Option<f64>,
) -> Result<MatchFeatures> {
    let home_form = recent_form(pool, home_team, match_date, VenueMode::All, FORM_WINDOW).await?;
    let home_home_form =
        recent_form(pool, home_team, match_date, VenueMode::Home, FORM_WINDOW).await?;

    let away_form = recent_form(pool, away_team, match_date, VenueMode::All, FORM_WINDOW).await?;
    let away_away_form =
        recent_form(pool, away_team, match_date, VenueMode::Away, FORM_WINDOW).await?;

    let h2h = head_to_head(pool, home_team, away_team, match_date, FORM_WINDOW).await?;

    let league_ctx = league_context(pool, league, match_date, LEAGUE_CONTEXT_WINDOW).await?;

    Ok(MatchFeatures {
        home_avg_scored: home_form.avg_scored,
        home_avg_conceded: home_form.avg_conceded,
        home_games_played: home_form.games_played as f64,
        home_home_avg_scored: home_home_form.avg_scored,
        home_home_avg_conceded: home_home_form.avg_conceded,

        away_avg_scored: away_form.avg_scored,
        away_avg_conceded: away_form.avg_conceded,
        away_games_played: away_form.games_played as f64,
        away_away_avg_scored: away_away_form.avg_scored,
        away_away_avg_conceded: away_away_form.avg_conceded,

        h2h_avg_goals: h2h.avg_goals,
        h2h_games: h2h.games_played as f64,

        league_avg_goals: league_ctx.avg_goals,

        total_avg_scored: home_form.avg_scored + away_form.avg_scored,
        goal_diff_home: home_form.avg_scored - home_form.avg_conceded,
        goal_diff_away: away_form.avg_scored - away_form.avg_conceded,

        over_25_odds: over_25_odds.unwrap_or(NEUTRAL_ODDS),
        under_25_odds: under_25_odds.unwrap_or(NEUTRAL_ODDS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_features() -> MatchFeatures {
        MatchFeatures {
            home_avg_scored: 1.8,
            home_avg_conceded: 1.0,
            home_games_played: 5.0,
            home_home_avg_scored: 2.2,
            home_home_avg_conceded: 0.8,
            away_avg_scored: 1.4,
            away_avg_conceded: 1.6,
            away_games_played: 5.0,
            away_away_avg_scored: 1.2,
            away_away_avg_conceded: 1.8,
            h2h_avg_goals: 3.0,
            h2h_games: 4.0,
            league_avg_goals: 2.8,
            total_avg_scored: 3.2,
            goal_diff_home: 0.8,
            goal_diff_away: -0.2,
            over_25_odds: 1.85,
            under_25_odds: 2.05,
        }
    }

    #[test]
    fn vector_follows_declared_name_order() {
        let features = sample_features();
        let names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        let vector = features.vector_for(&names).unwrap();

        assert_eq!(vector.len(), FEATURE_NAMES.len());
        assert_eq!(vector[0], 1.8); // home_avg_scored
        assert_eq!(vector[12], 2.8); // league_avg_goals
        assert_eq!(vector[16], 1.85); // over_25_odds
        assert_eq!(vector[17], 2.05); // under_25_odds
    }

    #[test]
    fn unknown_feature_name_is_a_hard_error() {
        let features = sample_features();
        let names = vec!["home_avg_scored".to_string(), "xg_delta".to_string()];

        match features.vector_for(&names) {
            Err(PredictionError::UnknownFeature(name)) => assert_eq!(name, "xg_delta"),
            other => panic!("expected UnknownFeature, got {:?}", other),
        }
    }

    #[test]
    fn every_declared_name_resolves() {
        let features = sample_features();
        for name in FEATURE_NAMES {
            assert!(features.value(name).is_some(), "unresolved feature {name}");
        }
    }
}
