//! Upstream fixtures and over/under 2.5 odds from The Odds API.
//!
//! This layer only supplies inputs to the prediction pipeline. An empty
//! provider response (no upcoming fixtures, no totals market quoted) is a
//! valid `Ok` result; only transport and HTTP failures surface as errors.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::env;

use crate::models::{Fixture, MatchOdds};
use crate::utils::teams_match;

/// Leagues the service understands, as Odds API sport keys.
pub const SPORT_KEYS: [(&str, &str); 6] = [
    ("soccer_epl", "Premier League"),
    ("soccer_spain_la_liga", "La Liga"),
    ("soccer_italy_serie_a", "Serie A"),
    ("soccer_germany_bundesliga", "Bundesliga"),
    ("soccer_france_ligue_one", "Ligue 1"),
    ("soccer_uefa_champs_league", "Champions League"),
];

pub fn league_name(sport_key: &str) -> &str {
    SPORT_KEYS
        .iter()
        .find(|(key, _)| *key == sport_key)
        .map(|(_, name)| *name)
        .unwrap_or(sport_key)
}

pub fn sport_key_for_league(league: &str) -> Option<&'static str> {
    SPORT_KEYS
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(league))
        .map(|(key, _)| *key)
}

// ── Odds API response types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OddsEvent {
    pub id: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Deserialize)]
pub struct Bookmaker {
    pub title: String,
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub markets: Vec<Market>,
}

#[derive(Debug, Deserialize)]
pub struct Market {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub price: f64,
    pub point: Option<f64>,
}

/// Extract over/under 2.5 prices from the first bookmaker quoting a totals
/// market at the 2.5 line. `None` means the market simply is not offered.
pub fn totals_from_event(event: &OddsEvent) -> Option<MatchOdds> {
    for bookmaker in &event.bookmakers {
        for market in &bookmaker.markets {
            if market.key != "totals" {
                continue;
            }

            let mut over = None;
            let mut under = None;
            for outcome in &market.outcomes {
                if outcome.point != Some(2.5) {
                    continue;
                }
                if outcome.name.contains("Over") {
                    over = Some(outcome.price);
                } else if outcome.name.contains("Under") {
                    under = Some(outcome.price);
                }
            }

            if let (Some(over_25_odds), Some(under_25_odds)) = (over, under) {
                return Some(MatchOdds {
                    over_25_odds,
                    under_25_odds,
                    bookmaker: bookmaker.title.clone(),
                    last_update: bookmaker.last_update,
                });
            }
        }
    }
    None
}

// ── OddsFetcher ──────────────────────────────────────────────────────────────

pub struct OddsFetcher {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OddsFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            api_key: env::var("ODDS_API_KEY").ok(),
            base_url: env::var("ODDS_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.the-odds-api.com/v4".to_string()),
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_events(&self, sport_key: &str) -> Result<Vec<OddsEvent>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("ODDS_API_KEY not set"))?;

        let url = format!("{}/sports/{}/odds", self.base_url, sport_key);
        let events = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", api_key.as_str()),
                ("regions", "uk"),
                ("markets", "totals"),
                ("oddsFormat", "decimal"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<OddsEvent>>()
            .await?;

        Ok(events)
    }

    /// Upcoming fixtures for a league. An empty list is a valid answer.
    pub async fn upcoming_fixtures(&self, sport_key: &str) -> Result<Vec<Fixture>> {
        let events = self.fetch_events(sport_key).await?;
        let league = league_name(sport_key).to_string();

        Ok(events
            .into_iter()
            .map(|e| Fixture {
                fixture_id: e.id,
                date: e.commence_time,
                league: league.clone(),
                home_team: e.home_team,
                away_team: e.away_team,
            })
            .collect())
    }

    /// Over/under 2.5 odds for one fixture, matched by fuzzy team name
    /// since provider spellings differ from ours. `Ok(None)` when the
    /// fixture or market is not listed; `Err` only on transport failure.
    pub async fn match_odds(
        &self,
        home_team: &str,
        away_team: &str,
        sport_key: &str,
    ) -> Result<Option<MatchOdds>> {
        let events = self.fetch_events(sport_key).await?;

        for event in &events {
            if teams_match(&event.home_team, home_team) && teams_match(&event.away_team, away_team)
            {
                return Ok(totals_from_event(event));
            }
        }

        Ok(None)
    }

    /// Fixtures with their totals odds in a single provider call, so one
    /// upcoming-fixtures request does not fan out into per-match fetches.
    pub async fn fixtures_with_odds(
        &self,
        sport_key: &str,
    ) -> Result<Vec<(Fixture, Option<MatchOdds>)>> {
        let events = self.fetch_events(sport_key).await?;
        let league = league_name(sport_key).to_string();

        Ok(events
            .into_iter()
            .map(|e| {
                let odds = totals_from_event(&e);
                let fixture = Fixture {
                    fixture_id: e.id,
                    date: e.commence_time,
                    league: league.clone(),
                    home_team: e.home_team,
                    away_team: e.away_team,
                };
                (fixture, odds)
            })
            .collect())
    }
}

impl Default for OddsFetcher {
    fn default() -> Self {
        Self::new()
    }
}
