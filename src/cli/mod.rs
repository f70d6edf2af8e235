use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::db::{count_historical_matches, create_pool, init_database_with_pool, seed_data};
use crate::services::{sport_key_for_league, ModelService, OddsFetcher, PredictionEngine};
use crate::utils::odds_to_probability;

pub async fn seed() -> Result<()> {
    let pool = create_pool().await?;
    init_database_with_pool(&pool).await?;

    println!("🌱 Seeding historical match data...");
    let inserted = seed_data(&pool).await?;
    let total = count_historical_matches(&pool).await?;

    println!("✅ Inserted {} matches ({} total in store)", inserted, total);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn predict(
    model: Arc<ModelService>,
    home_team: &str,
    away_team: &str,
    league: &str,
    match_date: NaiveDate,
    over_25_odds: Option<f64>,
    under_25_odds: Option<f64>,
) -> Result<()> {
    let pool = create_pool().await?;
    init_database_with_pool(&pool).await?;

    println!("🔮 Predicting {} vs {} ({}, {})...\n", home_team, away_team, league, match_date);

    // When the caller supplied no prices, try the odds provider before
    // falling back to the neutral defaults.
    let (over_25_odds, under_25_odds) = match (over_25_odds, under_25_odds) {
        (None, None) => fetch_market_odds(home_team, away_team, league).await?,
        supplied => supplied,
    };

    let engine = PredictionEngine::new(model);
    let prediction = engine
        .generate(
            &pool,
            home_team,
            away_team,
            league,
            match_date,
            None,
            over_25_odds,
            under_25_odds,
        )
        .await?;

    println!("📊 Over 2.5 goals:  {:.1}%", prediction.over_25_probability * 100.0);
    println!("📊 Under 2.5 goals: {:.1}%", prediction.under_25_probability * 100.0);
    println!(
        "🎯 Confidence: {:.2} ({})",
        prediction.confidence_score, prediction.confidence_level
    );

    if let (Some(over), Some(under)) = (
        prediction.bookmaker_over_25_odds,
        prediction.bookmaker_under_25_odds,
    ) {
        println!(
            "💰 Bookmaker: over {:.2} (implied {:.1}%) | under {:.2} (implied {:.1}%)",
            over,
            odds_to_probability(over) * 100.0,
            under,
            odds_to_probability(under) * 100.0
        );
    }

    if prediction.key_factors.is_empty() {
        println!("\n📝 No standout factors for this fixture");
    } else {
        println!("\n📝 Key factors:");
        for factor in &prediction.key_factors {
            println!("   • {}", factor);
        }
    }

    println!("\n🏷️  Model {} | fixture {}", prediction.model_version, prediction.fixture_id);
    Ok(())
}

async fn fetch_market_odds(
    home_team: &str,
    away_team: &str,
    league: &str,
) -> Result<(Option<f64>, Option<f64>)> {
    let fetcher = OddsFetcher::new();
    let sport_key = match sport_key_for_league(league) {
        Some(key) if fetcher.has_key() => key,
        _ => return Ok((None, None)),
    };

    match fetcher.match_odds(home_team, away_team, sport_key).await? {
        Some(odds) => {
            println!(
                "📥 Market odds from {}: {:.2} / {:.2}\n",
                odds.bookmaker, odds.over_25_odds, odds.under_25_odds
            );
            Ok((Some(odds.over_25_odds), Some(odds.under_25_odds)))
        }
        None => {
            println!("📭 No over/under 2.5 market quoted; using neutral defaults\n");
            Ok((None, None))
        }
    }
}

pub async fn model_info(model: Arc<ModelService>) -> Result<()> {
    let info = model.info().await;

    println!("🤖 Model status:");
    println!("   Loaded:   {}", if info.model_loaded { "yes" } else { "no" });
    println!("   Version:  {}", info.model_version);
    println!("   Features: {}", info.features_count);
    match info.last_prediction_at {
        Some(ts) => println!("   Last prediction: {}", ts.format("%Y-%m-%d %H:%M:%S")),
        None => println!("   Last prediction: never"),
    }

    Ok(())
}

pub async fn upcoming_fixtures(sport_key: &str) -> Result<()> {
    let fetcher = OddsFetcher::new();

    if !fetcher.has_key() {
        println!("❌ ODDS_API_KEY not set; cannot query the odds provider");
        return Ok(());
    }

    println!("📥 Fetching upcoming fixtures for {}...\n", sport_key);
    let fixtures = fetcher.fixtures_with_odds(sport_key).await?;

    if fixtures.is_empty() {
        println!("📭 No upcoming fixtures listed");
        return Ok(());
    }

    for (fixture, odds) in &fixtures {
        println!(
            "   {} | {} vs {}",
            fixture.date.format("%Y-%m-%d %H:%M"),
            fixture.home_team,
            fixture.away_team
        );
        match odds {
            Some(o) => println!(
                "      O/U 2.5: {:.2} / {:.2} ({})",
                o.over_25_odds, o.under_25_odds, o.bookmaker
            ),
            None => println!("      O/U 2.5: not quoted"),
        }
    }

    println!("\n✅ {} fixtures listed", fixtures.len());
    Ok(())
}
