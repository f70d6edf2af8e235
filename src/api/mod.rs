use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::{create_pool, init_database_with_pool};
use crate::models::{ApiResponse, Fixture, Prediction};
use crate::services::{ModelInfo, ModelService, OddsFetcher, PredictionEngine};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub model: Arc<ModelService>,
}

pub async fn serve(port: u16, model: Arc<ModelService>) -> anyhow::Result<()> {
    let pool = create_pool().await?;
    init_database_with_pool(&pool).await?;

    let app = create_router().with_state(AppState { pool, model });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Goalline API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/model", get(model_health))
        .route("/api/v1/predictions/predict", post(predict_handler))
        .route("/api/v1/predictions/test", get(test_prediction_handler))
        .route("/api/v1/fixtures/upcoming", get(upcoming_fixtures_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("Goalline API is running"))
}

// GET /health/model - classifier load state and metadata
async fn model_health(State(state): State<AppState>) -> Json<ApiResponse<ModelInfo>> {
    Json(ApiResponse::success(state.model.info().await))
}

// POST /api/v1/predictions/predict - predict one fixture
#[derive(Deserialize)]
struct PredictRequest {
    home_team: String,
    away_team: String,
    league: String,
    match_date: NaiveDate,
    fixture_id: Option<String>,
    over_25_odds: Option<f64>,
    under_25_odds: Option<f64>,
}

async fn predict_handler(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<ApiResponse<Prediction>>, StatusCode> {
    if !state.model.is_loaded().await {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let engine = PredictionEngine::new(state.model.clone());
    match engine
        .generate(
            &state.pool,
            &request.home_team,
            &request.away_team,
            &request.league,
            request.match_date,
            request.fixture_id,
            request.over_25_odds,
            request.under_25_odds,
        )
        .await
    {
        Ok(prediction) => Ok(Json(ApiResponse::success(prediction))),
        Err(e) => {
            tracing::error!("Failed to generate prediction: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// GET /api/v1/predictions/test - canned sample prediction
async fn test_prediction_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Prediction>>, StatusCode> {
    if !state.model.is_loaded().await {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let engine = PredictionEngine::new(state.model.clone());
    let match_date = chrono::Utc::now().date_naive() + chrono::Duration::days(2);

    match engine
        .generate(
            &state.pool,
            "Arsenal",
            "Chelsea",
            "Premier League",
            match_date,
            Some("test_match_001".to_string()),
            None,
            None,
        )
        .await
    {
        Ok(prediction) => Ok(Json(ApiResponse::success(prediction))),
        Err(e) => {
            tracing::error!("Failed to generate test prediction: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// GET /api/v1/fixtures/upcoming?sport_key=soccer_epl
#[derive(Deserialize)]
struct UpcomingFixturesQuery {
    sport_key: Option<String>,
}

#[derive(Serialize)]
struct FixtureWithPrediction {
    #[serde(flatten)]
    fixture: Fixture,
    prediction: Option<Prediction>,
}

async fn upcoming_fixtures_handler(
    State(state): State<AppState>,
    Query(params): Query<UpcomingFixturesQuery>,
) -> Result<Json<ApiResponse<Vec<FixtureWithPrediction>>>, StatusCode> {
    let sport_key = params.sport_key.unwrap_or_else(|| "soccer_epl".to_string());
    let fetcher = OddsFetcher::new();

    let fixtures = match fetcher.fixtures_with_odds(&sport_key).await {
        Ok(fixtures) => fixtures,
        Err(e) => {
            tracing::error!("Failed to fetch upcoming fixtures: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let engine = PredictionEngine::new(state.model.clone());
    let mut out = Vec::with_capacity(fixtures.len());

    for (fixture, odds) in fixtures {
        let prediction = if state.model.is_loaded().await {
            match engine
                .generate(
                    &state.pool,
                    &fixture.home_team,
                    &fixture.away_team,
                    &fixture.league,
                    fixture.date.date_naive(),
                    Some(fixture.fixture_id.clone()),
                    odds.as_ref().map(|o| o.over_25_odds),
                    odds.as_ref().map(|o| o.under_25_odds),
                )
                .await
            {
                Ok(mut prediction) => {
                    // Odds freshness comes from the provider, not the request.
                    prediction.odds_updated_at = odds.as_ref().and_then(|o| o.last_update);
                    Some(prediction)
                }
                Err(e) => {
                    tracing::error!("Prediction failed for {}: {}", fixture.fixture_id, e);
                    return Err(StatusCode::INTERNAL_SERVER_ERROR);
                }
            }
        } else {
            None
        };

        out.push(FixtureWithPrediction {
            fixture,
            prediction,
        });
    }

    Ok(Json(ApiResponse::success(out)))
}
