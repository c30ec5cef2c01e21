use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::ApiError;
use crate::api::AppState;
use crate::db::MealDeletion;
use crate::models::*;
use crate::nutrition::{decode_image, AnalysisError};

#[derive(Debug, Deserialize)]
pub struct AnalyzeInput {
    #[serde(default)]
    pub image: Option<String>,
}

pub async fn analyze_food(
    State(state): State<AppState>,
    Json(input): Json<AnalyzeInput>,
) -> Result<Json<FoodAnalysis>, ApiError> {
    let encoded = input
        .image
        .filter(|i| !i.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No image provided".to_string()))?;
    let image = decode_image(&encoded)
        .map_err(|_| ApiError::BadRequest("Image is not valid base64".to_string()))?;

    match state.analyzer.analyze(&image).await {
        Ok(food) => Ok(Json(FoodAnalysis {
            success: true,
            food,
        })),
        Err(AnalysisError::Disabled) => Err(ApiError::Unavailable(
            AnalysisError::Disabled.to_string(),
        )),
        Err(e) => {
            tracing::error!("Food analysis failed: {}", e);
            Err(ApiError::BadGateway(e.to_string()))
        }
    }
}

pub async fn log_meal(
    State(state): State<AppState>,
    Json(food): Json<FoodRecord>,
) -> Result<Json<MealLogged>, ApiError> {
    if food.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Meal name is required".to_string()));
    }

    let logged = state.db.log_meal(state.today(), food)?;
    tracing::info!(meal = %logged.meal_id, calories = logged.totals.calories, "meal logged");
    Ok(Json(logged))
}

pub async fn get_today_diet(State(state): State<AppState>) -> Result<Json<DietDay>, ApiError> {
    let diet = state.db.get_diet(state.today())?;
    Ok(Json(DietDay {
        success: true,
        meals: diet.meals,
        totals: diet.totals,
    }))
}

pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.db.delete_meal(state.today(), id)? {
        MealDeletion::Deleted(_) => Ok(Json(MessageResponse::ok("Meal deleted"))),
        MealDeletion::NoDiet => Err(ApiError::NotFound("No diet record found".to_string())),
        MealDeletion::NotFound => Err(ApiError::NotFound("Meal not found".to_string())),
    }
}

pub async fn cleanup_diets(
    State(state): State<AppState>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let removed = state.db.cleanup_before(state.today())?;
    tracing::info!(removed, "old diet records cleaned up");
    Ok(Json(CleanupResponse {
        success: true,
        message: "Old diet records cleaned up".to_string(),
        removed,
    }))
}
