use axum::{
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use pantrychef_core::domain::{analysis::ports::AnalysisService, upload::entities::UploadedImage};
use tracing::{error, info};
use validator::Validate;

use crate::application::http::{
    analysis::validators::AnalyzeForm,
    server::{
        api_entities::{
            api_error::ApiError,
            response::{AnalyzeResponse, Response},
        },
        app_state::AppState,
    },
};

#[utoipa::path(
    post,
    path = "/analyze",
    tag = "analysis",
    summary = "Suggest recipes from fridge photos",
    description = "Detects the ingredients in one or more photos and generates recipes with them. \
        Multipart fields: `images` (repeatable, `image` also accepted), `allergies`, \
        `main_ingredients` (comma-separated or repeated), `cuisine_type`, `num_recipes`.",
    request_body(content_type = "multipart/form-data", description = "Photos and preferences"),
    responses(
        (status = 200, body = AnalyzeResponse),
        (status = 400, description = "Invalid upload", body = AnalyzeResponse),
        (status = 413, description = "Upload too large", body = AnalyzeResponse),
        (status = 422, description = "No ingredients detected", body = AnalyzeResponse),
        (status = 429, description = "Rate limited", body = AnalyzeResponse),
        (status = 503, description = "AI provider unavailable", body = AnalyzeResponse)
    ),
)]
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response<AnalyzeResponse>, ApiError> {
    let form = read_form(multipart).await?;
    form.validate()
        .map_err(|e| ApiError::BadRequest(validation_message(&e)))?;

    info!(
        images = form.images.len(),
        allergies = form.allergies.len(),
        hints = form.main_ingredients.len(),
        cuisine_type = form.cuisine_type.as_deref().unwrap_or("-"),
        num_recipes = form.num_recipes.unwrap_or(1),
        "Analyze request received"
    );

    // Detached so a client disconnect cannot cancel provider calls or cleanup.
    let service = state.service.clone();
    let input = form.into_input();
    let outcome = tokio::spawn(async move { service.analyze(input).await })
        .await
        .map_err(|e| {
            error!(error = %e, "Analysis task failed");
            ApiError::unexpected()
        })?
        .map_err(ApiError::from)?;

    Ok(Response::OK(AnalyzeResponse::success(
        outcome.ingredients.into_vec(),
        outcome.recipes.into_iter().map(|recipe| recipe.html).collect(),
    )))
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, ApiError> {
    let mut form = AnalyzeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "images" | "image" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;

                // Browsers send an empty part when no file was picked.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                form.images
                    .push(UploadedImage::new(file_name, content_type, data));
            }
            "allergies" => {
                let text = field.text().await.map_err(multipart_error)?;
                AnalyzeForm::push_list(&mut form.allergies, &text);
            }
            "main_ingredients" => {
                let text = field.text().await.map_err(multipart_error)?;
                AnalyzeForm::push_list(&mut form.main_ingredients, &text);
            }
            "cuisine_type" => {
                let text = field.text().await.map_err(multipart_error)?;
                form.set_cuisine_type(&text);
            }
            "num_recipes" => {
                let text = field.text().await.map_err(multipart_error)?;
                form.set_num_recipes(&text).map_err(ApiError::BadRequest)?;
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(
            "La solicitud supera el tamaño máximo permitido".to_string(),
        );
    }
    error!("Failed to read multipart field: {}", e);
    ApiError::BadRequest(format!("Formulario no válido: {}", e.body_text()))
}

fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errors| errors.iter())
        .filter_map(|error| error.message.as_ref().map(|m| m.to_string()))
        .next()
        .unwrap_or_else(|| "Formulario no válido".to_string())
}
