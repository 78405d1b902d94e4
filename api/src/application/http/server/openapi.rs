use crate::application::http::{
    analysis::handlers::analyze::__path_analyze,
    health::__path_health,
    server::{
        api_entities::response::AnalyzeResponse,
        config::{__path_get_config, PublicConfig},
    },
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PantryChef API",
        description = "Turns fridge photos into ingredient lists and recipes"
    ),
    paths(analyze, get_config, health),
    components(schemas(AnalyzeResponse, PublicConfig)),
    tags(
        (name = "analysis", description = "Photo analysis and recipe generation"),
        (name = "system", description = "Health and public configuration")
    )
)]
pub struct ApiDoc;
