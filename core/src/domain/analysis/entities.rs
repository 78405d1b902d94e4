use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{ingredient::entities::IngredientList, recipe::entities::RecipeResult};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalysisOutcome {
    pub request_id: Uuid,
    pub ingredients: IngredientList,
    pub recipes: Vec<RecipeResult>,
}

/// Steps an analysis goes through, used to tag log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Received,
    Validated,
    ImageEncoded,
    IngredientsExtracted,
    RecipesGenerated,
    Cleaned,
}

impl AnalysisStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStage::Received => "received",
            AnalysisStage::Validated => "validated",
            AnalysisStage::ImageEncoded => "image_encoded",
            AnalysisStage::IngredientsExtracted => "ingredients_extracted",
            AnalysisStage::RecipesGenerated => "recipes_generated",
            AnalysisStage::Cleaned => "cleaned",
        }
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
