use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ingredient::entities::IngredientList;

/// One formatted recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecipeResult {
    pub title: String,
    /// HTML fragment ready to be inserted in the page.
    pub html: String,
    /// Items the model suggested buying, without bullets or checkboxes.
    pub shopping_list: Vec<String>,
}

/// Everything the recipe prompt is built from.
#[derive(Debug, Clone)]
pub struct RecipeRequest<'a> {
    pub ingredients: &'a IngredientList,
    pub allergies: &'a [String],
    pub cuisine_type: Option<&'a str>,
    /// 1-based position of this recipe in the batch.
    pub index: u32,
    pub total: u32,
    /// Titles already generated in this batch, to steer the model elsewhere.
    pub previous_titles: &'a [String],
}
