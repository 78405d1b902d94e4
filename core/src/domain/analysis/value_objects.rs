use crate::domain::upload::entities::UploadedImage;

/// One `/analyze` submission after the form has been read.
#[derive(Debug, Clone)]
pub struct AnalyzeInput {
    pub images: Vec<UploadedImage>,
    pub allergies: Vec<String>,
    /// Ingredients the user says they have, added to whatever the photos show.
    pub main_ingredients: Vec<String>,
    pub cuisine_type: Option<String>,
    pub num_recipes: u32,
}
