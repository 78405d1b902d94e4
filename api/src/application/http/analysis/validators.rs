use pantrychef_core::domain::{analysis::value_objects::AnalyzeInput, upload::entities::UploadedImage};
use validator::Validate;

/// `/analyze` multipart form once every part has been read.
#[derive(Debug, Default, Validate)]
pub struct AnalyzeForm {
    pub images: Vec<UploadedImage>,

    #[validate(length(max = 20, message = "Demasiadas alergias indicadas (máximo 20)"))]
    pub allergies: Vec<String>,

    #[validate(length(max = 50, message = "Demasiados ingredientes indicados (máximo 50)"))]
    pub main_ingredients: Vec<String>,

    #[validate(length(max = 50, message = "El tipo de cocina no puede superar 50 caracteres"))]
    pub cuisine_type: Option<String>,

    #[validate(range(max = 20, message = "num_recipes debe estar entre 1 y 20"))]
    pub num_recipes: Option<u32>,
}

impl AnalyzeForm {
    /// Adds a comma-separated or repeated list field.
    pub fn push_list(target: &mut Vec<String>, raw: &str) {
        target.extend(split_list(raw));
    }

    pub fn set_cuisine_type(&mut self, raw: &str) {
        let value = raw.trim();
        self.cuisine_type = (!value.is_empty()).then(|| value.to_string());
    }

    pub fn set_num_recipes(&mut self, raw: &str) -> Result<(), String> {
        let value = raw.trim();
        if value.is_empty() {
            return Ok(());
        }
        let parsed = value
            .parse::<u32>()
            .map_err(|_| format!("num_recipes debe ser un número entero: '{}'", value))?;
        self.num_recipes = Some(parsed);
        Ok(())
    }

    pub fn into_input(self) -> AnalyzeInput {
        AnalyzeInput {
            images: self.images,
            allergies: self.allergies,
            main_ingredients: self.main_ingredients,
            cuisine_type: self.cuisine_type,
            num_recipes: self.num_recipes.unwrap_or(1),
        }
    }
}

pub fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}
