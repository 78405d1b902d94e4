use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    analysis::{
        entities::{AnalysisOutcome, AnalysisStage},
        ports::AnalysisService,
        value_objects::AnalyzeInput,
    },
    common::{entities::app_errors::CoreError, generate_uuid_v7, services::Service},
    ingredient::{entities::IngredientList, prompts::VISION_INSTRUCTION},
    llm::{entities::EncodedImage, ports::LLMClient},
    recipe::{
        entities::{RecipeRequest, RecipeResult},
        formatter::RecipeFormatter,
        prompts::{RECIPE_SYSTEM_PROMPT, build_recipe_prompt},
    },
    retry::retry_with_backoff,
    upload::{entities::TempUpload, ports::TempFileStore},
};

impl<LLM, TS> AnalysisService for Service<LLM, TS>
where
    LLM: LLMClient,
    TS: TempFileStore,
{
    #[instrument(
        skip(self, input),
        fields(request_id = tracing::field::Empty, images = input.images.len())
    )]
    async fn analyze(&self, input: AnalyzeInput) -> Result<AnalysisOutcome, CoreError> {
        let request_id = generate_uuid_v7();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));
        log_stage(request_id, AnalysisStage::Received);

        let mut uploads = Vec::with_capacity(input.images.len());
        let result = self.run_pipeline(request_id, &input, &mut uploads).await;

        for upload in uploads {
            if let Err(e) = self.temp_store.remove(upload).await {
                warn!(%request_id, error = %e, "Failed to remove staged image");
            }
        }
        log_stage(request_id, AnalysisStage::Cleaned);

        match &result {
            Ok(outcome) => info!(
                %request_id,
                ingredients = outcome.ingredients.len(),
                recipes = outcome.recipes.len(),
                "Analysis completed"
            ),
            Err(e) => warn!(%request_id, error = %e, "Analysis failed"),
        }
        result
    }
}

impl<LLM, TS> Service<LLM, TS>
where
    LLM: LLMClient,
    TS: TempFileStore,
{
    /// Every staged file is pushed to `uploads` as soon as it exists so the
    /// caller can remove it whatever happens next.
    async fn run_pipeline(
        &self,
        request_id: Uuid,
        input: &AnalyzeInput,
        uploads: &mut Vec<TempUpload>,
    ) -> Result<AnalysisOutcome, CoreError> {
        let formats = self.upload_policy.validate_batch(&input.images)?;
        log_stage(request_id, AnalysisStage::Validated);

        let mut encoded = Vec::with_capacity(formats.len());
        for (image, format) in input.images.iter().zip(formats) {
            uploads.push(self.temp_store.store(image, format).await?);
            if let Some(upload) = uploads.last() {
                let base64 = self.temp_store.read_base64(upload).await?;
                encoded.push(EncodedImage::new(format, base64));
            }
        }
        log_stage(request_id, AnalysisStage::ImageEncoded);

        let mut ingredients = IngredientList::new();
        for image in encoded {
            ingredients.merge(self.detect_ingredients(image).await?);
        }
        ingredients.merge(IngredientList::from_hints(&input.main_ingredients));
        if ingredients.is_empty() {
            return Err(CoreError::NoIngredientsDetected);
        }
        log_stage(request_id, AnalysisStage::IngredientsExtracted);

        let recipes = self.generate_recipes(&ingredients, input).await?;
        log_stage(request_id, AnalysisStage::RecipesGenerated);

        Ok(AnalysisOutcome {
            request_id,
            ingredients,
            recipes,
        })
    }

    async fn detect_ingredients(&self, image: EncodedImage) -> Result<IngredientList, CoreError> {
        let llm = self.llm_client.as_ref();
        let result = retry_with_backoff(&self.retry_policy, "vision", move || {
            llm.generate_with_image(VISION_INSTRUCTION.to_string(), image.clone())
        })
        .await;

        // An unreadable answer counts as an image with nothing detected.
        let text = match result {
            Ok(text) => text,
            Err(CoreError::Parse(reason)) => {
                warn!(model = llm.vision_model(), %reason, "Vision answer unreadable");
                return Ok(IngredientList::new());
            }
            Err(e) => return Err(CoreError::VisionFailed(Box::new(e))),
        };

        let ingredients = IngredientList::parse_response(&text);
        debug!(
            model = llm.vision_model(),
            detected = ingredients.len(),
            "Vision answer parsed"
        );
        Ok(ingredients)
    }

    async fn generate_recipes(
        &self,
        ingredients: &IngredientList,
        input: &AnalyzeInput,
    ) -> Result<Vec<RecipeResult>, CoreError> {
        let total = self.recipe_count(input.num_recipes);
        let formatter = RecipeFormatter::new(ingredients);
        let llm = self.llm_client.as_ref();

        let mut titles: Vec<String> = Vec::with_capacity(total as usize);
        let mut recipes = Vec::with_capacity(total as usize);
        for index in 1..=total {
            let prompt = build_recipe_prompt(&RecipeRequest {
                ingredients,
                allergies: &input.allergies,
                cuisine_type: input.cuisine_type.as_deref(),
                index,
                total,
                previous_titles: &titles,
            });

            let text = retry_with_backoff(&self.retry_policy, "recipe", move || {
                llm.generate_with_text(RECIPE_SYSTEM_PROMPT.to_string(), prompt.clone())
            })
            .await
            .map_err(|e| CoreError::RecipeFailed(Box::new(e)))?;

            if text.trim().is_empty() {
                return Err(CoreError::RecipeFailed(Box::new(CoreError::Parse(
                    format!("empty answer for recipe {} of {}", index, total),
                ))));
            }

            let recipe = formatter.format(&text);
            debug!(index, total, title = %recipe.title, "Recipe formatted");
            titles.push(recipe.title.clone());
            recipes.push(recipe);
        }

        Ok(recipes)
    }

    /// `requested` clamped to `1..=max_recipes`.
    fn recipe_count(&self, requested: u32) -> u32 {
        let max = self.analysis_config.max_recipes.max(1);
        requested.clamp(1, max)
    }
}

fn log_stage(request_id: Uuid, stage: AnalysisStage) {
    debug!(%request_id, %stage, "Analysis stage reached");
}

#[cfg(test)]
mod tests {
    use std::{
        path::Path,
        sync::{
            Mutex,
            atomic::{AtomicU32, Ordering},
        },
        time::Duration,
    };

    use bytes::Bytes;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        domain::{
            common::AnalysisConfig, llm::ports::MockLLMClient, retry::RetryPolicy,
            upload::entities::UploadedImage, upload::policies::UploadPolicy,
        },
        infrastructure::upload::local_temp_store::LocalTempFileStore,
    };

    const RECIPE: &str = "# Tortilla\n## INGREDIENTES\n- huevos\n## LISTA DE COMPRAS\n- [ ] Sal";

    /// Answers come from a script indexed by call number; the last entry
    /// repeats once the script runs out.
    struct FakeLLMClient {
        vision_answers: Vec<Result<String, CoreError>>,
        recipe_answers: Vec<Result<String, CoreError>>,
        vision_calls: AtomicU32,
        recipe_calls: AtomicU32,
        recipe_prompts: Mutex<Vec<String>>,
    }

    impl FakeLLMClient {
        fn new(vision: Vec<Result<String, CoreError>>, recipe: Vec<Result<String, CoreError>>) -> Self {
            Self {
                vision_answers: vision,
                recipe_answers: recipe,
                vision_calls: AtomicU32::new(0),
                recipe_calls: AtomicU32::new(0),
                recipe_prompts: Mutex::new(Vec::new()),
            }
        }

        fn happy() -> Self {
            Self::new(
                vec![Ok("tomate, cebolla, ajo".to_string())],
                vec![Ok(RECIPE.to_string())],
            )
        }

        fn pick(script: &[Result<String, CoreError>], call: u32) -> Result<String, CoreError> {
            let index = (call as usize).min(script.len() - 1);
            script[index].clone()
        }
    }

    impl LLMClient for FakeLLMClient {
        async fn generate_with_image(
            &self,
            _instruction: String,
            _image: EncodedImage,
        ) -> Result<String, CoreError> {
            let call = self.vision_calls.fetch_add(1, Ordering::SeqCst);
            Self::pick(&self.vision_answers, call)
        }

        async fn generate_with_text(
            &self,
            _system_prompt: String,
            prompt: String,
        ) -> Result<String, CoreError> {
            let call = self.recipe_calls.fetch_add(1, Ordering::SeqCst);
            self.recipe_prompts.lock().unwrap().push(prompt);
            Self::pick(&self.recipe_answers, call)
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }

        fn vision_model(&self) -> &str {
            "fake-vision"
        }

        fn recipe_model(&self) -> &str {
            "fake-recipe"
        }
    }

    async fn service(
        llm: FakeLLMClient,
        dir: &TempDir,
    ) -> Service<FakeLLMClient, LocalTempFileStore> {
        let store = LocalTempFileStore::new(dir.path()).await.unwrap();
        Service::new(
            llm,
            store,
            UploadPolicy::new(1024, vec!["png".into(), "jpg".into(), "jpeg".into()], 3),
            AnalysisConfig { max_recipes: 3 },
            RetryPolicy::new(3, Duration::ZERO),
        )
    }

    fn photo(name: &str) -> UploadedImage {
        UploadedImage::new(name, Some("image/jpeg".into()), Bytes::from_static(b"\xff\xd8\xff"))
    }

    fn input(images: Vec<UploadedImage>, num_recipes: u32) -> AnalyzeInput {
        AnalyzeInput {
            images,
            allergies: vec![],
            main_ingredients: vec![],
            cuisine_type: None,
            num_recipes,
        }
    }

    fn transient() -> CoreError {
        CoreError::ProviderTransient {
            provider: "fake".to_string(),
            model: "fake-vision".to_string(),
            status: Some(503),
            message: "overloaded".to_string(),
        }
    }

    fn is_empty_dir(path: &Path) -> bool {
        std::fs::read_dir(path).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_analyze_returns_requested_recipes() {
        let dir = TempDir::new().unwrap();
        let service = service(FakeLLMClient::happy(), &dir).await;

        let outcome = service.analyze(input(vec![photo("fridge.jpg")], 2)).await.unwrap();

        assert_eq!(
            outcome.ingredients.as_slice(),
            &["tomate".to_string(), "cebolla".to_string(), "ajo".to_string()]
        );
        assert_eq!(outcome.recipes.len(), 2);
        assert_eq!(outcome.recipes[0].title, "Tortilla");
        assert_eq!(outcome.recipes[0].shopping_list, vec!["Sal".to_string()]);
        assert_eq!(service.llm_client.vision_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.llm_client.recipe_calls.load(Ordering::SeqCst), 2);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_recipe_count_is_clamped() {
        let dir = TempDir::new().unwrap();
        let service = service(FakeLLMClient::happy(), &dir).await;

        let many = service.analyze(input(vec![photo("a.png")], 10)).await.unwrap();
        assert_eq!(many.recipes.len(), 3);

        let none = service.analyze(input(vec![photo("a.png")], 0)).await.unwrap();
        assert_eq!(none.recipes.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_file_makes_no_provider_call() {
        let dir = TempDir::new().unwrap();
        let service = service(FakeLLMClient::happy(), &dir).await;

        let result = service.analyze(input(vec![photo("notes.txt")], 1)).await;

        assert_eq!(
            result.unwrap_err(),
            CoreError::UnsupportedFileType("notes.txt".to_string())
        );
        assert_eq!(service.llm_client.vision_calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.llm_client.recipe_calls.load(Ordering::SeqCst), 0);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_rejected_batch_never_touches_provider() {
        let dir = TempDir::new().unwrap();
        let store = LocalTempFileStore::new(dir.path()).await.unwrap();
        // No expectations: any provider call panics.
        let service = Service::new(
            MockLLMClient::new(),
            store,
            UploadPolicy::new(1024, vec!["jpg".into()], 1),
            AnalysisConfig { max_recipes: 3 },
            RetryPolicy::new(3, Duration::ZERO),
        );

        let too_many = service
            .analyze(input(vec![photo("a.jpg"), photo("b.jpg")], 1))
            .await;
        assert!(matches!(too_many, Err(CoreError::TooManyImages { .. })));

        let empty = UploadedImage::new("empty.jpg", None, Bytes::new());
        let result = service.analyze(input(vec![empty], 1)).await;
        assert_eq!(result.unwrap_err(), CoreError::EmptyFile("empty.jpg".to_string()));
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_vision_failure_cleans_up() {
        let dir = TempDir::new().unwrap();
        let llm = FakeLLMClient::new(vec![Err(transient())], vec![Ok(RECIPE.to_string())]);
        let service = service(llm, &dir).await;

        let err = service
            .analyze(input(vec![photo("a.jpg"), photo("b.jpeg")], 1))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::VisionFailed(_)));
        assert!(err.root_cause().is_transient());
        // Three attempts on the first image, then the request stops.
        assert_eq!(service.llm_client.vision_calls.load(Ordering::SeqCst), 3);
        assert_eq!(service.llm_client.recipe_calls.load(Ordering::SeqCst), 0);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_transient_vision_error_recovers() {
        let dir = TempDir::new().unwrap();
        let llm = FakeLLMClient::new(
            vec![Err(transient()), Ok("leche".to_string())],
            vec![Ok(RECIPE.to_string())],
        );
        let service = service(llm, &dir).await;

        let outcome = service.analyze(input(vec![photo("a.jpg")], 1)).await.unwrap();

        assert_eq!(outcome.ingredients.as_slice(), &["leche".to_string()]);
        assert_eq!(service.llm_client.vision_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_images_and_hints_are_merged() {
        let dir = TempDir::new().unwrap();
        let llm = FakeLLMClient::new(
            vec![Ok("tomate, queso".to_string()), Ok("Queso, pan".to_string())],
            vec![Ok(RECIPE.to_string())],
        );
        let service = service(llm, &dir).await;

        let mut request = input(vec![photo("a.jpg"), photo("b.png")], 1);
        request.main_ingredients = vec!["arroz".to_string(), "tomate".to_string()];
        let outcome = service.analyze(request).await.unwrap();

        assert_eq!(
            outcome.ingredients.as_slice(),
            &[
                "tomate".to_string(),
                "queso".to_string(),
                "pan".to_string(),
                "arroz".to_string()
            ]
        );
        assert_eq!(service.llm_client.vision_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_ingredients_is_an_error() {
        let dir = TempDir::new().unwrap();
        let llm = FakeLLMClient::new(vec![Ok("  ".to_string())], vec![Ok(RECIPE.to_string())]);
        let service = service(llm, &dir).await;

        let err = service.analyze(input(vec![photo("a.jpg")], 1)).await.unwrap_err();

        assert_eq!(err, CoreError::NoIngredientsDetected);
        assert_eq!(service.llm_client.recipe_calls.load(Ordering::SeqCst), 0);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_hints_alone_are_enough() {
        let dir = TempDir::new().unwrap();
        let llm = FakeLLMClient::new(vec![Ok(String::new())], vec![Ok(RECIPE.to_string())]);
        let service = service(llm, &dir).await;

        let mut request = input(vec![photo("a.jpg")], 1);
        request.main_ingredients = vec!["pollo, arroz".to_string()];
        let outcome = service.analyze(request).await.unwrap();

        assert_eq!(outcome.ingredients.len(), 2);
        assert_eq!(outcome.recipes.len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_vision_answer_counts_as_no_ingredients() {
        let dir = TempDir::new().unwrap();
        let llm = FakeLLMClient::new(
            vec![
                Ok("tomate, queso".to_string()),
                Err(CoreError::Parse("no message content in response".to_string())),
            ],
            vec![Ok(RECIPE.to_string())],
        );
        let service = service(llm, &dir).await;

        let mut request = input(vec![photo("a.jpg"), photo("b.jpg")], 1);
        request.main_ingredients = vec!["arroz".to_string()];
        let outcome = service.analyze(request).await.unwrap();

        assert_eq!(
            outcome.ingredients.as_slice(),
            &["tomate".to_string(), "queso".to_string(), "arroz".to_string()]
        );
        assert_eq!(service.llm_client.vision_calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.recipes.len(), 1);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_unreadable_vision_answer_without_hints_is_no_ingredients() {
        let dir = TempDir::new().unwrap();
        let llm = FakeLLMClient::new(
            vec![Err(CoreError::Parse("invalid chat completions response".to_string()))],
            vec![Ok(RECIPE.to_string())],
        );
        let service = service(llm, &dir).await;

        let err = service.analyze(input(vec![photo("a.jpg")], 1)).await.unwrap_err();

        assert_eq!(err, CoreError::NoIngredientsDetected);
        assert_eq!(service.llm_client.vision_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recipe_failure_fails_request() {
        let dir = TempDir::new().unwrap();
        let fatal = CoreError::ProviderFatal {
            provider: "fake".to_string(),
            model: "fake-recipe".to_string(),
            status: Some(401),
            message: "bad key".to_string(),
        };
        let llm = FakeLLMClient::new(
            vec![Ok("huevos".to_string())],
            vec![Ok(RECIPE.to_string()), Err(fatal.clone())],
        );
        let service = service(llm, &dir).await;

        let err = service.analyze(input(vec![photo("a.jpg")], 3)).await.unwrap_err();

        assert_eq!(err, CoreError::RecipeFailed(Box::new(fatal)));
        assert_eq!(service.llm_client.recipe_calls.load(Ordering::SeqCst), 2);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_empty_recipe_answer_is_parse_failure() {
        let dir = TempDir::new().unwrap();
        let llm = FakeLLMClient::new(vec![Ok("huevos".to_string())], vec![Ok("\n \n".to_string())]);
        let service = service(llm, &dir).await;

        let err = service.analyze(input(vec![photo("a.jpg")], 1)).await.unwrap_err();

        assert!(matches!(err.root_cause(), CoreError::Parse(_)));
    }

    #[tokio::test]
    async fn test_later_recipes_avoid_earlier_titles() {
        let dir = TempDir::new().unwrap();
        let service = service(FakeLLMClient::happy(), &dir).await;

        let mut request = input(vec![photo("a.jpg")], 2);
        request.allergies = vec!["gluten".to_string()];
        request.cuisine_type = Some("italiana".to_string());
        service.analyze(request).await.unwrap();

        let prompts = service.llm_client.recipe_prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Esta es la receta 1 de 2."));
        assert!(!prompts[0].contains("claramente distinto"));
        assert!(prompts[1].contains("claramente distinto de: Tortilla."));
        assert!(prompts[1].contains("RESTRICCIONES ALIMENTARIAS: gluten"));
        assert!(prompts[1].contains("ESTILO CULINARIO: Italiana"));
    }
}
