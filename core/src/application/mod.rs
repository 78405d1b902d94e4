use crate::{
    domain::common::{PantryChefConfig, entities::app_errors::CoreError, services::Service},
    infrastructure::{
        llm::chat_completions_client::ChatCompletionsClient,
        upload::local_temp_store::LocalTempFileStore,
    },
};

pub type PantryChefService = Service<ChatCompletionsClient, LocalTempFileStore>;

/// Resolves the provider, prepares the upload directory and wires the
/// service. Fails on missing credentials or an unusable upload directory.
pub async fn create_service(config: PantryChefConfig) -> Result<PantryChefService, CoreError> {
    let provider = config.llm.resolve()?;
    let llm_client = ChatCompletionsClient::new(provider)?;
    let temp_store = LocalTempFileStore::new(config.upload.upload_dir.clone()).await?;

    Ok(Service::new(
        llm_client,
        temp_store,
        config.upload.policy(),
        config.analysis,
        config.llm.retry,
    ))
}
