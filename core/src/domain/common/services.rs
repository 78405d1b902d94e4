use std::sync::Arc;

use crate::domain::{
    common::AnalysisConfig, llm::ports::LLMClient, retry::RetryPolicy,
    upload::{policies::UploadPolicy, ports::TempFileStore},
};

pub struct Service<LLM, TS>
where
    LLM: LLMClient,
    TS: TempFileStore,
{
    pub(crate) llm_client: Arc<LLM>,
    pub(crate) temp_store: Arc<TS>,
    pub(crate) upload_policy: UploadPolicy,
    pub(crate) analysis_config: AnalysisConfig,
    pub(crate) retry_policy: RetryPolicy,
}

impl<LLM, TS> Clone for Service<LLM, TS>
where
    LLM: LLMClient,
    TS: TempFileStore,
{
    fn clone(&self) -> Self {
        Self {
            llm_client: Arc::clone(&self.llm_client),
            temp_store: Arc::clone(&self.temp_store),
            upload_policy: self.upload_policy.clone(),
            analysis_config: self.analysis_config.clone(),
            retry_policy: self.retry_policy,
        }
    }
}

impl<LLM, TS> Service<LLM, TS>
where
    LLM: LLMClient,
    TS: TempFileStore,
{
    pub fn new(
        llm_client: LLM,
        temp_store: TS,
        upload_policy: UploadPolicy,
        analysis_config: AnalysisConfig,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            llm_client: Arc::new(llm_client),
            temp_store: Arc::new(temp_store),
            upload_policy,
            analysis_config,
            retry_policy,
        }
    }

    pub fn upload_policy(&self) -> &UploadPolicy {
        &self.upload_policy
    }

    pub fn max_recipes(&self) -> u32 {
        self.analysis_config.max_recipes
    }

    pub fn provider_name(&self) -> &'static str {
        self.llm_client.provider_name()
    }
}
