use std::future::Future;

use crate::domain::{
    analysis::{entities::AnalysisOutcome, value_objects::AnalyzeInput},
    common::entities::app_errors::CoreError,
};

pub trait AnalysisService: Send + Sync {
    /// Runs the whole photo-to-recipes pipeline for one request. Staged files
    /// are removed before this returns, whatever the outcome.
    fn analyze(
        &self,
        input: AnalyzeInput,
    ) -> impl Future<Output = Result<AnalysisOutcome, CoreError>> + Send;
}
