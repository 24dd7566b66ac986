//! Conversion of a REST endpoint into a rendered project.
//!
//! The pipeline runs analyze, validate, render in that order and stops at the
//! first stage that fails. Validation always sits between the analyzer and the
//! renderer.

use crate::application::ports::{
    AnalysisError, EndpointAnalyzer, EndpointReference, FileSet, ProjectRenderer, RenderError,
};
use crate::application::validator::{SpecValidationError, SpecValidator, ValidatedSpec};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Error returned by [`GenerationPipeline::convert`], tagged by failing stage.
#[derive(Debug)]
pub enum GenerationError {
    Analysis(AnalysisError),
    Validation(SpecValidationError),
    Render(RenderError),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Analysis(e) => write!(f, "{}", e),
            GenerationError::Validation(e) => write!(f, "{}", e),
            GenerationError::Render(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::Analysis(e) => Some(e),
            GenerationError::Validation(e) => Some(e),
            GenerationError::Render(e) => Some(e),
        }
    }
}

impl From<AnalysisError> for GenerationError {
    fn from(e: AnalysisError) -> Self {
        GenerationError::Analysis(e)
    }
}

impl From<SpecValidationError> for GenerationError {
    fn from(e: SpecValidationError) -> Self {
        GenerationError::Validation(e)
    }
}

impl From<RenderError> for GenerationError {
    fn from(e: RenderError) -> Self {
        GenerationError::Render(e)
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub spec: ValidatedSpec,
    pub files: FileSet,
}

impl GenerationReport {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Runs an endpoint through analysis, validation and rendering.
#[derive(Clone)]
pub struct GenerationPipeline {
    analyzer: Arc<dyn EndpointAnalyzer>,
    renderer: Arc<dyn ProjectRenderer>,
    validator: SpecValidator,
}

impl GenerationPipeline {
    pub fn new(analyzer: Arc<dyn EndpointAnalyzer>, renderer: Arc<dyn ProjectRenderer>) -> Self {
        Self {
            analyzer,
            renderer,
            validator: SpecValidator::new(),
        }
    }

    /// Convert an endpoint into a rendered project.
    ///
    /// # Errors
    /// Returns the error of the first stage that fails. An invalid spec never
    /// reaches the renderer.
    pub fn convert(
        &self,
        endpoint: &EndpointReference,
    ) -> Result<GenerationReport, GenerationError> {
        debug!(url = %endpoint.url, "analyzing endpoint");
        let spec = self.analyzer.analyze(endpoint)?;
        let spec = self.validator.validate_owned(spec)?;
        let files = self.renderer.render(&spec)?;

        info!(
            project = %spec.spec().project_name,
            files = files.len(),
            "generated project"
        );
        Ok(GenerationReport { spec, files })
    }
}

impl fmt::Debug for GenerationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationPipeline").finish_non_exhaustive()
    }
}
