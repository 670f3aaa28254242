//! Template source port.
//!
//! The template import pipeline writes templates already normalized to
//! `(phase, section, line item)` with canonical phase keys. This port only
//! reads them back.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, WorkflowType};
use crate::domain::template::WorkflowTemplate;

/// Read access to stored workflow templates.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Load the template for a workflow type.
    ///
    /// Returns `None` if no template is stored for the type.
    ///
    /// # Errors
    ///
    /// - `InvalidTemplate` if the stored template fails validation
    /// - `DatabaseError` on persistence failure
    async fn load_template(
        &self,
        workflow_type: &WorkflowType,
    ) -> Result<Option<WorkflowTemplate>, DomainError>;

    /// List every workflow type with a stored template.
    async fn list_workflow_types(&self) -> Result<Vec<WorkflowType>, DomainError>;
}
