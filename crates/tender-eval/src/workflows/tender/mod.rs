pub mod domain;
pub mod evaluation;
mod import;
pub mod status;
pub mod template;

pub use import::{TemplateImportError, TemplateImporter};
pub use status::{resolve, StatusResolution, StatusRules};
pub use template::{EvaluationTemplate, ScoreTargets};
