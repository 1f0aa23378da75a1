//! Documentation steps and the runner that executes them.

pub mod runner;
pub mod types;

pub use runner::{RunOptions, RunSummary, Workflow, crop};
pub use types::{
    Action, Annotation, AnnotationKind, Step, Target, WorkflowError, WorkflowResult,
};
