//! Tool Abstraction
//!
//! Every tool declares a [`ToolDescriptor`], implements [`McpTool::execute`]
//! and inherits argument validation plus [`McpTool::safe_execute`], which
//! turns any error or panic into a [`ToolResult::Failure`].

pub mod basic;
pub mod data_processor;
pub mod file_manager;
pub mod params;
pub mod registry;
pub mod result;
pub mod web_api;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tracing::{debug, error, info};

pub use params::{
    ParamType, SchemaError, ToolDescriptor, ToolParameter, ValidatedArgs, Violation,
    validate_arguments,
};
pub use registry::{McpToolHandler, ToolRegistry};
pub use result::ToolResult;

/// Errors raised while validating or executing a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Policy(String),

    #[error("{0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<Vec<Violation>> for ToolError {
    #[inline]
    fn from(violations: Vec<Violation>) -> Self {
        Self::Validation(violations.iter().map(ToString::to_string).collect())
    }
}

/// A named, independently invokable operation.
#[async_trait]
pub trait McpTool: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    /// Run the tool on already validated arguments.
    async fn execute(&self, args: ValidatedArgs) -> Result<ToolResult, ToolError>;

    #[inline]
    fn name(&self) -> &str {
        self.descriptor().name()
    }

    /// Check raw arguments against the declared parameters.
    #[inline]
    fn validate(&self, args: &Map<String, Value>) -> Result<ValidatedArgs, ToolError> {
        validate_arguments(self.descriptor().parameters(), args).map_err(ToolError::from)
    }

    /// Validate and execute, converting every error and panic into a failed
    /// result. Never returns an error and never unwinds.
    async fn safe_execute(&self, args: Map<String, Value>) -> ToolResult {
        let name = self.name().to_string();

        let outcome = AssertUnwindSafe(async {
            match self.validate(&args) {
                Ok(validated) => {
                    info!("Executing tool '{}'", name);
                    self.execute(validated).await
                }
                Err(e) => Err(e),
            }
        })
        .catch_unwind()
        .await;

        match outcome {
            Ok(Ok(result)) => {
                debug!("Tool '{}' finished (success: {})", name, result.is_success());
                result
            }
            Ok(Err(e)) => {
                error!(tool = %name, error = %e, "Tool execution failed");
                ToolResult::failure(format!("tool '{}' failed: {}", name, e))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(tool = %name, panic = %message, "Tool panicked");
                ToolResult::failure(format!("tool '{}' failed: unexpected error: {}", name, message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
