//! # Error Handling
//!
//! Error types for the hybrid resizer, with enough classification for callers
//! to decide between a silent CPU fallback and a visible failure.
//!
//! ## Taxonomy
//!
//! - `GpuUnavailable`: no adapter or device could be obtained. Always
//!   recoverable by resizing on the CPU.
//! - `GpuResizeFailed`: a GPU step failed after the context existed. Carries
//!   the stage name and the underlying [`DeviceError`].
//! - `BatchItemFailed`: one batch item failed. Never leaves `batch_resize`;
//!   it is logged and replaced by an empty sentinel.
//! - `EncodingFailed`: the output encoder rejected the format/quality pair or
//!   failed while writing.
//! - `InvalidRequest`: the request cannot be resolved to concrete dimensions.
//! - `Decode`: a source payload could not be decoded into pixels.
//!
//! ## Usage
//!
//! ```rust
//! use hybrid_image_resize::error::{Recoverable, ResizeError};
//!
//! let error = ResizeError::gpu_unavailable("no adapter")
//!     .with_context("resizing preview thumbnail");
//!
//! if error.is_recoverable() {
//!     // fall back to the CPU path
//! }
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

use crate::gpu::DeviceError;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational errors, e.g. an expected fallback
    Info,
    /// Warnings that may indicate potential issues
    Warning,
    /// Errors that affect the current operation
    Error,
    /// Errors that leave the engine unable to continue
    Fatal,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with the given severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Set recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.recovery_suggestion = Some(suggestion.into());
        self
    }
}

/// Base error type for the resize engine
#[derive(Debug)]
pub enum ResizeError {
    /// No GPU adapter or device could be obtained
    GpuUnavailable {
        reason: String,
        context: ErrorContext,
    },
    /// A GPU step failed after a context was acquired
    GpuResizeFailed {
        stage: String,
        source: DeviceError,
        context: ErrorContext,
    },
    /// A single batch item failed
    BatchItemFailed {
        index: usize,
        source: Box<ResizeError>,
        context: ErrorContext,
    },
    /// Output encoding failed
    EncodingFailed {
        format: String,
        reason: String,
        source: Option<image::ImageError>,
        context: ErrorContext,
    },
    /// The request could not be resolved or validated
    InvalidRequest {
        field: String,
        constraint: String,
        value: String,
        context: ErrorContext,
    },
    /// A source payload could not be decoded
    Decode {
        reason: String,
        source: Option<image::ImageError>,
        context: ErrorContext,
    },
}

impl ResizeError {
    /// Create a GPU-unavailable error
    pub fn gpu_unavailable(reason: impl Into<String>) -> Self {
        Self::GpuUnavailable {
            reason: reason.into(),
            context: ErrorContext::new()
                .with_severity(ErrorSeverity::Info)
                .with_recovery_suggestion("Resize on the CPU path instead"),
        }
    }

    /// Create a GPU resize failure for the named stage
    pub fn gpu_failed(stage: impl Into<String>, source: DeviceError) -> Self {
        Self::GpuResizeFailed {
            stage: stage.into(),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Wrap a failure of batch item `index`
    pub fn batch_item(index: usize, source: ResizeError) -> Self {
        Self::BatchItemFailed {
            index,
            source: Box::new(source),
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create an encoding error
    pub fn encoding(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EncodingFailed {
            format: format.into(),
            reason: reason.into(),
            source: None,
            context: ErrorContext::new(),
        }
    }

    /// Create an encoding error caused by the image encoder
    pub fn encoder(format: impl Into<String>, source: image::ImageError) -> Self {
        Self::EncodingFailed {
            format: format.into(),
            reason: source.to_string(),
            source: Some(source),
            context: ErrorContext::new(),
        }
    }

    /// Create an invalid-request error
    pub fn invalid_request(
        field: impl Into<String>,
        constraint: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidRequest {
            field: field.into(),
            constraint: constraint.into(),
            value: value.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a decode error
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
            source: None,
            context: ErrorContext::new(),
        }
    }

    /// Create a decode error caused by the image decoder
    pub fn decoder(source: image::ImageError) -> Self {
        Self::Decode {
            reason: source.to_string(),
            source: Some(source),
            context: ErrorContext::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::GpuUnavailable { context, .. } => context,
            Self::GpuResizeFailed { context, .. } => context,
            Self::BatchItemFailed { context, .. } => context,
            Self::EncodingFailed { context, .. } => context,
            Self::InvalidRequest { context, .. } => context,
            Self::Decode { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::GpuUnavailable { context, .. } => context,
            Self::GpuResizeFailed { context, .. } => context,
            Self::BatchItemFailed { context, .. } => context,
            Self::EncodingFailed { context, .. } => context,
            Self::InvalidRequest { context, .. } => context,
            Self::Decode { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::GpuUnavailable { .. } => "gpu_unavailable",
            Self::GpuResizeFailed { .. } => "gpu_resize_failed",
            Self::BatchItemFailed { .. } => "batch_item_failed",
            Self::EncodingFailed { .. } => "encoding_failed",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Decode { .. } => "decode",
        }
    }

    /// True for the error the UI treats as a silent fallback trigger.
    pub fn is_gpu_unavailable(&self) -> bool {
        matches!(self, Self::GpuUnavailable { .. })
    }
}

impl fmt::Display for ResizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResizeError::GpuUnavailable { reason, .. } => {
                write!(f, "GPU unavailable: {}", reason)
            }
            ResizeError::GpuResizeFailed { stage, source, .. } => {
                write!(f, "GPU resize failed during {}: {}", stage, source)
            }
            ResizeError::BatchItemFailed { index, source, .. } => {
                write!(f, "Batch item {} failed: {}", index, source)
            }
            ResizeError::EncodingFailed { format, reason, .. } => {
                write!(f, "Encoding to {} failed: {}", format, reason)
            }
            ResizeError::InvalidRequest {
                field,
                constraint,
                value,
                ..
            } => {
                write!(
                    f,
                    "Invalid resize request '{}': {} (value: {})",
                    field, constraint, value
                )
            }
            ResizeError::Decode { reason, .. } => {
                write!(f, "Failed to decode source image: {}", reason)
            }
        }
    }
}

impl StdError for ResizeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::GpuResizeFailed { source, .. } => Some(source),
            Self::BatchItemFailed { source, .. } => Some(source.as_ref()),
            Self::EncodingFailed {
                source: Some(source),
                ..
            } => Some(source),
            Self::Decode {
                source: Some(source),
                ..
            } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type ResizeResult<T> = Result<T, ResizeError>;

/// Trait for errors that can be recovered from
pub trait Recoverable {
    /// Check if this error can be recovered from
    fn is_recoverable(&self) -> bool;

    /// Get recovery strategies for this error
    fn recovery_strategies(&self) -> Vec<RecoveryStrategy>;
}

/// Recovery strategies for handling errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Use a fallback method
    Fallback { description: String },
    /// Reinitialize the component
    Reinitialize { component: String },
    /// Skip the current item
    Skip { reason: String },
}

impl Recoverable for ResizeError {
    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::GpuUnavailable { .. } | Self::GpuResizeFailed { .. } | Self::BatchItemFailed { .. }
        )
    }

    fn recovery_strategies(&self) -> Vec<RecoveryStrategy> {
        match self {
            Self::GpuUnavailable { .. } => vec![RecoveryStrategy::Fallback {
                description: "Resize with the CPU fallback".to_string(),
            }],
            Self::GpuResizeFailed { .. } => vec![
                RecoveryStrategy::Reinitialize {
                    component: "graphics_context".to_string(),
                },
                RecoveryStrategy::Fallback {
                    description: "Resize with the CPU fallback".to_string(),
                },
            ],
            Self::BatchItemFailed { .. } => vec![RecoveryStrategy::Skip {
                reason: "Emit an empty result for this item".to_string(),
            }],
            _ => vec![],
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for ResizeError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for ResizeError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

impl From<image::ImageError> for ResizeError {
    fn from(error: image::ImageError) -> Self {
        Self::decoder(error)
    }
}
