// src/domain/mod.rs
pub mod errors;
pub mod models;

// Re-export common types for convenience
pub use errors::{AnalysisError, AnalysisResult, AppError, AppResult, GuardError, GuardResult};
pub use models::{Bar, CooldownCheck, GuardDecision, RejectionCategory, RejectionLogEntry};
