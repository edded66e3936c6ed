//! Storage Layer
//!
//! Owns the authoritative in-memory collection of student records.

mod model;
mod repository;

pub use model::Student;
pub use repository::StudentRepository;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    /// No record carries the requested id
    #[error("Student {0} not found")]
    NotFound(i64),
    /// A thread panicked while holding the record lock
    #[error("Lock error: {0}")]
    LockPoisoned(String),
}
