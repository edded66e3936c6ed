//! Repository Implementation

use crate::{Student, StorageError};
use metrics::counter;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Repository for student records (in-memory).
///
/// Every operation takes the single record lock, so id assignment and the
/// append that follows it happen as one step.
pub struct StudentRepository {
    /// Records in insertion order
    students: Mutex<Vec<Student>>,
}

impl StudentRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a repository holding `records` as-is.
    ///
    /// Ids are trusted; callers seeding data must keep them unique.
    pub fn with_records(records: Vec<Student>) -> Self {
        info!("Creating in-memory student repository with {} records", records.len());
        Self {
            students: Mutex::new(records),
        }
    }

    /// Create a repository holding the three sample students
    pub fn seeded() -> Self {
        Self::with_records(vec![
            Student::new("John Doe", 20, "A").with_id(1),
            Student::new("Jane Smith", 19, "B").with_id(2),
            Student::new("Bob Johnson", 21, "A-").with_id(3),
        ])
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Student>>, StorageError> {
        self.students
            .lock()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }

    /// All records in insertion order
    pub fn list(&self) -> Result<Vec<Student>, StorageError> {
        Ok(self.lock()?.clone())
    }

    /// Find a record by id
    pub fn get(&self, id: i64) -> Result<Option<Student>, StorageError> {
        let students = self.lock()?;
        Ok(students.iter().find(|s| s.id == id).cloned())
    }

    /// Store `candidate` under a fresh id and return the stored record.
    ///
    /// The id is one past the largest id currently stored, or 1 when empty.
    /// Any id carried by `candidate` is discarded.
    pub fn create(&self, mut candidate: Student) -> Result<Student, StorageError> {
        let mut students = self.lock()?;

        candidate.id = students.iter().map(|s| s.id).max().map_or(1, |max| max + 1);
        students.push(candidate.clone());

        counter!("students_created_total").increment(1);
        debug!("Inserted student with ID {}", candidate.id);
        Ok(candidate)
    }

    /// Overwrite name, age and grade of the record with `id`
    pub fn update(&self, id: i64, replacement: Student) -> Result<(), StorageError> {
        let mut students = self.lock()?;

        let existing = students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StorageError::NotFound(id))?;
        existing.replace_fields(replacement);

        counter!("students_updated_total").increment(1);
        debug!("Updated student {}", id);
        Ok(())
    }

    /// Remove the record with `id`, returning it if it existed
    pub fn delete(&self, id: i64) -> Result<Option<Student>, StorageError> {
        let mut students = self.lock()?;

        let removed = students
            .iter()
            .position(|s| s.id == id)
            .map(|index| students.remove(index));

        if removed.is_some() {
            counter!("students_deleted_total").increment(1);
            debug!("Deleted student {}", id);
        }
        Ok(removed)
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }

    /// Clear all data (for testing)
    #[cfg(test)]
    pub fn clear(&self) {
        if let Ok(mut students) = self.students.lock() {
            students.clear();
        }
    }
}

impl Default for StudentRepository {
    fn default() -> Self {
        Self::new()
    }
}
