//! Student record

use serde::{Deserialize, Serialize};

/// A student record.
///
/// `id` is owned by the store: it is overwritten on insert and never changed
/// by an update. A body without `id` deserializes with `id = 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub grade: String,
}

impl Student {
    /// Build a record that has not been stored yet
    pub fn new(name: impl Into<String>, age: i32, grade: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            age,
            grade: grade.into(),
        }
    }

    /// Same record carrying `id`
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Copy every field except `id` from `other`
    pub(crate) fn replace_fields(&mut self, other: Student) {
        self.name = other.name;
        self.age = other.age;
        self.grade = other.grade;
    }
}
