use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

/// A row of `scanned_students`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StudentModel {
    pub id: Uuid,
    pub full_name: String,
    pub school_id: String,
    pub program: String,
    pub digital_card_link: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Ten ASCII digits identifying one person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchoolId(String);

impl SchoolId {
    pub const LEN: usize = 10;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SchoolId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() == Self::LEN && value.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(value))
        } else {
            Err(AppError::Validation(format!(
                "school ID must be exactly {} digits, got {:?}",
                Self::LEN,
                value
            )))
        }
    }
}

impl TryFrom<&str> for SchoolId {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}

impl From<SchoolId> for String {
    fn from(id: SchoolId) -> Self {
        id.0
    }
}

impl AsRef<str> for SchoolId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated fields of a record, as written by scan-save, add and edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentFields {
    pub full_name: String,
    pub school_id: SchoolId,
    pub program: String,
}

/// Raw form or JSON input before validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StudentForm {
    pub full_name: String,
    pub school_id: String,
    pub program: String,
}

impl StudentForm {
    pub fn validate(&self) -> Result<StudentFields, AppError> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(AppError::Validation("full name is required".into()));
        }
        let program = self.program.trim();
        if program.is_empty() {
            return Err(AppError::Validation("program is required".into()));
        }
        Ok(StudentFields {
            full_name: full_name.to_string(),
            school_id: SchoolId::try_from(self.school_id.trim())?,
            program: program.to_string(),
        })
    }
}

impl From<&StudentModel> for StudentForm {
    fn from(student: &StudentModel) -> Self {
        Self {
            full_name: student.full_name.clone(),
            school_id: student.school_id.clone(),
            program: student.program.clone(),
        }
    }
}

/// `{origin}/card/{school_id}`, persisted as the record's card link.
pub fn card_link(origin: &str, school_id: &SchoolId) -> String {
    format!("{origin}/card/{school_id}")
}
