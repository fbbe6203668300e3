use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Co-op term labels a student can be in.
pub const TERM_NUMBERS: [&str; 8] = ["1A", "1B", "2A", "2B", "3A", "3B", "4A", "4B"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Program {
    #[serde(rename = "Mathematics Co-op")]
    MathematicsCoop,
    #[serde(rename = "Computer Science/Data Science Co-op")]
    ComputerScienceCoop,
    #[serde(rename = "Computing & Financial Management Co-op")]
    ComputingFinancialManagementCoop,
    #[serde(rename = "Science Co-op")]
    ScienceCoop,
}

impl Program {
    pub const ALL: [Program; 4] = [
        Program::MathematicsCoop,
        Program::ComputerScienceCoop,
        Program::ComputingFinancialManagementCoop,
        Program::ScienceCoop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Program::MathematicsCoop => "Mathematics Co-op",
            Program::ComputerScienceCoop => "Computer Science/Data Science Co-op",
            Program::ComputingFinancialManagementCoop => "Computing & Financial Management Co-op",
            Program::ScienceCoop => "Science Co-op",
        }
    }
}

impl FromStr for Program {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Program::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown program: {}", s)))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudentType {
    #[serde(rename = "domestic")]
    Domestic,
    #[serde(rename = "domestic out of province")]
    DomesticOutOfProvince,
    #[serde(rename = "international")]
    International,
}

impl StudentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentType::Domestic => "domestic",
            StudentType::DomesticOutOfProvince => "domestic out of province",
            StudentType::International => "international",
        }
    }
}

impl FromStr for StudentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domestic" => Ok(StudentType::Domestic),
            "domestic out of province" => Ok(StudentType::DomesticOutOfProvince),
            "international" => Ok(StudentType::International),
            other => Err(AppError::Validation(format!("Unknown student type: {}", other))),
        }
    }
}

impl fmt::Display for StudentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn validate_term_number(term_number: Option<&str>) -> Result<(), AppError> {
    match term_number {
        Some(t) if !TERM_NUMBERS.contains(&t) => {
            Err(AppError::Validation(format!("Unknown term number: {}", t)))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub program: Program,
    pub student_type: StudentType,
    pub term_number: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw `users` row; enum columns are checked on the way out.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub program: String,
    pub student_type: String,
    pub term_number: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let program: Program = row.program.parse().map_err(|e| {
            tracing::error!("corrupt program for user {}: {}", row.id, e);
            AppError::InternalServerError
        })?;
        let student_type: StudentType = row.student_type.parse().map_err(|e| {
            tracing::error!("corrupt student_type for user {}: {}", row.id, e);
            AppError::InternalServerError
        })?;
        Ok(Self {
            program,
            student_type,
            id: row.id,
            name: row.name,
            email: row.email,
            term_number: row.term_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub program: Program,
    pub student_type: StudentType,
    pub term_number: Option<String>,
}

impl NewUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_term_number(self.term_number.as_deref())
    }
}

/// Settings update. `term_number: null` clears the label; omitting it keeps it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub program: Option<Program>,
    pub student_type: Option<StudentType>,
    #[serde(default, with = "double_option")]
    pub term_number: Option<Option<String>>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        match &self.term_number {
            Some(t) => validate_term_number(t.as_deref()),
            None => Ok(()),
        }
    }
}

mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}
