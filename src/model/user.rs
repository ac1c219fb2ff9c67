use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A badge holder. Read-only from the scan path.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct User {
    #[schema(example = 1)]
    pub id: u64,

    /// Uppercase hex badge identifier
    #[schema(example = "04A1B2C3")]
    pub rfid_uid: String,

    #[schema(example = "Jane Doe")]
    pub name: String,

    #[schema(example = "jane.doe@company.com", nullable = true)]
    pub email: Option<String>,

    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    pub active: bool,
}

/// Trim and uppercase a badge identifier the way every lookup expects it.
pub fn normalize_uid(raw: &str) -> String {
    raw.trim().to_uppercase()
}
