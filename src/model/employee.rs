use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "emp_id": "EMP001",
        "name": "John Doe",
        "joining_date": "2025-01-10",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = "EMP001")]
    pub emp_id: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(
        example = "2025-01-10",
        value_type = String,
        format = "date"
    )]
    pub joining_date: NaiveDate,

    #[schema(example = "active")]
    pub status: String,
}

impl Employee {
    /// Deactivated employees keep their history but may not record new attendance
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}
