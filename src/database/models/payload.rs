use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Free-form message stored through `/api/data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payload {
    pub id: i64,
    pub data: String,
    pub created_at: DateTime<Utc>,
}
