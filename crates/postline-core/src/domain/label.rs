use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Colored label a user can attach to posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLabel {
    pub name: String,
    pub color: String,
}
