use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Identity record for a tracked ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Stock {
    pub id: i64,
    pub symbol: String,
}
