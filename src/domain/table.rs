use super::TransitionError;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ExistingTypePath = "crate::schema::sql_types::TableState"]
#[DbValueStyle = "SCREAMING_SNAKE_CASE"]
pub enum TableState {
    Free,
    Held,
    Seated,
    Cleaning,
}

impl TableState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableState::Free => "FREE",
            TableState::Held => "HELD",
            TableState::Seated => "SEATED",
            TableState::Cleaning => "CLEANING",
        }
    }

    pub fn can_transition(&self, to: TableState) -> bool {
        use TableState::*;
        matches!(
            (self, to),
            (Free, Held)
                | (Free, Seated)
                | (Held, Seated)
                | (Held, Free)
                | (Seated, Cleaning)
                | (Seated, Free)
                | (Cleaning, Free)
        )
    }

    pub fn transition(&self, to: TableState) -> Result<TableState, TransitionError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(TransitionError::new("table", self, to))
        }
    }
}

impl fmt::Display for TableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
