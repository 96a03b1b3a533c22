use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ExistingTypePath = "crate::schema::sql_types::UserRole"]
#[DbValueStyle = "SCREAMING_SNAKE_CASE"]
pub enum Role {
    Customer,
    Staff,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Staff => "STAFF",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
        }
    }

    /// Roles that work inside a restaurant through an employment record.
    pub fn is_restaurant_side(&self) -> bool {
        matches!(self, Role::Staff | Role::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ExistingTypePath = "crate::schema::sql_types::StaffRole"]
#[DbValueStyle = "SCREAMING_SNAKE_CASE"]
pub enum StaffRole {
    Server,
    Kitchen,
    Driver,
    Manager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ExistingTypePath = "crate::schema::sql_types::EmploymentStatus"]
#[DbValueStyle = "SCREAMING_SNAKE_CASE"]
pub enum EmploymentStatus {
    Active,
    Inactive,
}

impl EmploymentStatus {
    pub fn toggled(&self) -> EmploymentStatus {
        match self {
            EmploymentStatus::Active => EmploymentStatus::Inactive,
            EmploymentStatus::Inactive => EmploymentStatus::Active,
        }
    }
}
