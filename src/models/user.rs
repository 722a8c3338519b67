use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::pagination::SortField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Dispatcher,
    Driver,
    Customer,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Customer
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Dispatcher => "DISPATCHER",
            UserRole::Driver => "DRIVER",
            UserRole::Customer => "CUSTOMER",
        }
    }
}

/// A user row exactly as stored, password hash included.
///
/// Never serialized; convert into [`User`] before it leaves a service.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outward-facing user representation. Has no password field at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        let full_name = format!("{} {}", record.first_name, record.last_name);
        Self {
            id: record.id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            full_name,
            role: record.role,
            phone: record.phone,
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Insert payload handed to a user store; the hash is already computed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub is_active: bool,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring over email, first and last name.
    pub search: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &UserRecord) -> bool {
        if let Some(role) = self.role {
            if user.role != role {
                return false;
            }
        }
        if let Some(is_active) = self.is_active {
            if user.is_active != is_active {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            return [&user.email, &user.first_name, &user.last_name]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    CreatedAt,
    UpdatedAt,
    Email,
    FirstName,
    LastName,
    Role,
}

impl SortField for UserSortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(UserSortField::CreatedAt),
            "updatedAt" => Some(UserSortField::UpdatedAt),
            "email" => Some(UserSortField::Email),
            "firstName" => Some(UserSortField::FirstName),
            "lastName" => Some(UserSortField::LastName),
            "role" => Some(UserSortField::Role),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            UserSortField::CreatedAt => "created_at",
            UserSortField::UpdatedAt => "updated_at",
            UserSortField::Email => "email",
            UserSortField::FirstName => "first_name",
            UserSortField::LastName => "last_name",
            UserSortField::Role => "role",
        }
    }
}

impl UserSortField {
    /// Ascending comparison on this field; role follows its declaration order
    /// like the Postgres enum does.
    pub fn compare(&self, a: &UserRecord, b: &UserRecord) -> Ordering {
        match self {
            UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            UserSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            UserSortField::Email => a.email.cmp(&b.email),
            UserSortField::FirstName => a.first_name.cmp(&b.first_name),
            UserSortField::LastName => a.last_name.cmp(&b.last_name),
            UserSortField::Role => (a.role as u8).cmp(&(b.role as u8)),
        }
    }
}
