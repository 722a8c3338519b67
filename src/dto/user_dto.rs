use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{User, UserChanges, UserFilter, UserRole};
use crate::pagination::{Paginated, PaginationParams};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(length(min = 2, max = 100))]
    pub first_name: String,
    #[validate(length(min = 2, max = 100))]
    pub last_name: String,
    pub role: UserRole,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateUserPayload {
    /// True if the payload touches fields only administrators may change.
    pub fn changes_privileges(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }
}

impl From<UpdateUserPayload> for UserChanges {
    fn from(value: UpdateUserPayload) -> Self {
        Self {
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            role: value.role,
            phone: value.phone,
            is_active: value.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UserListQuery {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl UserListQuery {
    pub fn filter(&self) -> UserFilter {
        UserFilter {
            role: self.role,
            is_active: self.is_active,
            search: self.search.clone().filter(|s| !s.is_empty()),
        }
    }

    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order.clone(),
        }
    }
}

pub type UserListResponse = Paginated<User>;
