use std::sync::Arc;

use uuid::Uuid;

use crate::database::UserStore;
use crate::dto::user_dto::{CreateUserPayload, UpdateUserPayload, UserListQuery, UserListResponse};
use crate::error::{Error, Result};
use crate::models::user::{NewUser, User, UserRecord, UserRole, UserSortField};
use crate::pagination::Paginated;
use crate::utils::crypto::CredentialVerifier;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    credentials: CredentialVerifier,
}

fn not_found(id: Uuid) -> Error {
    Error::NotFound(format!("User not found with id: {}", id))
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, credentials: CredentialVerifier) -> Self {
        Self { users, credentials }
    }

    pub async fn list(&self, query: &UserListQuery) -> Result<UserListResponse> {
        let page = query.pagination().resolve::<UserSortField>()?;
        let (records, total) = self.users.list(&query.filter(), &page).await?;
        Ok(Paginated::new(records, total, &page).map(User::from))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .map(User::from)
            .ok_or_else(|| not_found(id))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User> {
        self.users
            .find_by_email(email)
            .await?
            .map(User::from)
            .ok_or_else(|| Error::NotFound(format!("User not found with email: {}", email)))
    }

    pub async fn drivers(&self) -> Result<Vec<User>> {
        let records = self.users.find_active_by_role(UserRole::Driver).await?;
        Ok(records.into_iter().map(User::from).collect())
    }

    /// Hashes the password and stores a new account. Shared by admin
    /// creation and self-registration.
    pub async fn create(&self, payload: CreateUserPayload) -> Result<User> {
        self.create_record(payload).await.map(User::from)
    }

    pub(crate) async fn create_record(&self, payload: CreateUserPayload) -> Result<UserRecord> {
        if self.users.exists_by_email(&payload.email).await? {
            return Err(Error::DuplicateEmail(payload.email));
        }
        let password_hash = self.credentials.hash(&payload.password)?;
        let record = self
            .users
            .insert(NewUser {
                id: Uuid::now_v7(),
                email: payload.email,
                password_hash,
                first_name: payload.first_name,
                last_name: payload.last_name,
                role: payload.role,
                phone: payload.phone,
                is_active: payload.is_active.unwrap_or(true),
            })
            .await?;
        tracing::info!(user_id = %record.id, role = record.role.as_str(), "user account created");
        Ok(record)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateUserPayload) -> Result<User> {
        let record = self
            .users
            .update(id, payload.into())
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(user_id = %id, "user updated");
        Ok(record.into())
    }

    pub async fn delete(&self, id: Uuid) -> Result<User> {
        let record = self
            .users
            .delete(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(record.into())
    }
}
