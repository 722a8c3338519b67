use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::{NewUser, UserChanges, UserFilter, UserRecord, UserRole, UserSortField};
use crate::pagination::{like_pattern, PageRequest, SortField};

/// Persistence port for user accounts.
///
/// Implementations enforce email uniqueness (reporting
/// [`Error::DuplicateEmail`]) and own the `created_at`/`updated_at` stamps.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<UserRecord>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>>;

    /// Exact, case-sensitive match.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    /// One page of matching users plus the total number of matches.
    async fn list(
        &self,
        filter: &UserFilter,
        page: &PageRequest<UserSortField>,
    ) -> Result<(Vec<UserRecord>, i64)>;

    /// Active users holding `role`, ordered by first name.
    async fn find_active_by_role(&self, role: UserRole) -> Result<Vec<UserRecord>>;

    /// Returns `None` when no user has this id.
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<UserRecord>>;

    /// Hard delete; returns the removed row.
    async fn delete(&self, id: Uuid) -> Result<Option<UserRecord>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    let mut keyword = " WHERE ";
    if let Some(role) = filter.role {
        builder.push(keyword).push("role = ").push_bind(role);
        keyword = " AND ";
    }
    if let Some(is_active) = filter.is_active {
        builder.push(keyword).push("is_active = ").push_bind(is_active);
        keyword = " AND ";
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(keyword)
            .push("(email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn email_conflict(email: &str) -> impl FnOnce(sqlx::Error) -> Error + '_ {
    move |err| match Error::from(err) {
        Error::DuplicateEmail(_) => Error::DuplicateEmail(email.to_string()),
        other => other,
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<UserRecord> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, role, phone, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, email, password_hash, first_name, last_name, role, phone, is_active, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(user.email.as_str())
        .bind(user.password_hash.as_str())
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.role)
        .bind(user.phone.as_deref())
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(email_conflict(&user.email))?;

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role, phone, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role, phone, is_active, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list(
        &self,
        filter: &UserFilter,
        page: &PageRequest<UserSortField>,
    ) -> Result<(Vec<UserRecord>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count, filter);
        let (total,) = count
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        let mut items = QueryBuilder::<Postgres>::new(
            "SELECT id, email, password_hash, first_name, last_name, role, phone, is_active, created_at, updated_at FROM users",
        );
        push_filters(&mut items, filter);
        items
            .push(" ORDER BY ")
            .push(page.sort_by.column())
            .push(" ")
            .push(page.order.sql())
            .push(", id ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let records = items
            .build_query_as::<UserRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok((records, total))
    }

    async fn find_active_by_role(&self, role: UserRole) -> Result<Vec<UserRecord>> {
        let records = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role, phone, is_active, created_at, updated_at
            FROM users
            WHERE role = $1 AND is_active = TRUE
            ORDER BY first_name ASC, id ASC
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<UserRecord>> {
        let email = changes.email.clone().unwrap_or_default();
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET
                email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                role = COALESCE($5, role),
                phone = COALESCE($6, phone),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, first_name, last_name, role, phone, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.email)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.role)
        .bind(changes.phone)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(email_conflict(&email))?;
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            DELETE FROM users
            WHERE id = $1
            RETURNING id, email, password_hash, first_name, last_name, role, phone, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}
