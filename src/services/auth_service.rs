use std::sync::Arc;

use crate::database::UserStore;
use crate::dto::auth_dto::{AuthResponse, LoginPayload, RegisterPayload};
use crate::dto::user_dto::CreateUserPayload;
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::services::token_service::{Claims, TokenService};
use crate::services::user_service::UserService;
use crate::utils::crypto::CredentialVerifier;

impl From<RegisterPayload> for CreateUserPayload {
    fn from(value: RegisterPayload) -> Self {
        Self {
            email: value.email,
            password: value.password,
            first_name: value.first_name,
            last_name: value.last_name,
            role: value.role.unwrap_or_default(),
            phone: value.phone,
            is_active: Some(true),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    accounts: UserService,
    credentials: CredentialVerifier,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        credentials: CredentialVerifier,
        tokens: TokenService,
    ) -> Self {
        let accounts = UserService::new(users.clone(), credentials.clone());
        Self {
            users,
            accounts,
            credentials,
            tokens,
        }
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<AuthResponse> {
        let record = self.accounts.create_record(payload.into()).await?;
        let user = User::from(record);
        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(AuthResponse { token, user })
    }

    /// Unknown email and wrong password both yield [`Error::InvalidCredentials`].
    pub async fn login(&self, payload: LoginPayload) -> Result<AuthResponse> {
        let Some(record) = self.users.find_by_email(&payload.email).await? else {
            // Same argon2 cost as a real verification.
            self.credentials.verify_against_dummy(&payload.password);
            tracing::warn!("login failed: unknown account");
            return Err(Error::InvalidCredentials);
        };
        if !self.credentials.matches(&payload.password, &record.password_hash) {
            tracing::warn!(user_id = %record.id, "login failed: wrong password");
            return Err(Error::InvalidCredentials);
        }
        if !record.is_active {
            tracing::warn!(user_id = %record.id, "login refused: account inactive");
            return Err(Error::AccountInactive);
        }
        let user = User::from(record);
        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(AuthResponse { token, user })
    }

    /// Verifies a bearer token and reloads its account. The returned claims
    /// carry the stored email and role, not the ones sealed at issuance.
    pub async fn authenticate(&self, token: &str) -> Result<Claims> {
        let mut claims = self.tokens.decode(token)?;
        let record = self
            .users
            .find_by_id(claims.uid)
            .await?
            .ok_or_else(|| Error::Unauthorized("account no longer exists".to_string()))?;
        if !record.is_active {
            tracing::warn!(user_id = %record.id, "token refused: account inactive");
            return Err(Error::AccountInactive);
        }
        claims.sub = record.email;
        claims.role = record.role;
        Ok(claims)
    }

    /// Resolves the subject of a verified token to its account.
    pub async fn current_user(&self, email: &str) -> Result<User> {
        self.accounts.get_by_email(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryUserStore;
    use crate::database::user_store::MockUserStore;
    use crate::models::user::{UserChanges, UserRole};
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-must-be-at-least-32-characters-long";

    fn setup() -> (AuthService, TokenService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let tokens = TokenService::new(SECRET, Duration::hours(1)).unwrap();
        let svc = AuthService::new(store.clone(), CredentialVerifier::low_cost(), tokens.clone());
        (svc, tokens, store)
    }

    fn register_payload(email: &str, password: &str) -> RegisterPayload {
        RegisterPayload {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "A".into(),
            last_name: "One".into(),
            role: None,
            phone: None,
        }
    }

    fn login_payload(email: &str, password: &str) -> LoginPayload {
        LoginPayload {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_defaults_to_active_customer() {
        let (svc, tokens, _) = setup();
        let resp = svc.register(register_payload("a@x.com", "pw1")).await.unwrap();
        assert!(!resp.token.is_empty());
        assert_eq!(resp.user.email, "a@x.com");
        assert_eq!(resp.user.role, UserRole::Customer);
        assert!(resp.user.is_active);
        assert_eq!(tokens.extract_subject(&resp.token).unwrap(), "a@x.com");
    }

    #[tokio::test]
    async fn register_twice_is_duplicate_email() {
        let (svc, _, _) = setup();
        svc.register(register_payload("a@x.com", "pw1")).await.unwrap();
        let err = svc
            .register(register_payload("a@x.com", "pw2"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn password_is_stored_hashed_and_never_returned() {
        let (svc, _, store) = setup();
        let resp = svc.register(register_payload("a@x.com", "pw1")).await.unwrap();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("pw1"));
        assert!(!json.contains("password"));

        let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw1");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let (svc, _, _) = setup();
        svc.register(register_payload("a@x.com", "pw1")).await.unwrap();

        let wrong = svc.login(login_payload("a@x.com", "wrong")).await.unwrap_err();
        let unknown = svc.login(login_payload("nobody@x.com", "pw1")).await.unwrap_err();
        assert!(matches!(wrong, Error::InvalidCredentials));
        assert!(matches!(unknown, Error::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn login_issues_token_for_the_account() {
        let (svc, tokens, _) = setup();
        let registered = svc.register(register_payload("a@x.com", "pw1")).await.unwrap();
        let resp = svc.login(login_payload("a@x.com", "pw1")).await.unwrap();
        assert_eq!(resp.user.id, registered.user.id);
        assert!(tokens.verify(&resp.token, "a@x.com"));
        assert_eq!(tokens.decode(&resp.token).unwrap().uid, registered.user.id);
    }

    #[tokio::test]
    async fn deactivated_account_cannot_log_in() {
        let (svc, _, store) = setup();
        let resp = svc.register(register_payload("a@x.com", "pw1")).await.unwrap();
        store
            .update(
                resp.user.id,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let err = svc.login(login_payload("a@x.com", "pw1")).await.unwrap_err();
        assert!(matches!(err, Error::AccountInactive));
    }

    #[tokio::test]
    async fn current_user_resolves_by_email() {
        let (svc, _, _) = setup();
        svc.register(register_payload("a@x.com", "pw1")).await.unwrap();
        let me = svc.current_user("a@x.com").await.unwrap();
        assert_eq!(me.full_name, "A One");
        assert!(matches!(
            svc.current_user("ghost@x.com").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_email_is_invalid_credentials() {
        let mut store = MockUserStore::new();
        store
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        let tokens = TokenService::new(SECRET, Duration::hours(1)).unwrap();
        let svc = AuthService::new(Arc::new(store), CredentialVerifier::low_cost(), tokens);

        let err = svc.login(login_payload("ghost@x.com", "pw1")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
    }

    #[tokio::test]
    async fn authenticate_reflects_current_role_and_email() {
        let (svc, _, store) = setup();
        let resp = svc.register(register_payload("a@x.com", "pw1")).await.unwrap();
        store
            .update(
                resp.user.id,
                UserChanges {
                    email: Some("renamed@x.com".into()),
                    role: Some(UserRole::Dispatcher),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let claims = svc.authenticate(&resp.token).await.unwrap();
        assert_eq!(claims.uid, resp.user.id);
        assert_eq!(claims.sub, "renamed@x.com");
        assert_eq!(claims.role, UserRole::Dispatcher);
    }

    #[tokio::test]
    async fn authenticate_refuses_deactivated_and_deleted_accounts() {
        let (svc, _, store) = setup();
        let resp = svc.register(register_payload("a@x.com", "pw1")).await.unwrap();
        store
            .update(
                resp.user.id,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            svc.authenticate(&resp.token).await,
            Err(Error::AccountInactive)
        ));

        store.delete(resp.user.id).await.unwrap();
        assert!(matches!(
            svc.authenticate(&resp.token).await,
            Err(Error::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_rejects_bad_tokens_before_lookup() {
        let mut store = MockUserStore::new();
        store.expect_find_by_id().never();
        let tokens = TokenService::new(SECRET, Duration::hours(1)).unwrap();
        let svc = AuthService::new(Arc::new(store), CredentialVerifier::low_cost(), tokens);
        assert!(matches!(
            svc.authenticate("not.a.token").await,
            Err(Error::TokenMalformed)
        ));
    }
}
