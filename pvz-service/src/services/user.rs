//! User registration and credential checks.

use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{Role, User};
use crate::repository::UserStore;
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Register a new user. A taken email is a bad request.
    #[instrument(skip(self, email, password), fields(role = %role))]
    pub async fn register(
        &self,
        email: &str,
        password: &Password,
        role: Role,
    ) -> Result<User, AppError> {
        if self.users.user_exists(email).await? {
            info!("Registration rejected, email already taken");
            return Err(AppError::BadRequest(anyhow::anyhow!("user already exists")));
        }

        let hash = hash_password(password).map_err(AppError::InternalError)?;
        let user = User::new(email, role, hash.into_string());

        self.users.create_user(&user).await.map_err(|e| match e {
            AppError::Conflict(_) => AppError::BadRequest(anyhow::anyhow!("user already exists")),
            other => other,
        })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    #[instrument(skip(self, email))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.users.find_user_by_email(email).await
    }

    #[instrument(skip(self, email))]
    pub async fn exists(&self, email: &str) -> Result<bool, AppError> {
        self.users.user_exists(email).await
    }

    /// Check credentials. Unknown email is a bad request, a wrong password unauthorized.
    #[instrument(skip(self, email, password))]
    pub async fn authenticate(&self, email: &str, password: &Password) -> Result<User, AppError> {
        let user = self
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("user not found")))?;

        let stored = PasswordHashString::new(user.password_hash.clone());
        verify_password(password, &stored).map_err(|_| {
            warn!(user_id = %user.id, "Login failed, wrong password");
            AppError::Unauthorized(anyhow::anyhow!("invalid credentials"))
        })?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryStore::new()))
    }

    fn password(s: &str) -> Password {
        Password::new(s.to_string())
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let users = service();
        let user = users
            .register("emp@mail.ru", &password("secret-1"), Role::Employee)
            .await
            .unwrap();
        assert!(user.password_hash.starts_with("$argon2"));
        assert!(users.exists("emp@mail.ru").await.unwrap());

        let found = users
            .authenticate("emp@mail.ru", &password("secret-1"))
            .await
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.role, Role::Employee);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_bad_request() {
        let users = service();
        users
            .register("dup@mail.ru", &password("a"), Role::Moderator)
            .await
            .unwrap();

        let err = users
            .register("dup@mail.ru", &password("b"), Role::Employee)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_authenticate_failures() {
        let users = service();
        users
            .register("emp@mail.ru", &password("right"), Role::Employee)
            .await
            .unwrap();

        let err = users
            .authenticate("nobody@mail.ru", &password("right"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = users
            .authenticate("emp@mail.ru", &password("wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
