use std::sync::Arc;

use domain::{DomainError, PasswordHash, User, UserEmail, UserId, UserRepository, Username};
use uuid::Uuid;

use crate::{clock::Clock, error::ApplicationError, password::PasswordHasher};

/// 密码最短长度
const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthenticateUserRequest {
    pub email: String,
    pub password: String,
}

/// 资料更新请求，只有给定的字段会被修改
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    fn validate_password(password: &str) -> Result<(), DomainError> {
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(DomainError::validation(
                "password",
                "must be at least 6 characters",
            ));
        }
        Ok(())
    }

    /// 注册新用户。邮箱和用户名都必须全局唯一。
    pub async fn register(&self, request: RegisterUserRequest) -> Result<User, ApplicationError> {
        let username = Username::parse(request.username)?;
        let email = UserEmail::parse(request.email)?;
        Self::validate_password(&request.password)?;

        if self
            .deps
            .user_repository
            .email_exists(email.as_str())
            .await?
        {
            return Err(DomainError::already_exists("user", email.as_str()).into());
        }
        if self
            .deps
            .user_repository
            .username_exists(username.as_str())
            .await?
        {
            return Err(DomainError::already_exists("user", username.as_str()).into());
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;

        let now = self.deps.clock.now();
        let mut user = User::register(UserId::generate(), username, email, password_hash, now);
        if request.avatar.is_some() {
            user.update_profile(None, None, request.avatar);
        }

        let stored = self.deps.user_repository.create(&user).await?;
        tracing::info!(user_id = %stored.id, "user registered");
        Ok(stored)
    }

    /// 校验邮箱+密码。成功后把用户标记为在线并返回更新后的实体。
    pub async fn authenticate(
        &self,
        request: AuthenticateUserRequest,
    ) -> Result<User, ApplicationError> {
        let user = self
            .deps
            .user_repository
            .find_by_email(request.email.trim())
            .await?
            .ok_or(ApplicationError::Authentication)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await?;
        if !password_ok {
            tracing::warn!(user_id = %user.id, "login with wrong password");
            return Err(ApplicationError::Authentication);
        }

        let now = self.deps.clock.now();
        let online = self
            .deps
            .user_repository
            .update_online_status(user.id, true, now)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user.id))?;
        Ok(online)
    }

    /// 登出即标记离线
    pub async fn logout(&self, user_id: Uuid) -> Result<(), ApplicationError> {
        self.update_online_status(user_id, false).await.map(|_| ())
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, ApplicationError> {
        let user = self
            .deps
            .user_repository
            .find_by_id(UserId::from(user_id))
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApplicationError> {
        Ok(self.deps.user_repository.find_all().await?)
    }

    pub async fn list_online_users(&self) -> Result<Vec<User>, ApplicationError> {
        Ok(self.deps.user_repository.find_online().await?)
    }

    pub async fn user_count(&self) -> Result<u64, ApplicationError> {
        Ok(self.deps.user_repository.count().await?)
    }

    /// 合并更新资料。改用户名/邮箱时会先做冲突检查，
    /// 提供新密码时重新求哈希。
    pub async fn update_user(
        &self,
        user_id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<User, ApplicationError> {
        let mut user = self.get_user(user_id).await?;

        let username = request.username.map(Username::parse).transpose()?;
        let email = request.email.map(UserEmail::parse).transpose()?;

        if let Some(new_username) = &username {
            if new_username != &user.username
                && self
                    .deps
                    .user_repository
                    .username_exists(new_username.as_str())
                    .await?
            {
                return Err(DomainError::already_exists("user", new_username.as_str()).into());
            }
        }
        if let Some(new_email) = &email {
            if new_email != &user.email
                && self
                    .deps
                    .user_repository
                    .email_exists(new_email.as_str())
                    .await?
            {
                return Err(DomainError::already_exists("user", new_email.as_str()).into());
            }
        }

        user.update_profile(username, email, request.avatar);

        if let Some(password) = request.password {
            Self::validate_password(&password)?;
            let password_hash = self.deps.password_hasher.hash(&password).await?;
            user.set_password(password_hash);
        }

        Ok(self.deps.user_repository.update(&user).await?)
    }

    pub async fn update_online_status(
        &self,
        user_id: Uuid,
        is_online: bool,
    ) -> Result<User, ApplicationError> {
        let now = self.deps.clock.now();
        let user = self
            .deps
            .user_repository
            .update_online_status(UserId::from(user_id), is_online, now)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))?;
        Ok(user)
    }

    /// 修改密码：当前密码必须先校验通过
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<(), ApplicationError> {
        Self::validate_password(&request.new_password)?;

        let mut user = self.get_user(user_id).await?;

        let current_ok = self
            .deps
            .password_hasher
            .verify(&request.current_password, &user.password)
            .await?;
        if !current_ok {
            return Err(ApplicationError::Authentication);
        }

        let password_hash: PasswordHash =
            self.deps.password_hasher.hash(&request.new_password).await?;
        user.set_password(password_hash);
        self.deps.user_repository.update(&user).await?;
        tracing::info!(user_id = %user.id, "password changed");
        Ok(())
    }
}
