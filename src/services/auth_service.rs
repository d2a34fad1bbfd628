//! # سرویس احراز هویت (Authentication Service)
//!
//! ثبت‌نام با کد تایید، ورود، JWT و مدیریت ادمین‌ها

use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    config::Config,
    database::{Repository, UserRepository},
    error::{AppError, OptionExt, Result},
    models::{
        hash_password, Claims, CreateUser, LoginRequest, LoginResponse, RegisterRequest,
        RegisterResponse, Role, UpdatePasswordRequest, User, UserResponse, VerifyAccountRequest,
    },
    utils::{self, mask_email, normalize_email},
};

use super::{Clock, EmailMessage, Mailer};

// =====================================
// Auth Service
// =====================================
/// سرویس احراز هویت
///
/// # مسئولیت‌ها:
/// - ثبت‌نام و ارسال کد تایید
/// - تایید حساب
/// - ورود و صدور توکن
/// - ثبت ادمین جدید
#[derive(Debug, Clone)]
pub struct AuthService {
    repo: UserRepository,
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
    mailer: Arc<dyn Mailer>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        repo: UserRepository,
        config: Arc<Config>,
        clock: Arc<dyn Clock>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            repo,
            config,
            clock,
            mailer,
        }
    }

    /// ثبت‌نام کاربر جدید
    ///
    /// اگه email قبلا ثبت شده ولی تایید نشده، فقط کد جدید صادر میشه.
    #[instrument(skip(self, request), fields(email = %mask_email(&request.email)))]
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let now = self.clock.now();
        let code = utils::generate_verification_code();
        let expires_at = now + self.config.verification_code_ttl();

        let user = match UserRepository::find_by_email(self.repo.pool(), &email).await? {
            Some(existing) if existing.account_verified => {
                return Err(AppError::Conflict("User already exists".to_string()));
            }
            Some(existing) => {
                self.repo
                    .refresh_verification_code(&existing.id, &code, expires_at, now)
                    .await?;
                existing
            }
            None => {
                let create = CreateUser::new(request.name.trim(), &email, &request.password, Role::User)?
                    .with_verification_code(&code, expires_at);
                self.repo.create(&create, now).await?
            }
        };

        self.send_verification(&user, &code).await;

        info!(user_id = %user.id, "Verification code issued");

        Ok(RegisterResponse {
            user: user.into(),
            message: "Verification code sent to your email".to_string(),
        })
    }

    /// تایید حساب با کد
    #[instrument(skip(self, request))]
    pub async fn verify_account(&self, request: VerifyAccountRequest) -> Result<UserResponse> {
        request.validate()?;

        let code = request.verification_code.trim();
        if !utils::is_valid_verification_code(code) {
            return Err(AppError::BadRequest("Invalid verification code".to_string()));
        }

        let now = self.clock.now();
        let user = self
            .repo
            .find_by_verification_code(code)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid verification code".to_string()))?;

        if user.verification_expired(now) {
            return Err(AppError::BadRequest("Verification code has expired".to_string()));
        }

        let user = self
            .repo
            .mark_verified(&user.id, now)
            .await?
            .ok_or_not_found("User not found")?;

        info!(user_id = %user.id, "Account verified");
        Ok(user.into())
    }

    /// ورود کاربر
    #[instrument(skip(self, request), fields(email = %mask_email(&request.email)))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let user = UserRepository::find_by_email(self.repo.pool(), &email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !user.verify_password(&request.password)? {
            warn!(user_id = %user.id, "Failed login attempt");
            return Err(AppError::Unauthorized("Invalid email or password".to_string()));
        }

        if !user.account_verified {
            return Err(AppError::Forbidden("Account is not verified".to_string()));
        }

        let (token, claims) = self.generate_token(&user)?;
        let expires_at = chrono::DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AppError::Internal("Invalid token expiry".to_string()))?;

        info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(LoginResponse {
            user: user.into(),
            token,
            expires_at,
        })
    }

    /// اعتبارسنجی توکن JWT
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            warn!(error = %e, "Token verification failed");
            AppError::Unauthorized("Invalid token".to_string())
        })?;

        if token_data.claims.is_expired() {
            return Err(AppError::Unauthorized("Token expired".to_string()));
        }

        Ok(token_data.claims)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserResponse> {
        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User not found")?;

        Ok(user.into())
    }

    /// تغییر رمز عبور کاربر وارد شده
    ///
    /// # Errors
    /// - `BadRequest`: رمز فعلی اشتباهه یا رمز جدید با قبلی یکیه
    /// - `NotFound`: کاربر دیگه وجود نداره
    #[instrument(skip(self, request))]
    pub async fn update_password(&self, user_id: &str, request: UpdatePasswordRequest) -> Result<()> {
        request.validate()?;

        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User not found")?;

        if !user.verify_password(&request.current_password)? {
            return Err(AppError::BadRequest(
                "Current password is incorrect. Please enter correct password.".to_string(),
            ));
        }

        if user.verify_password(&request.new_password)? {
            return Err(AppError::BadRequest(
                "New password cannot be same as previous password. Please enter a different password."
                    .to_string(),
            ));
        }

        let password_hash = hash_password(&request.new_password)?;
        if !self
            .repo
            .update_password_hash(&user.id, &password_hash, self.clock.now())
            .await?
        {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        info!(user_id = %user.id, "Password updated");
        Ok(())
    }

    /// لیست کاربران تایید شده (ادمین)
    pub async fn list_users(&self) -> Result<Vec<UserResponse>> {
        let users = self.repo.find_verified().await?;

        if users.is_empty() {
            return Err(AppError::NotFound("No users found".to_string()));
        }

        Ok(users.iter().map(UserResponse::from).collect())
    }

    /// ثبت ادمین جدید (توسط ادمین)
    ///
    /// ادمین بدون کد تایید، تایید شده ساخته میشه. ثبت‌نام نیمه‌کاره
    /// با همین email پاک میشه.
    #[instrument(skip(self, request), fields(email = %mask_email(&request.email)))]
    pub async fn register_admin(&self, request: RegisterRequest) -> Result<UserResponse> {
        request.validate()?;

        let email = normalize_email(&request.email);
        if let Some(existing) = UserRepository::find_by_email(self.repo.pool(), &email).await? {
            if existing.account_verified {
                return Err(AppError::Conflict("User already registered".to_string()));
            }
            self.repo.delete(&existing.id).await?;
        }

        let create =
            CreateUser::new(request.name.trim(), &email, &request.password, Role::Admin)?.verified();
        let admin = self.repo.create(&create, self.clock.now()).await?;

        info!(user_id = %admin.id, "Admin registered");
        Ok(admin.into())
    }

    fn generate_token(&self, user: &User) -> Result<(String, Claims)> {
        let claims = Claims::new(user, self.config.jwt_expiration_hours);
        let encoding_key = EncodingKey::from_secret(self.config.jwt_secret.as_bytes());

        let token = encode(&Header::default(), &claims, &encoding_key)?;
        Ok((token, claims))
    }

    /// ارسال کد تایید؛ خطای ارسال فقط لاگ میشه
    async fn send_verification(&self, user: &User, code: &str) {
        let message = EmailMessage::verification(&user.name, &user.email, code);

        if let Err(e) = self.mailer.send(message).await {
            warn!(user_id = %user.id, error = %e, "Failed to send verification email");
        }
    }
}

// =====================================
// Token Utilities
// =====================================
/// استخراج توکن از header Authorization
///
/// # Format
/// `Authorization: Bearer <token>`
#[must_use]
pub fn extract_token_from_header(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
