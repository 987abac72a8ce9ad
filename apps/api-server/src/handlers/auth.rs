//! Authentication and account handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::User;
use quill_shared::Message;
use quill_shared::dto::{
    AuthResponse, ChangePasswordRequest, LoginRequest, ProfileResponse, RegisterRequest,
    UpdateProfileRequest, UpdateSettingsRequest, UserProfile,
};

use crate::middleware::auth::AuthUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate().map_err(AppError::BadRequest)?;

    let email = req.email.to_lowercase();
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already in use".to_string()));
    }
    if state.users.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = state.passwords.hash(&req.password)?;
    let user = state
        .users
        .insert(User::new(req.username, email, password_hash))
        .await?;

    let token = state.tokens.issue(user.id, user.role)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password return the same message so the
/// endpoint cannot be used to discover which emails are registered.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate().map_err(AppError::BadRequest)?;

    let mut user = state
        .users
        .find_by_email(&req.email.to_lowercase())
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = state.passwords.verify(&req.password, &user.password_hash)?;
    if !valid {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    user.record_login();
    let user = state.users.update(user).await?;

    let token = state.tokens.issue(user.id, user.role)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// GET /api/auth/me
pub async fn me(user: AuthUser) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserProfile::from(&user.0)))
}

/// PUT /api/auth/update-profile
pub async fn update_profile(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate().map_err(AppError::BadRequest)?;

    let mut user = user.0;

    if let Some(email) = req.email {
        let email = email.to_lowercase();
        if email != user.email {
            if state.users.find_by_email(&email).await?.is_some() {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
            user.email = email;
        }
    }
    if let Some(username) = req.username {
        if username != user.username {
            if state.users.find_by_username(&username).await?.is_some() {
                return Err(AppError::Conflict("Username already taken".to_string()));
            }
            user.username = username;
        }
    }
    if let Some(avatar_url) = req.avatar_url {
        user.avatar_url = avatar_url;
    }
    if let Some(phone_number) = req.phone_number {
        user.phone_number = phone_number;
    }

    let user = state.users.update(user).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user: UserProfile::from(&user),
    }))
}

/// PUT /api/auth/update-settings
pub async fn update_settings(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<UpdateSettingsRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate().map_err(AppError::BadRequest)?;

    let mut user = user.0;

    if let Some(dark_mode) = req.dark_mode {
        user.preferences.dark_mode = dark_mode;
    }
    if let Some(email_notifications) = req.email_notifications {
        user.preferences.email_notifications = email_notifications;
    }
    if let Some(language) = req.language() {
        user.preferences.language = language;
    }

    let user = state.users.update(user).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user: UserProfile::from(&user),
    }))
}

/// PUT /api/auth/change-password
pub async fn change_password(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate().map_err(AppError::BadRequest)?;

    let mut user = user.0;

    let valid = state
        .passwords
        .verify(&req.current_password, &user.password_hash)?;
    if !valid {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = state.passwords.hash(&req.new_password)?;
    user.set_password_hash(new_hash);
    state.users.update(user).await?;

    Ok(HttpResponse::Ok().json(Message::new("Password updated successfully")))
}
