use crate::{
    auth::{
        hash_password, normalize_email, verify_password, AuthResponse, AuthenticatedUserId,
        LoginRequest, ProfileResponse, RegisterRequest, TokenService, UpdateProfileRequest,
    },
    error::AppError,
    models::{NewUser, UserProfile},
    store::UserStore,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns an authentication token.
#[post("/register")]
pub async fn register(
    users: web::Data<dyn UserStore>,
    tokens: web::Data<TokenService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let register_data = register_data.into_inner().normalized();
    register_data.validate()?;

    let password_hash = hash_password(&register_data.password)?;

    let user = users
        .create_user(NewUser {
            name: register_data.name,
            email: register_data.email,
            password_hash,
        })
        .await?;

    let token = tokens.issue(user.id)?;

    log::info!("registered user {}", user.id);
    Ok(HttpResponse::Created().json(AuthResponse {
        message: "User registered successfully".into(),
        token,
        user: UserProfile::from(&user),
    }))
}

/// Login user
///
/// Authenticates a user and returns an authentication token. Unknown email and
/// wrong password produce the same response.
#[post("/login")]
pub async fn login(
    users: web::Data<dyn UserStore>,
    tokens: web::Data<TokenService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = users
        .find_by_email(&normalize_email(&login_data.email))
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&login_data.password, &user.password_hash)? {
        return Err(invalid_credentials());
    }

    let token = tokens.issue(user.id)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: UserProfile::from(&user),
    }))
}

/// Returns the authenticated user's profile.
pub async fn get_profile(
    users: web::Data<dyn UserStore>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let user = users
        .find_by_id(user.0)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        message: None,
        user: UserProfile::from(&user),
    }))
}

/// Renames the authenticated user. The email is the account's identity and
/// cannot be changed here.
pub async fn update_profile(
    users: web::Data<dyn UserStore>,
    user: AuthenticatedUserId,
    body: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let mut current = users
        .find_by_id(user.0)
        .await?
        .ok_or_else(user_not_found)?;

    if let Some(email) = &body.email {
        if normalize_email(email) != current.email {
            return Err(AppError::invalid_field("email", "Email cannot be changed"));
        }
    }

    if let Some(name) = &body.name {
        current = users
            .update_name(current.id, name.trim())
            .await?
            .ok_or_else(user_not_found)?;
    }

    Ok(HttpResponse::Ok().json(ProfileResponse {
        message: Some("Profile updated successfully".into()),
        user: UserProfile::from(&current),
    }))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthenticated("Invalid credentials".into())
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}
