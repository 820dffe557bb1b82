use actix_session::Session;
use actix_web::{get, post, web, HttpResponse};
use tracing::error;

use crate::{
    errors::AppError,
    middlewares::user::{AuthUser, SESSION_TOKEN_KEY},
    models::user::User,
    schema::{
        auth::{AuthResponse, LoginRequest, Profile, PublicUser, RegisterRequest},
        MessageResponse,
    },
    services::auth,
    utils::issue_token,
    GlobalState,
};

/// Issues a token and stores it in a fresh session.
fn sign_in(data: &GlobalState, session: &Session, user: &User) -> Result<AuthResponse, AppError> {
    let token = issue_token(user.id, &data.config.jwt_secret, data.config.token_ttl_days)
        .map_err(|e| {
            error!(error = %e, user_id = user.id, "token signing failed");
            AppError::InternalError
        })?;

    session.renew();
    session.insert(SESSION_TOKEN_KEY, &token).map_err(|e| {
        error!(error = %e, user_id = user.id, "session write failed");
        AppError::InternalError
    })?;

    Ok(AuthResponse {
        user: PublicUser::from(user),
        token,
    })
}

#[post("/register")]
pub async fn register(
    data: web::Data<GlobalState>,
    session: Session,
    form: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let user = auth::register(data.store.as_ref(), form.into_inner()).await?;
    let body = sign_in(&data, &session, &user)?;

    Ok(HttpResponse::Created().json(body))
}

#[post("/login")]
pub async fn login(
    data: web::Data<GlobalState>,
    session: Session,
    credentials: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let user = auth::login(data.store.as_ref(), credentials.into_inner()).await?;
    let body = sign_in(&data, &session, &user)?;

    Ok(HttpResponse::Ok().json(body))
}

#[post("/logout")]
pub async fn logout(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::Ok().json(MessageResponse {
        message: "Successfully logged out".to_string(),
    })
}

#[get("")]
pub async fn me(
    data: web::Data<GlobalState>,
    user: web::ReqData<AuthUser>,
) -> Result<HttpResponse, AppError> {
    let user = auth::profile(data.store.as_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(Profile::from(&user)))
}
