//! Sign-in, registration and account pages.

use super::{Item, Outcome, PageContext, PageState, PageView};
use crate::error::ApiError;
use crate::routes::LOGIN_PATH;

const HOME_PATH: &str = "/homepage";

pub fn login_form() -> PageState {
    PageState::Ready(
        PageView::new("Sign in")
            .detail("login --email <EMAIL> --password <PASSWORD>")
            .section(
                "",
                vec![Item::link("Don't have an account? Register", "/register")],
                "",
            ),
    )
}

pub fn register_form() -> PageState {
    PageState::Ready(
        PageView::new("Create an account")
            .detail("register --name <NAME> --email <EMAIL> --password <PASSWORD>")
            .section(
                "",
                vec![Item::link("Already have an account? Sign in", LOGIN_PATH)],
                "",
            ),
    )
}

pub async fn login(ctx: &PageContext, email: &str, password: &str) -> Outcome {
    match ctx.session.login(email, password).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "Signed in");
            ctx.go(HOME_PATH)
        }
        Err(ApiError::Validation(message)) => Outcome::Rejected(message),
        Err(error) => {
            tracing::debug!("Login failed: {}", error);
            Outcome::Rejected(ApiError::InvalidCredentials.to_string())
        }
    }
}

pub async fn register(ctx: &PageContext, name: &str, email: &str, password: &str) -> Outcome {
    match ctx.auth.register(name, email, password).await {
        Ok(()) => ctx.go(LOGIN_PATH),
        Err(ApiError::Validation(message)) => Outcome::Rejected(message),
        Err(error) => {
            tracing::debug!("Registration failed: {}", error);
            Outcome::Rejected(ApiError::RegistrationFailed.to_string())
        }
    }
}

pub async fn logout(ctx: &PageContext) -> Outcome {
    ctx.session.logout().await;
    ctx.go(LOGIN_PATH)
}

pub async fn change_password(
    ctx: &PageContext,
    current_password: &str,
    new_password: &str,
    repeat_password: &str,
) -> Outcome {
    match ctx
        .auth
        .change_password(current_password, new_password, repeat_password)
        .await
    {
        Ok(message) => Outcome::Completed(message),
        Err(ApiError::TokenExpired) => {
            ctx.session.expire();
            Outcome::Navigated
        }
        Err(error) => Outcome::Rejected(error.to_string()),
    }
}
