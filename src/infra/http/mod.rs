//! HTTP surface: JSON routes under `/api` plus `/health`.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use error::ApiError;
pub use state::HttpState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{MethodRouter, get, post, put},
};

use crate::application::auth::AccessPolicy;

use self::middleware::{AuthGate, authorize, log_responses, set_request_context};

/// Wrap `route` so it only runs for callers satisfying `policy`.
fn guarded(
    route: MethodRouter<HttpState>,
    state: &HttpState,
    policy: AccessPolicy,
) -> MethodRouter<HttpState> {
    route.route_layer(axum_middleware::from_fn_with_state(
        AuthGate {
            state: state.clone(),
            policy,
        },
        authorize,
    ))
}

pub fn build_router(state: HttpState) -> Router {
    use AccessPolicy::{ActiveAdmin, ActiveUser, AdminClaim, Authenticated};

    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login));

    let article_routes = Router::new()
        .route(
            "/api/articles",
            get(handlers::list_articles).merge(guarded(
                post(handlers::create_article),
                &state,
                Authenticated,
            )),
        )
        .route("/api/articles/page", get(handlers::list_articles_page))
        .route(
            "/api/articles/batch-delete",
            guarded(post(handlers::batch_delete_articles), &state, ActiveAdmin),
        )
        .route("/api/articles/{id}", get(handlers::get_article))
        .route(
            "/api/articles/{id}/like",
            guarded(post(handlers::like_article), &state, Authenticated),
        )
        .route("/api/articles/{id}/likes", get(handlers::article_likes));

    let user_routes = Router::new()
        .route(
            "/api/users",
            guarded(get(handlers::list_users), &state, AdminClaim),
        )
        .route(
            "/api/users/me",
            guarded(
                get(handlers::current_user).put(handlers::update_current_user),
                &state,
                ActiveUser,
            ),
        )
        .route(
            "/api/users/me/password",
            guarded(put(handlers::change_password), &state, ActiveUser),
        )
        .route(
            "/api/users/{id}",
            guarded(get(handlers::get_user), &state, Authenticated).merge(guarded(
                put(handlers::admin_update_user),
                &state,
                ActiveAdmin,
            )),
        );

    let rate_routes = Router::new().route(
        "/api/exchange-rates",
        get(handlers::list_exchange_rates).merge(guarded(
            post(handlers::create_exchange_rate),
            &state,
            Authenticated,
        )),
    );

    Router::new()
        .route("/health", get(handlers::health))
        .merge(auth_routes)
        .merge(article_routes)
        .merge(user_routes)
        .merge(rate_routes)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
