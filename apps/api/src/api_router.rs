use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use kasira_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;


pub fn build_router<S>(
    app_state: AppState,
    session_layer: SessionManagerLayer<S>,
) -> Result<Router, AppError>
where
    S: SessionStore + Clone,
{
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/api/permissions/available",
            get(handlers::permissions::available_permissions_handler),
        )
        .route(
            "/api/principals/{employee_id}/permissions",
            get(handlers::permissions::principal_permissions_handler),
        )
        .route(
            "/api/principals/{employee_id}/permissions/sync",
            post(handlers::permissions::sync_permissions_handler),
        )
        .route(
            "/api/principals/{employee_id}/permissions/grant",
            post(handlers::permissions::grant_permission_handler),
        )
        .route(
            "/api/principals/{employee_id}/permissions/revoke",
            post(handlers::permissions::revoke_permission_handler),
        )
        .route(
            "/api/approvals",
            get(handlers::approvals::list_approvals_handler),
        )
        .route(
            "/api/approvals/price-change",
            post(handlers::approvals::submit_price_change_handler),
        )
        .route(
            "/api/approvals/suspension",
            post(handlers::approvals::submit_suspension_handler),
        )
        .route(
            "/api/approvals/{request_id}",
            get(handlers::approvals::get_approval_handler),
        )
        .route(
            "/api/approvals/{request_id}/advance",
            post(handlers::approvals::advance_approval_handler),
        )
        .route(
            "/api/audit-log",
            get(handlers::audit_log::list_audit_log_handler),
        )
        .route(
            "/api/employees",
            post(handlers::employees::create_employee_handler),
        )
        .route(
            "/api/employees/{employee_id}",
            get(handlers::employees::get_employee_handler),
        )
        .route(
            "/api/employees/{employee_id}/roles",
            put(handlers::employees::assign_roles_handler),
        )
        .route(
            "/api/products",
            post(handlers::products::create_product_handler),
        )
        .route(
            "/api/products/{product_id}",
            get(handlers::products::get_product_handler)
                .put(handlers::products::update_product_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    let cors_layer = cors::build_cors_layer(&app_state.frontend_url)?;

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
