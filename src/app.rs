use crate::{
    handlers::*,
    middleware::{require_admin_key, require_purchase_key},
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

pub fn router(state: AppState) -> Router {
    // Routes that sign with server-held keys
    let purchase = Router::new()
        .route("/api/purchase", post(buy_tokens))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_purchase_key,
        ));
    let admin = Router::new()
        .route("/admin/withdraw", post(withdraw))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_key,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/ws/dashboard", get(websocket_handler))
        .route("/api/token", get(token_info))
        .route("/api/plan", get(current_plan))
        .route("/api/plan/:address", get(quote_plan))
        .route("/admin/balance", get(contract_balance))
        .merge(purchase)
        .merge(admin)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
