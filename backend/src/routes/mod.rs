//! Route definitions for the Warehouse Management System

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let upload_limit = state.config.import.max_upload_bytes + MULTIPART_OVERHEAD;

    let protected = Router::new()
        .nest("/auth", session_routes())
        .nest("/users", user_routes())
        .nest("/items", item_routes())
        .nest("/warehouses", warehouse_routes())
        .nest("/shelf-codes", shelf_code_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/customers", customer_routes())
        .nest("/stock", stock_routes())
        .nest("/inbound", inbound_routes())
        .nest("/outbound", outbound_routes())
        .nest("/transfers", transfer_routes())
        .nest("/stock-counts", stock_count_routes())
        .route("/templates/:kind", get(handlers::download_template))
        .route(
            "/imports/:kind",
            post(handlers::import_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/exports/:report", get(handlers::export_report))
        .route("/dashboard", get(handlers::get_dashboard))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh))
        .merge(protected)
}

/// Session routes that need a valid access token
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
}

/// User management routes (admin)
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/:user_id",
            put(handlers::update_user).delete(handlers::delete_user),
        )
}

fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
}

fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_warehouses).post(handlers::create_warehouse),
        )
        .route(
            "/:warehouse_id",
            get(handlers::get_warehouse)
                .put(handlers::update_warehouse)
                .delete(handlers::delete_warehouse),
        )
}

fn shelf_code_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_shelf_codes).post(handlers::create_shelf_code),
        )
        .route(
            "/:shelf_code_id",
            get(handlers::get_shelf_code)
                .put(handlers::update_shelf_code)
                .delete(handlers::delete_shelf_code),
        )
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
}

fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:customer_id",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
}

/// Stock levels, stock card and bin assignment
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stock))
        .route("/low", get(handlers::list_low_stock))
        .route("/items/:item_id/card", get(handlers::get_stock_card))
        .route("/:stock_id/shelf", put(handlers::assign_shelf))
}

fn inbound_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_inbound).post(handlers::create_inbound))
        .route(
            "/:id",
            get(handlers::get_inbound)
                .put(handlers::update_inbound)
                .delete(handlers::delete_inbound),
        )
}

fn outbound_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_outbound).post(handlers::create_outbound),
        )
        .route(
            "/:id",
            get(handlers::get_outbound)
                .put(handlers::update_outbound)
                .delete(handlers::delete_outbound),
        )
}

fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transfers).post(handlers::create_transfer),
        )
        .route(
            "/:id",
            get(handlers::get_transfer)
                .put(handlers::update_transfer)
                .delete(handlers::delete_transfer),
        )
}

fn stock_count_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_stock_counts).post(handlers::create_stock_count),
        )
        .route(
            "/:id",
            get(handlers::get_stock_count)
                .put(handlers::update_stock_count)
                .delete(handlers::delete_stock_count),
        )
}
