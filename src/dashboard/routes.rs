use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::server::AppState;

/// Create API router with all endpoints
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Public intake
        .route("/contact", post(handlers::submit_contact))
        // Registrations
        .route("/registrations", get(handlers::list_registrations))
        .route(
            "/registrations/batch-delete",
            post(handlers::batch_delete_registrations),
        )
        .route(
            "/registrations/:id",
            get(handlers::get_registration)
                .put(handlers::update_registration)
                .delete(handlers::delete_registration),
        )
        // Contacts
        .route("/contacts", get(handlers::list_contacts))
        .route(
            "/contacts/batch-delete",
            post(handlers::batch_delete_contacts),
        )
        .route("/contacts/:id", axum::routing::delete(handlers::delete_contact))
        // Reporting
        .route("/stats", get(handlers::get_stats))
        .route("/trends", get(handlers::get_trends))
        .route("/courses", get(handlers::get_courses))
        .route("/search", get(handlers::search_records))
        .route("/export", get(handlers::export_records))
        // Bulk data
        .route("/import-registrations", post(handlers::import_registrations))
        .route("/import-contacts", post(handlers::import_contacts))
        .route("/backup", post(handlers::create_backup))
        .route("/backups", get(handlers::list_backups))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_routes_creation() {
        let _router = api_routes();
    }
}
