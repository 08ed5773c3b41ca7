use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::api::handlers::{self, AppState};
use crate::store::KeyValueStorage;

pub fn create_router<S: KeyValueStorage + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Catalog
        .route(
            "/properties",
            get(handlers::list_properties::<S>).post(handlers::create_property::<S>),
        )
        .route("/properties/stats", get(handlers::get_status_counts::<S>))
        .route("/properties/reorder", post(handlers::reorder_properties::<S>))
        .route(
            "/properties/:id",
            get(handlers::get_property::<S>)
                .patch(handlers::update_property::<S>)
                .delete(handlers::delete_property::<S>),
        )
        // Gallery
        .route("/properties/:id/images", post(handlers::add_image::<S>))
        .route(
            "/properties/:id/images/reorder",
            post(handlers::reorder_images::<S>),
        )
        .route(
            "/properties/:id/images/:image_id",
            delete(handlers::remove_image::<S>),
        )
        // Amenities
        .route("/properties/:id/features", post(handlers::add_feature::<S>))
        .route(
            "/properties/:id/features/reorder",
            post(handlers::reorder_features::<S>),
        )
        .route(
            "/properties/:id/features/:feature_id",
            delete(handlers::remove_feature::<S>),
        )
}

/// Router with state attached, optionally serving dashboard assets for
/// every path the API does not claim
pub fn create_app<S: KeyValueStorage + 'static>(
    state: AppState<S>,
    static_dir: Option<&str>,
) -> Router {
    let router: Router = create_router::<S>().with_state(state);
    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}
