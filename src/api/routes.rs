//! API route configuration.
//!
//! Every API endpoint is scoped to the owner named in the owner header; see
//! [`crate::api::middleware::Owner`].

use crate::api::handlers::{
    add_link_tags_handler, create_link_handler, create_tag_handler, delete_link_handler,
    delete_tag_handler, get_link_handler, list_links_handler, list_tags_handler,
    remove_link_tags_handler, update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Owner-scoped API routes.
///
/// # Endpoints
///
/// - `POST   /links`            - Create a short link
/// - `GET    /links`            - List links (paginated)
/// - `GET    /links/{id}`       - Get a link with its tags
/// - `PATCH  /links/{id}`       - Partially update a link
/// - `DELETE /links/{id}`       - Soft-delete a link
/// - `POST   /links/{id}/tags`  - Attach tags
/// - `DELETE /links/{id}/tags`  - Detach tags
/// - `POST   /tags`             - Get-or-create a tag
/// - `GET    /tags`             - List tags
/// - `DELETE /tags/{id}`        - Delete a tag
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler).get(list_links_handler))
        .route(
            "/links/{id}",
            get(get_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
        .route(
            "/links/{id}/tags",
            post(add_link_tags_handler).delete(remove_link_tags_handler),
        )
        .route("/tags", post(create_tag_handler).get(list_tags_handler))
        .route("/tags/{id}", delete(delete_tag_handler))
}
