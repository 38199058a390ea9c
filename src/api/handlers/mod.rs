//! HTTP request handlers for API endpoints.
//!
//! Handlers stay thin: extract, call a service, convert the result.

pub mod health;
pub mod links;
pub mod redirect;
pub mod tags;

pub use health::health_handler;
pub use links::{
    add_link_tags_handler, create_link_handler, delete_link_handler, get_link_handler,
    list_links_handler, remove_link_tags_handler, update_link_handler,
};
pub use redirect::redirect_handler;
pub use tags::{create_tag_handler, delete_tag_handler, list_tags_handler};
