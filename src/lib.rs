pub mod category;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod imgflip;
pub mod meme_store;
pub mod mirror;
pub mod models;
pub mod routes;
pub mod source;
pub mod startup;
pub mod storage;
pub mod studio;
pub mod transform;
pub mod user_store;

use crate::{meme_store::MemeStore, studio::Studio, user_store::UserStore};

/// AppState holds the two stores and the creation flows shared by every handler.
/// The stores never reference each other; handlers coordinate them.
pub struct AppState {
    pub meme_store: MemeStore,
    pub user_store: UserStore,
    pub studio: Studio,
}
