//! Bookshelf application library
//!
//! The `books` module and the rule evaluator its validation is built on.

pub mod modules;
pub mod schema;

use std::sync::Arc;

use bookshelf_http::App;
use bookshelf_kernel::{settings::Settings, ModuleRegistry};

use modules::books::store::BookStore;

/// Registry holding every application module, backed by `store`
pub fn registry(store: Arc<dyn BookStore>, settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, settings);
    registry
}

/// The complete HTTP application over `store`, without binding a socket
pub fn app(store: Arc<dyn BookStore>, settings: &Settings) -> App {
    bookshelf_http::build_app(&registry(store, settings), settings)
}
