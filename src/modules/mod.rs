pub mod books;
pub mod library;
pub mod members;

use libris_db::{Database, Migration};
use libris_kernel::{settings::Settings, ModuleRegistry};

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &Database, settings: &Settings) {
    registry.register(books::create_module(db.clone()));
    registry.register(members::create_module(db.clone()));
    registry.register(library::create_module(
        db.clone(),
        settings.library.borrow_limit,
    ));
}

/// Every schema migration, in the order the registry would apply them.
pub fn migrations() -> Vec<(String, Migration)> {
    let mut all: Vec<(String, Migration)> = books::migrations()
        .into_iter()
        .map(|migration| ("book".to_string(), migration))
        .chain(
            members::migrations()
                .into_iter()
                .map(|migration| ("member".to_string(), migration)),
        )
        .collect();
    all.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));
    all
}
