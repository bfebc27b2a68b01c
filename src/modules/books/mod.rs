pub mod models;
pub mod routes;
pub mod service;

use async_trait::async_trait;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use libris_db::Database;
use libris_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use service::BookService;

/// Book catalogue: create-or-restock, fetch, update and delete
pub struct BooksModule {
    service: BookService,
}

impl BooksModule {
    pub fn new(db: Database) -> Self {
        Self {
            service: BookService::new(db),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "book"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "book module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/add", post(routes::add_book))
            .route("/{id}", get(routes::get_book))
            .route("/update/{id}", put(routes::update_book))
            .route("/delete/{id}", delete(routes::delete_book))
            .with_state(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let book = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Book" }
                    }
                }
            })
        };
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        });
        let payload = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookPayload" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/add": {
                    "post": {
                        "summary": "Add a book copy, creating the book on first sight",
                        "tags": ["Books"],
                        "requestBody": payload.clone(),
                        "responses": {
                            "201": book("Book created or restocked"),
                            "400": error("Invalid data")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book by ID",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": book("Book found"),
                            "404": error("Book not found"),
                            "500": error("Server error")
                        }
                    }
                },
                "/update/{id}": {
                    "put": {
                        "summary": "Update a book's title and author",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "requestBody": payload.clone(),
                        "responses": {
                            "200": book("Book updated"),
                            "400": error("Invalid data"),
                            "404": error("Book not found"),
                            "409": error("This book already exists"),
                            "500": error("Server error")
                        }
                    }
                },
                "/delete/{id}": {
                    "delete": {
                        "summary": "Delete a book by ID",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "204": { "description": "Book deleted" },
                            "404": error("Book not found"),
                            "409": error("Book is borrowed"),
                            "500": error("Server error")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string", "description": "Title of the book" },
                            "author": { "type": "string", "description": "Author, \"Name Surname\"" },
                            "amount": { "type": "integer", "minimum": 0, "description": "Copies on the shelf" }
                        },
                        "required": ["id", "title", "author", "amount"]
                    },
                    "BookPayload": {
                        "type": "object",
                        "properties": {
                            "title": {
                                "type": "string",
                                "minLength": 3,
                                "description": "Starts with a capital letter"
                            },
                            "author": {
                                "type": "string",
                                "description": "Two capitalized words separated by one space"
                            }
                        },
                        "required": ["title", "author"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }
}

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE IF NOT EXISTS books (
                id     INTEGER PRIMARY KEY AUTOINCREMENT,
                title  TEXT    NOT NULL,
                author TEXT    NOT NULL,
                amount INTEGER NOT NULL DEFAULT 0 CHECK (amount >= 0)
            );
            CREATE UNIQUE INDEX IF NOT EXISTS books_title_author_unique ON books (title, author);
            "#,
    }]
}

/// Create a new instance of the book module
pub fn create_module(db: Database) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(db))
}
