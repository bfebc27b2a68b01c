pub mod models;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{delete, get, post},
    Router,
};
use libris_db::Database;
use libris_kernel::{InitCtx, Module};
use serde_json::json;

use service::BorrowingService;

/// Lending desk: borrow, return and borrowing reports. Owns no tables; the
/// relation lives with the member module.
pub struct LibraryModule {
    service: BorrowingService,
}

impl LibraryModule {
    pub fn new(db: Database, borrow_limit: usize) -> Self {
        Self {
            service: BorrowingService::new(db, borrow_limit),
        }
    }
}

#[async_trait]
impl Module for LibraryModule {
    fn name(&self) -> &'static str {
        "library"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            borrow_limit = self.service.borrow_limit(),
            "library module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/add/{member_id}/{book_id}", post(routes::borrow_book))
            .route("/return/{member_id}/{book_id}", delete(routes::return_book))
            .route("/books/member/{name}", get(routes::books_by_member))
            .route("/books/borrowed", get(routes::borrowed_titles))
            .route("/books/borrowed_count", get(routes::borrowed_titles_with_count))
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
        let text = |description: &str| {
            json!({
                "description": description,
                "content": { "text/plain": { "schema": { "type": "string" } } }
            })
        };
        let pair = json!([
            {
                "name": "member_id",
                "in": "path",
                "required": true,
                "schema": { "type": "integer", "format": "int64" }
            },
            {
                "name": "book_id",
                "in": "path",
                "required": true,
                "schema": { "type": "integer", "format": "int64" }
            }
        ]);

        Some(json!({
            "paths": {
                "/add/{member_id}/{book_id}": {
                    "post": {
                        "summary": "Lend a copy of a book to a member",
                        "tags": ["Library"],
                        "parameters": pair.clone(),
                        "responses": {
                            "200": text("Borrowing added"),
                            "404": error("Book or member not found"),
                            "409": error("Limit reached, already borrowed or out of stock")
                        }
                    }
                },
                "/return/{member_id}/{book_id}": {
                    "delete": {
                        "summary": "Return a borrowed book",
                        "tags": ["Library"],
                        "parameters": pair.clone(),
                        "responses": {
                            "200": text("Book returned"),
                            "404": error("Book or member not found"),
                            "409": error("Member didn't borrow this book")
                        }
                    }
                },
                "/books/member/{name}": {
                    "get": {
                        "summary": "Books currently held by the member with this name",
                        "tags": ["Library"],
                        "parameters": [{
                            "name": "name",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Borrowed books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "404": error("No member with this name")
                        }
                    }
                },
                "/books/borrowed": {
                    "get": {
                        "summary": "Distinct titles with at least one borrower",
                        "tags": ["Library"],
                        "responses": {
                            "200": {
                                "description": "Borrowed titles",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "type": "string" } }
                                    }
                                }
                            }
                        }
                    }
                },
                "/books/borrowed_count": {
                    "get": {
                        "summary": "Borrowed titles with the number of distinct borrowers",
                        "tags": ["Library"],
                        "responses": {
                            "200": {
                                "description": "Borrowed titles and counts",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/BorrowedTitle" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BorrowedTitle": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "count": { "type": "integer", "minimum": 1 }
                        },
                        "required": ["title", "count"]
                    }
                }
            }
        }))
    }
}

pub fn create_module(db: Database, borrow_limit: usize) -> Arc<dyn Module> {
    Arc::new(LibraryModule::new(db, borrow_limit))
}
