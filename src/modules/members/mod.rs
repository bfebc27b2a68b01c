pub mod models;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use libris_db::Database;
use libris_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use service::MemberService;

pub struct MembersModule {
    service: MemberService,
}

impl MembersModule {
    pub fn new(db: Database) -> Self {
        Self {
            service: MemberService::new(db),
        }
    }
}

#[async_trait]
impl Module for MembersModule {
    fn name(&self) -> &'static str {
        "member"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "member module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/add", post(routes::add_member))
            .route("/{id}", get(routes::get_member))
            .route("/update/{id}", put(routes::update_member))
            .route("/delete/{id}", delete(routes::delete_member))
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
        let member = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Member" }
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
                    "schema": { "$ref": "#/components/schemas/MemberPayload" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/add": {
                    "post": {
                        "summary": "Register a new member",
                        "tags": ["Members"],
                        "requestBody": payload.clone(),
                        "responses": {
                            "201": member("Member created"),
                            "400": error("Invalid data")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a member and their borrowed books",
                        "tags": ["Members"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": member("Member found"),
                            "404": error("Member not found")
                        }
                    }
                },
                "/update/{id}": {
                    "put": {
                        "summary": "Rename a member",
                        "tags": ["Members"],
                        "parameters": [id_param.clone()],
                        "requestBody": payload.clone(),
                        "responses": {
                            "200": member("Member updated"),
                            "400": error("Invalid data"),
                            "404": error("Member not found")
                        }
                    }
                },
                "/delete/{id}": {
                    "delete": {
                        "summary": "Delete a member holding no books",
                        "tags": ["Members"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "204": { "description": "Member deleted" },
                            "404": error("Member not found"),
                            "409": error("Member still holds books")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Member": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "name": { "type": "string" },
                            "membership_date": { "type": "string", "format": "date-time" },
                            "books": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            }
                        },
                        "required": ["id", "name", "membership_date", "books"]
                    },
                    "MemberPayload": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string", "description": "Must not be blank" }
                        },
                        "required": ["name"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }
}

/// Members plus the borrowing relation, which the member side owns.
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_init",
            up: r#"
            CREATE TABLE IF NOT EXISTS members (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                membership_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS members_name_idx ON members (name);
            "#,
        },
        Migration {
            id: "002_borrowings",
            up: r#"
            CREATE TABLE IF NOT EXISTS borrowings (
                member_id INTEGER NOT NULL REFERENCES members (id),
                book_id   INTEGER NOT NULL REFERENCES books (id),
                PRIMARY KEY (member_id, book_id)
            );
            CREATE INDEX IF NOT EXISTS borrowings_book_idx ON borrowings (book_id);
            "#,
        },
    ]
}

pub fn create_module(db: Database) -> Arc<dyn Module> {
    Arc::new(MembersModule::new(db))
}
