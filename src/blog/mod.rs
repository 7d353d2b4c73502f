//! Sample blog application.
//!
//! # Data Flow
//! ```text
//! install(builder)
//!     → entities(): Article (has many comments), Comment
//!     → forms():    ArticleForm, CommentForm
//!     → controller(): /articles routes → controller.rs handlers
//! ```
//!
//! Used by the `crud-server` binary and the integration tests.

pub mod controller;

use crate::entity::EntitySpec;
use crate::forms::{Field, FieldType, FormSpec, FormSpecBuilder};
use crate::lifecycle::ApplicationBuilder;
use crate::validation::{max_length, min_length, required};

pub const ARTICLE: &str = "Article";
pub const COMMENT: &str = "Comment";
pub const ARTICLE_FORM: &str = "ArticleForm";
pub const COMMENT_FORM: &str = "CommentForm";

pub fn entities() -> Vec<EntitySpec> {
    vec![
        EntitySpec::new(ARTICLE)
            .attributes(["title", "content", "created_at", "updated_at"])
            .has_many("comments", COMMENT, "article"),
        EntitySpec::new(COMMENT).attributes(["article", "body", "created_at"]),
    ]
}

pub fn forms() -> Vec<FormSpecBuilder> {
    vec![
        FormSpec::builder(ARTICLE_FORM)
            .field(Field::string("title").rules([required(), min_length(5)]))
            .field(Field::string("content").rule(required()))
            .field(Field::new("tags", FieldType::list(FieldType::Integer)).default(Vec::<i64>::new())),
        FormSpec::builder(COMMENT_FORM).field(Field::string("body").rules([required(), max_length(500)])),
    ]
}

/// Register the blog's entities, forms and controller.
pub fn install(builder: ApplicationBuilder) -> ApplicationBuilder {
    let builder = entities().into_iter().fold(builder, ApplicationBuilder::entity);
    let builder = forms().into_iter().fold(builder, ApplicationBuilder::form);
    builder.controller(controller::articles())
}
