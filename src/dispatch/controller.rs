//! Declarative controller registration.
//!
//! A controller names a base path and lists its handler methods, each with a
//! verb, an optional sub-path and its parameters in handler order. Nothing is
//! resolved here; `ApplicationBuilder` turns declarations into `RouteSpec`s.
//!
//! ```ignore
//! Controller::new("ArticleController", "articles")
//!     .get(":Article", "show", vec![Param::entity("Article")], show)
//!     .post("", "add", vec![Param::form("ArticleForm")], add);
//! ```

use std::future::Future;

use crate::dispatch::args::{Args, ScalarType};
use crate::dispatch::handler::{handler, Handler, HandlerContext, HandlerResult};
use crate::routing::Verb;

/// Unresolved handler parameter, referring to specs by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Primitive { token: String, ty: ScalarType },
    Form { form: String },
    Entity { token: String, entity: String },
}

impl Param {
    pub fn primitive(token: impl Into<String>, ty: ScalarType) -> Self {
        Param::Primitive {
            token: token.into(),
            ty,
        }
    }

    pub fn form(form: impl Into<String>) -> Self {
        Param::Form { form: form.into() }
    }

    /// Entity addressed by the token of the same name (`/:Article` → `Article`).
    pub fn entity(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Param::Entity {
            token: entity.clone(),
            entity,
        }
    }

    /// Entity addressed by a differently named token.
    pub fn entity_at(token: impl Into<String>, entity: impl Into<String>) -> Self {
        Param::Entity {
            token: token.into(),
            entity: entity.into(),
        }
    }
}

/// One declared handler method.
#[derive(Clone)]
pub struct RouteDecl {
    pub verb: Verb,
    pub sub_path: String,
    pub method: String,
    pub params: Vec<Param>,
    pub handler: Handler,
}

impl std::fmt::Debug for RouteDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDecl")
            .field("verb", &self.verb)
            .field("sub_path", &self.sub_path)
            .field("method", &self.method)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A base path plus its handler methods.
#[derive(Debug, Clone)]
pub struct Controller {
    name: String,
    base: String,
    routes: Vec<RouteDecl>,
}

impl Controller {
    pub fn new(name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
            routes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn routes(&self) -> &[RouteDecl] {
        &self.routes
    }

    pub fn route<F, Fut>(
        mut self,
        verb: Verb,
        sub_path: impl Into<String>,
        method: impl Into<String>,
        params: Vec<Param>,
        f: F,
    ) -> Self
    where
        F: Fn(HandlerContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.routes.push(RouteDecl {
            verb,
            sub_path: sub_path.into(),
            method: method.into(),
            params,
            handler: handler(f),
        });
        self
    }

    pub fn get<F, Fut>(self, sub_path: &str, method: &str, params: Vec<Param>, f: F) -> Self
    where
        F: Fn(HandlerContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Verb::Get, sub_path, method, params, f)
    }

    pub fn post<F, Fut>(self, sub_path: &str, method: &str, params: Vec<Param>, f: F) -> Self
    where
        F: Fn(HandlerContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Verb::Post, sub_path, method, params, f)
    }

    pub fn patch<F, Fut>(self, sub_path: &str, method: &str, params: Vec<Param>, f: F) -> Self
    where
        F: Fn(HandlerContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Verb::Patch, sub_path, method, params, f)
    }

    pub fn put<F, Fut>(self, sub_path: &str, method: &str, params: Vec<Param>, f: F) -> Self
    where
        F: Fn(HandlerContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Verb::Put, sub_path, method, params, f)
    }

    pub fn delete<F, Fut>(self, sub_path: &str, method: &str, params: Vec<Param>, f: F) -> Self
    where
        F: Fn(HandlerContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Verb::Delete, sub_path, method, params, f)
    }
}
