//! Request → handler pipeline.
//!
//! # Responsibilities
//! - Match the request against the route table
//! - Resolve every declared parameter before the handler runs
//! - Invoke the handler and pass its result (or fault) upward
//!
//! # Design Decisions
//! - The pipeline performs no writes; only handler bodies mutate state
//! - Arguments reach the handler in declared order whatever the resolution mode
//! - With several failing parameters, the first-declared failure is reported

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tracing::Instrument;

use crate::config::ResolutionMode;
use crate::dispatch::args::{Arg, Args};
use crate::dispatch::handler::HandlerContext;
use crate::dispatch::reply::Reply;
use crate::dispatch::{DispatchError, InboundRequest, Payload};
use crate::entity::{EntityCatalog, EntityResolver, ResolveError};
use crate::forms::bind;
use crate::observability::metrics;
use crate::persistence::Persistence;
use crate::routing::{ParamSpec, RouteMatch, RouteTable};

/// Routes requests to handlers with fully resolved arguments.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
    catalog: Arc<EntityCatalog>,
    store: Arc<dyn Persistence>,
    resolver: EntityResolver,
    mode: ResolutionMode,
}

impl Dispatcher {
    pub fn new(
        table: Arc<RouteTable>,
        catalog: Arc<EntityCatalog>,
        store: Arc<dyn Persistence>,
        mode: ResolutionMode,
    ) -> Self {
        let resolver = EntityResolver::new(catalog.clone(), store.clone());
        Self {
            table,
            catalog,
            store,
            resolver,
            mode,
        }
    }

    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: InboundRequest) -> Result<Reply, DispatchError> {
        let start = Instant::now();

        let matched = match self.table.match_route(request.verb, &request.path) {
            Some(m) => m,
            None => {
                tracing::debug!(
                    request_id = %request.request_id,
                    verb = %request.verb,
                    path = %request.path,
                    "No route matched"
                );
                metrics::record_dispatch("unmatched", 404, start);
                return Err(DispatchError::RouteNotFound {
                    verb: request.verb.to_string(),
                    path: request.path,
                });
            }
        };

        let route = matched.route.clone();
        let span = tracing::info_span!(
            "dispatch",
            request_id = %request.request_id,
            route = %route.name,
            verb = %route.verb
        );

        let result = async {
            let args = self.resolve_all(&matched, &request.payload).await?;
            tracing::debug!(args = args.len(), "Parameters resolved, invoking handler");

            let ctx = HandlerContext::new(
                self.catalog.clone(),
                self.store.clone(),
                request.request_id.clone(),
            );
            (route.handler)(ctx, args).await.map_err(DispatchError::from)
        }
        .instrument(span)
        .await;

        let status = match &result {
            Ok(reply) => reply.status(),
            Err(err) => err.status(),
        };
        metrics::record_dispatch(&route.name, status, start);
        result
    }

    async fn resolve_all(&self, matched: &RouteMatch, payload: &Payload) -> Result<Args, DispatchError> {
        let params = &matched.route.params;
        let args = match self.mode {
            ResolutionMode::Sequential => {
                let mut args = Vec::with_capacity(params.len());
                for param in params {
                    args.push(self.resolve_one(param, matched, payload).await?);
                }
                args
            }
            ResolutionMode::Concurrent => {
                // Collecting in declared order surfaces the first-declared error.
                join_all(params.iter().map(|p| self.resolve_one(p, matched, payload)))
                    .await
                    .into_iter()
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(Args::new(args))
    }

    async fn resolve_one(
        &self,
        param: &ParamSpec,
        matched: &RouteMatch,
        payload: &Payload,
    ) -> Result<Arg, DispatchError> {
        match param {
            ParamSpec::Primitive { token, ty } => {
                let raw = binding(matched, token);
                let parsed = ty.parse(raw).ok_or_else(|| DispatchError::InvalidParameter {
                    token: token.clone(),
                    value: raw.to_string(),
                    expected: ty.to_string(),
                });
                metrics::record_resolution("primitive", outcome(&parsed));
                Ok(Arg::Primitive(parsed?))
            }
            ParamSpec::Form { form } => {
                let payload = match payload.decode() {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::debug!(form = %form.name(), error = %e, "Payload is not valid JSON");
                        metrics::record_resolution("form", "malformed");
                        return Err(DispatchError::MalformedPayload {
                            form: form.name().to_string(),
                            reason: e.to_string(),
                        });
                    }
                };
                let (instance, result) = bind(form, &payload);
                if result.valid {
                    metrics::record_resolution("form", "ok");
                    Ok(Arg::Form(instance))
                } else {
                    tracing::debug!(form = %form.name(), errors = result.errors.len(), "Form validation failed");
                    metrics::record_resolution("form", "invalid");
                    Err(DispatchError::ValidationFailed {
                        form: form.name().to_string(),
                        result,
                    })
                }
            }
            ParamSpec::Entity { token, entity } => {
                let raw = binding(matched, token);
                let resolved = self.resolver.resolve(entity, raw).await.map_err(|e| match e {
                    ResolveError::InvalidIdentifier { raw, expected, .. } => {
                        DispatchError::InvalidParameter {
                            token: token.clone(),
                            value: raw,
                            expected,
                        }
                    }
                    ResolveError::NotFound { entity, id } => DispatchError::EntityNotFound { entity, id },
                    ResolveError::Persistence(e) => DispatchError::Persistence(e),
                });
                metrics::record_resolution("entity", outcome(&resolved));
                Ok(Arg::Entity(resolved?))
            }
        }
    }
}

/// Registration guarantees every parameter token is bound by a match.
fn binding<'a>(matched: &'a RouteMatch, token: &str) -> &'a str {
    matched.binding(token).unwrap_or_default()
}

fn outcome<T>(result: &Result<T, DispatchError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(DispatchError::EntityNotFound { .. }) => "not_found",
        Err(DispatchError::InvalidParameter { .. }) => "invalid",
        Err(_) => "error",
    }
}
