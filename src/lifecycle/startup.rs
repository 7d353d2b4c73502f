//! Application bootstrap.
//!
//! # Responsibilities
//! - Collect rule, entity, form and controller declarations
//! - Validate them and freeze the immutable tables
//! - Wire the dispatcher to the persistence backend
//!
//! # Design Decisions
//! - Fail fast: any configuration fault is fatal and the application never starts
//! - Declarations are checked in dependency order: rules, entities, forms, routes
//! - Builder methods never fail; the first recorded fault is returned by `build`

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ResolutionMode;
use crate::dispatch::{Controller, DispatchError, Dispatcher, InboundRequest, Param, Reply};
use crate::entity::{CatalogError, EntityCatalog, EntitySpec};
use crate::forms::{FormError, FormSpec, FormSpecBuilder};
use crate::persistence::{InMemoryStore, Persistence};
use crate::routing::{ParamSpec, PathPattern, RouteError, RouteSpec, RouteTable};
use crate::validation::{Rule, RuleEngine, RuleError};

/// Startup-time configuration faults.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("form '{0}' is declared twice")]
    DuplicateForm(String),

    #[error("route {route} uses unknown form '{form}'")]
    UnknownForm { route: String, form: String },

    #[error("route {route} uses unknown entity '{entity}'")]
    UnknownEntity { route: String, entity: String },
}

/// Collects declarations and produces an `Application`.
pub struct ApplicationBuilder {
    engine: RuleEngine,
    entities: Vec<EntitySpec>,
    forms: Vec<FormSpecBuilder>,
    controllers: Vec<Controller>,
    store: Option<Arc<dyn Persistence>>,
    mode: ResolutionMode,
    deferred: Option<BootstrapError>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    /// Start with the built-in validation rules registered.
    pub fn new() -> Self {
        Self {
            engine: RuleEngine::with_builtins(),
            entities: Vec::new(),
            forms: Vec::new(),
            controllers: Vec::new(),
            store: None,
            mode: ResolutionMode::default(),
            deferred: None,
        }
    }

    fn defer(&mut self, err: impl Into<BootstrapError>) {
        if self.deferred.is_none() {
            self.deferred = Some(err.into());
        }
    }

    /// Register a custom validation rule.
    pub fn rule(mut self, rule: impl Rule + 'static) -> Self {
        if let Err(e) = self.engine.register(rule) {
            self.defer(e);
        }
        self
    }

    pub fn entity(mut self, spec: EntitySpec) -> Self {
        self.entities.push(spec);
        self
    }

    pub fn form(mut self, form: FormSpecBuilder) -> Self {
        self.forms.push(form);
        self
    }

    pub fn controller(mut self, controller: Controller) -> Self {
        self.controllers.push(controller);
        self
    }

    /// Persistence backend. Defaults to an empty `InMemoryStore`.
    pub fn store(mut self, store: Arc<dyn Persistence>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn resolution(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn build(self) -> Result<Application, BootstrapError> {
        if let Some(err) = self.deferred {
            return Err(err);
        }

        let catalog = Arc::new(EntityCatalog::build(self.entities)?);

        let mut forms: HashMap<String, Arc<FormSpec>> = HashMap::new();
        for builder in self.forms {
            let name = builder.name().to_string();
            if forms.contains_key(&name) {
                return Err(BootstrapError::DuplicateForm(name));
            }
            forms.insert(name, Arc::new(builder.build(&self.engine)?));
        }

        let mut table = RouteTable::new();
        for controller in &self.controllers {
            for decl in controller.routes() {
                let name = format!("{}.{}", controller.name(), decl.method);
                let raw = PathPattern::join(controller.base(), &decl.sub_path);
                let pattern = PathPattern::parse(&raw).map_err(|reason| RouteError::InvalidPattern {
                    pattern: raw.clone(),
                    reason,
                })?;

                let params = decl
                    .params
                    .iter()
                    .map(|param| resolve_param(param, &name, &catalog, &forms))
                    .collect::<Result<Vec<_>, _>>()?;

                table.register(RouteSpec {
                    verb: decl.verb,
                    pattern,
                    name,
                    params,
                    handler: decl.handler.clone(),
                })?;
            }
        }

        let table = Arc::new(table);
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()));

        tracing::info!(
            routes = table.len(),
            entities = catalog.names().count(),
            forms = forms.len(),
            resolution = ?self.mode,
            "Application bootstrapped"
        );

        Ok(Application {
            dispatcher: Dispatcher::new(table.clone(), catalog.clone(), store.clone(), self.mode),
            table,
            catalog,
            forms,
            store,
        })
    }
}

fn resolve_param(
    param: &Param,
    route: &str,
    catalog: &EntityCatalog,
    forms: &HashMap<String, Arc<FormSpec>>,
) -> Result<ParamSpec, BootstrapError> {
    match param {
        Param::Primitive { token, ty } => Ok(ParamSpec::Primitive {
            token: token.clone(),
            ty: *ty,
        }),
        Param::Form { form } => forms
            .get(form)
            .map(|spec| ParamSpec::Form { form: spec.clone() })
            .ok_or_else(|| BootstrapError::UnknownForm {
                route: route.to_string(),
                form: form.clone(),
            }),
        Param::Entity { token, entity } => catalog
            .get(entity)
            .map(|spec| ParamSpec::Entity {
                token: token.clone(),
                entity: spec.clone(),
            })
            .ok_or_else(|| BootstrapError::UnknownEntity {
                route: route.to_string(),
                entity: entity.clone(),
            }),
    }
}

/// A bootstrapped application: frozen tables plus its dispatcher.
#[derive(Debug, Clone)]
pub struct Application {
    dispatcher: Dispatcher,
    table: Arc<RouteTable>,
    catalog: Arc<EntityCatalog>,
    forms: HashMap<String, Arc<FormSpec>>,
    store: Arc<dyn Persistence>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub async fn handle(&self, request: InboundRequest) -> Result<Reply, DispatchError> {
        self.dispatcher.handle(request).await
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn catalog(&self) -> &Arc<EntityCatalog> {
        &self.catalog
    }

    pub fn form(&self, name: &str) -> Option<&Arc<FormSpec>> {
        self.forms.get(name)
    }

    pub fn store(&self) -> &Arc<dyn Persistence> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ScalarType;
    use crate::forms::Field;
    use crate::validation::{self, rules::Required};

    fn noop(controller: Controller, path: &str, params: Vec<Param>) -> Controller {
        controller.get(path, "noop", params, |_ctx, _args| async { Ok(Reply::no_content()) })
    }

    #[test]
    fn test_build_minimal_application() {
        let app = ApplicationBuilder::new()
            .entity(EntitySpec::new("Article").attribute("title"))
            .form(FormSpec::builder("ArticleForm").field(Field::string("title").rule(validation::required())))
            .controller(noop(
                Controller::new("ArticleController", "articles"),
                ":Article",
                vec![Param::entity("Article")],
            ))
            .build()
            .unwrap();

        assert_eq!(app.table().len(), 1);
        assert!(app.form("ArticleForm").is_some());
        let route = &app.table().routes()[0];
        assert_eq!(route.name, "ArticleController.noop");
        assert_eq!(route.pattern.to_string(), "/articles/:Article");
    }

    #[test]
    fn test_unknown_rule_aborts_startup() {
        let err = ApplicationBuilder::new()
            .form(FormSpec::builder("F").field(Field::string("x").rule(validation::RuleRef::new("Shiny"))))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Form(FormError::Rule { source: RuleError::UnknownRule(ref n), .. }) if n == "Shiny"
        ));
    }

    #[test]
    fn test_duplicate_rule_registration() {
        let err = ApplicationBuilder::new().rule(Required).build().unwrap_err();
        assert!(matches!(err, BootstrapError::Rule(RuleError::DuplicateRule(_))));
    }

    #[test]
    fn test_duplicate_route_aborts_startup() {
        let controller = Controller::new("A", "articles");
        let controller = noop(controller, ":Id", vec![]);
        let controller = noop(controller, "{Other}", vec![]);
        let err = ApplicationBuilder::new().controller(controller).build().unwrap_err();
        assert!(matches!(err, BootstrapError::Route(RouteError::DuplicateRoute { .. })));
    }

    #[test]
    fn test_entity_param_must_name_pattern_token() {
        let controller = noop(
            Controller::new("A", "articles"),
            ":Id",
            vec![Param::entity("Article")],
        );
        let err = ApplicationBuilder::new()
            .entity(EntitySpec::new("Article"))
            .controller(controller)
            .build()
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Route(RouteError::UnboundToken { ref token, .. }) if token == "Article"));
    }

    #[test]
    fn test_unknown_form_and_entity() {
        let err = ApplicationBuilder::new()
            .controller(noop(Controller::new("A", "a"), "", vec![Param::form("Missing")]))
            .build()
            .unwrap_err();
        assert!(matches!(err, BootstrapError::UnknownForm { ref form, .. } if form == "Missing"));

        let err = ApplicationBuilder::new()
            .controller(noop(Controller::new("A", "a"), ":User", vec![Param::entity("User")]))
            .build()
            .unwrap_err();
        assert!(matches!(err, BootstrapError::UnknownEntity { ref entity, .. } if entity == "User"));
    }

    #[test]
    fn test_invalid_pattern_and_duplicate_form() {
        let err = ApplicationBuilder::new()
            .controller(noop(Controller::new("A", "a"), "{Open", vec![]))
            .build()
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Route(RouteError::InvalidPattern { .. })));

        let err = ApplicationBuilder::new()
            .form(FormSpec::builder("F"))
            .form(FormSpec::builder("F"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BootstrapError::DuplicateForm(ref n) if n == "F"));
    }

    #[test]
    fn test_primitive_params_pass_through() {
        let app = ApplicationBuilder::new()
            .controller(noop(
                Controller::new("P", "pages"),
                ":Page",
                vec![Param::primitive("Page", ScalarType::Integer)],
            ))
            .build()
            .unwrap();
        let route = &app.table().routes()[0];
        assert!(matches!(&route.params[0], ParamSpec::Primitive { ty: ScalarType::Integer, .. }));
    }
}
