//! End-to-end dispatch tests against the blog application, below the HTTP layer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crud_dispatch::config::ResolutionMode;
use crud_dispatch::dispatch::{
    Controller, DispatchError, HandlerError, InboundRequest, Param, Reply, ScalarType,
};
use crud_dispatch::entity::EntitySpec;
use crud_dispatch::forms::{Field, FormSpec};
use crud_dispatch::lifecycle::ApplicationBuilder;
use crud_dispatch::persistence::{EntityId, Persistence, PersistenceError};
use crud_dispatch::routing::Verb;
use crud_dispatch::validation::{min_length, required};

mod common;

use common::{blog_app, seeded_store};

#[tokio::test]
async fn test_show_loads_entity_without_relations() {
    let store = seeded_store();
    let app = blog_app(store.clone(), ResolutionMode::Sequential);

    let reply = app.handle(InboundRequest::new(Verb::Get, "/articles/7")).await.unwrap();
    assert_eq!(reply.status(), 200);
    assert_eq!(
        reply.body().unwrap(),
        &json!({"id": 7, "title": "Seventh article", "content": "seven"})
    );
    assert_eq!(store.finds(), 1);
    assert_eq!(store.queries(), 0);
}

#[tokio::test]
async fn test_short_title_fails_on_title_only() {
    let store = seeded_store();
    let app = blog_app(store.clone(), ResolutionMode::Sequential);

    let request = InboundRequest::new(Verb::Post, "/articles").payload(json!({"title": "Hi", "content": "world"}));
    match app.handle(request).await.unwrap_err() {
        DispatchError::ValidationFailed { form, result } => {
            assert_eq!(form, "ArticleForm");
            assert!(!result.valid);
            assert_eq!(result.errors.len(), 1);
            assert_eq!(result.field_errors("title"), ["must be at least 5 characters"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.saves(), 0);
}

#[tokio::test]
async fn test_missing_required_fields_all_reported() {
    let app = blog_app(seeded_store(), ResolutionMode::Sequential);

    let err = app
        .handle(InboundRequest::new(Verb::Post, "/articles"))
        .await
        .unwrap_err();
    let DispatchError::ValidationFailed { result, .. } = err else {
        panic!("expected validation failure");
    };
    assert_eq!(result.field_errors("title"), ["is required"]);
    assert_eq!(result.field_errors("content"), ["is required"]);
}

#[tokio::test]
async fn test_create_persists_and_returns_201() {
    let store = seeded_store();
    let app = blog_app(store.clone(), ResolutionMode::Sequential);

    let request = InboundRequest::new(Verb::Post, "/articles")
        .payload(json!({"title": "Hello world", "content": "body", "tags": ["1", 2]}));
    let reply = app.handle(request).await.unwrap();
    assert_eq!(reply.status(), 201);

    let body = reply.body().unwrap();
    assert_eq!(body["id"], json!(8));
    assert_eq!(body["title"], json!("Hello world"));
    // `tags` is a form field, not an Article attribute.
    assert!(body.get("tags").is_none());
    assert!(body["created_at"].is_i64());

    let stored = store.inner.find_by_id("Article", &EntityId::Int(8)).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_patch_missing_article_is_not_found() {
    let store = seeded_store();
    let app = blog_app(store.clone(), ResolutionMode::Sequential);

    let request = InboundRequest::new(Verb::Patch, "/articles/42").payload(json!({"title": "Hello world", "content": "x"}));
    let err = app.handle(request).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::EntityNotFound { ref entity, ref id } if entity == "Article" && id == "42"
    ));
    assert_eq!(err.status(), 404);
    assert_eq!(store.saves(), 0);
}

#[tokio::test]
async fn test_malformed_body_reported_at_form_stage() {
    for mode in [ResolutionMode::Sequential, ResolutionMode::Concurrent] {
        let store = seeded_store();
        let app = blog_app(store.clone(), mode);

        let request = InboundRequest::new(Verb::Patch, "/articles/42").raw_body("{not json");
        let err = app.handle(request).await.unwrap_err();
        assert!(matches!(err, DispatchError::EntityNotFound { .. }), "{mode:?}: {err:?}");

        let request = InboundRequest::new(Verb::Patch, "/articles/7").raw_body("{not json");
        let err = app.handle(request).await.unwrap_err();
        assert!(
            matches!(err, DispatchError::MalformedPayload { ref form, .. } if form == "ArticleForm"),
            "{mode:?}: {err:?}"
        );
        assert_eq!(err.status(), 400);

        let request = InboundRequest::new(Verb::Get, "/articles/7").raw_body("{not json");
        assert_eq!(app.handle(request).await.unwrap().status(), 200);
        assert_eq!(store.saves(), 0);
    }
}

#[tokio::test]
async fn test_patch_fills_and_saves() {
    let store = seeded_store();
    let app = blog_app(store.clone(), ResolutionMode::Sequential);

    let request = InboundRequest::new(Verb::Patch, "/articles/7")
        .payload(json!({"title": "Seventh, revised", "content": "new body"}));
    let reply = app.handle(request).await.unwrap();
    assert_eq!(reply.body().unwrap()["title"], json!("Seventh, revised"));

    let stored = store
        .inner
        .find_by_id("Article", &EntityId::Int(7))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.get("content"), Some(&json!("new body")));
    assert_eq!(store.saves(), 1);
}

#[tokio::test]
async fn test_delete_forwards_resolved_record() {
    let store = seeded_store();
    let app = blog_app(store.clone(), ResolutionMode::Sequential);

    let before = store
        .inner
        .find_by_id("Article", &EntityId::Int(3))
        .await
        .unwrap()
        .unwrap();

    let reply = app.handle(InboundRequest::new(Verb::Delete, "/articles/3")).await.unwrap();
    assert_eq!(reply, Reply::no_content());
    assert_eq!(store.deleted(), vec![before]);
    assert_eq!(store.inner.count("Article"), 1);
}

#[tokio::test]
async fn test_comments_relation_materialized_on_access() {
    let store = seeded_store();
    let app = blog_app(store.clone(), ResolutionMode::Sequential);

    let reply = app
        .handle(InboundRequest::new(Verb::Get, "/articles/7/comments"))
        .await
        .unwrap();
    let comments = reply.body().unwrap().as_array().unwrap().clone();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["body"], json!("First!"));
    assert_eq!(store.queries(), 1);
}

#[tokio::test]
async fn test_add_comment_links_article() {
    let store = seeded_store();
    let app = blog_app(store.clone(), ResolutionMode::Sequential);

    let request = InboundRequest::new(Verb::Post, "/articles/3/comments").payload(json!({"body": "Agreed"}));
    let reply = app.handle(request).await.unwrap();
    assert_eq!(reply.status(), 201);
    assert_eq!(reply.body().unwrap()["article"], json!(3));

    let listed = app
        .handle(InboundRequest::new(Verb::Get, "/articles/3/comments"))
        .await
        .unwrap();
    assert_eq!(listed.body().unwrap().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_identifier_and_unknown_route() {
    let store = seeded_store();
    let app = blog_app(store.clone(), ResolutionMode::Sequential);

    let err = app
        .handle(InboundRequest::new(Verb::Get, "/articles/seven"))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidParameter { ref token, .. } if token == "Article"));
    assert_eq!(err.status(), 400);
    assert_eq!(store.finds(), 0);

    let err = app
        .handle(InboundRequest::new(Verb::Put, "/articles/7"))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::RouteNotFound { .. }));
}

#[tokio::test]
async fn test_all_lists_articles_in_id_order() {
    let app = blog_app(seeded_store(), ResolutionMode::Sequential);
    let reply = app.handle(InboundRequest::new(Verb::Get, "/articles")).await.unwrap();
    let ids: Vec<_> = reply
        .body()
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(3), json!(7)]);
}

/// Two-parameter route that counts handler invocations.
fn counted_app(store: Arc<common::CountingStore>, mode: ResolutionMode, calls: Arc<AtomicUsize>) -> crud_dispatch::Application {
    let controller = Controller::new("NoteController", "notes").patch(
        ":Note/:Revision",
        "revise",
        vec![Param::entity("Note"), Param::primitive("Revision", ScalarType::Integer), Param::form("NoteForm")],
        move |_ctx, args| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                assert_eq!(args.len(), 3);
                let revision = args.primitive(1)?.as_i64().unwrap_or_default();
                Reply::ok(&json!({"revision": revision}))
            }
        },
    );

    ApplicationBuilder::new()
        .store(store)
        .resolution(mode)
        .entity(EntitySpec::new("Note").attribute("text"))
        .form(FormSpec::builder("NoteForm").field(Field::string("text").rules([required(), min_length(3)])))
        .controller(controller)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_first_declared_failure_wins_in_both_modes() {
    for mode in [ResolutionMode::Sequential, ResolutionMode::Concurrent] {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = seeded_store();
        let app = counted_app(store.clone(), mode, calls.clone());

        // Entity missing, revision malformed, form invalid: the entity error is reported.
        let request = InboundRequest::new(Verb::Patch, "/notes/1/abc").payload(json!({"text": "x"}));
        let err = app.handle(request).await.unwrap_err();
        assert!(matches!(err, DispatchError::EntityNotFound { .. }), "{mode:?}: {err:?}");

        // Entity present: the malformed revision is next in line.
        store.inner.insert(crud_dispatch::persistence::Record::new("Note").with_id(1_i64).set("text", "note")).unwrap();
        let request = InboundRequest::new(Verb::Patch, "/notes/1/abc").payload(json!({"text": "x"}));
        let err = app.handle(request).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidParameter { ref token, .. } if token == "Revision"), "{mode:?}");

        let request = InboundRequest::new(Verb::Patch, "/notes/1/2").payload(json!({"text": "x"}));
        let err = app.handle(request).await.unwrap_err();
        assert!(matches!(err, DispatchError::ValidationFailed { .. }), "{mode:?}");

        // Partial resolution never reached the handler.
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let request = InboundRequest::new(Verb::Patch, "/notes/1/2").payload(json!({"text": "xyz"}));
        let reply = app.handle(request).await.unwrap();
        assert_eq!(reply.body().unwrap(), &json!({"revision": 2}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_handler_faults_propagate_untouched() {
    let controller = Controller::new("FaultController", "faults")
        .get("conflict", "conflict", vec![], |_ctx, _args| async {
            Err(HandlerError::fault(409, "already exists"))
        })
        .get("storage", "storage", vec![], |_ctx, _args| async {
            Err(PersistenceError::Backend("disk full".into()).into())
        });
    let app = ApplicationBuilder::new().controller(controller).build().unwrap();

    let err = app
        .handle(InboundRequest::new(Verb::Get, "/faults/conflict"))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Handler(HandlerError::Fault { status: 409, .. })));
    assert_eq!(err.status(), 409);

    let err = app
        .handle(InboundRequest::new(Verb::Get, "/faults/storage"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Handler(HandlerError::Persistence(PersistenceError::Backend(ref m))) if m == "disk full"
    ));
    assert_eq!(err.status(), 500);
}

#[tokio::test]
async fn test_dropped_request_never_invokes_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let controller = Controller::new("SlowController", "slow").get(
        ":Slow",
        "show",
        vec![Param::entity("Slow")],
        move |_ctx, _args| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Reply::no_content())
            }
        },
    );

    #[derive(Debug)]
    struct SlowStore;

    #[async_trait::async_trait]
    impl Persistence for SlowStore {
        async fn find_by_id(
            &self,
            _: &str,
            _: &EntityId,
        ) -> crud_dispatch::persistence::PersistenceResult<Option<crud_dispatch::persistence::Record>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }
        async fn query_by_foreign_key(
            &self,
            _: &str,
            _: &str,
            _: &serde_json::Value,
        ) -> crud_dispatch::persistence::PersistenceResult<Vec<crud_dispatch::persistence::Record>> {
            Ok(Vec::new())
        }
        async fn list(&self, _: &str) -> crud_dispatch::persistence::PersistenceResult<Vec<crud_dispatch::persistence::Record>> {
            Ok(Vec::new())
        }
        async fn save(
            &self,
            record: crud_dispatch::persistence::Record,
        ) -> crud_dispatch::persistence::PersistenceResult<crud_dispatch::persistence::Record> {
            Ok(record)
        }
        async fn delete(&self, _: &crud_dispatch::persistence::Record) -> crud_dispatch::persistence::PersistenceResult<()> {
            Ok(())
        }
    }

    let app = ApplicationBuilder::new()
        .store(Arc::new(SlowStore))
        .entity(EntitySpec::new("Slow"))
        .controller(controller)
        .build()
        .unwrap();

    let result = tokio::time::timeout(
        Duration::from_millis(50),
        app.handle(InboundRequest::new(Verb::Get, "/slow/1")),
    )
    .await;
    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
