//! `ArticleController`: CRUD over articles and their comments.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::blog::{ARTICLE, ARTICLE_FORM, COMMENT, COMMENT_FORM};
use crate::dispatch::{Args, Controller, HandlerContext, HandlerError, HandlerResult, Param, Reply};
use crate::persistence::EntityId;

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

pub fn articles() -> Controller {
    Controller::new("ArticleController", "articles")
        .get("", "all", vec![], all)
        .get(":Article", "show", vec![Param::entity(ARTICLE)], show)
        .post("", "add", vec![Param::form(ARTICLE_FORM)], add)
        .patch(
            ":Article",
            "update",
            vec![Param::entity(ARTICLE), Param::form(ARTICLE_FORM)],
            update,
        )
        .delete(":Article", "delete", vec![Param::entity(ARTICLE)], delete)
        .get("{Article}/comments", "comments", vec![Param::entity(ARTICLE)], comments)
        .post(
            "{Article}/comments",
            "add_comment",
            vec![Param::entity(ARTICLE), Param::form(COMMENT_FORM)],
            add_comment,
        )
}

async fn all(ctx: HandlerContext, _args: Args) -> HandlerResult {
    let articles = ctx.repository(ARTICLE)?.all().await?;
    Reply::ok(&articles)
}

async fn show(_ctx: HandlerContext, args: Args) -> HandlerResult {
    Reply::ok(args.entity(0)?)
}

async fn add(ctx: HandlerContext, args: Args) -> HandlerResult {
    let form = args.form(0)?;
    let mut article = ctx.repository(ARTICLE)?.build();
    let stamp = now();
    article
        .fill(form)
        .set("created_at", stamp)?
        .set("updated_at", stamp)?;
    article.save().await?;
    tracing::info!(request_id = %ctx.request_id(), id = ?article.id(), "Article created");
    Reply::created(&article)
}

async fn update(_ctx: HandlerContext, mut args: Args) -> HandlerResult {
    let form = args.take_form(1)?;
    let article = args.entity_mut(0)?;
    article.fill(&form).set("updated_at", now())?;
    article.save().await?;
    Reply::ok(&*article)
}

async fn delete(ctx: HandlerContext, mut args: Args) -> HandlerResult {
    let article = args.take_entity(0)?;
    let id = article.id().map(ToString::to_string);
    article.delete().await?;
    tracing::info!(request_id = %ctx.request_id(), id = ?id, "Article deleted");
    Ok(Reply::no_content())
}

async fn comments(_ctx: HandlerContext, args: Args) -> HandlerResult {
    let comments = args.entity(0)?.related("comments").await?;
    Reply::ok(&comments)
}

async fn add_comment(ctx: HandlerContext, args: Args) -> HandlerResult {
    let article_id = args
        .entity(0)?
        .id()
        .map(EntityId::to_value)
        .ok_or_else(|| HandlerError::fault(409, "article has not been saved"))?;
    let form = args.form(1)?;

    let mut comment = ctx.repository(COMMENT)?.build();
    comment
        .fill(form)
        .set("article", article_id)?
        .set("created_at", now())?;
    comment.save().await?;
    Reply::created(&comment)
}
