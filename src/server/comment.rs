use super::forms::{CommentForm, ConfirmForm, Errors};
use super::{
    form, found, goh, render, templates, wrap, Req, Result, ViewError,
};
use crate::access::{may_change_comment, Decision, Identity};
use crate::dbopt::Connection;
use crate::models::{Comment, Post};
use crate::route::Route;
use tracing::{info, instrument};
use warp::filters::BoxedFilter;
use warp::path::{end, param, path};
use warp::reply::Response;
use warp::{Filter, Reply};

pub fn routes(s: BoxedFilter<(Req,)>) -> BoxedFilter<(impl Reply,)> {
    let create = param()
        .and(path("comment"))
        .and(end())
        .and(form())
        .and(s.clone())
        .then(create_comment);
    let edit = param().and(path("edit_comment")).and(param()).and(end());
    let edit = edit
        .clone()
        .and(goh())
        .and(s.clone())
        .then(edit_form)
        .or(edit.and(form()).and(s.clone()).then(edit_comment))
        .unify();
    let delete = param().and(path("delete_comment")).and(param()).and(end());
    let delete = delete
        .clone()
        .and(goh())
        .and(s.clone())
        .then(delete_form)
        .or(delete.and(form()).and(s).then(delete_comment))
        .unify();
    create.or(edit).unify().or(delete).unify().map(wrap).boxed()
}

#[instrument(skip(form))]
async fn create_comment(
    post_id: i32,
    form: CommentForm,
    req: Req,
) -> Result<Response> {
    let mut db = req.db().await?;
    let me = req.identity(&mut db).await?;
    let user = me.require_user(Route::PostDetail { id: post_id })?;
    req.verify_csrf(&form.csrftoken)?;
    let post = Post::by_id(post_id, &mut db)
        .await?
        .ok_or(ViewError::NotFound)?;
    match form.validate() {
        Ok(text) => {
            let comment =
                Comment::create(post.id, user.id, text, &mut db).await?;
            info!(
                "{} wrote comment #{} on post #{}",
                user.username, comment.id, post.id,
            );
            Ok(found(&post.url()).into_response())
        }
        Err(errors) => {
            let ctx = req.ctx(me)?;
            let (action, back) = (post.comment_url(), post.url());
            render(&ctx, |o| {
                templates::comment_form_html(
                    o, &ctx, &action, &back, &form, &errors,
                )
            })
        }
    }
}

/// Load a comment for changing it, if `me` may.
///
/// The comment must be on the post named in the url.
async fn comment_to_change(
    post_id: i32,
    comment_id: i32,
    wanted: Route,
    req: &Req,
    db: &mut Connection,
) -> Result<(Identity, Decision<Comment>)> {
    let me = req.identity(db).await?;
    me.require_user(wanted)?;
    let comment = Comment::by_id(comment_id, db)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or(ViewError::NotFound)?;
    let decision = may_change_comment(&me, comment);
    Ok((me, decision))
}

#[instrument]
async fn edit_form(
    post_id: i32,
    comment_id: i32,
    req: Req,
) -> Result<Response> {
    let mut db = req.db().await?;
    let wanted = Route::CommentEdit {
        post_id,
        comment_id,
    };
    let (me, decision) =
        comment_to_change(post_id, comment_id, wanted, &req, &mut db).await?;
    let comment = match decision {
        Decision::Allow(comment) => comment,
        Decision::Deny(to) => return Ok(found(&to.url()).into_response()),
    };
    let ctx = req.ctx(me)?;
    let form = CommentForm::with_text(&comment.text);
    let (action, back) = (comment.edit_url(), post_url(&comment));
    render(&ctx, |o| {
        templates::comment_form_html(
            o,
            &ctx,
            &action,
            &back,
            &form,
            &Errors::new(),
        )
    })
}

#[instrument(skip(form))]
async fn edit_comment(
    post_id: i32,
    comment_id: i32,
    form: CommentForm,
    req: Req,
) -> Result<Response> {
    let mut db = req.db().await?;
    let wanted = Route::CommentEdit {
        post_id,
        comment_id,
    };
    let (me, decision) =
        comment_to_change(post_id, comment_id, wanted, &req, &mut db).await?;
    let comment = match decision {
        Decision::Allow(comment) => comment,
        Decision::Deny(to) => return Ok(found(&to.url()).into_response()),
    };
    req.verify_csrf(&form.csrftoken)?;
    match form.validate() {
        Ok(text) => {
            Comment::set_text(comment.id, text, &mut db).await?;
            info!("Comment #{} updated", comment.id);
            Ok(found(&post_url(&comment)).into_response())
        }
        Err(errors) => {
            let ctx = req.ctx(me)?;
            let (action, back) = (comment.edit_url(), post_url(&comment));
            render(&ctx, |o| {
                templates::comment_form_html(
                    o, &ctx, &action, &back, &form, &errors,
                )
            })
        }
    }
}

#[instrument]
async fn delete_form(
    post_id: i32,
    comment_id: i32,
    req: Req,
) -> Result<Response> {
    let mut db = req.db().await?;
    let wanted = Route::CommentDelete {
        post_id,
        comment_id,
    };
    let (me, decision) =
        comment_to_change(post_id, comment_id, wanted, &req, &mut db).await?;
    let comment = match decision {
        Decision::Allow(comment) => comment,
        Decision::Deny(to) => return Ok(found(&to.url()).into_response()),
    };
    let ctx = req.ctx(me)?;
    render(&ctx, |o| templates::comment_delete_html(o, &ctx, &comment))
}

#[instrument(skip(form))]
async fn delete_comment(
    post_id: i32,
    comment_id: i32,
    form: ConfirmForm,
    req: Req,
) -> Result<Response> {
    let mut db = req.db().await?;
    let wanted = Route::CommentDelete {
        post_id,
        comment_id,
    };
    let (_, decision) =
        comment_to_change(post_id, comment_id, wanted, &req, &mut db).await?;
    let comment = match decision {
        Decision::Allow(comment) => comment,
        Decision::Deny(to) => return Ok(found(&to.url()).into_response()),
    };
    req.verify_csrf(&form.csrftoken)?;
    Comment::delete(comment.id, &mut db).await?;
    info!("Comment #{} deleted", comment.id);
    Ok(found(&post_url(&comment)).into_response())
}

fn post_url(comment: &Comment) -> String {
    Route::PostDetail {
        id: comment.post_id,
    }
    .url()
}

#[cfg(test)]
mod test {
    use super::super::{routes, AppData};
    use crate::models::Comment;
    use crate::testdb::{self, TestDb};
    use chrono::{Duration, Utc};
    use url::form_urlencoded::Serializer;
    use warp::http::header::LOCATION;
    use warp::http::StatusCode;

    fn comment_body(token: &str, text: &str) -> String {
        Serializer::new(String::new())
            .append_pair("csrftoken", token)
            .append_pair("text", text)
            .finish()
    }

    #[tokio::test]
    async fn only_author_changes_comment() {
        let Some(testdb) = TestDb::create() else { return };
        let mut db = testdb.db().await;
        let leo = testdb::user("leo", &mut db).await;
        let ann = testdb::user("ann", &mut db).await;
        let travel = testdb::category("travel", true, &mut db).await;
        let yesterday = Utc::now() - Duration::days(1);
        let post =
            testdb::post("Trip", leo.id, Some(travel), yesterday, true, &mut db)
                .await;
        let comment = Comment::create(post.id, leo.id, "Nice trip!", &mut db)
            .await
            .unwrap();
        let app = AppData::for_test(testdb.pool());
        let blog = routes(app.clone());

        let (cookie, token) = app.browser(ann.id);
        let response = warp::test::request()
            .method("POST")
            .path(&comment.edit_url())
            .header("cookie", &cookie)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(comment_body(&token, "Boring."))
            .reply(&blog)
            .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], post.url().as_str());
        let kept = Comment::by_id(comment.id, &mut db).await.unwrap();
        assert_eq!(kept.unwrap().text, "Nice trip!");

        let response = warp::test::request()
            .method("POST")
            .path(&comment.delete_url())
            .header("cookie", &cookie)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(comment_body(&token, ""))
            .reply(&blog)
            .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(Comment::by_id(comment.id, &mut db).await.unwrap().is_some());

        let (cookie, token) = app.browser(leo.id);
        let response = warp::test::request()
            .method("POST")
            .path(&comment.edit_url())
            .header("cookie", &cookie)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(comment_body(&token, "Nice trip, again!"))
            .reply(&blog)
            .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], post.url().as_str());
        let edited = Comment::by_id(comment.id, &mut db).await.unwrap();
        assert_eq!(edited.unwrap().text, "Nice trip, again!");
    }

    #[tokio::test]
    async fn comment_on_other_post_is_not_found() {
        let Some(testdb) = TestDb::create() else { return };
        let mut db = testdb.db().await;
        let leo = testdb::user("leo", &mut db).await;
        let travel = testdb::category("travel", true, &mut db).await;
        let yesterday = Utc::now() - Duration::days(1);
        let one =
            testdb::post("One", leo.id, Some(travel), yesterday, true, &mut db)
                .await;
        let two =
            testdb::post("Two", leo.id, Some(travel), yesterday, true, &mut db)
                .await;
        let comment = Comment::create(one.id, leo.id, "On one.", &mut db)
            .await
            .unwrap();
        let app = AppData::for_test(testdb.pool());

        let (cookie, _) = app.browser(leo.id);
        let response = warp::test::request()
            .path(&format!("/posts/{}/edit_comment/{}", two.id, comment.id))
            .header("cookie", &cookie)
            .reply(&routes(app))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
