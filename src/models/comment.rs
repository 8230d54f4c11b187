use super::{DateTime, Markdown, Result, User, When};
use crate::dbopt::Connection;
use crate::route::Route;
use crate::schema::comments::{self, dsl as c};
use crate::schema::users;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: i32,
    pub text: String,
    pub post_id: i32,
    pub author_id: i32,
    pub created_at: DateTime,
}

impl Comment {
    pub async fn by_id(id: i32, db: &mut Connection) -> Result<Option<Comment>> {
        c::comments
            .select(Comment::as_select())
            .filter(c::id.eq(id))
            .first(db)
            .await
            .optional()
    }

    pub async fn create(
        post_id: i32,
        author_id: i32,
        text: &str,
        db: &mut Connection,
    ) -> Result<Comment> {
        diesel::insert_into(c::comments)
            .values((
                c::post_id.eq(post_id),
                c::author_id.eq(author_id),
                c::text.eq(text),
            ))
            .returning(Comment::as_returning())
            .get_result(db)
            .await
    }

    pub async fn set_text(
        id: i32,
        text: &str,
        db: &mut Connection,
    ) -> Result<Comment> {
        diesel::update(c::comments.filter(c::id.eq(id)))
            .set(c::text.eq(text))
            .returning(Comment::as_returning())
            .get_result(db)
            .await
    }

    pub async fn delete(id: i32, db: &mut Connection) -> Result<usize> {
        diesel::delete(c::comments.filter(c::id.eq(id)))
            .execute(db)
            .await
    }

    pub fn html_id(&self) -> String {
        format!("c{:x}", self.id)
    }
    pub fn body(&self) -> Markdown<'_> {
        Markdown(&self.text)
    }
    pub fn when(&self) -> When {
        When(self.created_at)
    }
    pub fn edit_url(&self) -> String {
        Route::CommentEdit {
            post_id: self.post_id,
            comment_id: self.id,
        }
        .url()
    }
    pub fn delete_url(&self) -> String {
        Route::CommentDelete {
            post_id: self.post_id,
            comment_id: self.id,
        }
        .url()
    }
}

/// A comment with its author, as shown below a post.
#[derive(Debug)]
pub struct CommentByUser {
    comment: Comment,
    pub author: User,
}

impl CommentByUser {
    /// All comments on a post, oldest first.
    pub async fn for_post(
        post_id: i32,
        db: &mut Connection,
    ) -> Result<Vec<CommentByUser>> {
        Ok(c::comments
            .inner_join(users::table)
            .select((Comment::as_select(), User::as_select()))
            .filter(c::post_id.eq(post_id))
            .order((c::created_at.asc(), c::id.asc()))
            .load::<(Comment, User)>(db)
            .await?
            .into_iter()
            .map(|(comment, author)| CommentByUser { comment, author })
            .collect())
    }
}

impl std::ops::Deref for CommentByUser {
    type Target = Comment;
    fn deref(&self) -> &Comment {
        &self.comment
    }
}

#[cfg(test)]
pub(crate) fn comment(id: i32, post_id: i32, author_id: i32) -> Comment {
    Comment {
        id,
        text: "A comment.".into(),
        post_id,
        author_id,
        created_at: chrono::Utc::now(),
    }
}
