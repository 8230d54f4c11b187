use super::{DateTime, Markdown, Result, When};
use crate::dbopt::Connection;
use crate::route::Route;
use crate::schema::posts::{self, dsl as p};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = posts)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime,
    pub author_id: i32,
    pub location_id: Option<i32>,
    pub category_id: Option<i32>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime,
}

/// The writable fields of a post.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = posts, treat_none_as_null = true)]
pub struct PostData<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub pub_date: DateTime,
    pub author_id: i32,
    pub location_id: Option<i32>,
    pub category_id: Option<i32>,
    pub image: Option<&'a str>,
    pub is_published: bool,
}

impl Post {
    pub async fn by_id(id: i32, db: &mut Connection) -> Result<Option<Post>> {
        p::posts
            .select(Post::as_select())
            .filter(p::id.eq(id))
            .first(db)
            .await
            .optional()
    }

    pub async fn create(data: &PostData<'_>, db: &mut Connection) -> Result<Post> {
        diesel::insert_into(p::posts)
            .values(data)
            .returning(Post::as_returning())
            .get_result(db)
            .await
    }

    pub async fn update(
        id: i32,
        data: &PostData<'_>,
        db: &mut Connection,
    ) -> Result<Post> {
        diesel::update(p::posts.filter(p::id.eq(id)))
            .set(data)
            .returning(Post::as_returning())
            .get_result(db)
            .await
    }

    /// Delete a post.
    ///
    /// Comments on the post are removed by the `ON DELETE CASCADE`
    /// foreign key.
    pub async fn delete(id: i32, db: &mut Connection) -> Result<usize> {
        diesel::delete(p::posts.filter(p::id.eq(id)))
            .execute(db)
            .await
    }

    pub fn body(&self) -> Markdown<'_> {
        Markdown(&self.text)
    }
    pub fn when(&self) -> When {
        When(self.pub_date)
    }

    pub fn url(&self) -> String {
        Route::PostDetail { id: self.id }.url()
    }
    pub fn edit_url(&self) -> String {
        Route::PostEdit { post_id: self.id }.url()
    }
    pub fn delete_url(&self) -> String {
        Route::PostDelete { post_id: self.id }.url()
    }
    pub fn comment_url(&self) -> String {
        Route::CommentCreate { post_id: self.id }.url()
    }
}

#[cfg(test)]
pub(crate) fn post(id: i32, author_id: i32, pub_date: DateTime) -> Post {
    Post {
        id,
        title: format!("Post {id}"),
        text: "Some text.".into(),
        pub_date,
        author_id,
        location_id: None,
        category_id: Some(1),
        image: None,
        is_published: true,
        created_at: pub_date,
    }
}

#[cfg(test)]
mod test {
    use super::Post;
    use crate::models::{Comment, CommentByUser};
    use crate::testdb::{self, TestDb};
    use chrono::Utc;

    #[tokio::test]
    async fn delete_removes_comments() {
        let Some(testdb) = TestDb::create() else { return };
        let mut db = testdb.db().await;
        let leo = testdb::user("leo", &mut db).await;
        let ann = testdb::user("ann", &mut db).await;
        let db = &mut db;
        let now = Utc::now();
        let post = testdb::post("Trip", leo.id, None, now, true, db).await;
        let kept = testdb::post("Other", leo.id, None, now, true, db).await;
        let gone = Comment::create(post.id, ann.id, "Nice!", db).await;
        let gone = gone.unwrap();
        Comment::create(post.id, leo.id, "Thanks.", db).await.unwrap();
        Comment::create(kept.id, ann.id, "Also nice.", db).await.unwrap();

        assert_eq!(Post::delete(post.id, db).await.unwrap(), 1);
        assert!(Post::by_id(post.id, db).await.unwrap().is_none());
        assert!(Comment::by_id(gone.id, db).await.unwrap().is_none());
        let left = CommentByUser::for_post(post.id, db).await.unwrap();
        assert!(left.is_empty());
        let other = CommentByUser::for_post(kept.id, db).await.unwrap();
        assert_eq!(other.len(), 1);
    }
}
