use super::fullpost::{joined, Row};
use super::{Category, DateTime, FullPost, Location, Page, Paged, Post, Result, User};
use crate::dbopt::Connection;
use crate::schema::comments::dsl as c;
use crate::schema::posts::dsl as p;
use crate::visibility::public_at;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::HashMap;

/// Which posts a listing page shows.
#[derive(Clone, Copy, Debug)]
pub enum Listing {
    /// The front page feed.
    Public,
    /// Public posts in a category.
    Category(i32),
    /// Posts by a user.
    ///
    /// Hidden posts are included only when the author looks at their
    /// own profile.
    Author { id: i32, include_hidden: bool },
}

/// A post as shown in a listing, with the number of comments on it.
pub struct Teaser {
    post: FullPost,
    n_comments: i64,
}

impl Teaser {
    /// Load a page of posts, newest first.
    #[tracing::instrument(skip(db))]
    pub async fn page(
        listing: Listing,
        page: Page,
        now: DateTime,
        db: &mut Connection,
    ) -> Result<Paged<Teaser>> {
        let mut query = joined()
            .select((
                Post::as_select(),
                User::as_select(),
                Option::<Category>::as_select(),
                Option::<Location>::as_select(),
            ))
            .order((p::pub_date.desc(), p::id.desc()))
            .limit(page.fetch_limit())
            .offset(page.offset())
            .into_boxed();
        query = match listing {
            Listing::Public => query.filter(public_at(now)),
            Listing::Category(id) => query
                .filter(p::category_id.assume_not_null().eq(id))
                .filter(public_at(now)),
            Listing::Author {
                id,
                include_hidden: true,
            } => query.filter(p::author_id.eq(id)),
            Listing::Author {
                id,
                include_hidden: false,
            } => query.filter(p::author_id.eq(id)).filter(public_at(now)),
        };
        let rows = query.load::<Row>(db).await?;

        let ids = rows.iter().map(|(post, ..)| post.id).collect::<Vec<_>>();
        let counts = comment_counts(ids, db).await?;
        let teasers = rows
            .into_iter()
            .map(|row| {
                let post = FullPost::from(row);
                let n_comments = counts.get(&post.id).copied().unwrap_or(0);
                Teaser { post, n_comments }
            })
            .collect();
        Ok(Paged::from_fetched(teasers, page))
    }

    pub fn n_comments(&self) -> i64 {
        self.n_comments
    }
}

/// Count the comments on each of the given posts.
///
/// Always counted live, posts without comments are absent from the map.
async fn comment_counts(
    post_ids: Vec<i32>,
    db: &mut Connection,
) -> Result<HashMap<i32, i64>> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(c::comments
        .filter(c::post_id.eq_any(post_ids))
        .group_by(c::post_id)
        .select((c::post_id, count_star()))
        .load::<(i32, i64)>(db)
        .await?
        .into_iter()
        .collect())
}

impl std::ops::Deref for Teaser {
    type Target = FullPost;
    fn deref(&self) -> &FullPost {
        &self.post
    }
}

#[cfg(test)]
mod test {
    use super::{Listing, Teaser};
    use crate::dbopt::Connection;
    use crate::models::{Comment, Page};
    use crate::testdb::{self, TestDb};
    use chrono::{Duration, Utc};

    async fn titles(listing: Listing, db: &mut Connection) -> Vec<String> {
        Teaser::page(listing, Page::default(), Utc::now(), db)
            .await
            .unwrap()
            .items
            .iter()
            .map(|t| t.title.clone())
            .collect()
    }

    #[tokio::test]
    async fn listings_follow_visibility() {
        let Some(testdb) = TestDb::create() else { return };
        let mut db = testdb.db().await;
        let leo = testdb::user("leo", &mut db).await;
        let ann = testdb::user("ann", &mut db).await;
        let travel = testdb::category("travel", true, &mut db).await;
        let secret = testdb::category("secret", false, &mut db).await;
        let (now, day) = (Utc::now(), Duration::days(1));
        let db = &mut db;
        testdb::post("Public", leo.id, Some(travel), now - day * 2, true, db)
            .await;
        testdb::post("Draft", leo.id, Some(travel), now - day, false, db)
            .await;
        testdb::post("Later", leo.id, Some(travel), now + day, true, db).await;
        testdb::post("Hidden", leo.id, Some(secret), now - day, true, db)
            .await;
        testdb::post("Loose", leo.id, None, now - day, true, db).await;
        testdb::post("Ann's", ann.id, Some(travel), now - day, true, db).await;

        assert_eq!(titles(Listing::Public, db).await, ["Ann's", "Public"]);
        assert_eq!(
            titles(Listing::Category(travel), db).await,
            ["Ann's", "Public"]
        );
        assert!(titles(Listing::Category(secret), db).await.is_empty());
        let others_view = Listing::Author {
            id: leo.id,
            include_hidden: false,
        };
        assert_eq!(titles(others_view, db).await, ["Public"]);
        let own_view = Listing::Author {
            id: leo.id,
            include_hidden: true,
        };
        assert_eq!(
            titles(own_view, db).await,
            ["Later", "Loose", "Hidden", "Draft", "Public"]
        );
    }

    #[tokio::test]
    async fn counts_comments() {
        let Some(testdb) = TestDb::create() else { return };
        let mut db = testdb.db().await;
        let leo = testdb::user("leo", &mut db).await;
        let travel = testdb::category("travel", true, &mut db).await;
        let yesterday = Utc::now() - Duration::days(1);
        let db = &mut db;
        let busy =
            testdb::post("Busy", leo.id, Some(travel), yesterday, true, db)
                .await;
        testdb::post("Quiet", leo.id, Some(travel), yesterday, true, db).await;
        for text in ["One.", "Two."] {
            Comment::create(busy.id, leo.id, text, db).await.unwrap();
        }

        let page = Teaser::page(Listing::Public, Page::default(), Utc::now(), db)
            .await
            .unwrap();
        let counts = page
            .items
            .iter()
            .map(|t| (t.title.as_str(), t.n_comments()))
            .collect::<Vec<_>>();
        assert_eq!(counts, [("Quiet", 0), ("Busy", 2)]);
    }
}
