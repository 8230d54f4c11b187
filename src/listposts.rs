use crate::dbopt::DbOpt;
use crate::models::{DateTime, Post};
use crate::schema::categories::dsl as c;
use crate::schema::posts::dsl as p;
use crate::schema::users::dsl as u;
use crate::visibility::is_public;
use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use diesel::prelude::*;

#[derive(Parser)]
pub struct Args {
    #[clap(flatten)]
    db: DbOpt,

    /// Base url to show post urls in, e.g. https://blog.example.com
    #[clap(long, short = 'b', default_value = "")]
    public_base: String,
}

impl Args {
    pub fn run(self) -> Result<()> {
        let mut db = self.db.get_db()?;
        let now = Utc::now();
        let posts = p::posts
            .inner_join(u::users)
            .left_join(c::categories)
            .select((
                Post::as_select(),
                u::username,
                c::is_published.nullable(),
            ))
            .order((p::pub_date.desc(), p::id.desc()))
            .load::<(Post, String, Option<bool>)>(&mut db)?;
        for (post, author, category_published) in posts {
            println!(
                "{:4}. {}{:14} {:10} {:>16} {} by {}",
                post.id,
                self.public_base,
                post.url(),
                status(&post, category_published, now),
                post.pub_date.format("%Y-%m-%d %H:%M"),
                post.title,
                author,
            );
        }
        Ok(())
    }
}

/// Why a post is or is not on public display.
fn status(
    post: &Post,
    category_published: Option<bool>,
    now: DateTime,
) -> &'static str {
    if is_public(post, category_published, now) {
        "public"
    } else if !post.is_published {
        "draft"
    } else if category_published.is_none() {
        "uncategorized"
    } else if category_published == Some(false) {
        "cat-hidden"
    } else {
        "scheduled"
    }
}

#[cfg(test)]
mod test {
    use super::status;
    use crate::models::test_post;
    use chrono::{Duration, Utc};

    #[test]
    fn statuses() {
        let now = Utc::now();
        let mut post = test_post(1, 1, now - Duration::days(1));
        assert_eq!(status(&post, Some(true), now), "public");
        assert_eq!(status(&post, Some(false), now), "cat-hidden");
        assert_eq!(status(&post, None, now), "uncategorized");
        post.pub_date = now + Duration::days(1);
        assert_eq!(status(&post, Some(true), now), "scheduled");
        post.is_published = false;
        assert_eq!(status(&post, Some(true), now), "draft");
    }
}
