mod category;
mod comment;
mod datetime;
mod fullpost;
mod location;
mod markdown;
mod paging;
mod post;
mod slug;
mod teaser;
mod user;

pub use self::category::Category;
pub use self::comment::{Comment, CommentByUser};
pub use self::datetime::{parse_form_date, DateTime, When};
pub use self::fullpost::FullPost;
pub use self::location::Location;
pub use self::markdown::Markdown;
pub use self::paging::{Page, Paged};
pub use self::post::{Post, PostData};
pub use self::slug::Slug;
pub use self::teaser::{Listing, Teaser};
pub use self::user::User;

#[cfg(test)]
pub(crate) use self::comment::comment as test_comment;
#[cfg(test)]
pub(crate) use self::post::post as test_post;
#[cfg(test)]
pub(crate) use self::user::user as test_user;

type Result<T, E = diesel::result::Error> = std::result::Result<T, E>;
