//! Typed url targets for links and redirects.
use std::fmt::{self, Display};
use url::form_urlencoded;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Route {
    Index,
    PostDetail { id: i32 },
    PostCreate,
    PostEdit { post_id: i32 },
    PostDelete { post_id: i32 },
    CommentCreate { post_id: i32 },
    CommentEdit { post_id: i32, comment_id: i32 },
    CommentDelete { post_id: i32, comment_id: i32 },
    Category { slug: String },
    Profile { username: String },
    ProfileEdit { username: String },
    /// The login page, with the path to continue to afterwards.
    Login { next: Option<String> },
    Logout,
    Registration,
}

impl Route {
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl Display for Route {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Route::Index => out.write_str("/"),
            Route::PostDetail { id } => write!(out, "/posts/{id}"),
            Route::PostCreate => out.write_str("/posts/create"),
            Route::PostEdit { post_id } => write!(out, "/posts/{post_id}/edit"),
            Route::PostDelete { post_id } => {
                write!(out, "/posts/{post_id}/delete")
            }
            Route::CommentCreate { post_id } => {
                write!(out, "/posts/{post_id}/comment")
            }
            Route::CommentEdit {
                post_id,
                comment_id,
            } => write!(out, "/posts/{post_id}/edit_comment/{comment_id}"),
            Route::CommentDelete {
                post_id,
                comment_id,
            } => write!(out, "/posts/{post_id}/delete_comment/{comment_id}"),
            Route::Category { slug } => write!(out, "/category/{slug}"),
            Route::Profile { username } => write!(out, "/profile/{username}"),
            Route::ProfileEdit { username } => {
                write!(out, "/profile/{username}/edit")
            }
            Route::Login { next: None } => out.write_str("/auth/login"),
            Route::Login { next: Some(next) } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("next", next)
                    .finish();
                write!(out, "/auth/login?{query}")
            }
            Route::Logout => out.write_str("/auth/logout"),
            Route::Registration => out.write_str("/auth/registration"),
        }
    }
}

/// Check a `next` parameter before redirecting to it.
///
/// Only absolute paths on this site are accepted.
pub fn local_path(next: &str) -> Option<&str> {
    let ok = next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control);
    ok.then_some(next)
}

#[cfg(test)]
mod test {
    use super::{local_path, Route};

    #[test]
    fn post_routes() {
        assert_eq!(Route::PostDetail { id: 7 }.url(), "/posts/7");
        assert_eq!(Route::PostEdit { post_id: 7 }.url(), "/posts/7/edit");
        assert_eq!(Route::PostDelete { post_id: 7 }.url(), "/posts/7/delete");
        assert_eq!(
            Route::CommentCreate { post_id: 7 }.url(),
            "/posts/7/comment"
        );
    }

    #[test]
    fn comment_routes() {
        let edit = Route::CommentEdit {
            post_id: 3,
            comment_id: 12,
        };
        assert_eq!(edit.url(), "/posts/3/edit_comment/12");
        let delete = Route::CommentDelete {
            post_id: 3,
            comment_id: 12,
        };
        assert_eq!(delete.url(), "/posts/3/delete_comment/12");
    }

    #[test]
    fn profile_routes() {
        let username = "anna.k+blog".to_string();
        assert_eq!(
            Route::Profile {
                username: username.clone()
            }
            .url(),
            "/profile/anna.k+blog"
        );
        assert_eq!(
            Route::ProfileEdit { username }.url(),
            "/profile/anna.k+blog/edit"
        );
    }

    #[test]
    fn login_with_next() {
        let next = Route::ProfileEdit {
            username: "a+b".into(),
        };
        assert_eq!(
            Route::Login {
                next: Some(next.url())
            }
            .url(),
            "/auth/login?next=%2Fprofile%2Fa%2Bb%2Fedit"
        );
        assert_eq!(Route::Login { next: None }.url(), "/auth/login");
    }

    #[test]
    fn only_local_next() {
        assert_eq!(local_path("/posts/3"), Some("/posts/3"));
        assert_eq!(local_path("https://evil.example/"), None);
        assert_eq!(local_path("//evil.example/"), None);
        assert_eq!(local_path("/\\evil.example"), None);
        assert_eq!(local_path(""), None);
    }
}
