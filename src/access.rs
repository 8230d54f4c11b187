//! Who may change what.
//!
//! Only the author of a post or comment may edit or delete it, and only
//! the owner of a profile may edit it.  A denied change is never an
//! error for the visitor, they are sent back to a page where the
//! resource can be seen.
use crate::models::{Comment, Post, User};
use crate::route::Route;

/// The user making the current request.
#[derive(Debug)]
pub enum Identity {
    Anonymous,
    User(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    /// True if this is the logged in user with the given id.
    pub fn is_user(&self, id: i32) -> bool {
        self.user().is_some_and(|u| u.id == id)
    }

    /// The authentication gate for creating and changing content.
    ///
    /// `wanted` is where to continue after logging in.
    pub fn require_user(&self, wanted: Route) -> Result<&User, LoginRequired> {
        self.user().ok_or(LoginRequired(wanted))
    }
}

/// An anonymous visitor tried something that requires a login.
#[derive(Debug, PartialEq, Eq)]
pub struct LoginRequired(pub Route);

impl LoginRequired {
    /// The login page, continuing to the wanted page afterwards.
    pub fn login_route(&self) -> Route {
        Route::Login {
            next: Some(self.0.url()),
        }
    }
}

/// The result of an ownership check.
#[derive(Debug)]
pub enum Decision<T> {
    /// Go ahead and change this.
    Allow(T),
    /// Not yours, go here instead.
    Deny(Route),
}

/// May `me` edit or delete this post?
///
/// If not, the post detail page is where to go.
pub fn may_change_post(me: &Identity, post: Post) -> Decision<Post> {
    if me.is_user(post.author_id) {
        Decision::Allow(post)
    } else {
        Decision::Deny(Route::PostDetail { id: post.id })
    }
}

/// May `me` edit or delete this comment?
///
/// If not, the detail page of the commented post is where to go.
pub fn may_change_comment(me: &Identity, comment: Comment) -> Decision<Comment> {
    if me.is_user(comment.author_id) {
        Decision::Allow(comment)
    } else {
        Decision::Deny(Route::PostDetail {
            id: comment.post_id,
        })
    }
}

/// May `me` edit this profile?
///
/// Profiles are self service, there is no administrator override.
pub fn may_edit_profile(me: &Identity, profile: User) -> Decision<User> {
    match me.user() {
        Some(user) if user.username == profile.username => {
            Decision::Allow(profile)
        }
        _ => Decision::Deny(Route::Profile {
            username: profile.username,
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::{test_comment, test_post, test_user};
    use chrono::Utc;

    fn me(id: i32, name: &str) -> Identity {
        Identity::User(test_user(id, name))
    }

    #[test]
    fn author_may_change_post() {
        let post = test_post(5, 1, Utc::now());
        match may_change_post(&me(1, "author"), post) {
            Decision::Allow(post) => assert_eq!(post.id, 5),
            Decision::Deny(to) => panic!("Denied, sent to {to}"),
        }
    }

    #[test]
    fn others_sent_to_post() {
        for who in [me(2, "other"), Identity::Anonymous] {
            let post = test_post(5, 1, Utc::now());
            match may_change_post(&who, post) {
                Decision::Allow(_) => panic!("{who:?} allowed"),
                Decision::Deny(to) => {
                    assert_eq!(to, Route::PostDetail { id: 5 })
                }
            }
        }
    }

    #[test]
    fn author_may_change_comment() {
        let comment = test_comment(12, 5, 2);
        assert!(matches!(
            may_change_comment(&me(2, "commenter"), comment),
            Decision::Allow(c) if c.id == 12
        ));
    }

    #[test]
    fn others_sent_to_commented_post() {
        // The post author is not the comment author.
        let comment = test_comment(12, 5, 2);
        match may_change_comment(&me(1, "post-author"), comment) {
            Decision::Allow(_) => panic!("Allowed"),
            Decision::Deny(to) => assert_eq!(to.url(), "/posts/5"),
        }
    }

    #[test]
    fn profile_is_self_service() {
        let profile = test_user(3, "leo");
        assert!(matches!(
            may_edit_profile(&me(3, "leo"), profile.clone()),
            Decision::Allow(_)
        ));
        match may_edit_profile(&me(4, "anna"), profile) {
            Decision::Allow(_) => panic!("Allowed"),
            Decision::Deny(to) => assert_eq!(to.url(), "/profile/leo"),
        }
    }

    #[test]
    fn anonymous_must_log_in() {
        let gate = Identity::Anonymous.require_user(Route::PostCreate);
        let err = gate.unwrap_err();
        assert_eq!(err.login_route().url(), "/auth/login?next=%2Fposts%2Fcreate");
    }

    #[test]
    fn logged_in_passes_gate() {
        let who = me(1, "author");
        let user = who.require_user(Route::PostCreate).unwrap();
        assert_eq!(user.username, "author");
    }
}
