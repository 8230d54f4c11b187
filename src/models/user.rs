use super::{DateTime, Result};
use crate::dbopt::Connection;
use crate::route::Route;
use crate::schema::users::{self, dsl as u};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

/// A registered user, as shown on pages.
///
/// The password hash is never loaded into this struct.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime,
}

impl User {
    pub async fn by_id(id: i32, db: &mut Connection) -> Result<Option<User>> {
        u::users
            .select(User::as_select())
            .filter(u::id.eq(id))
            .first(db)
            .await
            .optional()
    }

    pub async fn by_username(
        username: &str,
        db: &mut Connection,
    ) -> Result<Option<User>> {
        u::users
            .select(User::as_select())
            .filter(u::username.eq(username))
            .first(db)
            .await
            .optional()
    }

    /// Get a user and the stored password hash, for logging in.
    pub async fn with_password_hash(
        username: &str,
        db: &mut Connection,
    ) -> Result<Option<(User, String)>> {
        u::users
            .select((User::as_select(), u::password_hash))
            .filter(u::username.eq(username))
            .first(db)
            .await
            .optional()
    }

    /// Create a user with an already hashed password.
    pub async fn create(
        username: &str,
        password_hash: &str,
        db: &mut Connection,
    ) -> Result<User> {
        diesel::insert_into(u::users)
            .values((
                u::username.eq(username),
                u::password_hash.eq(password_hash),
            ))
            .returning(User::as_returning())
            .get_result(db)
            .await
    }

    /// Save new profile fields, returning the updated user.
    pub async fn update_profile(
        id: i32,
        username: &str,
        first_name: &str,
        last_name: &str,
        email: &str,
        db: &mut Connection,
    ) -> Result<User> {
        diesel::update(u::users.filter(u::id.eq(id)))
            .set((
                u::username.eq(username),
                u::first_name.eq(first_name),
                u::last_name.eq(last_name),
                u::email.eq(email),
            ))
            .returning(User::as_returning())
            .get_result(db)
            .await
    }

    /// Display name: the full name if given, else the username.
    pub fn name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    pub fn url(&self) -> String {
        Route::Profile {
            username: self.username.clone(),
        }
        .url()
    }
    pub fn edit_url(&self) -> String {
        Route::ProfileEdit {
            username: self.username.clone(),
        }
        .url()
    }
}

#[cfg(test)]
pub(crate) fn user(id: i32, username: &str) -> User {
    User {
        id,
        username: username.into(),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        created_at: chrono::Utc::now(),
    }
}

#[test]
fn name_falls_back_to_username() {
    let mut u = user(1, "leo");
    assert_eq!(u.name(), "leo");
    u.first_name = "Leo".into();
    assert_eq!(u.name(), "Leo");
    u.last_name = "Tolstoy".into();
    assert_eq!(u.name(), "Leo Tolstoy");
}
