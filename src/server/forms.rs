//! Form data posted by users, and checking it.
//!
//! A form that does not validate is shown again with the messages.
use crate::models::{
    parse_form_date, Category, DateTime, Location, Post, User, When,
};
use lazy_regex::regex_is_match;
use serde::{Deserialize, Deserializer};

pub type Errors = Vec<String>;

/// A checkbox is only present in the form data when checked.
fn checkbox<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    String::deserialize(d).map(|_| true)
}

fn check_length(errors: &mut Errors, name: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.push(format!("{name} is required."));
    } else if value.chars().count() > max {
        errors.push(format!("{name} can be at most {max} characters."));
    }
}

/// Parse an optional id from a select field, empty means none.
fn optional_id(value: &str) -> Result<Option<i32>, ()> {
    let value = value.trim();
    if value.is_empty() {
        Ok(None)
    } else {
        value.parse().map(Some).map_err(|_| ())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub csrftoken: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pub_date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub is_published: bool,
}

/// The checked content of a [`PostForm`].
#[derive(Debug, PartialEq)]
pub struct ValidPost<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub pub_date: DateTime,
    pub location_id: Option<i32>,
    pub category_id: i32,
    pub image: Option<&'a str>,
    pub is_published: bool,
}

impl PostForm {
    /// An empty form for a new post, to be published now.
    pub fn new_post(now: DateTime) -> Self {
        PostForm {
            pub_date: When(now).form_value(),
            is_published: true,
            ..Default::default()
        }
    }

    /// A form filled in from an existing post.
    pub fn from_post(post: &Post) -> Self {
        PostForm {
            csrftoken: String::new(),
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: When(post.pub_date).form_value(),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            image: post.image.clone().unwrap_or_default(),
            is_published: post.is_published,
        }
    }

    /// Check the form.
    ///
    /// The category is required and the location optional, both must
    /// be among the existing ones.
    pub fn validate<'a>(
        &'a self,
        categories: &[Category],
        locations: &[Location],
    ) -> Result<ValidPost<'a>, Errors> {
        let mut errors = Errors::new();
        check_length(&mut errors, "Title", &self.title, 256);
        if self.text.trim().is_empty() {
            errors.push("Text is required.".into());
        }
        let pub_date = parse_form_date(&self.pub_date);
        if pub_date.is_none() {
            errors.push("Enter a valid publication date and time.".into());
        }
        let category_id = match optional_id(&self.category) {
            Ok(Some(id)) if categories.iter().any(|c| c.id == id) => Some(id),
            Ok(None) => {
                errors.push("Category is required.".into());
                None
            }
            _ => {
                errors.push("Select a valid category.".into());
                None
            }
        };
        let location_id = match optional_id(&self.location) {
            Ok(Some(id)) if locations.iter().any(|l| l.id == id) => Some(id),
            Ok(None) => None,
            _ => {
                errors.push("Select a valid location.".into());
                None
            }
        };
        let image = Some(self.image.trim()).filter(|s| !s.is_empty());
        if image.is_some_and(|i| i.chars().any(char::is_whitespace)) {
            errors.push("The image reference can't contain spaces.".into());
        }
        match (pub_date, category_id) {
            (Some(pub_date), Some(category_id)) if errors.is_empty() => {
                Ok(ValidPost {
                    title: self.title.trim(),
                    text: &self.text,
                    pub_date,
                    location_id,
                    category_id,
                    image,
                    is_published: self.is_published,
                })
            }
            _ => Err(errors),
        }
    }

    pub fn is_category(&self, category: &Category) -> bool {
        self.category.trim() == category.id.to_string()
    }
    pub fn is_location(&self, location: &Location) -> bool {
        self.location.trim() == location.id.to_string()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub csrftoken: String,
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn with_text(text: &str) -> Self {
        CommentForm {
            csrftoken: String::new(),
            text: text.into(),
        }
    }
    pub fn validate(&self) -> Result<&str, Errors> {
        if self.text.trim().is_empty() {
            Err(vec!["The comment can't be empty.".into()])
        } else {
            Ok(&self.text)
        }
    }
}

/// A form with nothing but the csrf token, for confirming deletes.
#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub csrftoken: String,
}

fn check_username(errors: &mut Errors, username: &str) {
    check_length(errors, "Username", username, 150);
    if !username.is_empty() && !regex_is_match!(r"^[A-Za-z0-9@.+_-]+$", username) {
        errors.push(
            "A username may only contain letters, digits and @.+-_".into(),
        );
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub csrftoken: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl UserForm {
    pub fn from_user(user: &User) -> Self {
        UserForm {
            csrftoken: String::new(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
    pub fn validate(&self) -> Result<(), Errors> {
        let mut errors = Errors::new();
        check_username(&mut errors, &self.username);
        for (name, value) in [
            ("First name", &self.first_name),
            ("Last name", &self.last_name),
        ] {
            if value.chars().count() > 150 {
                errors.push(format!("{name} can be at most 150 characters."));
            }
        }
        if !self.email.is_empty()
            && !regex_is_match!(r"^[^@\s]+@[^@\s]+\.[^@\s]+$", &self.email)
        {
            errors.push("Enter a valid email address.".into());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub csrftoken: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub csrftoken: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), Errors> {
        let mut errors = Errors::new();
        check_username(&mut errors, &self.username);
        if self.password1.chars().count() < 8 {
            errors.push("The password must be at least 8 characters.".into());
        }
        if self.password1 != self.password2 {
            errors.push("The two passwords don't match.".into());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::Slug;
    use chrono::{TimeZone, Utc};

    fn categories() -> Vec<Category> {
        vec![Category {
            id: 3,
            title: "Travel".into(),
            description: String::new(),
            slug: "travel".parse::<Slug>().unwrap(),
            is_published: true,
            created_at: Utc::now(),
        }]
    }

    fn locations() -> Vec<Location> {
        vec![Location {
            id: 8,
            name: "Moscow".into(),
            is_published: true,
            created_at: Utc::now(),
        }]
    }

    fn post_form() -> PostForm {
        PostForm {
            title: " A trip ".into(),
            text: "We went places.".into(),
            pub_date: "2099-01-01T10:00".into(),
            category: "3".into(),
            is_published: true,
            ..Default::default()
        }
    }

    #[test]
    fn valid_post() {
        let form = post_form();
        let valid = form.validate(&categories(), &locations()).unwrap();
        assert_eq!(
            valid,
            ValidPost {
                title: "A trip",
                text: "We went places.",
                pub_date: Utc.with_ymd_and_hms(2099, 1, 1, 10, 0, 0).unwrap(),
                location_id: None,
                category_id: 3,
                image: None,
                is_published: true,
            }
        );
    }

    #[test]
    fn post_with_location() {
        let form = PostForm {
            location: "8".into(),
            ..post_form()
        };
        let valid = form.validate(&categories(), &locations()).unwrap();
        assert_eq!(valid.location_id, Some(8));
    }

    #[test]
    fn post_needs_category() {
        let form = PostForm {
            category: String::new(),
            ..post_form()
        };
        let errors = form.validate(&categories(), &locations()).unwrap_err();
        assert_eq!(errors, vec!["Category is required.".to_string()]);
    }

    #[test]
    fn post_unknown_references() {
        let form = PostForm {
            category: "4".into(),
            location: "x".into(),
            ..post_form()
        };
        let errors = form.validate(&categories(), &locations()).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn post_bad_date_and_title() {
        let form = PostForm {
            title: "x".repeat(257),
            pub_date: "tomorrow".into(),
            ..post_form()
        };
        let errors = form.validate(&categories(), &locations()).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn unchecked_box_is_unpublished() {
        let form: PostForm =
            parse_form("title=T&text=x&pub_date=2020-01-01T00%3A00&category=3");
        assert!(!form.is_published);
        let form: PostForm = parse_form("title=T&is_published=on");
        assert!(form.is_published);
    }

    /// Parse a form body the way warp does.
    fn parse_form<T: serde::de::DeserializeOwned + Send + 'static>(body: &str) -> T {
        use warp::Filter;
        let filter = warp::body::form::<T>();
        let request = warp::test::request()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body.to_string());
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(request.filter(&filter))
            .map_err(|_| "rejected")
            .unwrap()
    }

    #[test]
    fn empty_comment() {
        assert!(CommentForm::with_text("  \n").validate().is_err());
        assert_eq!(CommentForm::with_text("Nice!").validate(), Ok("Nice!"));
    }

    #[test]
    fn usernames() {
        for ok in ["leo", "anna.k+blog", "user@example.com", "a_b-c"] {
            let form = UserForm {
                username: ok.into(),
                ..Default::default()
            };
            assert_eq!(form.validate(), Ok(()), "{ok:?}");
        }
        for bad in ["", "two words", "slash/ed", "åsa"] {
            let form = UserForm {
                username: bad.into(),
                ..Default::default()
            };
            assert!(form.validate().is_err(), "{bad:?}");
        }
    }

    #[test]
    fn user_email() {
        let form = UserForm {
            username: "leo".into(),
            email: "not an email".into(),
            ..Default::default()
        };
        assert!(form.validate().is_err());
        let form = UserForm {
            username: "leo".into(),
            email: "leo@example.com".into(),
            ..Default::default()
        };
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn registration_passwords() {
        let form = RegistrationForm {
            username: "leo".into(),
            password1: "long enough".into(),
            password2: "long enough".into(),
            ..Default::default()
        };
        assert_eq!(form.validate(), Ok(()));
        let form = RegistrationForm {
            password2: "different".into(),
            ..form
        };
        assert!(form.validate().is_err());
        let form = RegistrationForm {
            username: "leo".into(),
            password1: "short".into(),
            password2: "short".into(),
            ..Default::default()
        };
        assert!(form.validate().is_err());
    }
}
