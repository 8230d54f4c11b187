use diesel::backend::Backend;
use diesel::deserialize::FromSql;
use diesel::pg::Pg;
use diesel::sql_types::Text;
use std::str::FromStr;

/// The url identifier of a category.
///
/// Latin letters, digits, hyphen and underscore only, at most
/// [`Slug::MAX_LEN`] of them.
#[derive(Debug, Clone, Eq, PartialEq, FromSqlRow)]
pub struct Slug(String);

impl Slug {
    /// Width of the slug column.
    pub const MAX_LEN: usize = 64;
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl FromSql<Text, Pg> for Slug {
    fn from_sql(
        bytes: <Pg as Backend>::RawValue<'_>,
    ) -> diesel::deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Slug::from_str(&s).map_err(|_| format!("Bad slug {s:?}").into())
    }
}
impl std::fmt::Display for Slug {
    fn fmt(&self, out: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(out)
    }
}
impl std::ops::Deref for Slug {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}
impl FromStr for Slug {
    type Err = BadSlug;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty()
            && s.len() <= Slug::MAX_LEN
            && s.bytes()
                .all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_')
        {
            Ok(Slug(s.to_string()))
        } else {
            Err(BadSlug(s.to_string()))
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error(
    "Bad slug {0:?}, use at most 64 latin letters, digits, hyphens \
     and underscores"
)]
pub struct BadSlug(String);
