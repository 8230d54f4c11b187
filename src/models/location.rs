use super::{DateTime, Result};
use crate::dbopt::Connection;
use crate::schema::locations::{self, dsl as l};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = locations)]
pub struct Location {
    pub id: i32,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime,
}

impl Location {
    pub async fn all(db: &mut Connection) -> Result<Vec<Location>> {
        l::locations
            .select(Location::as_select())
            .order(l::name)
            .load(db)
            .await
    }
}
