use crate::schema::users;
use diesel::prelude::*;

pub static DEFAULT_ROLE: &str = "user";

/// A stored credential, independent of the backing store.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
}

#[derive(Queryable)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub role: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            username: row.username,
            password_hash: row.password_hash,
            role: row.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        }
    }
}
