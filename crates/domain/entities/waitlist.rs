use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::waitlist;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = waitlist, primary_key(email))]
pub struct WaitlistEntity {
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = waitlist)]
pub struct InsertWaitlistEntity {
    pub email: String,
    pub name: Option<String>,
}
