use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::waitlist},
};
use domain::{
    entities::waitlist::InsertWaitlistEntity, repositories::waitlist::WaitlistRepository,
};

pub struct WaitlistPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl WaitlistPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl WaitlistRepository for WaitlistPostgres {
    async fn join_waitlist(&self, insert_waitlist_entity: InsertWaitlistEntity) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(waitlist::table)
            .values(&insert_waitlist_entity)
            .on_conflict(waitlist::email)
            .do_nothing()
            .execute(&mut conn)?;

        Ok(inserted == 1)
    }
}
