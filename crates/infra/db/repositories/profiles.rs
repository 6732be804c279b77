use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{PgConnection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::profiles},
};
use domain::{
    entities::profiles::{ProfileEntity, UpdateProfileBillingEntity},
    repositories::profiles::ProfileRepository,
};

pub struct ProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn ensure_profile_row(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<usize> {
    insert_into(profiles::table)
        .values(profiles::id.eq(user_id))
        .on_conflict_do_nothing()
        .execute(conn)
}

#[async_trait]
impl ProfileRepository for ProfilePostgres {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .find(user_id)
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_stripe_customer_id(
        &self,
        stripe_customer_id: String,
    ) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .filter(profiles::stripe_customer_id.eq(stripe_customer_id))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn apply_billing_update(
        &self,
        user_id: Uuid,
        update_entity: UpdateProfileBillingEntity,
    ) -> Result<()> {
        let mut pooled = Arc::clone(&self.db_pool).get()?;
        let conn: &mut PgConnection = &mut pooled;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            ensure_profile_row(conn, user_id)?;

            update(profiles::table.find(user_id))
                .set((&update_entity, profiles::updated_at.eq(Utc::now())))
                .execute(conn)?;

            Ok(())
        })?;

        Ok(())
    }

    async fn increment_generations_used(&self, user_id: Uuid) -> Result<i32> {
        let mut pooled = Arc::clone(&self.db_pool).get()?;
        let conn: &mut PgConnection = &mut pooled;

        let generations_used = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            ensure_profile_row(conn, user_id)?;

            update(profiles::table.find(user_id))
                .set((
                    profiles::generations_used.eq(profiles::generations_used + 1),
                    profiles::updated_at.eq(Utc::now()),
                ))
                .returning(profiles::generations_used)
                .get_result::<i32>(conn)
        })?;

        Ok(generations_used)
    }
}
