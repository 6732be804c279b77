use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::profiles::ProfileEntity;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileDto {
    pub id: Uuid,
    pub is_pro: bool,
    pub generations_used: i32,
    pub free_generation_limit: i32,
    pub remaining_generations: Option<i32>,
    pub subscription_status: Option<String>,
    pub subscription_tier: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
}

impl ProfileDto {
    /// Builds the summary for `user_id`; a user without a row yet gets the
    /// free-tier defaults.
    pub fn from_entity(user_id: Uuid, profile: Option<ProfileEntity>, free_limit: i32) -> Self {
        match profile {
            Some(profile) => Self {
                id: profile.id,
                is_pro: profile.is_pro,
                generations_used: profile.generations_used,
                free_generation_limit: free_limit,
                remaining_generations: remaining(profile.is_pro, profile.generations_used, free_limit),
                subscription_status: profile.subscription_status,
                subscription_tier: profile.subscription_tier,
                current_period_end: profile.current_period_end,
            },
            None => Self {
                id: user_id,
                is_pro: false,
                generations_used: 0,
                free_generation_limit: free_limit,
                remaining_generations: Some(free_limit),
                subscription_status: None,
                subscription_tier: None,
                current_period_end: None,
            },
        }
    }
}

/// Free generations left, or `None` when the user is not metered.
pub fn remaining(is_pro: bool, generations_used: i32, free_limit: i32) -> Option<i32> {
    if is_pro {
        None
    } else {
        Some((free_limit - generations_used).max(0))
    }
}
