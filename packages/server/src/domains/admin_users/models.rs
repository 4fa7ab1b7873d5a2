use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{AdminUserId, GlobalRole};

/// Admin user - anyone who can sign in to the admin side
///
/// Profile fields double as the gifter card shown to gift recipients, each
/// one gated by a flag on the gift code.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: String,
    pub display_name: String,
    pub role: GlobalRole,

    // Profile
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAdminUser {
    pub email: String,
    pub display_name: String,
    pub role: GlobalRole,
}

/// Profile update; `None` leaves a field untouched, `""` clears it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
}

impl AdminUser {
    pub async fn find_by_id(id: AdminUserId, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, Self>("SELECT * FROM admin_users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        let user =
            sqlx::query_as::<_, Self>("SELECT * FROM admin_users WHERE LOWER(email) = LOWER($1)")
                .bind(email.trim())
                .fetch_optional(pool)
                .await?;
        Ok(user)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let users = sqlx::query_as::<_, Self>(
            "SELECT * FROM admin_users ORDER BY role = 'super_admin' DESC, LOWER(email)",
        )
        .fetch_all(pool)
        .await?;
        Ok(users)
    }

    pub async fn create(input: CreateAdminUser, pool: &PgPool) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO admin_users (id, email, display_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(AdminUserId::new())
        .bind(input.email.trim())
        .bind(input.display_name.trim())
        .bind(input.role)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn update_role<'e>(
        id: AdminUserId,
        role: GlobalRole,
        db: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, Self>(
            "UPDATE admin_users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn update_profile(
        id: AdminUserId,
        input: UpdateProfile,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            UPDATE admin_users SET
                display_name = COALESCE($2, display_name),
                full_name = CASE WHEN $3::text IS NULL THEN full_name ELSE NULLIF($3, '') END,
                phone = CASE WHEN $4::text IS NULL THEN phone ELSE NULLIF($4, '') END,
                bio = CASE WHEN $5::text IS NULL THEN bio ELSE NULLIF($5, '') END,
                avatar_url = CASE WHEN $6::text IS NULL THEN avatar_url ELSE NULLIF($6, '') END,
                website = CASE WHEN $7::text IS NULL THEN website ELSE NULLIF($7, '') END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.display_name)
        .bind(&input.full_name)
        .bind(&input.phone)
        .bind(&input.bio)
        .bind(&input.avatar_url)
        .bind(&input.website)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn delete<'e>(id: AdminUserId, db: impl PgExecutor<'e>) -> Result<bool> {
        let result = sqlx::query("DELETE FROM admin_users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lock and return every super admin id (serializes last-super-admin checks)
    pub async fn lock_super_admins<'e>(db: impl PgExecutor<'e>) -> Result<Vec<AdminUserId>> {
        let ids = sqlx::query_scalar::<_, AdminUserId>(
            "SELECT id FROM admin_users WHERE role = 'super_admin' ORDER BY id FOR UPDATE",
        )
        .fetch_all(db)
        .await?;
        Ok(ids)
    }
}
