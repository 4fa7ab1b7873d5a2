use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::utils::address_fingerprint;
use crate::common::{
    AdminUserId, CampaignId, ClaimId, GiftCodeId, InviteCodeId, ValidatedPaginationArgs,
};

crate::text_enum! {
    pub enum ClaimStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Rejected => "rejected",
    }
}

crate::text_enum! {
    /// How a claim entered the system
    pub enum ClaimSource {
        Form => "form",
        Import => "import",
        PreCreated => "pre_created",
        Gift => "gift",
    }
}

/// Recipient and shipping address, as typed by a person
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl ClaimContact {
    /// Address hash used to spot the same household twice
    pub fn fingerprint(&self) -> Option<String> {
        address_fingerprint(
            self.address_line1.as_deref()?,
            self.address_line2.as_deref(),
            self.postal_code.as_deref().unwrap_or_default(),
            self.country.as_deref().unwrap_or("US"),
        )
    }

    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }
}

impl From<&Claim> for ClaimContact {
    fn from(claim: &Claim) -> Self {
        Self {
            name: claim.name.clone(),
            email: claim.email.clone(),
            phone: claim.phone.clone(),
            address_line1: claim.address_line1.clone(),
            address_line2: claim.address_line2.clone(),
            city: claim.city.clone(),
            region: claim.region.clone(),
            postal_code: claim.postal_code.clone(),
            country: claim.country.clone(),
        }
    }
}

/// One address submission
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Claim {
    pub id: ClaimId,
    pub campaign_id: CampaignId,

    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,

    pub status: ClaimStatus,
    pub is_test_claim: bool,
    pub source: ClaimSource,
    #[serde(skip_serializing)]
    pub fingerprint: Option<String>,

    pub claim_token: Option<String>,
    pub pre_created_by: Option<AdminUserId>,
    pub gifted_by: Option<AdminUserId>,
    pub gift_code_id: Option<GiftCodeId>,
    pub gift_message: Option<String>,
    pub invite_code_id: Option<InviteCodeId>,

    pub shipped_at: Option<DateTime<Utc>>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub admin_notes: Option<String>,

    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to insert a claim row
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub campaign_id: CampaignId,
    pub contact: ClaimContact,
    pub status: ClaimStatus,
    pub is_test_claim: bool,
    pub source: ClaimSource,
    pub fingerprint: Option<String>,
    pub claim_token: Option<String>,
    pub pre_created_by: Option<AdminUserId>,
    pub gifted_by: Option<AdminUserId>,
    pub gift_code_id: Option<GiftCodeId>,
    pub gift_message: Option<String>,
    pub invite_code_id: Option<InviteCodeId>,
    pub admin_notes: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl NewClaim {
    /// A claim submitted now, with no linkage
    pub fn submitted(campaign_id: CampaignId, contact: ClaimContact, source: ClaimSource) -> Self {
        Self {
            campaign_id,
            contact,
            status: ClaimStatus::Pending,
            is_test_claim: false,
            source,
            fingerprint: None,
            claim_token: None,
            pre_created_by: None,
            gifted_by: None,
            gift_code_id: None,
            gift_message: None,
            invite_code_id: None,
            admin_notes: None,
            submitted_at: Some(Utc::now()),
        }
    }
}

/// Admin list/export filters (`?status=pending&search=ada&shipped=false`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
    pub search: Option<String>,
    pub is_test: Option<bool>,
    pub shipped: Option<bool>,
    pub source: Option<ClaimSource>,
    pub submitted_from: Option<DateTime<Utc>>,
    pub submitted_to: Option<DateTime<Utc>>,
}

impl ClaimFilter {
    /// ILIKE pattern for `search`, with wildcards in the input escaped
    pub fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{}%", escaped))
    }
}

/// `$1` is the campaign, `$2..$8` the filter values (see `bind_filter!`)
const FILTER_SQL: &str = r#"
    WHERE campaign_id = $1
      AND ($2::text IS NULL OR status = $2)
      AND ($3::text IS NULL
           OR name ILIKE $3 OR email ILIKE $3 OR city ILIKE $3 OR postal_code ILIKE $3)
      AND ($4::boolean IS NULL OR is_test_claim = $4)
      AND ($5::boolean IS NULL OR (shipped_at IS NOT NULL) = $5)
      AND ($6::text IS NULL OR source = $6)
      AND ($7::timestamptz IS NULL OR submitted_at >= $7)
      AND ($8::timestamptz IS NULL OR submitted_at < $8)
"#;

macro_rules! bind_filter {
    ($query:expr, $campaign_id:expr, $filter:expr) => {
        $query
            .bind($campaign_id)
            .bind($filter.status)
            .bind($filter.search_pattern())
            .bind($filter.is_test)
            .bind($filter.shipped)
            .bind($filter.source)
            .bind($filter.submitted_from)
            .bind($filter.submitted_to)
    };
}

/// Claim counts for a campaign's dashboard
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct ClaimCounts {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub rejected: i64,
    pub shipped: i64,
    pub test: i64,
    pub counted: i64,
}

/// An existing claim an import row collides with
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExistingClaimMatch {
    pub email: Option<String>,
    pub fingerprint: Option<String>,
    pub campaign_id: CampaignId,
    pub campaign_slug: String,
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct ClaimStatusRow {
    pub id: ClaimId,
    pub status: ClaimStatus,
}

impl Claim {
    pub async fn insert<'e>(new: &NewClaim, db: impl PgExecutor<'e>) -> Result<Self> {
        let c = &new.contact;
        let claim = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO claims (
                id, campaign_id,
                name, email, phone, address_line1, address_line2, city, region, postal_code, country,
                status, is_test_claim, source, fingerprint,
                claim_token, pre_created_by, gifted_by, gift_code_id, gift_message, invite_code_id,
                admin_notes, submitted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING *
            "#,
        )
        .bind(ClaimId::new())
        .bind(new.campaign_id)
        .bind(&c.name)
        .bind(&c.email)
        .bind(&c.phone)
        .bind(&c.address_line1)
        .bind(&c.address_line2)
        .bind(&c.city)
        .bind(&c.region)
        .bind(&c.postal_code)
        .bind(&c.country)
        .bind(new.status)
        .bind(new.is_test_claim)
        .bind(new.source)
        .bind(&new.fingerprint)
        .bind(&new.claim_token)
        .bind(new.pre_created_by)
        .bind(new.gifted_by)
        .bind(new.gift_code_id)
        .bind(&new.gift_message)
        .bind(new.invite_code_id)
        .bind(&new.admin_notes)
        .bind(new.submitted_at)
        .fetch_one(db)
        .await?;
        Ok(claim)
    }

    pub async fn find_in_campaign<'e>(
        id: ClaimId,
        campaign_id: CampaignId,
        db: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        let claim =
            sqlx::query_as::<_, Self>("SELECT * FROM claims WHERE id = $1 AND campaign_id = $2")
                .bind(id)
                .bind(campaign_id)
                .fetch_optional(db)
                .await?;
        Ok(claim)
    }

    pub async fn find_by_token(token: &str, pool: &PgPool) -> Result<Option<Self>> {
        let claim = sqlx::query_as::<_, Self>("SELECT * FROM claims WHERE claim_token = $1")
            .bind(token)
            .fetch_optional(pool)
            .await?;
        Ok(claim)
    }

    pub async fn lock_by_token<'e>(token: &str, db: impl PgExecutor<'e>) -> Result<Option<Self>> {
        let claim =
            sqlx::query_as::<_, Self>("SELECT * FROM claims WHERE claim_token = $1 FOR UPDATE")
                .bind(token)
                .fetch_optional(db)
                .await?;
        Ok(claim)
    }

    /// Claims occupying a slot: not rejected, and not test claims unless
    /// `include_test` (the campaign is in test mode).
    pub async fn count_toward_capacity<'e>(
        campaign_id: CampaignId,
        include_test: bool,
        db: impl PgExecutor<'e>,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM claims
            WHERE campaign_id = $1
              AND status <> 'rejected'
              AND (NOT is_test_claim OR $2)
            "#,
        )
        .bind(campaign_id)
        .bind(include_test)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    /// A live (non-rejected) claim in the campaign with the same email or
    /// address fingerprint
    pub async fn find_duplicate<'e>(
        campaign_id: CampaignId,
        email: Option<&str>,
        fingerprint: Option<&str>,
        exclude: Option<ClaimId>,
        db: impl PgExecutor<'e>,
    ) -> Result<Option<ClaimId>> {
        let id = sqlx::query_scalar::<_, ClaimId>(
            r#"
            SELECT id FROM claims
            WHERE campaign_id = $1
              AND status <> 'rejected'
              AND ($4::uuid IS NULL OR id <> $4)
              AND (
                  ($2::text IS NOT NULL AND LOWER(email) = LOWER($2))
                  OR ($3::text IS NOT NULL AND fingerprint = $3)
              )
            LIMIT 1
            "#,
        )
        .bind(campaign_id)
        .bind(email)
        .bind(fingerprint)
        .bind(exclude)
        .fetch_optional(db)
        .await?;
        Ok(id)
    }

    /// One page of claims, newest first
    pub async fn find_page(
        campaign_id: CampaignId,
        filter: &ClaimFilter,
        args: &ValidatedPaginationArgs,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT * FROM claims {} AND ($9::uuid IS NULL OR id < $9) ORDER BY id DESC LIMIT $10",
            FILTER_SQL
        );
        let claims = bind_filter!(sqlx::query_as::<_, Self>(&sql), campaign_id, filter)
            .bind(args.cursor)
            .bind(args.fetch_limit())
            .fetch_all(pool)
            .await?;
        Ok(claims)
    }

    pub async fn count_filtered(
        campaign_id: CampaignId,
        filter: &ClaimFilter,
        pool: &PgPool,
    ) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM claims {}", FILTER_SQL);
        let count = bind_filter!(sqlx::query_scalar::<_, i64>(&sql), campaign_id, filter)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Every matching claim, oldest first (exports)
    pub async fn find_all_filtered(
        campaign_id: CampaignId,
        filter: &ClaimFilter,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let sql = format!("SELECT * FROM claims {} ORDER BY id", FILTER_SQL);
        let claims = bind_filter!(sqlx::query_as::<_, Self>(&sql), campaign_id, filter)
            .fetch_all(pool)
            .await?;
        Ok(claims)
    }

    pub async fn counts(
        campaign_id: CampaignId,
        include_test: bool,
        pool: &PgPool,
    ) -> Result<ClaimCounts> {
        let counts = sqlx::query_as::<_, ClaimCounts>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'confirmed') AS confirmed,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected,
                COUNT(*) FILTER (WHERE shipped_at IS NOT NULL) AS shipped,
                COUNT(*) FILTER (WHERE is_test_claim) AS test,
                COUNT(*) FILTER (
                    WHERE status <> 'rejected' AND (NOT is_test_claim OR $2)
                ) AS counted
            FROM claims
            WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .bind(include_test)
        .fetch_one(pool)
        .await?;
        Ok(counts)
    }

    /// Overwrite contact, status and notes after an admin edit
    pub async fn update_details<'e>(
        id: ClaimId,
        contact: &ClaimContact,
        fingerprint: Option<&str>,
        status: ClaimStatus,
        admin_notes: Option<&str>,
        db: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let claim = sqlx::query_as::<_, Self>(
            r#"
            UPDATE claims SET
                name = $2, email = $3, phone = $4,
                address_line1 = $5, address_line2 = $6, city = $7,
                region = $8, postal_code = $9, country = $10,
                fingerprint = $11, status = $12, admin_notes = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.address_line1)
        .bind(&contact.address_line2)
        .bind(&contact.city)
        .bind(&contact.region)
        .bind(&contact.postal_code)
        .bind(&contact.country)
        .bind(fingerprint)
        .bind(status)
        .bind(admin_notes)
        .fetch_one(db)
        .await?;
        Ok(claim)
    }

    /// Record the recipient's details on a pre-created claim
    pub async fn complete<'e>(
        id: ClaimId,
        contact: &ClaimContact,
        fingerprint: Option<&str>,
        db: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let claim = sqlx::query_as::<_, Self>(
            r#"
            UPDATE claims SET
                name = $2, email = $3, phone = $4,
                address_line1 = $5, address_line2 = $6, city = $7,
                region = $8, postal_code = $9, country = $10,
                fingerprint = $11,
                submitted_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND submitted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.address_line1)
        .bind(&contact.address_line2)
        .bind(&contact.city)
        .bind(&contact.region)
        .bind(&contact.postal_code)
        .bind(&contact.country)
        .bind(fingerprint)
        .fetch_one(db)
        .await?;
        Ok(claim)
    }

    pub async fn find_statuses<'e>(
        campaign_id: CampaignId,
        ids: &[ClaimId],
        db: impl PgExecutor<'e>,
    ) -> Result<Vec<ClaimStatusRow>> {
        let rows = sqlx::query_as::<_, ClaimStatusRow>(
            "SELECT id, status FROM claims WHERE campaign_id = $1 AND id = ANY($2) FOR UPDATE",
        )
        .bind(campaign_id)
        .bind(ids)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Mark claims shipped; pending ones become confirmed on the way
    pub async fn mark_shipped<'e>(
        ids: &[ClaimId],
        shipped_at: DateTime<Utc>,
        carrier: Option<&str>,
        tracking_number: Option<&str>,
        db: impl PgExecutor<'e>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE claims SET
                status = 'confirmed',
                shipped_at = $2,
                carrier = $3,
                tracking_number = $4,
                updated_at = NOW()
            WHERE id = ANY($1) AND status <> 'rejected'
            "#,
        )
        .bind(ids)
        .bind(shipped_at)
        .bind(carrier)
        .bind(tracking_number)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn clear_shipping(
        campaign_id: CampaignId,
        ids: &[ClaimId],
        pool: &PgPool,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE claims SET
                shipped_at = NULL,
                carrier = NULL,
                tracking_number = NULL,
                updated_at = NOW()
            WHERE campaign_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(campaign_id)
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(id: ClaimId, campaign_id: CampaignId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM claims WHERE id = $1 AND campaign_id = $2")
            .bind(id)
            .bind(campaign_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_campaign(
        campaign_id: CampaignId,
        test_only: bool,
        pool: &PgPool,
    ) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM claims WHERE campaign_id = $1 AND (is_test_claim OR NOT $2)")
                .bind(campaign_id)
                .bind(test_only)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn exists_for_campaign<'e>(
        campaign_id: CampaignId,
        db: impl PgExecutor<'e>,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM claims WHERE campaign_id = $1)",
        )
        .bind(campaign_id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    /// Claims in any campaign sharing an email or fingerprint (import dedup)
    pub async fn find_matches(
        emails: &[String],
        fingerprints: &[String],
        pool: &PgPool,
    ) -> Result<Vec<ExistingClaimMatch>> {
        let matches = sqlx::query_as::<_, ExistingClaimMatch>(
            r#"
            SELECT LOWER(cl.email) AS email, cl.fingerprint, cl.campaign_id, c.slug AS campaign_slug
            FROM claims cl
            JOIN campaigns c ON c.id = cl.campaign_id
            WHERE LOWER(cl.email) = ANY($1) OR cl.fingerprint = ANY($2)
            "#,
        )
        .bind(emails)
        .bind(fingerprints)
        .fetch_all(pool)
        .await?;
        Ok(matches)
    }
}

#[cfg(test)]
pub(crate) fn test_claim(campaign_id: CampaignId) -> Claim {
    let now = Utc::now();
    Claim {
        id: ClaimId::new(),
        campaign_id,
        name: Some("Ada Lovelace".into()),
        email: Some("ada@example.com".into()),
        phone: None,
        address_line1: Some("12 Engine St".into()),
        address_line2: None,
        city: Some("Portland".into()),
        region: Some("OR".into()),
        postal_code: Some("97201".into()),
        country: Some("US".into()),
        status: ClaimStatus::Confirmed,
        is_test_claim: false,
        source: ClaimSource::Form,
        fingerprint: None,
        claim_token: None,
        pre_created_by: None,
        gifted_by: None,
        gift_code_id: None,
        gift_message: None,
        invite_code_id: None,
        shipped_at: None,
        carrier: None,
        tracking_number: None,
        admin_notes: None,
        submitted_at: Some(now),
        created_at: now,
        updated_at: now,
    }
}
