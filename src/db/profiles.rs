//! Profiles repository
//!
//! A profile holds one user's newsletter preferences. There is at most one profile per
//! user, guaranteed by the unique index on `profiles.user_id` and by [`ProfileRepository::upsert`]
//! being a single conditional statement.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::sqlite_helpers::{
    bool_to_int, int_to_bool, json_to_vec, now_iso8601, str_to_uuid, uuid_to_str, vec_to_json,
};

/// Send time stored when a profile is created without one
pub const DEFAULT_SEND_TIME: &str = "8am";

/// Profile as stored, with the user held as a bare reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: Uuid,
    pub user: Uuid,
    pub fav_subreddits: Vec<String>,
    pub newsletter_send_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wants_newsletter: Option<bool>,
    pub created_at: String,
    pub updated_at: String,
}

/// The fields of a user exposed when a profile reference is expanded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
}

/// Profile with its user reference expanded to a [`UserSummary`].
///
/// `user` is `None` when the referenced user no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedProfile {
    pub id: Uuid,
    pub user: Option<UserSummary>,
    pub fav_subreddits: Vec<String>,
    pub newsletter_send_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wants_newsletter: Option<bool>,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial write. `None` leaves the stored value untouched (or the default on create).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertProfile {
    pub fav_subreddits: Option<Vec<String>>,
    pub newsletter_send_time: Option<String>,
    pub wants_newsletter: Option<bool>,
}

type ProfileRow = (String, String, String, String, Option<i32>, String, String);
type PopulatedRow = (String, String, String, String, Option<i32>, String, String, Option<String>);

const PROFILE_COLUMNS: &str = "id, user_id, fav_subreddits, newsletter_send_time, wants_newsletter, created_at, updated_at";

const POPULATED_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.fav_subreddits, p.newsletter_send_time, p.wants_newsletter,
           p.created_at, p.updated_at, u.name
    FROM profiles p
    LEFT JOIN users u ON u.id = p.user_id
"#;

fn row_to_record(r: ProfileRow) -> Result<ProfileRecord> {
    Ok(ProfileRecord {
        id: str_to_uuid(&r.0)?,
        user: str_to_uuid(&r.1)?,
        fav_subreddits: json_to_vec(&r.2),
        newsletter_send_time: r.3,
        wants_newsletter: r.4.map(int_to_bool),
        created_at: r.5,
        updated_at: r.6,
    })
}

fn row_to_populated(r: PopulatedRow) -> Result<PopulatedProfile> {
    let user_id = str_to_uuid(&r.1)?;
    Ok(PopulatedProfile {
        id: str_to_uuid(&r.0)?,
        user: r.7.map(|name| UserSummary { id: user_id, name }),
        fav_subreddits: json_to_vec(&r.2),
        newsletter_send_time: r.3,
        wants_newsletter: r.4.map(int_to_bool),
        created_at: r.5,
        updated_at: r.6,
    })
}

pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the profile for a user with the user's display name joined in
    pub async fn get_populated_by_user(&self, user_id: Uuid) -> Result<Option<PopulatedProfile>> {
        let row = sqlx::query_as::<_, PopulatedRow>(&format!(
            "{} WHERE p.user_id = ?",
            POPULATED_SELECT
        ))
        .bind(uuid_to_str(user_id))
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_populated).transpose()
    }

    /// List every profile in insertion order, user names joined in
    pub async fn list_populated(&self) -> Result<Vec<PopulatedProfile>> {
        let rows = sqlx::query_as::<_, PopulatedRow>(&format!(
            "{} ORDER BY p.rowid",
            POPULATED_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_populated).collect()
    }

    /// Create the user's profile or apply a partial update to it, atomically.
    ///
    /// On create, fields left as `None` take the schema defaults. On update, they keep
    /// their stored value.
    pub async fn upsert(&self, user_id: Uuid, fields: UpsertProfile) -> Result<ProfileRecord> {
        let now = now_iso8601();

        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            INSERT INTO profiles (id, user_id, fav_subreddits, newsletter_send_time, wants_newsletter, created_at, updated_at)
            VALUES (?1, ?2, COALESCE(?3, '[]'), COALESCE(?4, '{default_time}'), ?5, ?6, ?6)
            ON CONFLICT(user_id) DO UPDATE SET
                fav_subreddits = COALESCE(?3, profiles.fav_subreddits),
                newsletter_send_time = COALESCE(?4, profiles.newsletter_send_time),
                wants_newsletter = COALESCE(?5, profiles.wants_newsletter),
                updated_at = ?6
            RETURNING {columns}
            "#,
            default_time = DEFAULT_SEND_TIME,
            columns = PROFILE_COLUMNS,
        ))
        .bind(uuid_to_str(Uuid::new_v4()))
        .bind(uuid_to_str(user_id))
        .bind(fields.fav_subreddits.as_deref().map(vec_to_json))
        .bind(fields.newsletter_send_time)
        .bind(fields.wants_newsletter.map(bool_to_int))
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        row_to_record(row)
    }

    /// Count stored profiles
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::db::{CreateUser, Database};

    use super::*;

    async fn setup() -> (Database, Uuid) {
        let db = Database::in_memory().await.unwrap();
        let user = db
            .users()
            .create(CreateUser { name: "Ada".to_string(), email: None })
            .await
            .unwrap();
        (db, user.id)
    }

    fn subs(names: &[&str]) -> Option<Vec<String>> {
        Some(names.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_get_missing_profile_is_none() {
        let (db, user_id) = setup().await;
        assert!(db.profiles().get_populated_by_user(user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_creates_with_defaults() {
        let (db, user_id) = setup().await;

        let profile = db
            .profiles()
            .upsert(user_id, UpsertProfile { fav_subreddits: subs(&["rust"]), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(profile.user, user_id);
        assert_eq!(profile.fav_subreddits, vec!["rust".to_string()]);
        assert_eq!(profile.newsletter_send_time, DEFAULT_SEND_TIME);
        assert_eq!(profile.wants_newsletter, None);
    }

    #[tokio::test]
    async fn test_upsert_updates_only_supplied_fields() {
        let (db, user_id) = setup().await;
        let repo = db.profiles();

        let created = repo
            .upsert(
                user_id,
                UpsertProfile {
                    fav_subreddits: subs(&["news", "funny"]),
                    newsletter_send_time: Some("7am".to_string()),
                    wants_newsletter: Some(true),
                },
            )
            .await
            .unwrap();

        let updated = repo
            .upsert(
                user_id,
                UpsertProfile { newsletter_send_time: Some("9pm".to_string()), ..Default::default() },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.newsletter_send_time, "9pm");
        assert_eq!(updated.fav_subreddits, created.fav_subreddits);
        assert_eq!(updated.wants_newsletter, Some(true));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_writes_false_and_empty_values() {
        let (db, user_id) = setup().await;
        let repo = db.profiles();

        repo.upsert(
            user_id,
            UpsertProfile { fav_subreddits: subs(&["news"]), wants_newsletter: Some(true), ..Default::default() },
        )
        .await
        .unwrap();

        let updated = repo
            .upsert(
                user_id,
                UpsertProfile {
                    fav_subreddits: Some(Vec::new()),
                    wants_newsletter: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.wants_newsletter, Some(false));
        assert!(updated.fav_subreddits.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_leave_one_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concurrent.db");
        let db = Database::connect(path.to_str().unwrap(), 8).await.unwrap();
        db.migrate().await.unwrap();
        let user_id = db
            .users()
            .create(CreateUser { name: "Ada".to_string(), email: None })
            .await
            .unwrap()
            .id;

        let handles: Vec<_> = (1..=8)
            .map(|hour| {
                let repo = db.profiles();
                tokio::spawn(async move {
                    repo.upsert(
                        user_id,
                        UpsertProfile { newsletter_send_time: Some(format!("{}am", hour)), ..Default::default() },
                    )
                    .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(db.profiles().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_populated_profile_expands_user_name() {
        let (db, user_id) = setup().await;
        db.profiles().upsert(user_id, UpsertProfile::default()).await.unwrap();

        let profile = db.profiles().get_populated_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(profile.user, Some(UserSummary { id: user_id, name: "Ada".to_string() }));
    }

    #[tokio::test]
    async fn test_populated_profile_with_deleted_user_has_null_user() {
        let (db, user_id) = setup().await;
        db.profiles().upsert(user_id, UpsertProfile::default()).await.unwrap();
        db.users().delete(user_id).await.unwrap();

        let profiles = db.profiles().list_populated().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].user, None);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let db = Database::in_memory().await.unwrap();
        let mut ids = Vec::new();
        for name in ["first", "second", "third"] {
            let user = db
                .users()
                .create(CreateUser { name: name.to_string(), email: None })
                .await
                .unwrap();
            db.profiles().upsert(user.id, UpsertProfile::default()).await.unwrap();
            ids.push(user.id);
        }

        let listed: Vec<Uuid> = db
            .profiles()
            .list_populated()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|p| p.user.map(|u| u.id))
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.profiles().list_populated().await.unwrap().is_empty());
    }
}
