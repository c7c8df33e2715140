// ABOUTME: SQLite association store built on sqlx with transactional batch writes
// ABOUTME: Creates the schema at open and maps constraint violations onto StoreError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{into_page, AssociationStore, BatchLookup, StoreResult};
use crate::config::DatabaseUrl;
use crate::constants::limits::SQLITE_BUSY_TIMEOUT_SECS;
use crate::errors::{EntityKind, StoreError};
use crate::models::{
    AssociationFilter, AssociationKey, NewParameter, NewProfile, Parameter, ParameterFilter,
    ParameterId, Profile, ProfileId, ProfileParameter, ProfileType, Server, ServerId,
};
use crate::pagination::{CursorPage, PaginationParams};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const PROFILE_COLUMNS: &str = "id, name, description, type, last_updated";
const PARAMETER_COLUMNS: &str = "id, name, config_file, value, secure, last_updated";
const SERVER_COLUMNS: &str = "id, host_name, profile, last_updated";

const ASSOCIATION_SELECT: &str = r"
    SELECT pp.profile AS profile_id, p.name AS profile, pp.parameter AS parameter_id,
           pa.name AS parameter, pa.config_file, pa.value, pa.secure, pp.last_updated
    FROM profile_parameter pp
    JOIN profile p ON p.id = pp.profile
    JOIN parameter pa ON pa.id = pp.parameter";

const SCHEMA: [&str; 5] = [
    r"CREATE TABLE IF NOT EXISTS profile (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        type TEXT NOT NULL DEFAULT 'UNK',
        last_updated TEXT NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS parameter (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        config_file TEXT NOT NULL,
        value TEXT NOT NULL,
        secure INTEGER NOT NULL DEFAULT 0,
        last_updated TEXT NOT NULL,
        UNIQUE (name, config_file, value)
    )",
    r"CREATE TABLE IF NOT EXISTS profile_parameter (
        profile INTEGER NOT NULL REFERENCES profile(id) ON DELETE CASCADE,
        parameter INTEGER NOT NULL REFERENCES parameter(id) ON DELETE CASCADE,
        last_updated TEXT NOT NULL,
        PRIMARY KEY (profile, parameter)
    )",
    r"CREATE INDEX IF NOT EXISTS idx_profile_parameter_parameter
        ON profile_parameter(parameter)",
    r"CREATE TABLE IF NOT EXISTS server (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        host_name TEXT NOT NULL UNIQUE,
        profile INTEGER NOT NULL REFERENCES profile(id),
        last_updated TEXT NOT NULL
    )",
];

#[derive(FromRow)]
struct ProfileRow {
    id: i64,
    name: String,
    description: String,
    #[sqlx(rename = "type")]
    profile_type: String,
    last_updated: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let profile_type = ProfileType::from_str(&row.profile_type)
            .map_err(|e| StoreError::storage(format!("profile {}: {}", row.id, e.message)))?;
        Ok(Self {
            id: ProfileId(row.id),
            name: row.name,
            description: row.description,
            profile_type,
            last_updated: row.last_updated,
        })
    }
}

#[derive(FromRow)]
struct ParameterRow {
    id: i64,
    name: String,
    config_file: String,
    value: String,
    secure: bool,
    last_updated: DateTime<Utc>,
}

impl From<ParameterRow> for Parameter {
    fn from(row: ParameterRow) -> Self {
        Self {
            id: ParameterId(row.id),
            name: row.name,
            config_file: row.config_file,
            value: row.value,
            secure: row.secure,
            last_updated: row.last_updated,
        }
    }
}

#[derive(FromRow)]
struct ServerRow {
    id: i64,
    host_name: String,
    profile: i64,
    last_updated: DateTime<Utc>,
}

impl From<ServerRow> for Server {
    fn from(row: ServerRow) -> Self {
        Self {
            id: ServerId(row.id),
            host_name: row.host_name,
            profile_id: ProfileId(row.profile),
            last_updated: row.last_updated,
        }
    }
}

#[derive(FromRow)]
struct AssociationRow {
    profile_id: i64,
    profile: String,
    parameter_id: i64,
    parameter: String,
    config_file: String,
    value: String,
    secure: bool,
    last_updated: DateTime<Utc>,
}

impl From<AssociationRow> for ProfileParameter {
    fn from(row: AssociationRow) -> Self {
        Self {
            profile_id: ProfileId(row.profile_id),
            profile: row.profile,
            parameter_id: ParameterId(row.parameter_id),
            parameter: row.parameter,
            config_file: row.config_file,
            value: row.value,
            secure: row.secure,
            last_updated: row.last_updated,
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Map a unique-constraint failure onto `Duplicate`, anything else onto `Storage`
fn duplicate_or_storage(error: sqlx::Error, entity: EntityKind, key: String) -> StoreError {
    if is_unique_violation(&error) {
        StoreError::Duplicate { entity, key }
    } else {
        StoreError::from(error)
    }
}

fn parameter_key(parameter: &NewParameter) -> String {
    format!(
        "{}/{}/{}",
        parameter.config_file, parameter.name, parameter.value
    )
}

async fn exists(conn: &mut SqliteConnection, sql: &str, id: i64) -> StoreResult<bool> {
    let found: Option<i64> = sqlx::query_scalar(sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

async fn pair_exists(conn: &mut SqliteConnection, key: AssociationKey) -> StoreResult<bool> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM profile_parameter WHERE profile = ? AND parameter = ?",
    )
    .bind(key.profile_id.get())
    .bind(key.parameter_id.get())
    .fetch_optional(conn)
    .await?;
    Ok(found.is_some())
}

async fn profiles_of(
    conn: &mut SqliteConnection,
    id: ParameterId,
) -> StoreResult<Vec<ProfileId>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT profile FROM profile_parameter WHERE parameter = ? ORDER BY profile",
    )
    .bind(id.get())
    .fetch_all(conn)
    .await?;
    Ok(ids.into_iter().map(ProfileId).collect())
}

/// `SQLite` backed store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database and ensure the schema exists
    ///
    /// # Errors
    ///
    /// Returns a storage error if the database cannot be opened or the schema
    /// cannot be created
    pub async fn open(url: &DatabaseUrl, max_connections: u32) -> StoreResult<Self> {
        let (options, max_connections) = match url {
            DatabaseUrl::Sqlite { path } => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        StoreError::storage(format!(
                            "cannot create database directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
                (
                    SqliteConnectOptions::new()
                        .filename(path)
                        .create_if_missing(true)
                        .foreign_keys(true)
                        .journal_mode(SqliteJournalMode::Wal)
                        .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS)),
                    max_connections.max(1),
                )
            }
            // A private in-memory database lives as long as its single connection
            DatabaseUrl::SqliteMemory | DatabaseUrl::Memory => (
                SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true),
                1,
            ),
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create tables and indexes if they do not exist
    async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("SQLite association schema ready");
        Ok(())
    }

    /// Get a reference to the connection pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Read transaction; the snapshot is taken at the first statement
    async fn begin(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Write transaction holding the write lock from its first statement
    ///
    /// Deferred transactions that read first fail with `SQLITE_BUSY` on lock
    /// upgrade instead of waiting out the busy timeout.
    async fn begin_write(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    async fn fetch_profile(
        conn: &mut SqliteConnection,
        id: ProfileId,
    ) -> StoreResult<Option<Profile>> {
        let row: Option<ProfileRow> =
            sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM profile WHERE id = ?"))
                .bind(id.get())
                .fetch_optional(conn)
                .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn fetch_parameter(
        conn: &mut SqliteConnection,
        id: ParameterId,
    ) -> StoreResult<Option<Parameter>> {
        let row: Option<ParameterRow> =
            sqlx::query_as(&format!("SELECT {PARAMETER_COLUMNS} FROM parameter WHERE id = ?"))
                .bind(id.get())
                .fetch_optional(conn)
                .await?;
        Ok(row.map(Parameter::from))
    }

    async fn fetch_association(
        conn: &mut SqliteConnection,
        key: AssociationKey,
    ) -> StoreResult<ProfileParameter> {
        let row: AssociationRow = sqlx::query_as(&format!(
            "{ASSOCIATION_SELECT} WHERE pp.profile = ? AND pp.parameter = ?"
        ))
        .bind(key.profile_id.get())
        .bind(key.parameter_id.get())
        .fetch_one(conn)
        .await?;
        Ok(row.into())
    }
}

#[async_trait]
impl AssociationStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_profile(&self, profile: &NewProfile) -> StoreResult<Profile> {
        let row: ProfileRow = sqlx::query_as(&format!(
            "INSERT INTO profile (name, description, type, last_updated) VALUES (?, ?, ?, ?) \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(&profile.name)
        .bind(&profile.description)
        .bind(profile.profile_type.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_or_storage(e, EntityKind::Profile, profile.name.clone()))?;
        row.try_into()
    }

    async fn update_profile(&self, id: ProfileId, profile: &NewProfile) -> StoreResult<Profile> {
        let row: Option<ProfileRow> = sqlx::query_as(&format!(
            "UPDATE profile SET name = ?, description = ?, type = ?, last_updated = ? \
             WHERE id = ? RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(&profile.name)
        .bind(&profile.description)
        .bind(profile.profile_type.as_str())
        .bind(Utc::now())
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| duplicate_or_storage(e, EntityKind::Profile, profile.name.clone()))?;

        row.ok_or(StoreError::NotFound {
            entity: EntityKind::Profile,
            id: id.get(),
        })?
        .try_into()
    }

    async fn delete_profile(&self, id: ProfileId) -> StoreResult<Profile> {
        let mut tx = self.begin_write().await?;

        let profile = Self::fetch_profile(&mut tx, id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Profile,
                id: id.get(),
            })?;

        let assigned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM server WHERE profile = ?")
            .bind(id.get())
            .fetch_one(&mut *tx)
            .await?;
        if assigned > 0 {
            return Err(StoreError::InUse {
                entity: EntityKind::Profile,
                id: id.get(),
                reason: format!("{assigned} server(s) are assigned to it"),
            });
        }

        sqlx::query("DELETE FROM profile_parameter WHERE profile = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM profile WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(profile)
    }

    async fn get_profile(&self, id: ProfileId) -> StoreResult<Option<Profile>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_profile(&mut conn, id).await
    }

    async fn find_profile_by_name(&self, name: &str) -> StoreResult<Option<Profile>> {
        let row: Option<ProfileRow> =
            sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM profile WHERE name = ?"))
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn list_profiles(&self) -> StoreResult<Vec<Profile>> {
        let rows: Vec<ProfileRow> =
            sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM profile ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(Profile::try_from).collect()
    }

    async fn create_parameter(&self, parameter: &NewParameter) -> StoreResult<Parameter> {
        let row: ParameterRow = sqlx::query_as(&format!(
            "INSERT INTO parameter (name, config_file, value, secure, last_updated) \
             VALUES (?, ?, ?, ?, ?) RETURNING {PARAMETER_COLUMNS}"
        ))
        .bind(&parameter.name)
        .bind(&parameter.config_file)
        .bind(&parameter.value)
        .bind(parameter.secure)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_or_storage(e, EntityKind::Parameter, parameter_key(parameter)))?;
        Ok(row.into())
    }

    async fn update_parameter(
        &self,
        id: ParameterId,
        parameter: &NewParameter,
    ) -> StoreResult<(Parameter, Vec<ProfileId>)> {
        let mut tx = self.begin_write().await?;

        let row: Option<ParameterRow> = sqlx::query_as(&format!(
            "UPDATE parameter SET name = ?, config_file = ?, value = ?, secure = ?, \
             last_updated = ? WHERE id = ? RETURNING {PARAMETER_COLUMNS}"
        ))
        .bind(&parameter.name)
        .bind(&parameter.config_file)
        .bind(&parameter.value)
        .bind(parameter.secure)
        .bind(Utc::now())
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| duplicate_or_storage(e, EntityKind::Parameter, parameter_key(parameter)))?;

        let updated = row.ok_or(StoreError::NotFound {
            entity: EntityKind::Parameter,
            id: id.get(),
        })?;
        let affected = profiles_of(&mut tx, id).await?;

        tx.commit().await?;
        Ok((updated.into(), affected))
    }

    async fn delete_parameter(&self, id: ParameterId) -> StoreResult<Vec<ProfileId>> {
        let mut tx = self.begin_write().await?;

        if !exists(&mut tx, "SELECT id FROM parameter WHERE id = ?", id.get()).await? {
            return Err(StoreError::NotFound {
                entity: EntityKind::Parameter,
                id: id.get(),
            });
        }

        let affected = profiles_of(&mut tx, id).await?;
        sqlx::query("DELETE FROM profile_parameter WHERE parameter = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM parameter WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(affected)
    }

    async fn get_parameter(&self, id: ParameterId) -> StoreResult<Option<Parameter>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_parameter(&mut conn, id).await
    }

    async fn list_parameters(&self, filter: &ParameterFilter) -> StoreResult<Vec<Parameter>> {
        let rows: Vec<ParameterRow> = sqlx::query_as(&format!(
            "SELECT {PARAMETER_COLUMNS} FROM parameter \
             WHERE (? IS NULL OR name = ?) \
               AND (? IS NULL OR config_file = ?) \
               AND (? IS NULL OR value = ?) \
             ORDER BY id"
        ))
        .bind(filter.name.as_deref())
        .bind(filter.name.as_deref())
        .bind(filter.config_file.as_deref())
        .bind(filter.config_file.as_deref())
        .bind(filter.value.as_deref())
        .bind(filter.value.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Parameter::from).collect())
    }

    async fn create_server(&self, host_name: &str, profile_id: ProfileId) -> StoreResult<Server> {
        let mut tx = self.begin_write().await?;

        if !exists(&mut tx, "SELECT id FROM profile WHERE id = ?", profile_id.get()).await? {
            return Err(StoreError::MissingReference {
                entity: EntityKind::Profile,
                id: profile_id.get(),
            });
        }

        let row: ServerRow = sqlx::query_as(&format!(
            "INSERT INTO server (host_name, profile, last_updated) VALUES (?, ?, ?) \
             RETURNING {SERVER_COLUMNS}"
        ))
        .bind(host_name)
        .bind(profile_id.get())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| duplicate_or_storage(e, EntityKind::Server, host_name.to_owned()))?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn delete_server(&self, id: ServerId) -> StoreResult<Server> {
        let row: Option<ServerRow> = sqlx::query_as(&format!(
            "DELETE FROM server WHERE id = ? RETURNING {SERVER_COLUMNS}"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Server::from).ok_or(StoreError::NotFound {
            entity: EntityKind::Server,
            id: id.get(),
        })
    }

    async fn get_server_by_host(&self, host_name: &str) -> StoreResult<Option<Server>> {
        let row: Option<ServerRow> =
            sqlx::query_as(&format!("SELECT {SERVER_COLUMNS} FROM server WHERE host_name = ?"))
                .bind(host_name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Server::from))
    }

    async fn list_servers(&self) -> StoreResult<Vec<Server>> {
        let rows: Vec<ServerRow> =
            sqlx::query_as(&format!("SELECT {SERVER_COLUMNS} FROM server ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Server::from).collect())
    }

    async fn lookup(&self, keys: &[AssociationKey]) -> StoreResult<BatchLookup> {
        let mut tx = self.begin().await?;
        let mut lookup = BatchLookup::default();

        let profiles: BTreeSet<ProfileId> = keys.iter().map(|k| k.profile_id).collect();
        for id in profiles {
            if exists(&mut tx, "SELECT id FROM profile WHERE id = ?", id.get()).await? {
                lookup.profiles.insert(id);
            }
        }

        let parameters: BTreeSet<ParameterId> = keys.iter().map(|k| k.parameter_id).collect();
        for id in parameters {
            if exists(&mut tx, "SELECT id FROM parameter WHERE id = ?", id.get()).await? {
                lookup.parameters.insert(id);
            }
        }

        for key in keys {
            if pair_exists(&mut tx, *key).await? {
                lookup.existing.insert(*key);
            }
        }

        tx.commit().await?;
        Ok(lookup)
    }

    async fn create_associations(
        &self,
        keys: &[AssociationKey],
    ) -> StoreResult<Vec<ProfileParameter>> {
        let mut tx = self.begin_write().await?;
        let now = Utc::now();

        for key in keys {
            if !exists(&mut tx, "SELECT id FROM profile WHERE id = ?", key.profile_id.get()).await? {
                return Err(StoreError::MissingReference {
                    entity: EntityKind::Profile,
                    id: key.profile_id.get(),
                });
            }
            if !exists(&mut tx, "SELECT id FROM parameter WHERE id = ?", key.parameter_id.get())
                .await?
            {
                return Err(StoreError::MissingReference {
                    entity: EntityKind::Parameter,
                    id: key.parameter_id.get(),
                });
            }

            sqlx::query(
                "INSERT INTO profile_parameter (profile, parameter, last_updated) VALUES (?, ?, ?)",
            )
            .bind(key.profile_id.get())
            .bind(key.parameter_id.get())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::AssociationExists {
                        profile_id: key.profile_id.get(),
                        parameter_id: key.parameter_id.get(),
                    }
                } else {
                    StoreError::from(e)
                }
            })?;
        }

        let mut rows = Vec::with_capacity(keys.len());
        for key in keys {
            rows.push(Self::fetch_association(&mut tx, *key).await?);
        }

        // Dropping `tx` on any early return above rolls the whole batch back
        tx.commit().await?;
        Ok(rows)
    }

    async fn delete_association(&self, key: AssociationKey) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM profile_parameter WHERE profile = ? AND parameter = ?")
            .bind(key.profile_id.get())
            .bind(key.parameter_id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AssociationNotFound {
                profile_id: key.profile_id.get(),
                parameter_id: key.parameter_id.get(),
            });
        }
        Ok(())
    }

    async fn association_exists(&self, key: AssociationKey) -> StoreResult<bool> {
        let mut conn = self.pool.acquire().await?;
        pair_exists(&mut conn, key).await
    }

    async fn list_by_profile(&self, profile_id: ProfileId) -> StoreResult<Vec<ProfileParameter>> {
        let rows: Vec<AssociationRow> = sqlx::query_as(&format!(
            "{ASSOCIATION_SELECT} WHERE pp.profile = ? ORDER BY pp.parameter"
        ))
        .bind(profile_id.get())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProfileParameter::from).collect())
    }

    async fn list_by_parameter(
        &self,
        parameter_id: ParameterId,
    ) -> StoreResult<Vec<ProfileParameter>> {
        let rows: Vec<AssociationRow> = sqlx::query_as(&format!(
            "{ASSOCIATION_SELECT} WHERE pp.parameter = ? ORDER BY pp.profile"
        ))
        .bind(parameter_id.get())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProfileParameter::from).collect())
    }

    async fn list_associations(
        &self,
        filter: AssociationFilter,
        page: PaginationParams,
    ) -> StoreResult<CursorPage<ProfileParameter>> {
        let (after_profile, after_parameter) = page
            .after
            .map_or((0, 0), |key| (key.profile_id.get(), key.parameter_id.get()));
        let profile_id = filter.profile_id.map(ProfileId::get);
        let parameter_id = filter.parameter_id.map(ParameterId::get);
        let fetch = i64::try_from(page.limit.saturating_add(1)).unwrap_or(i64::MAX);

        let rows: Vec<AssociationRow> = sqlx::query_as(&format!(
            "{ASSOCIATION_SELECT} \
             WHERE (? IS NULL OR pp.profile = ?) \
               AND (? IS NULL OR pp.parameter = ?) \
               AND (pp.profile > ? OR (pp.profile = ? AND pp.parameter > ?)) \
             ORDER BY pp.profile, pp.parameter \
             LIMIT ?"
        ))
        .bind(profile_id)
        .bind(profile_id)
        .bind(parameter_id)
        .bind(parameter_id)
        .bind(after_profile)
        .bind(after_profile)
        .bind(after_parameter)
        .bind(fetch)
        .fetch_all(&self.pool)
        .await?;

        Ok(into_page(
            rows.into_iter().map(ProfileParameter::from).collect(),
            page.limit,
        ))
    }

    async fn profile_with_parameters(
        &self,
        profile_id: ProfileId,
    ) -> StoreResult<Option<(Profile, Vec<Parameter>)>> {
        let mut tx = self.begin().await?;

        let Some(profile) = Self::fetch_profile(&mut tx, profile_id).await? else {
            return Ok(None);
        };

        let rows: Vec<ParameterRow> = sqlx::query_as(
            "SELECT pa.id, pa.name, pa.config_file, pa.value, pa.secure, pa.last_updated \
             FROM profile_parameter pp JOIN parameter pa ON pa.id = pp.parameter \
             WHERE pp.profile = ? ORDER BY pa.id",
        )
        .bind(profile_id.get())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((profile, rows.into_iter().map(Parameter::from).collect())))
    }
}
