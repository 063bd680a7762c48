use async_trait::async_trait;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    Error as SqlxError, PgPool, Row,
};

use crate::{
    ClassData, ClassMemberData, ClassRole, Database, DatabaseError, DatabaseResult,
    IntoDatabaseError, MemberRemoval, NewClass, NewClassMember, NewSession, NewSet, NewUser,
    PrimaryKey, Result, RoleChange, SessionData, SetData, SetPrivacy, UserData,
};

/// A postgres database implementation for studydeck
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }

    async fn class_members(&self, class_id: PrimaryKey) -> Result<Vec<ClassMemberData>> {
        let rows = sqlx::query(
            "
            SELECT
                class_members.id,
                class_members.role,
                users.id AS user_id,
                users.username,
                users.password,
                users.display_name,
                users.superuser
            FROM class_members
                INNER JOIN users ON class_members.user_id = users.id
            WHERE class_id = $1",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        rows.iter().map(member_from_row).collect()
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn check_for_superuser(&self) -> Result<bool> {
        let result = sqlx::query("SELECT id FROM users WHERE superuser = true")
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(SqlxError::RowNotFound) => Ok(false),
            Err(e) => Err(e.any()),
        }
    }

    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "id"))?;

        Ok(user_from_row(&row, "id"))
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "username"))?;

        Ok(user_from_row(&row, "id"))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.user_by_username(&new_user.username)
            .await
            .conflict_or_ok("user", "username", &new_user.username)?;

        let row = sqlx::query(
            "INSERT INTO users (username, password, display_name, superuser)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .bind(&new_user.display_name)
        .bind(new_user.superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(user_from_row(&row, "id"))
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let row = sqlx::query(
            "
            SELECT
                sessions.id,
                sessions.token,
                sessions.expires_at,
                users.id AS user_id,
                users.username,
                users.password,
                users.display_name,
                users.superuser
            FROM sessions
                INNER JOIN users ON sessions.user_id = users.id
            WHERE token = $1",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("session", "token"))?;

        Ok(SessionData {
            id: row.get("id"),
            token: row.get("token"),
            expires_at: row.get("expires_at"),
            user: user_from_row(&row, "user_id"),
        })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_token(&new_session.token)
            .await
            .conflict_or_ok("session", "token", &new_session.token)?;

        let row = sqlx::query(
            "INSERT INTO sessions (token, user_id, expires_at)
             VALUES ($1, $2, $3)
             RETURNING token",
        )
        .bind(&new_session.token)
        .bind(new_session.user_id)
        .bind(new_session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.session_by_token(row.get("token")).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        // Ensure session exists
        let _ = self.session_by_token(token).await?;

        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE timezone('UTC', now()) > expires_at")
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn class_by_id(&self, class_id: PrimaryKey) -> Result<ClassData> {
        let row = sqlx::query("SELECT * FROM classes WHERE id = $1")
            .bind(class_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("class", "id"))?;

        let members = self.class_members(class_id).await?;

        Ok(ClassData {
            id: row.get("id"),
            name: row.get("name"),
            members,
        })
    }

    async fn classes_for_user(&self, user_id: PrimaryKey) -> Result<Vec<ClassData>> {
        let rows = sqlx::query(
            "
            SELECT classes.id, classes.name FROM classes
                INNER JOIN class_members ON class_members.class_id = classes.id
            WHERE class_members.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let mut classes: Vec<_> = rows
            .into_iter()
            .map(|row| ClassData {
                id: row.get("id"),
                name: row.get("name"),
                members: vec![],
            })
            .collect();

        for class in classes.iter_mut() {
            class.members = self.class_members(class.id).await?
        }

        Ok(classes)
    }

    async fn create_class(&self, new_class: NewClass) -> Result<ClassData> {
        let user = self.user_by_id(new_class.user_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let row = sqlx::query("INSERT INTO classes (name) VALUES ($1) RETURNING id")
            .bind(&new_class.name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        let class_id: PrimaryKey = row.get("id");

        // The creator becomes the first admin of the class
        sqlx::query("INSERT INTO class_members (class_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(class_id)
            .bind(user.id)
            .bind(ClassRole::Admin.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())?;

        self.class_by_id(class_id).await
    }

    async fn delete_class(&self, class_id: PrimaryKey) -> Result<()> {
        // Ensure class exists
        let _ = self.class_by_id(class_id).await?;

        sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(class_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn member_by_class_and_user(
        &self,
        class_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<ClassMemberData> {
        let row = sqlx::query(
            "
            SELECT
                class_members.id,
                class_members.role,
                users.id AS user_id,
                users.username,
                users.password,
                users.display_name,
                users.superuser
            FROM class_members
                INNER JOIN users ON class_members.user_id = users.id
            WHERE class_id = $1 AND user_id = $2",
        )
        .bind(class_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("class member", "class:user"))?;

        member_from_row(&row)
    }

    async fn create_class_member(&self, new_member: NewClassMember) -> Result<ClassMemberData> {
        self.member_by_class_and_user(new_member.class_id, new_member.user_id)
            .await
            .conflict_or_ok(
                "class member",
                "class:user",
                format!("{}:{}", new_member.class_id, new_member.user_id).as_str(),
            )?;

        sqlx::query("INSERT INTO class_members (class_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(new_member.class_id)
            .bind(new_member.user_id)
            .bind(new_member.role.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.member_by_class_and_user(new_member.class_id, new_member.user_id)
            .await
    }

    async fn set_member_role(&self, change: RoleChange) -> Result<ClassMemberData> {
        let member = self
            .member_by_class_and_user(change.class_id, change.user_id)
            .await?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        sqlx::query("UPDATE class_members SET role = $1 WHERE id = $2")
            .bind(change.role.as_str())
            .bind(member.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        if change.purge_notifications {
            sqlx::query("DELETE FROM notifications WHERE class_id = $1 AND user_id = $2")
                .bind(change.class_id)
                .bind(change.user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| e.any())?;
        }

        tx.commit().await.map_err(|e| e.any())?;

        self.member_by_class_and_user(change.class_id, change.user_id)
            .await
    }

    async fn remove_class_member(&self, removal: MemberRemoval) -> Result<()> {
        let member = self
            .member_by_class_and_user(removal.class_id, removal.user_id)
            .await?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        sqlx::query("DELETE FROM notifications WHERE class_id = $1 AND user_id = $2")
            .bind(removal.class_id)
            .bind(removal.user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        sqlx::query("DELETE FROM class_members WHERE id = $1")
            .bind(member.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        if removal.privatize_sets {
            sqlx::query("UPDATE sets SET privacy = $1 WHERE user_id = $2 AND class_id = $3")
                .bind(SetPrivacy::Private.as_str())
                .bind(removal.user_id)
                .bind(removal.class_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| e.any())?;
        }

        if removal.delete_class_when_empty {
            let row = sqlx::query("SELECT COUNT(*) AS remaining FROM class_members WHERE class_id = $1")
                .bind(removal.class_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| e.any())?;

            let remaining: i64 = row.get("remaining");

            if remaining == 0 {
                sqlx::query("DELETE FROM classes WHERE id = $1")
                    .bind(removal.class_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| e.any())?;
            }
        }

        tx.commit().await.map_err(|e| e.any())
    }

    async fn create_set(&self, new_set: NewSet) -> Result<SetData> {
        let row = sqlx::query(
            "INSERT INTO sets (name, user_id, class_id, privacy)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&new_set.name)
        .bind(new_set.user_id)
        .bind(new_set.class_id)
        .bind(new_set.privacy.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        set_from_row(&row)
    }

    async fn sets_for_user(&self, user_id: PrimaryKey) -> Result<Vec<SetData>> {
        let rows = sqlx::query("SELECT * FROM sets WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        rows.iter().map(set_from_row).collect()
    }

    async fn purge_class_notifications_for_user(
        &self,
        class_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<()> {
        sqlx::query("DELETE FROM notifications WHERE class_id = $1 AND user_id = $2")
            .bind(class_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn count_class_notifications_for_user(
        &self,
        class_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM notifications WHERE class_id = $1 AND user_id = $2",
        )
        .bind(class_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let total: i64 = row.get("total");
        Ok(total as u64)
    }
}

fn user_from_row(row: &PgRow, id_column: &str) -> UserData {
    UserData {
        id: row.get(id_column),
        username: row.get("username"),
        password: row.get("password"),
        display_name: row.get("display_name"),
        superuser: row.get("superuser"),
    }
}

fn member_from_row(row: &PgRow) -> Result<ClassMemberData> {
    let role: String = row.get("role");

    Ok(ClassMemberData {
        id: row.get("id"),
        role: parse_stored_role(&role)?,
        user: user_from_row(row, "user_id"),
    })
}

fn set_from_row(row: &PgRow) -> Result<SetData> {
    let privacy: String = row.get("privacy");

    Ok(SetData {
        id: row.get("id"),
        name: row.get("name"),
        user_id: row.get("user_id"),
        class_id: row.get("class_id"),
        privacy: SetPrivacy::from_name(&privacy)
            .ok_or_else(|| stored_value_error("set privacy", &privacy))?,
    })
}

fn parse_stored_role(role: &str) -> Result<ClassRole> {
    ClassRole::from_name(role).ok_or_else(|| stored_value_error("role", role))
}

fn stored_value_error(what: &str, value: &str) -> DatabaseError {
    DatabaseError::Internal(format!("stored {what} {value} is not recognized").into())
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}
