use async_trait::async_trait;
use thiserror::Error;

mod data;
pub use data::*;

mod pg;
pub use pg::*;

#[cfg(test)]
pub(crate) mod memory;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

impl DatabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Represents a type that can fetch and mutate studydeck data in a database.
///
/// The composite mutations ([Database::set_member_role] and
/// [Database::remove_class_member]) apply every write they describe in a
/// single transaction; a failed sub-step leaves no partial mutation behind.
#[async_trait]
pub trait Database: Send + Sync + 'static {
    async fn check_for_superuser(&self) -> Result<bool>;
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData>;
    async fn user_by_username(&self, username: &str) -> Result<UserData>;
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;

    async fn session_by_token(&self, token: &str) -> Result<SessionData>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    async fn delete_session_by_token(&self, token: &str) -> Result<()>;
    async fn clear_expired_sessions(&self) -> Result<()>;

    async fn class_by_id(&self, class_id: PrimaryKey) -> Result<ClassData>;
    async fn classes_for_user(&self, user_id: PrimaryKey) -> Result<Vec<ClassData>>;
    async fn create_class(&self, new_class: NewClass) -> Result<ClassData>;
    async fn delete_class(&self, class_id: PrimaryKey) -> Result<()>;

    async fn member_by_class_and_user(
        &self,
        class_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<ClassMemberData>;
    async fn create_class_member(&self, new_member: NewClassMember) -> Result<ClassMemberData>;
    async fn set_member_role(&self, change: RoleChange) -> Result<ClassMemberData>;
    async fn remove_class_member(&self, removal: MemberRemoval) -> Result<()>;

    async fn create_set(&self, new_set: NewSet) -> Result<SetData>;
    async fn sets_for_user(&self, user_id: PrimaryKey) -> Result<Vec<SetData>>;

    /// Purges the user's notifications that belong to the class. Purging a
    /// user with nothing to purge is not an error.
    async fn purge_class_notifications_for_user(
        &self,
        class_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<()>;
    async fn count_class_notifications_for_user(
        &self,
        class_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<u64>;
}
