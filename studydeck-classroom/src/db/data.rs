use chrono::{DateTime, Utc};

use crate::ClassRole;

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// A studydeck account
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: PrimaryKey,
    pub username: String,
    pub password: String,
    pub display_name: String,
    /// Platform-level administrator. Grants class administration rights
    /// everywhere, independently of per-class roles.
    pub superuser: bool,
}

/// Login session data for authentication
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: PrimaryKey,
    /// The session token, or key if you will
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// The user that is logged in
    pub user: UserData,
}

/// A class and its roster. The roster is loaded with the class and is never
/// mutated in place; after a write the class is queried again.
#[derive(Debug, Clone)]
pub struct ClassData {
    pub id: PrimaryKey,
    pub name: String,
    pub members: Vec<ClassMemberData>,
}

/// A member of a class
#[derive(Debug, Clone)]
pub struct ClassMemberData {
    pub id: PrimaryKey,
    pub role: ClassRole,
    pub user: UserData,
}

/// Who may see a flashcard set.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SetPrivacy {
    Public,
    /// Visible to members of the class the set is shared with.
    Class,
    Private,
}

impl SetPrivacy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "PUBLIC" => Some(Self::Public),
            "CLASS" => Some(Self::Class),
            "PRIVATE" => Some(Self::Private),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Class => "CLASS",
            Self::Private => "PRIVATE",
        }
    }
}

/// A flashcard set, optionally shared with a class
#[derive(Debug, Clone)]
pub struct SetData {
    pub id: PrimaryKey,
    pub name: String,
    pub user_id: PrimaryKey,
    pub class_id: Option<PrimaryKey>,
    pub privacy: SetPrivacy,
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub superuser: bool,
}

#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub user_id: PrimaryKey,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewClass {
    pub name: String,
    /// The creator of the class, added to the roster as its first admin
    pub user_id: PrimaryKey,
}

#[derive(Debug)]
pub struct NewClassMember {
    pub class_id: PrimaryKey,
    pub user_id: PrimaryKey,
    pub role: ClassRole,
}

#[derive(Debug)]
pub struct NewSet {
    pub name: String,
    pub user_id: PrimaryKey,
    pub class_id: Option<PrimaryKey>,
    pub privacy: SetPrivacy,
}

/// One role change, applied by the store in a single transaction.
///
/// The flags are decided by the membership engine; the store only executes
/// them.
#[derive(Debug)]
pub struct RoleChange {
    pub class_id: PrimaryKey,
    pub user_id: PrimaryKey,
    pub role: ClassRole,
    /// Purge the member's notifications for this class along with the change
    pub purge_notifications: bool,
}

/// One membership removal, applied by the store in a single transaction.
#[derive(Debug)]
pub struct MemberRemoval {
    pub class_id: PrimaryKey,
    pub user_id: PrimaryKey,
    /// Downgrade the member's sets shared with this class to private
    pub privatize_sets: bool,
    /// Delete the class itself if its roster is empty after the removal
    pub delete_class_when_empty: bool,
}
