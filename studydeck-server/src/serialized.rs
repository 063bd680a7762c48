//! All schemas that are exposed from endpoints are defined here
//! along with the conversion impls

use serde::Serialize;
use studydeck_classroom::{
    ClassData, ClassMemberData, MemberInfo, MemberPage, SessionData, SetData, UserData,
};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    id: i32,
    username: String,
    display_name: String,
    superuser: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResult {
    token: String,
    user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Class {
    id: i32,
    name: String,
    members: Vec<ClassMember>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassMember {
    id: i32,
    role: String,
    user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RosterEntry {
    user_id: i32,
    username: String,
    role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RosterPage {
    class_id: i32,
    class_name: String,
    members: Vec<RosterEntry>,
    page: u32,
    page_size: u32,
    total_pages: u32,
    total_elements: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Set {
    id: i32,
    name: String,
    class_id: Option<i32>,
    privacy: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MembershipStatus {
    pub member: bool,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            superuser: self.superuser,
        }
    }
}

impl ToSerialized<LoginResult> for SessionData {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            token: self.token.clone(),
            user: self.user.to_serialized(),
        }
    }
}

impl ToSerialized<Class> for ClassData {
    fn to_serialized(&self) -> Class {
        Class {
            id: self.id,
            name: self.name.clone(),
            members: self.members.to_serialized(),
        }
    }
}

impl ToSerialized<ClassMember> for ClassMemberData {
    fn to_serialized(&self) -> ClassMember {
        ClassMember {
            id: self.id,
            role: self.role.to_string(),
            user: self.user.to_serialized(),
        }
    }
}

impl ToSerialized<RosterEntry> for MemberInfo {
    fn to_serialized(&self) -> RosterEntry {
        RosterEntry {
            user_id: self.user_id,
            username: self.username.clone(),
            role: self.role.to_string(),
        }
    }
}

impl ToSerialized<RosterPage> for MemberPage {
    fn to_serialized(&self) -> RosterPage {
        RosterPage {
            class_id: self.class_id,
            class_name: self.class_name.clone(),
            members: self.members.to_serialized(),
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            total_elements: self.total_elements,
        }
    }
}

impl ToSerialized<Set> for SetData {
    fn to_serialized(&self) -> Set {
        Set {
            id: self.id,
            name: self.name.clone(),
            class_id: self.class_id,
            privacy: self.privacy.as_str().to_string(),
        }
    }
}
