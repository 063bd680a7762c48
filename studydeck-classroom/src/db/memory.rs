//! An in-memory [Database] used by the test suites. Mirrors the relational
//! schema closely enough that cascade behavior can be observed.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    ClassData, ClassMemberData, ClassRole, Database, DatabaseError, DatabaseResult, MemberRemoval,
    NewClass, NewClassMember, NewSession, NewSet, NewUser, PrimaryKey, Result, RoleChange,
    SessionData, SetData, SetPrivacy, UserData,
};

#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: PrimaryKey,
    users: Vec<UserData>,
    sessions: Vec<StoredSession>,
    classes: Vec<StoredClass>,
    members: Vec<StoredMember>,
    sets: Vec<SetData>,
    notifications: Vec<StoredNotification>,
}

#[derive(Clone)]
struct StoredSession {
    id: PrimaryKey,
    token: String,
    user_id: PrimaryKey,
    expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone)]
struct StoredClass {
    id: PrimaryKey,
    name: String,
}

#[derive(Clone)]
struct StoredMember {
    id: PrimaryKey,
    class_id: PrimaryKey,
    user_id: PrimaryKey,
    role: ClassRole,
}

#[derive(Clone)]
struct StoredNotification {
    class_id: PrimaryKey,
    user_id: PrimaryKey,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Default::default()
    }

    /// Seeds a notification row, so purges have something to observe
    pub fn add_notification(&self, class_id: PrimaryKey, user_id: PrimaryKey) {
        self.state.lock().notifications.push(StoredNotification {
            class_id,
            user_id,
        });
    }
}

impl State {
    fn next_id(&mut self) -> PrimaryKey {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, user_id: PrimaryKey) -> Result<UserData> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })
    }

    fn member(&self, class_id: PrimaryKey, user_id: PrimaryKey) -> Result<ClassMemberData> {
        let member = self
            .members
            .iter()
            .find(|m| m.class_id == class_id && m.user_id == user_id)
            .ok_or(DatabaseError::NotFound {
                resource: "class member",
                identifier: "class:user",
            })?;

        Ok(ClassMemberData {
            id: member.id,
            role: member.role,
            user: self.user(member.user_id)?,
        })
    }

    fn class(&self, class_id: PrimaryKey) -> Result<ClassData> {
        let class = self
            .classes
            .iter()
            .find(|c| c.id == class_id)
            .ok_or(DatabaseError::NotFound {
                resource: "class",
                identifier: "id",
            })?;

        let members = self
            .members
            .iter()
            .filter(|m| m.class_id == class_id)
            .map(|m| self.member(m.class_id, m.user_id))
            .collect::<Result<Vec<_>>>()?;

        Ok(ClassData {
            id: class.id,
            name: class.name.clone(),
            members,
        })
    }

    fn drop_class(&mut self, class_id: PrimaryKey) {
        self.classes.retain(|c| c.id != class_id);
        self.members.retain(|m| m.class_id != class_id);
        self.notifications.retain(|n| n.class_id != class_id);

        for set in self.sets.iter_mut() {
            if set.class_id == Some(class_id) {
                set.class_id = None;
            }
        }
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn check_for_superuser(&self) -> Result<bool> {
        Ok(self.state.lock().users.iter().any(|u| u.superuser))
    }

    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        self.state.lock().user(user_id)
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        self.state
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "username",
            })
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.user_by_username(&new_user.username)
            .await
            .conflict_or_ok("user", "username", &new_user.username)?;

        let mut state = self.state.lock();
        let user = UserData {
            id: state.next_id(),
            username: new_user.username,
            password: new_user.password,
            display_name: new_user.display_name,
            superuser: new_user.superuser,
        };

        state.users.push(user.clone());
        Ok(user)
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let state = self.state.lock();
        let session = state
            .sessions
            .iter()
            .find(|s| s.token == token)
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            })?;

        Ok(SessionData {
            id: session.id,
            token: session.token.clone(),
            expires_at: session.expires_at,
            user: state.user(session.user_id)?,
        })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_token(&new_session.token)
            .await
            .conflict_or_ok("session", "token", &new_session.token)?;

        let token = new_session.token.clone();

        {
            let mut state = self.state.lock();
            let id = state.next_id();
            state.sessions.push(StoredSession {
                id,
                token: new_session.token,
                user_id: new_session.user_id,
                expires_at: new_session.expires_at,
            });
        }

        self.session_by_token(&token).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        let _ = self.session_by_token(token).await?;
        self.state.lock().sessions.retain(|s| s.token != token);
        Ok(())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        let now = chrono::Utc::now();
        self.state.lock().sessions.retain(|s| s.expires_at > now);
        Ok(())
    }

    async fn class_by_id(&self, class_id: PrimaryKey) -> Result<ClassData> {
        self.state.lock().class(class_id)
    }

    async fn classes_for_user(&self, user_id: PrimaryKey) -> Result<Vec<ClassData>> {
        let state = self.state.lock();
        state
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| state.class(m.class_id))
            .collect()
    }

    async fn create_class(&self, new_class: NewClass) -> Result<ClassData> {
        let class_id = {
            let mut state = self.state.lock();
            state.user(new_class.user_id)?;

            let class_id = state.next_id();
            state.classes.push(StoredClass {
                id: class_id,
                name: new_class.name,
            });

            let member_id = state.next_id();
            state.members.push(StoredMember {
                id: member_id,
                class_id,
                user_id: new_class.user_id,
                role: ClassRole::Admin,
            });

            class_id
        };

        self.class_by_id(class_id).await
    }

    async fn delete_class(&self, class_id: PrimaryKey) -> Result<()> {
        let mut state = self.state.lock();
        state.class(class_id)?;
        state.drop_class(class_id);
        Ok(())
    }

    async fn member_by_class_and_user(
        &self,
        class_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<ClassMemberData> {
        self.state.lock().member(class_id, user_id)
    }

    async fn create_class_member(&self, new_member: NewClassMember) -> Result<ClassMemberData> {
        self.member_by_class_and_user(new_member.class_id, new_member.user_id)
            .await
            .conflict_or_ok(
                "class member",
                "class:user",
                format!("{}:{}", new_member.class_id, new_member.user_id).as_str(),
            )?;

        let mut state = self.state.lock();
        state.class(new_member.class_id)?;
        state.user(new_member.user_id)?;

        let id = state.next_id();
        state.members.push(StoredMember {
            id,
            class_id: new_member.class_id,
            user_id: new_member.user_id,
            role: new_member.role,
        });

        state.member(new_member.class_id, new_member.user_id)
    }

    async fn set_member_role(&self, change: RoleChange) -> Result<ClassMemberData> {
        let mut state = self.state.lock();
        state.member(change.class_id, change.user_id)?;

        for member in state.members.iter_mut() {
            if member.class_id == change.class_id && member.user_id == change.user_id {
                member.role = change.role;
            }
        }

        if change.purge_notifications {
            state
                .notifications
                .retain(|n| !(n.class_id == change.class_id && n.user_id == change.user_id));
        }

        state.member(change.class_id, change.user_id)
    }

    async fn remove_class_member(&self, removal: MemberRemoval) -> Result<()> {
        let mut state = self.state.lock();
        let member = state.member(removal.class_id, removal.user_id)?;

        state
            .notifications
            .retain(|n| !(n.class_id == removal.class_id && n.user_id == removal.user_id));
        state.members.retain(|m| m.id != member.id);

        if removal.privatize_sets {
            for set in state.sets.iter_mut() {
                if set.user_id == removal.user_id && set.class_id == Some(removal.class_id) {
                    set.privacy = SetPrivacy::Private;
                }
            }
        }

        if removal.delete_class_when_empty {
            let remaining = state
                .members
                .iter()
                .filter(|m| m.class_id == removal.class_id)
                .count();

            if remaining == 0 {
                state.drop_class(removal.class_id);
            }
        }

        Ok(())
    }

    async fn create_set(&self, new_set: NewSet) -> Result<SetData> {
        let mut state = self.state.lock();
        state.user(new_set.user_id)?;

        let set = SetData {
            id: state.next_id(),
            name: new_set.name,
            user_id: new_set.user_id,
            class_id: new_set.class_id,
            privacy: new_set.privacy,
        };

        state.sets.push(set.clone());
        Ok(set)
    }

    async fn sets_for_user(&self, user_id: PrimaryKey) -> Result<Vec<SetData>> {
        Ok(self
            .state
            .lock()
            .sets
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn purge_class_notifications_for_user(
        &self,
        class_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<()> {
        self.state
            .lock()
            .notifications
            .retain(|n| !(n.class_id == class_id && n.user_id == user_id));
        Ok(())
    }

    async fn count_class_notifications_for_user(
        &self,
        class_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<u64> {
        Ok(self
            .state
            .lock()
            .notifications
            .iter()
            .filter(|n| n.class_id == class_id && n.user_id == user_id)
            .count() as u64)
    }
}
