mod page;

pub use page::*;

use log::info;
use thiserror::Error;

use crate::{
    ClassMemberData, ClassRole, ClassroomContext, ClassroomEvent, Database, DatabaseError,
    MemberRemoval, NewClassMember, PrimaryKey, RoleChange, UserData,
};

/// Manages class rosters: who is in a class, with which role, and under which
/// rules membership may change.
///
/// Every mutating operation serializes on a per-class lock for its whole
/// check-then-act sequence, so two concurrent operations cannot both observe
/// a stale admin count. The roster itself is always read back from the store.
pub struct MembershipManager<Db> {
    context: ClassroomContext<Db>,
}

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("You are not a member of this class")]
    NotAMember,
    #[error("You are not authorized to manage members of this class")]
    Unauthorized,
    #[error("User {0} is not a member of this class")]
    MemberNotFound(PrimaryKey),
    /// The operation would leave a non-empty class without an admin
    #[error("You are the last admin in this class")]
    LastAdmin,
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

type Result<T> = std::result::Result<T, MembershipError>;

impl<Db> MembershipManager<Db>
where
    Db: Database,
{
    pub fn new(context: &ClassroomContext<Db>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// True if the user may administer the class: they hold the admin role in
    /// it, or they are a platform administrator.
    pub fn is_authorized_for_class_admin(
        user: &UserData,
        membership: Option<&ClassMemberData>,
    ) -> bool {
        membership.map(|m| m.role.is_admin()).unwrap_or(false) || user.superuser
    }

    /// Adds a user to a class roster with the member role. The acting user
    /// must be able to administer the class.
    pub async fn add_member(
        &self,
        acting_user_id: PrimaryKey,
        class_id: PrimaryKey,
        target_user_id: PrimaryKey,
    ) -> Result<ClassMemberData> {
        let _guard = self.context.lock_class(class_id).await;

        let acting = self.context.database.user_by_id(acting_user_id).await?;
        let acting_membership = self.membership_of(class_id, acting_user_id).await?;

        if !Self::is_authorized_for_class_admin(&acting, acting_membership.as_ref()) {
            return Err(MembershipError::Unauthorized);
        }

        let member = self
            .context
            .database
            .create_class_member(NewClassMember {
                class_id,
                user_id: target_user_id,
                role: ClassRole::Member,
            })
            .await?;

        info!(
            "User {} joined class {}",
            member.user.username, class_id
        );

        self.context.emit(ClassroomEvent::MemberJoined {
            class_id,
            user_id: member.user.id,
            role: member.role,
        });

        Ok(member)
    }

    /// Removes a member from a class. Removing yourself is the same as
    /// leaving the class, and is subject to the same last-admin rule.
    ///
    /// A platform administrator may remove members of classes they don't
    /// belong to; everyone else must be an admin member of the class.
    pub async fn remove_member(
        &self,
        acting_user_id: PrimaryKey,
        class_id: PrimaryKey,
        target_user_id: PrimaryKey,
    ) -> Result<()> {
        let _guard = self.context.lock_class(class_id).await;

        let acting = self.context.database.user_by_id(acting_user_id).await?;
        let acting_membership = self.membership_of(class_id, acting_user_id).await?;

        if acting_membership.is_none() && !acting.superuser {
            return Err(MembershipError::NotAMember);
        }

        if !Self::is_authorized_for_class_admin(&acting, acting_membership.as_ref()) {
            return Err(MembershipError::Unauthorized);
        }

        if acting_user_id == target_user_id {
            return self.leave_locked(&acting, class_id).await;
        }

        let target = self
            .membership_of(class_id, target_user_id)
            .await?
            .ok_or(MembershipError::MemberNotFound(target_user_id))?;

        // Purge and removal commit together; neither outlives the other
        self.context
            .database
            .remove_class_member(MemberRemoval {
                class_id,
                user_id: target.user.id,
                privatize_sets: false,
                delete_class_when_empty: false,
            })
            .await?;

        info!(
            "User {} was removed from class {}",
            target.user.username, class_id
        );

        self.context.emit(ClassroomEvent::MemberLeft {
            class_id,
            user_id: target.user.id,
        });

        Ok(())
    }

    /// Changes a member's role. A sole admin cannot demote themselves; they
    /// must promote someone else first.
    pub async fn change_role(
        &self,
        acting_user_id: PrimaryKey,
        class_id: PrimaryKey,
        target_user_id: PrimaryKey,
        role_name: &str,
    ) -> Result<()> {
        let _guard = self.context.lock_class(class_id).await;

        let acting = self.context.database.user_by_id(acting_user_id).await?;
        let acting_membership = self
            .membership_of(class_id, acting_user_id)
            .await?
            .ok_or(MembershipError::NotAMember)?;

        if !Self::is_authorized_for_class_admin(&acting, Some(&acting_membership)) {
            return Err(MembershipError::Unauthorized);
        }

        let target = self
            .membership_of(class_id, target_user_id)
            .await?
            .ok_or(MembershipError::MemberNotFound(target_user_id))?;

        let class = self.context.database.class_by_id(class_id).await?;
        let admin_count = class.members.iter().filter(|m| m.role.is_admin()).count();

        if admin_count == 1 && target_user_id == acting_user_id && acting_membership.role.is_admin()
        {
            return Err(MembershipError::LastAdmin);
        }

        let role = ClassRole::from_name(role_name)
            .ok_or_else(|| MembershipError::UnknownRole(role_name.to_string()))?;

        // Members without the admin role no longer receive class
        // notifications, so demotions drop the pending ones
        self.context
            .database
            .set_member_role(RoleChange {
                class_id,
                user_id: target.user.id,
                role,
                purge_notifications: !role.is_admin(),
            })
            .await?;

        info!(
            "User {} is now {} in class {}",
            target.user.username, role, class_id
        );

        self.context.emit(ClassroomEvent::MemberRoleChanged {
            class_id,
            user_id: target.user.id,
            role,
        });

        Ok(())
    }

    /// Leaves a class. Permitted when another admin remains, when the leaver
    /// is a regular member, or when the leaver is the only member left — in
    /// which case the class itself is deleted.
    pub async fn leave_class(
        &self,
        acting_user_id: PrimaryKey,
        class_id: PrimaryKey,
    ) -> Result<()> {
        let _guard = self.context.lock_class(class_id).await;

        let acting = self.context.database.user_by_id(acting_user_id).await?;
        self.leave_locked(&acting, class_id).await
    }

    /// The leave sequence itself. The caller holds the class lock.
    async fn leave_locked(&self, acting: &UserData, class_id: PrimaryKey) -> Result<()> {
        let membership = self
            .membership_of(class_id, acting.id)
            .await?
            .ok_or(MembershipError::NotAMember)?;

        let class = self.context.database.class_by_id(class_id).await?;
        let admin_count = class.members.iter().filter(|m| m.role.is_admin()).count();
        let roster_size = class.members.len();

        let may_leave =
            admin_count >= 2 || roster_size == 1 || membership.role == ClassRole::Member;

        if !may_leave {
            return Err(MembershipError::LastAdmin);
        }

        // Membership removal, set privatization, notification purge and the
        // possible class deletion commit as one unit
        self.context
            .database
            .remove_class_member(MemberRemoval {
                class_id,
                user_id: acting.id,
                privatize_sets: true,
                delete_class_when_empty: true,
            })
            .await?;

        info!("User {} left class {}", acting.username, class.name);

        self.context.emit(ClassroomEvent::MemberLeft {
            class_id,
            user_id: acting.id,
        });

        if roster_size == 1 {
            info!("Class {} was deleted along with its last member", class.name);
            self.context.emit(ClassroomEvent::ClassDeleted { class_id });
        }

        Ok(())
    }

    /// Returns one page of the class roster. The caller must be a member of
    /// the class or a platform administrator.
    pub async fn all_members(
        &self,
        acting_user_id: PrimaryKey,
        class_id: PrimaryKey,
        params: PageParams,
    ) -> Result<MemberPage> {
        self.members_page(acting_user_id, class_id, None, params)
            .await
    }

    /// Like [MembershipManager::all_members], filtered by a case-insensitive
    /// substring match on usernames.
    pub async fn search_members(
        &self,
        acting_user_id: PrimaryKey,
        class_id: PrimaryKey,
        name_filter: &str,
        params: PageParams,
    ) -> Result<MemberPage> {
        self.members_page(acting_user_id, class_id, Some(name_filter), params)
            .await
    }

    /// True if the acting user is currently a member of the class
    pub async fn check_user_in_class(
        &self,
        acting_user_id: PrimaryKey,
        class_id: PrimaryKey,
    ) -> Result<bool> {
        Ok(self.membership_of(class_id, acting_user_id).await?.is_some())
    }

    async fn members_page(
        &self,
        acting_user_id: PrimaryKey,
        class_id: PrimaryKey,
        name_filter: Option<&str>,
        params: PageParams,
    ) -> Result<MemberPage> {
        let acting = self.context.database.user_by_id(acting_user_id).await?;
        let is_member = self
            .membership_of(class_id, acting_user_id)
            .await?
            .is_some();

        if !is_member && !acting.superuser {
            return Err(MembershipError::Unauthorized);
        }

        let class = self.context.database.class_by_id(class_id).await?;

        let mut members: Vec<_> = class
            .members
            .iter()
            .map(|m| MemberInfo {
                user_id: m.user.id,
                username: m.user.username.clone(),
                role: m.role,
            })
            .collect();

        if let Some(filter) = name_filter {
            let needle = filter.to_lowercase();
            members.retain(|m| m.username.to_lowercase().contains(&needle));
        }

        Ok(MemberPage::paginate(class.id, class.name, members, params))
    }

    async fn membership_of(
        &self,
        class_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> std::result::Result<Option<ClassMemberData>, DatabaseError> {
        match self
            .context
            .database
            .member_by_class_and_user(class_id, user_id)
            .await
        {
            Ok(member) => Ok(Some(member)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
