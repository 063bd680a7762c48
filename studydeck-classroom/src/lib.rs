mod auth;
mod db;
mod events;
mod memberships;
mod roles;
mod sets;
mod util;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub use auth::*;
pub use db::*;
pub use events::*;
pub use memberships::*;
pub use roles::*;
pub use sets::*;

/// The studydeck classroom system, facilitating class membership, roles,
/// authentication, and more.
pub struct Classroom<Db> {
    context: ClassroomContext<Db>,
    events: EventReceiver,

    pub auth: Auth<Db>,
    pub members: MembershipManager<Db>,
    pub sets: SetManager<Db>,
}

/// A type passed to the managers of the classroom system, to access the
/// store, emit events, and serialize per-class mutations.
pub struct ClassroomContext<Db> {
    pub database: Arc<Db>,
    pub(crate) events: EventSender,
    pub(crate) class_locks: Arc<DashMap<PrimaryKey, Arc<Mutex<()>>>>,
}

impl<Db> Classroom<Db>
where
    Db: Database,
{
    pub fn new(database: Db) -> Self {
        let database = Arc::new(database);
        let (sender, receiver) = crossbeam::channel::unbounded();

        let context = ClassroomContext {
            database: database.clone(),
            events: sender,
            class_locks: Default::default(),
        };

        Self {
            auth: Auth::new(&database),
            members: MembershipManager::new(&context),
            sets: SetManager::new(&context),
            context,
            events: receiver,
        }
    }

    /// Returns a receiver for the events emitted by the system
    pub fn events(&self) -> EventReceiver {
        self.events.clone()
    }

    /// Creates a new class, with the creator as its first admin
    pub async fn create_class(&self, new_class: NewClass) -> Result<ClassData> {
        let class = self.context.database.create_class(new_class).await?;

        if let Some(creator) = class.members.first() {
            self.context.emit(ClassroomEvent::MemberJoined {
                class_id: class.id,
                user_id: creator.user.id,
                role: creator.role,
            });
        }

        Ok(class)
    }

    pub async fn class_by_id(&self, class_id: PrimaryKey) -> Result<ClassData> {
        self.context.database.class_by_id(class_id).await
    }

    /// All classes the user is a member of
    pub async fn classes_for_user(&self, user_id: PrimaryKey) -> Result<Vec<ClassData>> {
        self.context.database.classes_for_user(user_id).await
    }
}

impl<Db> ClassroomContext<Db>
where
    Db: Database,
{
    pub(crate) fn emit(&self, event: ClassroomEvent) {
        // Nobody may be listening, which is fine
        let _ = self.events.send(event);
    }

    /// Takes the class's mutation lock. Mutating membership operations hold
    /// this across their whole check-then-act sequence, so concurrent
    /// operations on one class cannot interleave between the admin-count
    /// check and the write.
    pub(crate) async fn lock_class(&self, class_id: PrimaryKey) -> OwnedMutexGuard<()> {
        let lock = self
            .class_locks
            .entry(class_id)
            .or_default()
            .clone();

        lock.lock_owned().await
    }
}

impl<Db> Clone for ClassroomContext<Db>
where
    Db: Database,
{
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            events: self.events.clone(),
            class_locks: self.class_locks.clone(),
        }
    }
}
