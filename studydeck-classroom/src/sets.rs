use thiserror::Error;

use crate::{ClassroomContext, Database, DatabaseError, NewSet, PrimaryKey, SetData};

/// Manages flashcard sets, as far as the classroom system cares about them:
/// creation, listing, and the class-sharing rule.
pub struct SetManager<Db> {
    context: ClassroomContext<Db>,
}

#[derive(Debug, Error)]
pub enum SetError {
    /// Sharing a set with a class requires being a member of that class
    #[error("You are not a member of this class")]
    NotAMember,
    #[error(transparent)]
    Db(DatabaseError),
}

impl<Db> SetManager<Db>
where
    Db: Database,
{
    pub fn new(context: &ClassroomContext<Db>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn create_set(&self, new_set: NewSet) -> Result<SetData, SetError> {
        if let Some(class_id) = new_set.class_id {
            self.context
                .database
                .member_by_class_and_user(class_id, new_set.user_id)
                .await
                .map_err(|e| match e {
                    e if e.is_not_found() => SetError::NotAMember,
                    e => SetError::Db(e),
                })?;
        }

        self.context
            .database
            .create_set(new_set)
            .await
            .map_err(SetError::Db)
    }

    pub async fn sets_for_user(&self, user_id: PrimaryKey) -> Result<Vec<SetData>, DatabaseError> {
        self.context.database.sets_for_user(user_id).await
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::db::memory::MemoryDatabase;
    use crate::{NewClass, NewUser, SetPrivacy};

    fn manager() -> (Arc<MemoryDatabase>, SetManager<MemoryDatabase>) {
        let database = Arc::new(MemoryDatabase::new());
        let (sender, _receiver) = crossbeam::channel::unbounded();

        let context = ClassroomContext {
            database: database.clone(),
            events: sender,
            class_locks: Default::default(),
        };

        (database, SetManager::new(&context))
    }

    #[tokio::test]
    async fn test_sharing_a_set_requires_class_membership() {
        let (db, sets) = manager();

        let anna = db
            .create_user(NewUser {
                username: "anna".to_string(),
                password: "secret".to_string(),
                display_name: "anna".to_string(),
                superuser: false,
            })
            .await
            .unwrap();
        let dora = db
            .create_user(NewUser {
                username: "dora".to_string(),
                password: "secret".to_string(),
                display_name: "dora".to_string(),
                superuser: false,
            })
            .await
            .unwrap();

        let class = db
            .create_class(NewClass {
                name: "biology".to_string(),
                user_id: anna.id,
            })
            .await
            .unwrap();

        let shared = sets
            .create_set(NewSet {
                name: "cell anatomy".to_string(),
                user_id: anna.id,
                class_id: Some(class.id),
                privacy: SetPrivacy::Class,
            })
            .await
            .unwrap();
        assert_eq!(shared.class_id, Some(class.id));

        let rejected = sets
            .create_set(NewSet {
                name: "trespassing".to_string(),
                user_id: dora.id,
                class_id: Some(class.id),
                privacy: SetPrivacy::Class,
            })
            .await;
        assert!(matches!(rejected, Err(SetError::NotAMember)));
    }
}
