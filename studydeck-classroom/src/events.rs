use crossbeam::channel::{Receiver, Sender};

use crate::{ClassRole, PrimaryKey};

pub type EventSender = Sender<ClassroomEvent>;
pub type EventReceiver = Receiver<ClassroomEvent>;

/// Events emitted by the classroom system after a successful commit
#[derive(Debug, Clone)]
pub enum ClassroomEvent {
    /// A user became a member of a class
    MemberJoined {
        class_id: PrimaryKey,
        user_id: PrimaryKey,
        role: ClassRole,
    },
    /// A user's membership in a class ended, by leaving or removal
    MemberLeft {
        class_id: PrimaryKey,
        user_id: PrimaryKey,
    },
    /// A member's role in a class changed
    MemberRoleChanged {
        class_id: PrimaryKey,
        user_id: PrimaryKey,
        role: ClassRole,
    },
    /// A class lost its last member and was deleted
    ClassDeleted { class_id: PrimaryKey },
}
