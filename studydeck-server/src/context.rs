use std::sync::Arc;

use axum::extract::FromRef;
use studydeck_classroom::{Classroom, PgDatabase};

/// The classroom system as the server hosts it
pub type ClassroomInstance = Arc<Classroom<PgDatabase>>;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub classroom: ClassroomInstance,
}
