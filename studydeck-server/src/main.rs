use std::{env, sync::Arc, thread};

use log::info;
use studydeck_classroom::{Classroom, ClassroomEvent, PgDatabase};
use studydeck_server::{logging, run_server};

#[tokio::main]
async fn main() {
    logging::init_logger();

    let database_url =
        env::var("STUDYDECK_DATABASE_URL").expect("STUDYDECK_DATABASE_URL is set");

    let database = PgDatabase::new(&database_url)
        .await
        .expect("database is reachable");

    let classroom = Arc::new(Classroom::new(database));

    let events = classroom.events();
    thread::spawn(move || {
        for event in events.iter() {
            log_event(event);
        }
    });

    info!("Starting studydeck server");
    run_server(classroom).await;
}

fn log_event(event: ClassroomEvent) {
    match event {
        ClassroomEvent::MemberJoined {
            class_id, user_id, ..
        } => info!("event: user {user_id} joined class {class_id}"),
        ClassroomEvent::MemberLeft { class_id, user_id } => {
            info!("event: user {user_id} left class {class_id}")
        }
        ClassroomEvent::MemberRoleChanged {
            class_id,
            user_id,
            role,
        } => info!("event: user {user_id} in class {class_id} is now {role}"),
        ClassroomEvent::ClassDeleted { class_id } => {
            info!("event: class {class_id} was deleted")
        }
    }
}
