use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use studydeck_classroom::{NewSet, SetPrivacy};

use crate::{
    auth::Session,
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{NewSetSchema, ValidatedJson},
    serialized::{Set, ToSerialized},
};

#[utoipa::path(
    post,
    path = "/v1/sets",
    tag = "sets",
    request_body = NewSetSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Set)
    )
)]
async fn create_set(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewSetSchema>,
) -> ServerResult<Json<Set>> {
    let privacy = SetPrivacy::from_name(&body.privacy)
        .ok_or_else(|| ServerError::UnknownPrivacy(body.privacy.clone()))?;

    let set = context
        .classroom
        .sets
        .create_set(NewSet {
            name: body.name,
            user_id: session.user().id,
            class_id: body.class_id,
            privacy,
        })
        .await?;

    Ok(Json(set.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/sets",
    tag = "sets",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Set>)
    )
)]
async fn my_sets(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Set>>> {
    let sets = context
        .classroom
        .sets
        .sets_for_user(session.user().id)
        .await?;

    Ok(Json(sets.to_serialized()))
}

pub fn router() -> Router<ServerContext> {
    Router::new()
        .route("/", post(create_set))
        .route("/", get(my_sets))
}
