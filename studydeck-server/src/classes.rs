use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use studydeck_classroom::{NewClass, PageParams};
use utoipa::IntoParams;

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    schemas::{AddMemberSchema, ChangeRoleSchema, NewClassSchema, ValidatedJson},
    serialized::{Class, ClassMember, MembershipStatus, RosterPage, ToSerialized},
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RosterQuery {
    /// Zero-based page index
    page: Option<u32>,
    /// Page length
    size: Option<u32>,
    /// Case-insensitive username filter
    name: Option<String>,
}

impl RosterQuery {
    fn page_params(&self) -> PageParams {
        let defaults = PageParams::default();

        PageParams {
            page: self.page.unwrap_or(defaults.page),
            size: self.size.unwrap_or(defaults.size),
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/classes",
    tag = "classes",
    request_body = NewClassSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Class)
    )
)]
async fn create_class(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewClassSchema>,
) -> ServerResult<Json<Class>> {
    let class = context
        .classroom
        .create_class(NewClass {
            name: body.name,
            user_id: session.user().id,
        })
        .await?;

    Ok(Json(class.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/classes",
    tag = "classes",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Class>)
    )
)]
async fn my_classes(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Class>>> {
    let classes = context
        .classroom
        .classes_for_user(session.user().id)
        .await?;

    Ok(Json(classes.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/classes/{id}/members",
    tag = "classes",
    params(RosterQuery),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = RosterPage)
    )
)]
async fn members(
    session: Session,
    State(context): State<ServerContext>,
    Path(class_id): Path<i32>,
    Query(query): Query<RosterQuery>,
) -> ServerResult<Json<RosterPage>> {
    let user_id = session.user().id;
    let params = query.page_params();

    let page = match &query.name {
        Some(filter) => {
            context
                .classroom
                .members
                .search_members(user_id, class_id, filter, params)
                .await?
        }
        None => {
            context
                .classroom
                .members
                .all_members(user_id, class_id, params)
                .await?
        }
    };

    Ok(Json(page.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/classes/{id}/members",
    tag = "classes",
    request_body = AddMemberSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = ClassMember)
    )
)]
async fn add_member(
    session: Session,
    State(context): State<ServerContext>,
    Path(class_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<AddMemberSchema>,
) -> ServerResult<Json<ClassMember>> {
    let member = context
        .classroom
        .members
        .add_member(session.user().id, class_id, body.user_id)
        .await?;

    Ok(Json(member.to_serialized()))
}

#[utoipa::path(
    patch,
    path = "/v1/classes/{id}/members/{user_id}",
    tag = "classes",
    request_body = ChangeRoleSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Role was changed"),
        (status = 409, description = "The class would lose its last admin")
    )
)]
async fn change_role(
    session: Session,
    State(context): State<ServerContext>,
    Path((class_id, user_id)): Path<(i32, i32)>,
    ValidatedJson(body): ValidatedJson<ChangeRoleSchema>,
) -> ServerResult<()> {
    context
        .classroom
        .members
        .change_role(session.user().id, class_id, user_id, &body.role)
        .await?;

    Ok(())
}

#[utoipa::path(
    delete,
    path = "/v1/classes/{id}/members/{user_id}",
    tag = "classes",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Member was removed")
    )
)]
async fn remove_member(
    session: Session,
    State(context): State<ServerContext>,
    Path((class_id, user_id)): Path<(i32, i32)>,
) -> ServerResult<()> {
    context
        .classroom
        .members
        .remove_member(session.user().id, class_id, user_id)
        .await?;

    Ok(())
}

#[utoipa::path(
    delete,
    path = "/v1/classes/{id}/members/me",
    tag = "classes",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Left the class"),
        (status = 409, description = "The class would lose its last admin")
    )
)]
async fn leave_class(
    session: Session,
    State(context): State<ServerContext>,
    Path(class_id): Path<i32>,
) -> ServerResult<()> {
    context
        .classroom
        .members
        .leave_class(session.user().id, class_id)
        .await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/classes/{id}/members/me",
    tag = "classes",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = MembershipStatus)
    )
)]
async fn membership(
    session: Session,
    State(context): State<ServerContext>,
    Path(class_id): Path<i32>,
) -> ServerResult<Json<MembershipStatus>> {
    let member = context
        .classroom
        .members
        .check_user_in_class(session.user().id, class_id)
        .await?;

    Ok(Json(MembershipStatus { member }))
}

pub fn router() -> Router<ServerContext> {
    Router::new()
        .route("/", post(create_class))
        .route("/", get(my_classes))
        .route("/:id/members", get(members))
        .route("/:id/members", post(add_member))
        .route("/:id/members/me", delete(leave_class))
        .route("/:id/members/me", get(membership))
        .route("/:id/members/:user_id", patch(change_role))
        .route("/:id/members/:user_id", delete(remove_member))
}
