use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;

use crate::{
	db,
	extract::{Auth, Json, Path, Query},
	openapi::tag,
	route::model::{reply, Count, Data, Page, Reply},
	visibility::{self, RelationKind, RelationStatus},
	Database,
};

use super::{model, Error, RouteError};

/// List relations
/// Returns a page of the authenticated user's relations of a single type, newest first.
#[route(tag = tag::RELATION)]
pub async fn get_relations(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::RelationPath>,
	Query(query): Query<model::RelationQuery>,
) -> Result<Reply<Page<model::Relation>>, RouteError> {
	if path.user != auth.id() {
		return Err(Error::NotSelf.into());
	}

	let relations =
		db::relation::list(&database, auth.id(), query.kind, query.cursor(), query.count).await?;

	let ids = relations
		.iter()
		.map(|relation| relation.relation_user_id)
		.collect::<Vec<_>>();
	let users = db::user::find_many(&database, &ids).await?;

	Ok(reply(Page::new(model::assemble(relations, users))))
}

/// Count relations
/// Returns how many relations of a single type the authenticated user has.
#[route(tag = tag::RELATION)]
pub async fn count_relations(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::RelationPath>,
	Query(query): Query<model::RelationTypeInput>,
) -> Result<Reply<Count>, RouteError> {
	if path.user != auth.id() {
		return Err(Error::NotSelf.into());
	}

	let count = db::relation::count(&database, auth.id(), query.kind).await?;

	Ok(reply(Count { count }))
}

/// Get relation status
/// Returns how the authenticated user and another user relate to each other.
#[route(tag = tag::RELATION)]
pub async fn get_relation_status(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::RelationUserPath>,
) -> Result<Reply<Data<RelationStatus>>, RouteError> {
	if path.user != auth.id() {
		return Err(Error::NotSelf.into());
	}

	let status = visibility::relation_status(&database, auth.id(), path.relation_user).await?;

	Ok(reply(Data::new(status)))
}

/// Add relation
/// Follows or blocks another user. Following is refused while either user blocks the other.
#[route(tag = tag::RELATION, response(status = 201, shape = "Reply<Data<model::Relation>>", description = "Relation added."))]
pub async fn add_relation(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::RelationUserPath>,
	Json(input): Json<model::RelationTypeInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	if path.user != auth.id() {
		return Err(Error::NotSelf.into());
	}

	if path.relation_user == auth.id() {
		return Err(Error::SelfRelation.into());
	}

	if !input.kind.is_stored() {
		return Err(Error::NotStorable(input.kind).into());
	}

	let relation_user = db::user::find(&database, path.relation_user)
		.await?
		.ok_or(Error::UnknownUser(path.relation_user))?;

	if input.kind == RelationKind::Following {
		visibility::ensure_visible::<Error>(&database, auth.id(), relation_user.id).await?;
	}

	let relation = db::relation::insert(&database, auth.id(), relation_user.id, input.kind)
		.await
		.map_err(|e| {
			if db::is_unique_violation(&e) {
				Error::AlreadyExists(input.kind).into()
			} else {
				RouteError::from(e)
			}
		})?;

	tracing::info!(
		user = %auth.id(),
		relation_user = %relation_user.id,
		kind = %input.kind,
		"relation added"
	);

	Ok((
		StatusCode::CREATED,
		reply(Data::new(model::Relation::new(relation, relation_user))),
	))
}

/// Delete relation
/// Removes a relation of the given type. Removing a follower deletes their follow. Missing relations are ignored.
#[route(tag = tag::RELATION, response(status = 204, description = "Relation removed."))]
pub async fn delete_relation(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::RelationUserPath>,
	Query(query): Query<model::RelationTypeInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	if path.user != auth.id() {
		return Err(Error::NotSelf.into());
	}

	db::relation::delete(&database, auth.id(), path.relation_user, query.kind).await?;

	Ok(StatusCode::NO_CONTENT.into_response())
}
