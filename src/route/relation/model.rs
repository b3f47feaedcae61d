use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
	db::{relation::DbRelation, user::DbUser},
	pagination::{self, Cursor},
	route::user::model::User,
	visibility::RelationKind,
};

/// A relation between the requester and another user, seen from the requester's side.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Relation {
	pub id: Uuid,
	/// Always the requester.
	pub user_id: Uuid,
	pub relation_user_id: Uuid,
	pub relation_type: RelationKind,
	/// The user on the other side of the relation.
	pub relation_user: User,
	pub created_at: DateTime<Utc>,
}

impl Relation {
	pub fn new(relation: DbRelation, relation_user: DbUser) -> Self {
		Self {
			id: relation.id,
			user_id: relation.user_id,
			relation_user_id: relation.relation_user_id,
			relation_type: relation.relation_type,
			relation_user: relation_user.into(),
			created_at: relation.created_at,
		}
	}
}

/// Joins relation rows with their related users, keeping the row order.
///
/// Each related user appears in at most one row of a listing. Rows whose
/// user is missing from `users` are dropped.
pub fn assemble(relations: Vec<DbRelation>, users: Vec<DbUser>) -> Vec<Relation> {
	let mut users = users
		.into_iter()
		.map(|user| (user.id, user))
		.collect::<HashMap<_, _>>();

	relations
		.into_iter()
		.filter_map(|relation| {
			let user = users.remove(&relation.relation_user_id)?;

			Some(Relation::new(relation, user))
		})
		.collect()
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RelationPath {
	pub user: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RelationUserPath {
	pub user: Uuid,
	/// The user on the other side of the relation.
	pub relation_user: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[validate(schema(function = "validate_relation_cursor"))]
pub struct RelationQuery {
	/// The type of relation to list.
	#[serde(rename = "type")]
	pub kind: RelationKind,
	/// The creation time of the last relation seen, defaults to now.
	pub last_seen_relation_created_at: Option<DateTime<Utc>>,
	pub last_seen_relation_id: Option<Uuid>,
	/// The number of relations to return.
	#[validate(range(min = 1, max = 50))]
	#[serde(default = "pagination::default_count")]
	pub count: i64,
}

fn validate_relation_cursor(query: &RelationQuery) -> Result<(), ValidationError> {
	pagination::validate_cursor(
		query.last_seen_relation_created_at,
		query.last_seen_relation_id,
	)
}

impl RelationQuery {
	pub fn cursor(&self) -> Cursor {
		Cursor::new(
			self.last_seen_relation_created_at,
			self.last_seen_relation_id,
		)
	}
}

/// Selects a single relation type.
#[derive(Deserialize, Validate, JsonSchema)]
pub struct RelationTypeInput {
	#[serde(rename = "type")]
	pub kind: RelationKind,
}

#[cfg(test)]
mod test {
	use chrono::Utc;
	use uuid::Uuid;

	use super::*;

	fn user(id: Uuid, username: &str) -> DbUser {
		DbUser {
			id,
			email: format!("{username}@example.com"),
			username: username.into(),
			name: username.into(),
			about: None,
			avatar_url: None,
			password: String::new(),
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	fn relation(user_id: Uuid, relation_user_id: Uuid) -> DbRelation {
		DbRelation {
			id: Uuid::new_v4(),
			user_id,
			relation_user_id,
			relation_type: RelationKind::Follower,
			created_at: Utc::now(),
		}
	}

	#[test]
	fn test_assemble_keeps_order_and_embeds_user() {
		let me = Uuid::new_v4();
		let (ann, bob, gone) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

		let relations = assemble(
			vec![relation(me, bob), relation(me, gone), relation(me, ann)],
			vec![user(ann, "ann"), user(bob, "bob")],
		);

		assert_eq!(relations.len(), 2);
		assert_eq!(relations[0].relation_user.username, "bob");
		assert_eq!(relations[1].relation_user.username, "ann");
		assert_eq!(relations[1].relation_type, RelationKind::Follower);
		assert!(relations[0].relation_user.email.is_none());
	}

	#[test]
	fn test_query_type_is_required() {
		let parse = |query| serde_json::from_value::<RelationQuery>(query);

		assert!(parse(serde_json::json!({})).is_err());
		assert!(parse(serde_json::json!({ "type": "friends" })).is_err());

		let query = parse(serde_json::json!({ "type": "follower" })).unwrap();

		assert_eq!(query.kind, RelationKind::Follower);
		assert_eq!(query.count, pagination::DEFAULT_COUNT);
	}
}
