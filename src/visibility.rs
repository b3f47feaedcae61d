//! Relation-aware post visibility.
//!
//! Relations are stored in one direction only: a row `(user_id, relation_user_id, type)`
//! reads as "`user_id` is `type` `relation_user_id`". A follower is the object side of
//! a `following` row, so it is never written to the table. [`RelationKind::storage`]
//! is the single place where that flip happens.

use std::{collections::HashSet, fmt, str::FromStr};

use axum::http::StatusCode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
	db::{self, relation::DbRelation},
	error::{self, ErrorShape, RouteError},
	Database,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("can't get posts, blocked by user")]
	Blocked(Uuid),
	#[error("invalid filter {0:?}, expected one of all, user, subscriptions")]
	InvalidFilter(String),
	#[error("a user_id is required for the user filter")]
	MissingTarget,
	#[error("unknown relation type {0:?}, expected one of following, follower, blocked")]
	UnknownRelation(String),
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::Blocked(..) => StatusCode::FORBIDDEN,
			Self::InvalidFilter(..) | Self::MissingTarget | Self::UnknownRelation(..) => {
				StatusCode::BAD_REQUEST
			}
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::Blocked(user) => error::Message::new("blocked")
				.detail("user", user)
				.into_vec(),
			Self::InvalidFilter(..) => error::Message::new("invalid_filter")
				.field("type")
				.into_vec(),
			Self::MissingTarget => error::Message::new("invalid_filter")
				.field("user_id")
				.into_vec(),
			Self::UnknownRelation(..) => error::Message::new("unknown_relation")
				.field("type")
				.into_vec(),
		}
	}
}

/// Which posts a listing should draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FetchMode {
	/// Every post.
	All,
	/// Posts written by a single user.
	User,
	/// Posts written by the users the requester follows.
	Subscriptions,
}

impl FromStr for FetchMode {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"all" => Ok(Self::All),
			"user" => Ok(Self::User),
			"subscriptions" => Ok(Self::Subscriptions),
			other => Err(Error::InvalidFilter(other.to_owned())),
		}
	}
}

impl TryFrom<String> for FetchMode {
	type Error = Error;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// The type of a relation, as seen by the user on the subject side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RelationKind {
	Following,
	Follower,
	Blocked,
}

/// A side of a stored relation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
	/// `user_relation.user_id`
	Subject,
	/// `user_relation.relation_user_id`
	Object,
}

impl Side {
	pub fn column(self) -> &'static str {
		match self {
			Self::Subject => "user_id",
			Self::Object => "relation_user_id",
		}
	}

	pub fn other(self) -> Self {
		match self {
			Self::Subject => Self::Object,
			Self::Object => Self::Subject,
		}
	}
}

impl RelationKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Following => "following",
			Self::Follower => "follower",
			Self::Blocked => "blocked",
		}
	}

	/// The stored row type that answers this kind, and the side of that row
	/// the user asking about it sits on.
	///
	/// "A is a follower of B" is stored as "A is following B", so B reads
	/// it from the object side.
	pub fn storage(self) -> (Self, Side) {
		match self {
			Self::Follower => (Self::Following, Side::Object),
			kind => (kind, Side::Subject),
		}
	}

	/// Whether rows of this kind are written to the table as-is.
	pub fn is_stored(self) -> bool {
		self.storage().1 == Side::Subject
	}
}

impl fmt::Display for RelationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for RelationKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"following" => Ok(Self::Following),
			"follower" => Ok(Self::Follower),
			"blocked" => Ok(Self::Blocked),
			other => Err(Error::UnknownRelation(other.to_owned())),
		}
	}
}

impl TryFrom<String> for RelationKind {
	type Error = Error;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// How the requester and another user relate, from the requester's side.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct RelationStatus {
	/// The requester follows the other user.
	pub following: bool,
	/// The other user follows the requester.
	pub follower: bool,
	/// The requester blocked the other user.
	pub blocked: bool,
	/// The other user blocked the requester.
	pub blocked_by: bool,
}

impl RelationStatus {
	/// Folds the rows stored between two users into the requester's view.
	///
	/// `rows` must only contain rows between the requester and one other user.
	pub fn from_rows(requester: Uuid, rows: &[DbRelation]) -> Self {
		rows.iter().fold(Self::default(), |mut status, row| {
			let own = row.user_id == requester;

			match (row.relation_type, own) {
				(RelationKind::Following, true) => status.following = true,
				(RelationKind::Following, false) => status.follower = true,
				(RelationKind::Blocked, true) => status.blocked = true,
				(RelationKind::Blocked, false) => status.blocked_by = true,
				(RelationKind::Follower, _) => {}
			}

			status
		})
	}

	/// A block in either direction hides each user's content from the other.
	pub fn is_blocked(&self) -> bool {
		self.blocked || self.blocked_by
	}
}

/// A condition on post authors, appended to post queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
	Everyone,
	Author(Uuid),
	Authors(Vec<Uuid>),
}

impl PostFilter {
	/// Whether the filter can never match a post.
	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Authors(authors) if authors.is_empty())
	}

	/// Appends `AND <condition>` against `{table}.user_id`.
	pub fn push_condition(&self, query: &mut QueryBuilder<'_, Postgres>, table: &str) {
		match self {
			Self::Everyone => {}
			Self::Author(author) => {
				query
					.push(format!(" AND {table}.user_id = "))
					.push_bind(*author);
			}
			Self::Authors(authors) => {
				query
					.push(format!(" AND {table}.user_id = ANY("))
					.push_bind(authors.clone())
					.push(")");
			}
		}
	}
}

pub fn user_filter(target: Uuid, status: RelationStatus) -> Result<PostFilter, Error> {
	if status.is_blocked() {
		return Err(Error::Blocked(target));
	}

	Ok(PostFilter::Author(target))
}

/// Followed users minus anyone with a block in either direction.
pub fn subscription_filter(following: Vec<Uuid>, blocked: &HashSet<Uuid>) -> PostFilter {
	PostFilter::Authors(
		following
			.into_iter()
			.filter(|id| !blocked.contains(id))
			.collect(),
	)
}

/// Loads the relation status between the requester and `target`.
///
/// A user has no relation with themselves.
pub async fn relation_status(
	database: &Database,
	requester: Uuid,
	target: Uuid,
) -> Result<RelationStatus, sqlx::Error> {
	if requester == target {
		return Ok(RelationStatus::default());
	}

	let rows = db::relation::between(database, requester, target).await?;

	Ok(RelationStatus::from_rows(requester, &rows))
}

/// Fails with [`Error::Blocked`] when the requester and `author` blocked each other.
pub async fn ensure_visible<E>(
	database: &Database,
	requester: Uuid,
	author: Uuid,
) -> Result<(), RouteError<E>>
where
	E: From<Error> + ErrorShape,
{
	if relation_status(database, requester, author)
		.await?
		.is_blocked()
	{
		return Err(RouteError::Route(Error::Blocked(author).into()));
	}

	Ok(())
}

/// Resolves a fetch mode into the filter posts are listed with.
pub async fn resolve<E>(
	database: &Database,
	requester: Uuid,
	mode: FetchMode,
	target: Option<Uuid>,
) -> Result<PostFilter, RouteError<E>>
where
	E: From<Error> + ErrorShape,
{
	match mode {
		FetchMode::All => Ok(PostFilter::Everyone),
		FetchMode::User => {
			let Some(target) = target else {
				return Err(RouteError::Route(Error::MissingTarget.into()));
			};

			let status = relation_status(database, requester, target).await?;

			user_filter(target, status).map_err(|e| RouteError::Route(e.into()))
		}
		FetchMode::Subscriptions => {
			let following =
				db::relation::counterparts(database, requester, RelationKind::Following).await?;
			let blocked = db::relation::blocked_either(database, requester)
				.await?
				.into_iter()
				.collect::<HashSet<_>>();

			Ok(subscription_filter(following, &blocked))
		}
	}
}

#[cfg(test)]
mod test {
	use std::collections::HashSet;

	use chrono::Utc;
	use sqlx::{Postgres, QueryBuilder};
	use uuid::Uuid;

	use super::*;
	use crate::db::relation::DbRelation;

	fn row(subject: Uuid, object: Uuid, kind: RelationKind) -> DbRelation {
		DbRelation {
			id: Uuid::new_v4(),
			user_id: subject,
			relation_user_id: object,
			relation_type: kind,
			created_at: Utc::now(),
		}
	}

	#[test]
	fn test_follow_reads_both_ways() {
		let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
		let rows = [row(a, b, RelationKind::Following)];

		let from_a = RelationStatus::from_rows(a, &rows);
		let from_b = RelationStatus::from_rows(b, &rows);

		assert!(from_a.following && !from_a.follower);
		assert!(from_b.follower && !from_b.following);
		assert!(!from_a.is_blocked() && !from_b.is_blocked());
	}

	#[test]
	fn test_block_reads_both_ways() {
		let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
		let rows = [row(a, b, RelationKind::Blocked)];

		let from_a = RelationStatus::from_rows(a, &rows);
		let from_b = RelationStatus::from_rows(b, &rows);

		assert!(from_a.blocked && !from_a.blocked_by);
		assert!(from_b.blocked_by && !from_b.blocked);
		assert!(from_a.is_blocked() && from_b.is_blocked());
	}

	#[test]
	fn test_storage_flip() {
		assert_eq!(
			RelationKind::Follower.storage(),
			(RelationKind::Following, Side::Object)
		);
		assert_eq!(
			RelationKind::Following.storage(),
			(RelationKind::Following, Side::Subject)
		);
		assert_eq!(
			RelationKind::Blocked.storage(),
			(RelationKind::Blocked, Side::Subject)
		);

		assert!(!RelationKind::Follower.is_stored());
		assert_eq!(Side::Object.other().column(), "user_id");
	}

	#[test]
	fn test_user_filter_blocked_either_way() {
		let target = Uuid::new_v4();

		let blocked_by = RelationStatus {
			blocked_by: true,
			..Default::default()
		};

		assert!(matches!(
			user_filter(target, blocked_by),
			Err(Error::Blocked(id)) if id == target
		));

		let blocked = RelationStatus {
			blocked: true,
			following: true,
			..Default::default()
		};

		assert!(user_filter(target, blocked).is_err());
		assert_eq!(
			user_filter(target, RelationStatus::default()).unwrap(),
			PostFilter::Author(target)
		);
	}

	#[test]
	fn test_block_dominates_follow() {
		let (kept, blocked) = (Uuid::new_v4(), Uuid::new_v4());

		let filter = subscription_filter(vec![kept, blocked], &HashSet::from([blocked]));

		assert_eq!(filter, PostFilter::Authors(vec![kept]));
	}

	#[test]
	fn test_following_nobody_is_empty() {
		let filter = subscription_filter(Vec::new(), &HashSet::new());

		assert!(filter.is_empty());
		assert!(!PostFilter::Everyone.is_empty());
	}

	#[test]
	fn test_fetch_mode_parse() {
		assert_eq!("all".parse::<FetchMode>().unwrap(), FetchMode::All);
		assert_eq!(
			"subscriptions".parse::<FetchMode>().unwrap(),
			FetchMode::Subscriptions
		);
		assert!(matches!(
			"friends".parse::<FetchMode>(),
			Err(Error::InvalidFilter(mode)) if mode == "friends"
		));

		assert!(serde_json::from_str::<FetchMode>("\"everyone\"").is_err());
	}

	#[test]
	fn test_filter_condition() {
		let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM post p WHERE TRUE");
		PostFilter::Authors(vec![Uuid::new_v4()]).push_condition(&mut query, "p");

		assert_eq!(
			query.sql(),
			"SELECT * FROM post p WHERE TRUE AND p.user_id = ANY($1)"
		);

		let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM post p WHERE TRUE");
		PostFilter::Everyone.push_condition(&mut query, "p");

		assert_eq!(query.sql(), "SELECT * FROM post p WHERE TRUE");
	}
}
