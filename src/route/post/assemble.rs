//! Joins post and comment rows with the users they embed.
//!
//! The joins are pure so they can be tested without a database. Rows whose
//! author is missing from the loaded users (deleted in the meantime) are
//! dropped rather than shown without an author.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
	db::{self, comment::DbComment, post::DbPost, user::DbUser},
	route::comment::model::Comment,
	Database,
};

use super::model::{Post, PREVIEW_COMMENT_COUNT};

type Users = HashMap<Uuid, DbUser>;

fn index(users: Vec<DbUser>) -> Users {
	users.into_iter().map(|user| (user.id, user)).collect()
}

fn comment(users: &Users, comment: DbComment) -> Option<Comment> {
	let user = users.get(&comment.user_id)?.clone();

	Some(Comment::new(comment, user))
}

/// Joins comments with their authors, keeping the row order.
pub fn comments(comments: Vec<DbComment>, users: Vec<DbUser>) -> Vec<Comment> {
	let users = index(users);

	comments
		.into_iter()
		.filter_map(|row| comment(&users, row))
		.collect()
}

/// Joins posts with their authors and preview comments, keeping the row order.
///
/// `comments` may hold the comments of any number of posts, in the order
/// they should be shown within each post.
pub fn posts(posts: Vec<DbPost>, comments: Vec<DbComment>, users: Vec<DbUser>) -> Vec<Post> {
	let users = index(users);
	let mut by_post = HashMap::<Uuid, Vec<Comment>>::new();

	for row in comments {
		let post_id = row.post_id;

		if let Some(comment) = comment(&users, row) {
			by_post.entry(post_id).or_default().push(comment);
		}
	}

	posts
		.into_iter()
		.filter_map(|post| {
			let user = users.get(&post.user_id)?.clone();
			let comments = by_post.remove(&post.id).unwrap_or_default();

			Some(Post::new(post, user, comments))
		})
		.collect()
}

/// Loads what `rows` embed and joins it in, as seen by `viewer`.
pub async fn load_posts(
	database: &Database,
	viewer: Uuid,
	rows: Vec<DbPost>,
) -> Result<Vec<Post>, sqlx::Error> {
	let ids = rows.iter().map(|post| post.id).collect::<Vec<_>>();
	let previews = db::comment::preview(database, viewer, &ids, PREVIEW_COMMENT_COUNT).await?;

	let mut user_ids = rows
		.iter()
		.map(|post| post.user_id)
		.chain(previews.iter().map(|comment| comment.user_id))
		.collect::<Vec<_>>();

	user_ids.sort_unstable();
	user_ids.dedup();

	let users = db::user::find_many(database, &user_ids).await?;

	Ok(posts(rows, previews, users))
}

pub async fn load_post(
	database: &Database,
	viewer: Uuid,
	row: DbPost,
) -> Result<Option<Post>, sqlx::Error> {
	Ok(load_posts(database, viewer, vec![row]).await?.pop())
}

pub async fn load_comments(
	database: &Database,
	rows: Vec<DbComment>,
) -> Result<Vec<Comment>, sqlx::Error> {
	let mut user_ids = rows
		.iter()
		.map(|comment| comment.user_id)
		.collect::<Vec<_>>();

	user_ids.sort_unstable();
	user_ids.dedup();

	let users = db::user::find_many(database, &user_ids).await?;

	Ok(comments(rows, users))
}

#[cfg(test)]
mod test {
	use chrono::{Duration, Utc};
	use uuid::Uuid;

	use super::*;

	fn user(username: &str) -> DbUser {
		DbUser {
			id: Uuid::new_v4(),
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

	fn post(author: &DbUser, minutes_ago: i64) -> DbPost {
		DbPost {
			id: Uuid::new_v4(),
			user_id: author.id,
			content: "/data/image/0".into(),
			description: String::new(),
			created_at: Utc::now() - Duration::minutes(minutes_ago),
			likes: 2,
			liked: true,
		}
	}

	fn comment(post: &DbPost, author: &DbUser, content: &str) -> DbComment {
		DbComment {
			id: Uuid::new_v4(),
			post_id: post.id,
			user_id: author.id,
			content: content.into(),
			created_at: Utc::now(),
			updated_at: Utc::now(),
			likes: 0,
			liked: false,
		}
	}

	#[test]
	fn test_posts_embed_author_and_comments() {
		let (ann, bob) = (user("ann"), user("bob"));
		let (first, second) = (post(&ann, 0), post(&bob, 5));

		let comments = vec![
			comment(&second, &ann, "newest"),
			comment(&first, &bob, "hello"),
			comment(&second, &bob, "oldest"),
		];

		let posts = posts(
			vec![first.clone(), second.clone()],
			comments,
			vec![ann.clone(), bob.clone()],
		);

		assert_eq!(posts.len(), 2);
		assert_eq!(posts[0].id, first.id);
		assert_eq!(posts[0].user.username, "ann");
		assert_eq!(posts[0].likes, 2);
		assert!(posts[0].liked);
		assert_eq!(posts[0].comments.len(), 1);
		assert_eq!(posts[0].comments[0].user.username, "bob");

		let contents = posts[1]
			.comments
			.iter()
			.map(|comment| comment.content.as_str())
			.collect::<Vec<_>>();

		assert_eq!(contents, ["newest", "oldest"]);
	}

	#[test]
	fn test_rows_without_author_are_dropped() {
		let (ann, gone) = (user("ann"), user("gone"));
		let (kept, orphan) = (post(&ann, 0), post(&gone, 1));
		let comments = vec![comment(&kept, &gone, "ghost"), comment(&kept, &ann, "hi")];

		let posts = posts(vec![kept, orphan], comments, vec![ann]);

		assert_eq!(posts.len(), 1);
		assert_eq!(posts[0].comments.len(), 1);
		assert_eq!(posts[0].comments[0].content, "hi");
	}

	#[test]
	fn test_comments_hide_author_email() {
		let ann = user("ann");
		let post = post(&ann, 0);

		let comments = comments(vec![comment(&post, &ann, "hi")], vec![ann]);
		let value = serde_json::to_value(&comments[0]).unwrap();

		assert_eq!(value["user"]["username"], "ann");
		assert!(value["user"].get("email").is_none());
	}
}
