//! Post repository
//!
//! Handles posts and their operations with:
//! - Atomic reply creation (parent lock, value derivation, post + operation)
//! - Paginated root listing with reply counts
//! - Recursive CTEs for subtrees and ancestor chains

use chrono::{DateTime, Utc};
use numtree_core::{CoreError, OperationKind, TreeNode};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::DbError;
use crate::models::{Operand, Paginated, Pagination, PostValue};

/// Columns selected for a full post with author and operation.
///
/// Expects `posts p`, `users u` and `operations o` in scope.
const POST_COLUMNS: &str = r#"
    p.id, p.value, p.user_id, p.parent_id, p.created_at, p.updated_at,
    u.username,
    o.id AS op_id, o.kind AS op_kind, o.operand AS op_operand,
    o.created_at AS op_created_at, o.updated_at AS op_updated_at
"#;

const POST_JOINS: &str = r#"
    JOIN users u ON u.id = p.user_id
    LEFT JOIN operations o ON o.post_id = p.id
"#;

const REPLY_COUNT: &str =
    "(SELECT COUNT(*) FROM posts r WHERE r.parent_id = p.id) AS reply_count";

/// Public identity of a post's author
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
}

/// Operation record from database
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub id: Uuid,
    pub kind: OperationKind,
    pub operand: f64,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post with its author and (for replies) its operation
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub value: f64,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Author,
    pub operation: Option<Operation>,
    /// Present when the query counted direct replies
    pub reply_count: Option<i64>,
}

impl TreeNode for Post {
    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn operation(&self) -> Option<(OperationKind, f64)> {
        self.operation.as_ref().map(|op| (op.kind, op.operand))
    }
}

/// A post with its parent and direct replies
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub parent: Option<Post>,
    pub replies: Vec<Post>,
}

/// Minimal row for auditing stored derivations
#[derive(Debug, Clone)]
pub struct DerivationRow {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub value: f64,
    pub parent_value: Option<f64>,
    pub operation: Option<(OperationKind, f64)>,
}

/// Table sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub users: i64,
    pub posts: i64,
    pub operations: i64,
}

fn parse_kind(raw: &str) -> Result<OperationKind, DbError> {
    raw.parse().map_err(|e: CoreError| DbError::Corrupt {
        reason: e.to_string(),
    })
}

fn post_from_row(row: &PgRow) -> Result<Post, DbError> {
    let id: Uuid = row.try_get("id")?;
    let user_id: Uuid = row.try_get("user_id")?;

    let operation = match row.try_get::<Option<Uuid>, _>("op_id")? {
        Some(op_id) => {
            let kind: String = row.try_get("op_kind")?;
            Some(Operation {
                id: op_id,
                kind: parse_kind(&kind)?,
                operand: row.try_get("op_operand")?,
                post_id: id,
                created_at: row.try_get("op_created_at")?,
                updated_at: row.try_get("op_updated_at")?,
            })
        }
        None => None,
    };

    let reply_count = match row.try_get::<i64, _>("reply_count") {
        Ok(n) => Some(n),
        Err(sqlx::Error::ColumnNotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(Post {
        id,
        value: row.try_get("value")?,
        user_id,
        parent_id: row.try_get("parent_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        author: Author {
            id: user_id,
            username: row.try_get("username")?,
        },
        operation,
        reply_count,
    })
}

fn posts_from_rows(rows: &[PgRow]) -> Result<Vec<Post>, DbError> {
    rows.iter().map(post_from_row).collect()
}

/// Post repository
pub struct PostRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PostRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a root post (no parent, no operation).
    pub async fn create_root(&self, user_id: Uuid, value: PostValue) -> Result<Post, DbError> {
        let row = sqlx::query(&format!(
            r#"
            WITH p AS (
                INSERT INTO posts (value, user_id)
                VALUES ($1, $2)
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM p
            {POST_JOINS}
            "#
        ))
        .bind(value.get())
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        post_from_row(&row)
    }

    /// Reply to `parent_id` by applying `kind` with `operand` to the parent's
    /// value. Returns the new reply and its parent.
    ///
    /// The parent row is share-locked for the duration of the transaction, and
    /// the post and its operation are inserted in one statement, so a reply is
    /// never stored without its operation.
    pub async fn create_reply(
        &self,
        parent_id: Uuid,
        user_id: Uuid,
        kind: OperationKind,
        operand: Operand,
    ) -> Result<(Post, Post), DbError> {
        let mut tx = self.pool.begin().await?;

        let parent_row = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            {POST_JOINS}
            WHERE p.id = $1
            FOR SHARE OF p
            "#
        ))
        .bind(parent_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "Parent post",
            id: parent_id.to_string(),
        })?;
        let parent = post_from_row(&parent_row)?;

        let value = kind.apply(parent.value, operand.get())?;

        let row = sqlx::query(
            r#"
            WITH p AS (
                INSERT INTO posts (value, user_id, parent_id)
                VALUES ($1, $2, $3)
                RETURNING *
            ),
            o AS (
                INSERT INTO operations (post_id, kind, operand)
                SELECT id, $4, $5 FROM p
                RETURNING *
            )
            SELECT
                p.id, p.value, p.user_id, p.parent_id, p.created_at, p.updated_at,
                u.username,
                o.id AS op_id, o.kind AS op_kind, o.operand AS op_operand,
                o.created_at AS op_created_at, o.updated_at AS op_updated_at
            FROM p
            JOIN users u ON u.id = p.user_id
            JOIN o ON o.post_id = p.id
            "#,
        )
        .bind(value)
        .bind(user_id)
        .bind(parent_id)
        .bind(kind.as_str())
        .bind(operand.get())
        .fetch_one(&mut *tx)
        .await?;
        let reply = post_from_row(&row)?;

        tx.commit().await?;

        tracing::debug!(
            reply = %reply.id,
            parent = %parent_id,
            op = %kind,
            value,
            "reply created"
        );
        Ok((reply, parent))
    }

    /// List root posts, newest first, with direct reply counts.
    pub async fn list_roots(&self, page: Pagination) -> Result<Paginated<Post>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}, {REPLY_COUNT}, COUNT(*) OVER() AS total
            FROM posts p
            {POST_JOINS}
            WHERE p.parent_id IS NULL
            ORDER BY p.created_at DESC, p.id
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(self.pool)
        .await?;

        let total = match rows.first() {
            Some(row) => row.try_get::<i64, _>("total")?,
            None if page.offset > 0 => self.count_roots().await?,
            None => 0,
        };
        let items = posts_from_rows(&rows)?;

        Ok(Paginated {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }

    async fn count_roots(&self) -> Result<i64, DbError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE parent_id IS NULL")
            .fetch_one(self.pool)
            .await?;
        Ok(n)
    }

    /// Get a post with its parent and direct replies (oldest first).
    pub async fn get_detail(&self, id: Uuid) -> Result<PostDetail, DbError> {
        let post_row = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}, {REPLY_COUNT}
            FROM posts p
            {POST_JOINS}
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "Post",
            id: id.to_string(),
        })?;
        let post = post_from_row(&post_row)?;

        let parent = match post.parent_id {
            Some(parent_id) => {
                let row = sqlx::query(&format!(
                    r#"
                    SELECT {POST_COLUMNS}
                    FROM posts p
                    {POST_JOINS}
                    WHERE p.id = $1
                    "#
                ))
                .bind(parent_id)
                .fetch_optional(self.pool)
                .await?;
                row.as_ref().map(post_from_row).transpose()?
            }
            None => None,
        };

        let reply_rows = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}, {REPLY_COUNT}
            FROM posts p
            {POST_JOINS}
            WHERE p.parent_id = $1
            ORDER BY p.created_at ASC, p.id
            "#
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        let replies = posts_from_rows(&reply_rows)?;

        Ok(PostDetail {
            post,
            parent,
            replies,
        })
    }

    /// Fetch the subtree rooted at `id`, down to `max_depth` levels below it.
    ///
    /// Rows come back breadth-first (by depth, then creation time), each with
    /// its direct reply count so callers can tell where the cut fell.
    pub async fn subtree(&self, id: Uuid, max_depth: u32) -> Result<Vec<Post>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id, 0 AS depth
                FROM posts
                WHERE id = $1
                UNION ALL
                SELECT c.id, s.depth + 1
                FROM posts c
                JOIN subtree s ON c.parent_id = s.id
                WHERE s.depth < $2
            )
            SELECT {POST_COLUMNS}, {REPLY_COUNT}, s.depth
            FROM subtree s
            JOIN posts p ON p.id = s.id
            {POST_JOINS}
            ORDER BY s.depth, p.created_at, p.id
            "#
        ))
        .bind(id)
        .bind(max_depth as i32)
        .fetch_all(self.pool)
        .await?;

        if rows.is_empty() {
            return Err(DbError::NotFound {
                resource: "Post",
                id: id.to_string(),
            });
        }
        posts_from_rows(&rows)
    }

    /// Fetch the path from the root down to `id` (root first, `id` last).
    pub async fn ancestors(&self, id: Uuid) -> Result<Vec<Post>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            WITH RECURSIVE chain AS (
                SELECT id, parent_id, 0 AS hops
                FROM posts
                WHERE id = $1
                UNION ALL
                SELECT a.id, a.parent_id, c.hops + 1
                FROM posts a
                JOIN chain c ON a.id = c.parent_id
            )
            SELECT {POST_COLUMNS}
            FROM chain c
            JOIN posts p ON p.id = c.id
            {POST_JOINS}
            ORDER BY c.hops DESC
            "#
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        if rows.is_empty() {
            return Err(DbError::NotFound {
                resource: "Post",
                id: id.to_string(),
            });
        }
        posts_from_rows(&rows)
    }

    /// Every post with its parent's value and its operation, for auditing.
    pub async fn derivations(&self) -> Result<Vec<DerivationRow>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                p.id,
                p.parent_id,
                p.value,
                parent.value AS parent_value,
                o.kind AS op_kind,
                o.operand AS op_operand
            FROM posts p
            LEFT JOIN posts parent ON parent.id = p.parent_id
            LEFT JOIN operations o ON o.post_id = p.id
            ORDER BY p.created_at, p.id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let kind: Option<String> = r.try_get("op_kind")?;
                let operand: Option<f64> = r.try_get("op_operand")?;
                let operation = match (kind, operand) {
                    (Some(kind), Some(operand)) => Some((parse_kind(&kind)?, operand)),
                    _ => None,
                };
                Ok(DerivationRow {
                    id: r.try_get("id")?,
                    parent_id: r.try_get("parent_id")?,
                    value: r.try_get("value")?,
                    parent_value: r.try_get("parent_value")?,
                    operation,
                })
            })
            .collect()
    }

    /// Row counts for users, posts and operations.
    pub async fn counts(&self) -> Result<RowCounts, DbError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM posts) AS posts,
                (SELECT COUNT(*) FROM operations) AS operations
            "#,
        )
        .fetch_one(self.pool)
        .await?;

        Ok(RowCounts {
            users: row.try_get("users")?,
            posts: row.try_get("posts")?,
            operations: row.try_get("operations")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{User, UserRepo};
    use crate::models::Username;
    use numtree_core::build_tree;

    async fn setup() -> (PgPool, User) {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();
        crate::db::migrations::run(&pool).await.unwrap();

        let suffix = &Uuid::new_v4().simple().to_string()[..12];
        let name = Username::new(&format!("p_{suffix}")).unwrap();
        let user = UserRepo::new(&pool).create(&name, "hash").await.unwrap();
        (pool, user)
    }

    fn operand(v: f64) -> Operand {
        Operand::new(v).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn reply_derives_value_from_parent() {
        let (pool, user) = setup().await;
        let repo = PostRepo::new(&pool);

        let root = repo
            .create_root(user.id, PostValue::new(10.0).unwrap())
            .await
            .unwrap();
        assert!(root.operation.is_none());
        assert_eq!(root.author.username, user.username);

        let (reply, parent) = repo
            .create_reply(root.id, user.id, OperationKind::Add, operand(5.0))
            .await
            .unwrap();
        assert_eq!(reply.value, 15.0);
        assert_eq!(reply.parent_id, Some(root.id));
        assert_eq!(parent.id, root.id);

        let op = reply.operation.unwrap();
        assert_eq!(op.kind, OperationKind::Add);
        assert_eq!(op.operand, 5.0);
        assert_eq!(op.post_id, reply.id);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn division_by_zero_stores_nothing() {
        let (pool, user) = setup().await;
        let repo = PostRepo::new(&pool);

        let root = repo
            .create_root(user.id, PostValue::new(4.0).unwrap())
            .await
            .unwrap();
        let err = repo
            .create_reply(root.id, user.id, OperationKind::Divide, operand(0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::DivisionByZero)));

        let detail = repo.get_detail(root.id).await.unwrap();
        assert!(detail.replies.is_empty());
        assert_eq!(detail.post.reply_count, Some(0));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn overflow_stores_nothing() {
        let (pool, user) = setup().await;
        let repo = PostRepo::new(&pool);

        let root = repo
            .create_root(user.id, PostValue::new(1e300).unwrap())
            .await
            .unwrap();
        let err = repo
            .create_reply(root.id, user.id, OperationKind::Multiply, operand(1e308))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::NonFiniteResult { .. })));

        let detail = repo.get_detail(root.id).await.unwrap();
        assert!(detail.replies.is_empty());
        assert_eq!(detail.post.reply_count, Some(0));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn reply_to_missing_parent() {
        let (pool, user) = setup().await;
        let err = PostRepo::new(&pool)
            .create_reply(Uuid::new_v4(), user.id, OperationKind::Add, operand(1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "Parent post", .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn subtree_and_ancestors() {
        let (pool, user) = setup().await;
        let repo = PostRepo::new(&pool);

        let root = repo
            .create_root(user.id, PostValue::new(10.0).unwrap())
            .await
            .unwrap();
        let (a, _) = repo
            .create_reply(root.id, user.id, OperationKind::Add, operand(5.0))
            .await
            .unwrap();
        let (b, _) = repo
            .create_reply(a.id, user.id, OperationKind::Multiply, operand(2.0))
            .await
            .unwrap();
        repo.create_reply(root.id, user.id, OperationKind::Subtract, operand(1.0))
            .await
            .unwrap();

        let rows = repo.subtree(root.id, 64).await.unwrap();
        assert_eq!(rows.len(), 4);
        let tree = build_tree(root.id, rows).unwrap();
        assert_eq!(tree.size(), 4);
        assert_eq!(tree.depth(), 2);
        assert!(tree.inconsistencies().is_empty());

        let shallow = repo.subtree(root.id, 1).await.unwrap();
        assert_eq!(shallow.len(), 3);

        let chain = repo.ancestors(b.id).await.unwrap();
        let ids: Vec<Uuid> = chain.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![root.id, a.id, b.id]);
        assert_eq!(chain[2].value, 30.0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn listing_includes_new_root() {
        let (pool, user) = setup().await;
        let repo = PostRepo::new(&pool);

        let root = repo
            .create_root(user.id, PostValue::new(-3.5).unwrap())
            .await
            .unwrap();
        let page = repo.list_roots(Pagination::new(100, 0)).await.unwrap();
        assert!(page.total >= 1);
        assert!(page.items.iter().all(|p| p.parent_id.is_none()));
        assert!(page.items.iter().all(|p| p.reply_count.is_some()));
        // Newest first; a concurrent test may have inserted after us.
        assert!(page.items.iter().any(|p| p.id == root.id));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unknown_post_not_found() {
        let (pool, _) = setup().await;
        let repo = PostRepo::new(&pool);
        let id = Uuid::new_v4();

        assert!(matches!(
            repo.get_detail(id).await.unwrap_err(),
            DbError::NotFound { resource: "Post", .. }
        ));
        assert!(matches!(
            repo.subtree(id, 3).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert!(matches!(
            repo.ancestors(id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
