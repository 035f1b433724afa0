//! Post endpoints: roots, replies, detail, trees and chains

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use numtree_core::{build_tree, render_chain, OperationKind, Tree, TreeNode, TreeStats};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{Author, Operation, Post, PostRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ParentId, PostId, ValidJson, ValidQuery};
use crate::http::server::AppState;
use crate::models::{Operand, Pagination, PaginationParams, PostValue, ValidationError};

/// Deepest subtree returned by the tree endpoint
pub const MAX_TREE_DEPTH: u32 = 64;

/// Create root post request
#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub value: f64,
}

/// Reply request
#[derive(Deserialize)]
pub struct CreateReplyRequest {
    pub operation: String,
    pub operand: f64,
}

#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub username: String,
}

impl From<Author> for AuthorResponse {
    fn from(a: Author) -> Self {
        Self {
            id: a.id,
            username: a.username,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub operand: f64,
    pub post_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Operation> for OperationResponse {
    fn from(o: Operation) -> Self {
        Self {
            id: o.id,
            kind: o.kind,
            operand: o.operand,
            post_id: o.post_id,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

/// Post response. `operation` is always present (`null` for roots).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub value: f64,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
    pub user: AuthorResponse,
    pub operation: Option<OperationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<i64>,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            value: p.value,
            user_id: p.user_id,
            parent_id: p.parent_id,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
            user: p.author.into(),
            operation: p.operation.map(OperationResponse::from),
            reply_count: p.reply_count,
        }
    }
}

/// Post with its parent and direct replies
#[derive(Serialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub parent: Option<PostResponse>,
    pub replies: Vec<PostResponse>,
}

/// Newly created reply with the parent it was derived from
#[derive(Serialize)]
pub struct ReplyResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub parent: PostResponse,
}

#[derive(Serialize)]
pub struct PostEnvelope<T> {
    pub post: T,
}

#[derive(Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

/// Tree node with its depth below the requested post
#[derive(Serialize)]
pub struct TreeNodeResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub depth: usize,
    pub children: Vec<TreeNodeResponse>,
}

impl TreeNodeResponse {
    /// Recursion is bounded by [`MAX_TREE_DEPTH`].
    fn from_tree(tree: Tree<Post>, depth: usize) -> Self {
        Self {
            post: tree.node.into(),
            depth,
            children: tree
                .children
                .into_iter()
                .map(|child| Self::from_tree(child, depth + 1))
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct TreeResponse {
    pub tree: TreeNodeResponse,
    pub stats: TreeStats,
    /// Some posts at the depth limit have replies that were not returned
    pub truncated: bool,
}

#[derive(Deserialize)]
pub struct TreeParams {
    pub depth: Option<u32>,
}

#[derive(Serialize)]
pub struct ChainResponse {
    pub chain: Vec<PostResponse>,
    pub expression: String,
    pub result: f64,
}

/// POST /posts - start a new tree
async fn create_post(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidJson(req): ValidJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostEnvelope<PostResponse>>), ApiError> {
    let value = PostValue::new(req.value)?;
    let post = PostRepo::new(&state.pool)
        .create_root(current.user.id, value)
        .await?;

    tracing::info!(post = %post.id, user = %current.user.id, value = post.value, "root post created");
    Ok((
        StatusCode::CREATED,
        Json(PostEnvelope { post: post.into() }),
    ))
}

/// GET /posts - root posts, newest first
async fn list_posts(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<PaginationParams>,
) -> Result<Json<PostListResponse>, ApiError> {
    let page = Pagination::from(params);
    let result = PostRepo::new(&state.pool)
        .list_roots(page)
        .await?
        .map(PostResponse::from);

    Ok(Json(PostListResponse {
        posts: result.items,
        total: result.total,
        limit: result.limit,
        offset: result.offset,
    }))
}

/// GET /posts/{id} - a post with its parent and replies
async fn get_post(
    State(state): State<Arc<AppState>>,
    PostId(id): PostId,
) -> Result<Json<PostEnvelope<PostDetailResponse>>, ApiError> {
    let detail = PostRepo::new(&state.pool).get_detail(id).await?;

    Ok(Json(PostEnvelope {
        post: PostDetailResponse {
            post: detail.post.into(),
            parent: detail.parent.map(PostResponse::from),
            replies: detail.replies.into_iter().map(PostResponse::from).collect(),
        },
    }))
}

/// POST /posts/{id}/reply - derive a new post from its parent
async fn create_reply(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ParentId(parent_id): ParentId,
    ValidJson(req): ValidJson<CreateReplyRequest>,
) -> Result<(StatusCode, Json<PostEnvelope<ReplyResponse>>), ApiError> {
    let kind: OperationKind = req.operation.parse().map_err(|_| {
        ValidationError::InvalidFormat {
            field: "operation",
            reason: "must be one of add, subtract, multiply, divide",
        }
    })?;
    let operand = Operand::new(req.operand)?;

    let (reply, parent) = PostRepo::new(&state.pool)
        .create_reply(parent_id, current.user.id, kind, operand)
        .await?;

    tracing::info!(
        post = %reply.id,
        parent = %parent_id,
        user = %current.user.id,
        "reply created"
    );
    Ok((
        StatusCode::CREATED,
        Json(PostEnvelope {
            post: ReplyResponse {
                post: reply.into(),
                parent: parent.into(),
            },
        }),
    ))
}

/// GET /posts/{id}/tree - the post and its descendants
async fn get_tree(
    State(state): State<Arc<AppState>>,
    PostId(id): PostId,
    ValidQuery(params): ValidQuery<TreeParams>,
) -> Result<Json<TreeResponse>, ApiError> {
    let max_depth = params.depth.unwrap_or(MAX_TREE_DEPTH).min(MAX_TREE_DEPTH);
    let rows = PostRepo::new(&state.pool).subtree(id, max_depth).await?;

    let tree = build_tree(id, rows).ok_or_else(|| ApiError::Internal {
        message: format!("subtree query for {} returned no root", id),
    })?;

    let truncated = tree
        .iter()
        .any(|(depth, post)| depth == max_depth as usize && post.reply_count.unwrap_or(0) > 0);
    let stats = tree.stats();

    let broken = tree.inconsistencies();
    if !broken.is_empty() {
        tracing::warn!(root = %id, count = broken.len(), "tree contains inconsistent derivations");
    }

    Ok(Json(TreeResponse {
        tree: TreeNodeResponse::from_tree(tree, 0),
        stats,
        truncated,
    }))
}

/// GET /posts/{id}/chain - path from the root, as an expression
async fn get_chain(
    State(state): State<Arc<AppState>>,
    PostId(id): PostId,
) -> Result<Json<ChainResponse>, ApiError> {
    let chain = PostRepo::new(&state.pool).ancestors(id).await?;

    let (root, rest) = chain.split_first().ok_or_else(|| ApiError::NotFound {
        resource: "Post",
        id: id.to_string(),
    })?;
    let steps: Vec<(OperationKind, f64)> = rest.iter().filter_map(TreeNode::operation).collect();
    let expression = render_chain(root.value, &steps);
    let result = chain.last().map_or(root.value, |p| p.value);

    Ok(Json(ChainResponse {
        chain: chain.into_iter().map(PostResponse::from).collect(),
        expression,
        result,
    }))
}

/// Post routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post))
        .route("/posts/{id}/reply", post(create_reply))
        .route("/posts/{id}/tree", get(get_tree))
        .route("/posts/{id}/chain", get(get_chain))
}
