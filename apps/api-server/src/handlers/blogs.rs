//! Blog handlers.

use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{Blog, policy};
use quill_shared::Message;
use quill_shared::dto::{AddCommentRequest, BlogResponse, CreateBlogRequest, UpdateBlogRequest};

use crate::middleware::auth::AuthUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn blog_not_found() -> AppError {
    AppError::NotFound("Blog not found".to_string())
}

/// Resolve every user a set of blogs references (authors and comment
/// authors) in one batched lookup, then assemble wire responses.
async fn present(state: &AppState, blogs: &[Blog]) -> AppResult<Vec<BlogResponse>> {
    let mut ids: Vec<Uuid> = blogs
        .iter()
        .flat_map(|b| {
            std::iter::once(b.author_id).chain(b.comments.iter().map(|c| c.user_id))
        })
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let users = state.users.find_by_ids(&ids).await?;
    let by_id: HashMap<Uuid, _> = users.into_iter().map(|u| (u.id, u)).collect();

    Ok(blogs
        .iter()
        .map(|blog| BlogResponse::assemble(blog, |id| by_id.get(&id)))
        .collect())
}

async fn present_one(state: &AppState, blog: &Blog) -> AppResult<BlogResponse> {
    present(state, std::slice::from_ref(blog))
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Presentation produced no response".to_string()))
}

async fn find_required(state: &AppState, id: Uuid) -> AppResult<Blog> {
    state
        .blogs
        .find_by_id(id)
        .await?
        .ok_or_else(blog_not_found)
}

/// GET /api/blogs
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let blogs = state.blogs.list_all().await?;
    Ok(HttpResponse::Ok().json(present(&state, &blogs).await?))
}

/// GET /api/blogs/my-blogs
pub async fn my_blogs(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    let blogs = state.blogs.find_by_author(user.id).await?;
    Ok(HttpResponse::Ok().json(present(&state, &blogs).await?))
}

/// GET /api/blogs/{idOrSlug}
///
/// The path segment is a UUID or a slug; UUIDs never collide with slugs
/// because slugs are lowercased words joined by hyphens.
pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let id_or_slug = path.into_inner();

    let blog = match id_or_slug.parse::<Uuid>() {
        Ok(id) => state.blogs.find_by_id(id).await?,
        Err(_) => state.blogs.find_by_slug(&id_or_slug).await?,
    };
    let mut blog = blog.ok_or_else(blog_not_found)?;

    // Best-effort view counter; a lost increment is not worth failing
    // the read over.
    blog.record_view();
    if let Err(e) = state.blogs.update(blog.clone()).await {
        tracing::warn!(blog_id = %blog.id, error = %e, "View count update failed");
    }

    Ok(HttpResponse::Ok().json(present_one(&state, &blog).await?))
}

/// POST /api/blogs
pub async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<CreateBlogRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate().map_err(AppError::BadRequest)?;

    let blog = Blog::new(user.id, req.title, req.content, req.tags);
    let blog = state.blogs.insert(blog).await.map_err(|e| match e {
        quill_core::error::RepoError::Constraint(_) => {
            AppError::Conflict("A blog with this title already exists".to_string())
        }
        other => other.into(),
    })?;

    tracing::info!(blog_id = %blog.id, author = %user.id, "Blog created");

    Ok(HttpResponse::Created().json(present_one(&state, &blog).await?))
}

/// PUT /api/blogs/{id}
pub async fn update(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateBlogRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate().map_err(AppError::BadRequest)?;

    let mut blog = find_required(&state, path.into_inner()).await?;
    policy::ensure_author(&blog, user.id)?;

    if let Some(title) = req.title {
        if title != blog.title {
            blog.set_title(title);
        }
    }
    if let Some(content) = req.content {
        blog.set_content(content);
    }
    if let Some(tags) = req.tags {
        blog.set_tags(tags);
    }

    let blog = state.blogs.update(blog).await?;

    Ok(HttpResponse::Ok().json(present_one(&state, &blog).await?))
}

/// DELETE /api/blogs/{id}
pub async fn delete(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let blog = find_required(&state, path.into_inner()).await?;
    policy::ensure_author(&blog, user.id)?;

    state.blogs.delete(blog.id).await?;

    tracing::info!(blog_id = %blog.id, "Blog deleted");

    Ok(HttpResponse::Ok().json(Message::new("Blog deleted successfully")))
}

/// POST /api/blogs/{id}/like
pub async fn toggle_like(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let mut blog = find_required(&state, path.into_inner()).await?;

    blog.toggle_like(user.id);
    let blog = state.blogs.update(blog).await?;

    Ok(HttpResponse::Ok().json(present_one(&state, &blog).await?))
}

/// POST /api/blogs/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<AddCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate().map_err(AppError::BadRequest)?;

    let mut blog = find_required(&state, path.into_inner()).await?;
    blog.add_comment(user.id, &req.text)?;
    let blog = state.blogs.update(blog).await?;

    Ok(HttpResponse::Created().json(present_one(&state, &blog).await?))
}

/// DELETE /api/blogs/{id}/comments/{commentId}
pub async fn delete_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (blog_id, comment_id) = path.into_inner();

    let mut blog = find_required(&state, blog_id).await?;
    let comment = blog
        .find_comment(comment_id)
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if !policy::can_remove_comment(&blog, comment, user.id) {
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    blog.remove_comment(comment_id);
    let blog = state.blogs.update(blog).await?;

    Ok(HttpResponse::Ok().json(present_one(&state, &blog).await?))
}
