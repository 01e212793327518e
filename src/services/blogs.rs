//! Blog posts shown on the public website.

use chrono::Utc;
use serde::Deserialize;

use super::{ServiceError, ServiceResult};
use crate::db::CrmDb;
use crate::types::BlogPost;
use crate::util::{format_long_date, today};

/// Image used for review posts that only link to Google.
pub const REVIEW_PLACEHOLDER_IMAGE: &str =
    "https://via.placeholder.com/800x300.png?text=Google+Review";

const REQUIRED_MESSAGE: &str =
    "title, excerpt, content, author, category and either image or googleReviewUrl are required";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub google_review_url: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

/// Text fields of a post after the required-field check.
struct Validated {
    title: String,
    excerpt: String,
    content: String,
    author: String,
    category: String,
    image: Option<String>,
    google_review_url: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate(input: BlogInput) -> ServiceResult<(Validated, Option<bool>)> {
    let image = present(input.image);
    let google_review_url = present(input.google_review_url);
    let fields = (
        present(input.title),
        present(input.excerpt),
        present(input.content),
        present(input.author),
        present(input.category),
    );
    match fields {
        (Some(title), Some(excerpt), Some(content), Some(author), Some(category))
            if image.is_some() || google_review_url.is_some() =>
        {
            Ok((
                Validated {
                    title,
                    excerpt,
                    content,
                    author,
                    category,
                    image,
                    google_review_url,
                },
                input.published,
            ))
        }
        _ => Err(ServiceError::invalid(REQUIRED_MESSAGE)),
    }
}

fn load(db: &CrmDb, id: i64) -> ServiceResult<BlogPost> {
    db.get_blog(id)?.ok_or(ServiceError::NotFound("Blog post"))
}

/// Published posts, or every post for an admin view.
pub fn list(db: &CrmDb, include_unpublished: bool) -> ServiceResult<Vec<BlogPost>> {
    Ok(db.list_blogs(include_unpublished)?)
}

pub fn create(db: &CrmDb, input: BlogInput) -> ServiceResult<BlogPost> {
    let (fields, published) = validate(input)?;
    let now = Utc::now();
    let mut post = BlogPost {
        id: 0,
        title: fields.title,
        excerpt: fields.excerpt,
        content: fields.content,
        author: fields.author,
        category: fields.category,
        image: fields
            .image
            .unwrap_or_else(|| REVIEW_PLACEHOLDER_IMAGE.to_string()),
        google_review_url: fields.google_review_url,
        published: published.unwrap_or(true),
        views: 0,
        date: format_long_date(today()),
        created_at: now,
        updated_at: now,
    };
    post.id = db.insert_blog(&post)?;
    log::info!("Created blog post {} \"{}\"", post.id, post.title);
    Ok(post)
}

/// Fetch a post for display, counting the view.
pub fn view(db: &CrmDb, id: i64) -> ServiceResult<BlogPost> {
    if !db.increment_blog_views(id)? {
        return Err(ServiceError::NotFound("Blog post"));
    }
    load(db, id)
}

/// Replace a post's text. Views and display date are kept.
pub fn update(db: &CrmDb, id: i64, input: BlogInput) -> ServiceResult<BlogPost> {
    let mut post = load(db, id)?;
    let (fields, published) = validate(input)?;
    post.title = fields.title;
    post.excerpt = fields.excerpt;
    post.content = fields.content;
    post.author = fields.author;
    post.category = fields.category;
    if let Some(image) = fields.image {
        post.image = image;
    } else if post.image.is_empty() {
        post.image = REVIEW_PLACEHOLDER_IMAGE.to_string();
    }
    post.google_review_url = fields.google_review_url;
    if let Some(published) = published {
        post.published = published;
    }
    post.updated_at = Utc::now();
    if !db.update_blog(&post)? {
        return Err(ServiceError::NotFound("Blog post"));
    }
    Ok(post)
}

pub fn delete(db: &CrmDb, id: i64) -> ServiceResult<()> {
    if db.delete_blog(id)? {
        log::info!("Deleted blog post {}", id);
        Ok(())
    } else {
        Err(ServiceError::NotFound("Blog post"))
    }
}
