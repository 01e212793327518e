use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::*;
use crate::types::BlogPost;
use crate::util::timestamp;

const BLOG_COLUMNS: &str = "id, title, excerpt, content, author, category, image,
    google_review_url, published, views, display_date, created_at, updated_at";

fn parse_stamp(index: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

impl CrmDb {
    fn map_blog_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlogPost> {
        let created_at: String = row.get(11)?;
        let updated_at: String = row.get(12)?;
        Ok(BlogPost {
            id: row.get(0)?,
            title: row.get(1)?,
            excerpt: row.get(2)?,
            content: row.get(3)?,
            author: row.get(4)?,
            category: row.get(5)?,
            image: row.get(6)?,
            google_review_url: row.get(7)?,
            published: row.get::<_, i32>(8)? != 0,
            views: row.get(9)?,
            date: row.get(10)?,
            created_at: parse_stamp(11, &created_at)?,
            updated_at: parse_stamp(12, &updated_at)?,
        })
    }

    /// Insert a post and return its assigned id. `post.id` is ignored.
    pub fn insert_blog(&self, post: &BlogPost) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO blogs (title, excerpt, content, author, category, image,
                 google_review_url, published, views, display_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                post.title,
                post.excerpt,
                post.content,
                post.author,
                post.category,
                post.image,
                post.google_review_url,
                post.published as i32,
                post.views,
                post.date,
                timestamp(&post.created_at),
                timestamp(&post.updated_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_blog(&self, id: i64) -> Result<Option<BlogPost>, DbError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = ?1"),
                params![id],
                Self::map_blog_row,
            )
            .optional()?)
    }

    /// Posts newest first. Drafts are included only when asked for.
    pub fn list_blogs(&self, include_unpublished: bool) -> Result<Vec<BlogPost>, DbError> {
        let filter = if include_unpublished { "" } else { "WHERE published = 1" };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs {filter} ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], Self::map_blog_row)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    pub fn update_blog(&self, post: &BlogPost) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE blogs SET title = ?2, excerpt = ?3, content = ?4, author = ?5,
                 category = ?6, image = ?7, google_review_url = ?8, published = ?9,
                 updated_at = ?10
             WHERE id = ?1",
            params![
                post.id,
                post.title,
                post.excerpt,
                post.content,
                post.author,
                post.category,
                post.image,
                post.google_review_url,
                post.published as i32,
                timestamp(&post.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn increment_blog_views(&self, id: i64) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("UPDATE blogs SET views = views + 1 WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn delete_blog(&self, id: i64) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM blogs WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}
