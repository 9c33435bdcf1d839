//! Catalog routes
//!
//! Reading the catalog is public; every mutation requires an administrator.

use hyper::Response;
use serde::Deserialize;
use tracing::info;

use crate::db::schemas::{BookDoc, Metadata};
use crate::routes::helpers::{authenticate_admin, created, ok, ApiRequest, FullBody, SuccessResponse};
use crate::routes::views::BookView;
use crate::server::AppState;
use crate::types::{BookwormError, Result};

#[derive(Debug, Default, Deserialize)]
pub struct BookQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
}

impl BookInput {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(BookwormError::Validation("Title is required".into()));
        }
        if self.author.trim().is_empty() {
            return Err(BookwormError::Validation("Author is required".into()));
        }
        Ok(())
    }

    /// Copy the descriptive fields onto `book`, leaving id and rating alone
    fn apply(self, book: &mut BookDoc) {
        book.title = self.title.trim().to_string();
        book.author = self.author.trim().to_string();
        book.category = self.category.trim().to_string();
        book.description = self.description;
        book.cover_url = self.cover_url.filter(|url| !url.trim().is_empty());
        book.published_year = self.published_year;
    }
}

async fn load_book(state: &AppState, book_id: i64) -> Result<BookDoc> {
    state
        .store
        .get_book(book_id)
        .await?
        .ok_or_else(|| BookwormError::NotFound(format!("Book {}", book_id)))
}

/// GET /api/books
pub async fn handle_list_books(state: &AppState, req: &ApiRequest) -> Result<Response<FullBody>> {
    let query: BookQuery = req.query()?;
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let books = state.store.list_books(category).await?;
    let views: Vec<BookView> = books.iter().map(BookView::from).collect();
    ok(&views)
}

/// GET /api/books/{id}
pub async fn handle_get_book(state: &AppState, book_id: i64) -> Result<Response<FullBody>> {
    ok(&BookView::from(&load_book(state, book_id).await?))
}

/// POST /api/books
pub async fn handle_create_book(state: &AppState, req: &ApiRequest) -> Result<Response<FullBody>> {
    let ctx = authenticate_admin(state, req).await?;
    let input: BookInput = req.json()?;
    input.validate()?;

    let mut book = BookDoc {
        metadata: Metadata::new(),
        ..Default::default()
    };
    input.apply(&mut book);

    let book = state.store.insert_book(book).await?;
    info!("Book {} '{}' added by {}", book.id, book.title, ctx.username);
    created(&BookView::from(&book))
}

/// PUT /api/books/{id}
pub async fn handle_update_book(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    authenticate_admin(state, req).await?;
    let input: BookInput = req.json()?;
    input.validate()?;

    let mut book = load_book(state, book_id).await?;
    input.apply(&mut book);

    if !state.store.update_book(&book).await? {
        return Err(BookwormError::NotFound(format!("Book {}", book_id)));
    }
    ok(&BookView::from(&load_book(state, book_id).await?))
}

/// DELETE /api/books/{id}
///
/// Removes the book's questions, reviews and list entries with it.
pub async fn handle_delete_book(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    let ctx = authenticate_admin(state, req).await?;

    if !state.store.delete_book(book_id).await? {
        return Err(BookwormError::NotFound(format!("Book {}", book_id)));
    }
    info!("Book {} deleted by {}", book_id, ctx.username);
    ok(&SuccessResponse::new())
}
