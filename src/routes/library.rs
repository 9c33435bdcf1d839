//! Personal reading list and liked books
//!
//! All routes act on the caller's own lists.

use hyper::Response;
use serde::Deserialize;

use crate::db::schemas::BookDoc;
use crate::routes::helpers::{authenticate, ok, ApiRequest, FullBody, SuccessResponse};
use crate::routes::views::{books_by_id, LikedBookView, ReadingEntryView};
use crate::server::AppState;
use crate::types::{BookwormError, Result};

pub const MAX_PROGRESS: i32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ProgressRequest {
    #[serde(default)]
    pub progress: i32,
}

async fn load_book(state: &AppState, book_id: i64) -> Result<BookDoc> {
    state
        .store
        .get_book(book_id)
        .await?
        .ok_or_else(|| BookwormError::NotFound(format!("Book {}", book_id)))
}

/// GET /api/me/reading-list
pub async fn handle_reading_list(state: &AppState, req: &ApiRequest) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    let entries = state.store.list_reading_entries(ctx.user_id).await?;

    let ids: Vec<i64> = entries.iter().map(|e| e.book_id).collect();
    let books = books_by_id(state.store.as_ref(), &ids).await?;

    let views: Vec<ReadingEntryView> = entries
        .iter()
        .filter_map(|entry| {
            books
                .get(&entry.book_id)
                .map(|book| ReadingEntryView::new(entry, book))
        })
        .collect();
    ok(&views)
}

/// PUT /api/me/reading-list/{bookId}
///
/// An empty body adds the book with zero progress.
pub async fn handle_set_progress(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    let body: ProgressRequest = if req.body.is_empty() {
        ProgressRequest::default()
    } else {
        req.json()?
    };

    if !(0..=MAX_PROGRESS).contains(&body.progress) {
        return Err(BookwormError::Validation(format!(
            "Progress must be between 0 and {}",
            MAX_PROGRESS
        )));
    }

    let book = load_book(state, book_id).await?;
    let entry = state
        .store
        .upsert_reading_entry(ctx.user_id, book_id, body.progress)
        .await?;
    ok(&ReadingEntryView::new(&entry, &book))
}

/// DELETE /api/me/reading-list/{bookId}
pub async fn handle_remove_from_reading_list(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    if !state.store.delete_reading_entry(ctx.user_id, book_id).await? {
        return Err(BookwormError::NotFound(format!(
            "Book {} is not on the reading list",
            book_id
        )));
    }
    ok(&SuccessResponse::new())
}

/// GET /api/me/liked
pub async fn handle_liked_books(state: &AppState, req: &ApiRequest) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    let likes = state.store.list_liked_books(ctx.user_id).await?;

    let ids: Vec<i64> = likes.iter().map(|l| l.book_id).collect();
    let books = books_by_id(state.store.as_ref(), &ids).await?;

    let views: Vec<LikedBookView> = likes
        .iter()
        .filter_map(|like| books.get(&like.book_id).map(|book| LikedBookView::new(like, book)))
        .collect();
    ok(&views)
}

/// PUT /api/me/liked/{bookId}
pub async fn handle_like(state: &AppState, req: &ApiRequest, book_id: i64) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    let book = load_book(state, book_id).await?;
    let like = state.store.like_book(ctx.user_id, book_id).await?;
    ok(&LikedBookView::new(&like, &book))
}

/// DELETE /api/me/liked/{bookId}
pub async fn handle_unlike(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    if !state.store.unlike_book(ctx.user_id, book_id).await? {
        return Err(BookwormError::NotFound(format!("Book {} is not liked", book_id)));
    }
    ok(&SuccessResponse::new())
}
