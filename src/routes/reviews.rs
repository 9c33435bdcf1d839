//! Review routes
//!
//! Posting a review goes through the admission gate; every mutation
//! recomputes the book's rating before responding.

use hyper::Response;

use crate::reviews::{NewReview, ReviewEdit};
use crate::routes::helpers::{authenticate, created, ok, ApiRequest, FullBody, SuccessResponse};
use crate::routes::views::{review_views, ReviewView};
use crate::server::AppState;
use crate::types::Result;

async fn view_of(state: &AppState, review: &crate::db::schemas::ReviewDoc) -> Result<ReviewView> {
    let author = state.store.get_user(review.user_id).await?;
    Ok(ReviewView::new(review, author.as_ref()))
}

/// GET /api/books/{id}/reviews
pub async fn handle_list_reviews(state: &AppState, book_id: i64) -> Result<Response<FullBody>> {
    let reviews = state.reviews.list_reviews(book_id).await?;
    ok(&review_views(state.store.as_ref(), &reviews).await?)
}

/// POST /api/books/{id}/reviews
pub async fn handle_create_review(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    let input: NewReview = req.json()?;
    let review = state.reviews.create_review(&ctx, book_id, input).await?;
    created(&view_of(state, &review).await?)
}

/// PUT /api/reviews/{id}
pub async fn handle_update_review(
    state: &AppState,
    req: &ApiRequest,
    review_id: i64,
) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    let edit: ReviewEdit = req.json()?;
    let review = state.reviews.update_review(&ctx, review_id, edit).await?;
    ok(&view_of(state, &review).await?)
}

/// DELETE /api/reviews/{id}
pub async fn handle_delete_review(
    state: &AppState,
    req: &ApiRequest,
    review_id: i64,
) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    state.reviews.delete_review(&ctx, review_id).await?;
    ok(&SuccessResponse::new())
}
