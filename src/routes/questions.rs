//! Quiz and verification routes
//!
//! - GET    /api/books/{id}/questions          - Quiz without answers (public)
//! - GET    /api/books/{id}/questions/answers  - Quiz with answers (admin)
//! - POST   /api/books/{id}/questions          - Add one question (admin)
//! - PUT    /api/books/{id}/questions          - Replace the whole quiz (admin)
//! - DELETE /api/books/{id}/questions          - Remove the quiz (admin)
//! - PUT    /api/questions/{id}                - Edit a question (admin)
//! - DELETE /api/questions/{id}                - Delete a question (admin)
//! - POST   /api/books/{id}/verify             - Submit answers for this session
//! - GET    /api/books/{id}/verification       - Verification state of this session

use hyper::Response;
use serde::{Deserialize, Serialize};

use crate::quiz::{AnsweredQuestion, QuestionInput};
use crate::routes::helpers::{
    authenticate, authenticate_admin, created, ok, ApiRequest, FullBody, SuccessResponse,
};
use crate::server::AppState;
use crate::types::{BookwormError, Result};

#[derive(Debug, Deserialize)]
pub struct ReplaceQuestionsRequest {
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub answers: Vec<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub book_id: i64,
    pub passed: bool,
    pub reason: String,
    /// Whether the session is verified for the book after this attempt
    pub verified: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatus {
    pub book_id: i64,
    pub verified: bool,
    pub question_count: usize,
    pub can_review: bool,
}

#[derive(Debug, Serialize)]
pub struct DeletedCount {
    pub deleted: u64,
}

fn answered(questions: &[crate::db::schemas::QuestionDoc]) -> Vec<AnsweredQuestion> {
    questions.iter().map(AnsweredQuestion::from).collect()
}

/// GET /api/books/{id}/questions
pub async fn handle_list_questions(state: &AppState, book_id: i64) -> Result<Response<FullBody>> {
    ok(&state.quiz.get_questions(book_id).await?)
}

/// GET /api/books/{id}/questions/answers
pub async fn handle_list_answers(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    authenticate_admin(state, req).await?;
    let questions = state.quiz.get_questions_with_answers(book_id).await?;
    ok(&answered(&questions))
}

/// POST /api/books/{id}/questions
pub async fn handle_create_question(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    authenticate_admin(state, req).await?;
    let input: QuestionInput = req.json()?;
    let question = state.quiz.create_question(book_id, input).await?;
    created(&AnsweredQuestion::from(&question))
}

/// PUT /api/books/{id}/questions
pub async fn handle_replace_questions(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    authenticate_admin(state, req).await?;
    let body: ReplaceQuestionsRequest = req.json()?;
    let questions = state.quiz.replace_all_questions(book_id, body.questions).await?;
    ok(&answered(&questions))
}

/// DELETE /api/books/{id}/questions
pub async fn handle_delete_questions(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    authenticate_admin(state, req).await?;
    let deleted = state.quiz.delete_all_questions(book_id).await?;
    ok(&DeletedCount { deleted })
}

/// PUT /api/questions/{id}
pub async fn handle_update_question(
    state: &AppState,
    req: &ApiRequest,
    question_id: i64,
) -> Result<Response<FullBody>> {
    authenticate_admin(state, req).await?;
    let input: QuestionInput = req.json()?;
    let question = state.quiz.update_question(question_id, input).await?;
    ok(&AnsweredQuestion::from(&question))
}

/// DELETE /api/questions/{id}
pub async fn handle_delete_question(
    state: &AppState,
    req: &ApiRequest,
    question_id: i64,
) -> Result<Response<FullBody>> {
    authenticate_admin(state, req).await?;
    state.quiz.delete_question(question_id).await?;
    ok(&SuccessResponse::new())
}

/// POST /api/books/{id}/verify
///
/// A wrong but complete submission is a normal `200` with `passed: false`.
pub async fn handle_verify(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    let body: VerifyRequest = req.json()?;

    let evaluation = state
        .quiz
        .verify(&state.sessions, &ctx.session_id, book_id, &body.answers)
        .await?;

    ok(&VerifyResponse {
        book_id,
        passed: evaluation.passed,
        reason: evaluation.reason,
        verified: state.sessions.is_verified(&ctx.session_id, book_id),
    })
}

/// GET /api/books/{id}/verification
pub async fn handle_verification_status(
    state: &AppState,
    req: &ApiRequest,
    book_id: i64,
) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;

    if state.store.get_book(book_id).await?.is_none() {
        return Err(BookwormError::NotFound(format!("Book {}", book_id)));
    }
    let question_count = state.store.list_questions(book_id).await?.len();

    ok(&VerificationStatus {
        book_id,
        verified: state.sessions.is_verified(&ctx.session_id, book_id),
        question_count,
        can_review: state.reviews.policy().can_review(
            &state.sessions,
            &ctx.session_id,
            book_id,
            question_count,
            false,
        ),
    })
}
