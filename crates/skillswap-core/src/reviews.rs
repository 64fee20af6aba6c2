use anyhow::Context;
use chrono::Utc;
use tracing::info;

use skillswap_db::models::{NewReviewRow, ReviewRow};
use skillswap_types::api::{NewReview, ReviewFilter};
use skillswap_types::models::{Identity, Review, ReviewList};
use skillswap_types::{RequestStatus, SwapError};

use crate::lifecycle::Role;
use crate::{AppState, Result, requests, users, validate};

pub(crate) fn to_review(row: ReviewRow) -> Result<Review> {
    let rating = u8::try_from(row.rating)
        .with_context(|| format!("review {} has an out-of-range rating", row.id))?;

    Ok(Review {
        id: row.id,
        request_id: row.service_request_id,
        reviewer_id: row.reviewer_id,
        reviewer: row.reviewer_name,
        reviewee_id: row.reviewee_id,
        reviewee: row.reviewee_name,
        rating,
        comments: row.comments,
        created_at: row.created_at,
    })
}

fn to_reviews(rows: Vec<ReviewRow>) -> Result<Vec<Review>> {
    rows.into_iter().map(to_review).collect()
}

/// Rates the other party of a completed request. One review per party per request.
pub fn add(state: &AppState, identity: &Identity, review: NewReview) -> Result<Review> {
    let rating = validate::rating(review.rating)?;

    let (request, role) = requests::load_for_party(state, identity, review.request_id)?;

    if request.status != RequestStatus::Completed {
        return Err(SwapError::RequestNotCompleted {
            id: request.id,
            status: request.status,
        });
    }
    if state.db.review_exists(request.id, identity.user_id)? {
        return Err(SwapError::DuplicateReview(request.id));
    }

    let (reviewee_id, reviewee) = match role {
        Role::Requester => (request.provider_id, request.provider),
        Role::Provider => (request.requester_id, request.requester),
    };
    let comments = review.comments.trim().to_string();
    let created_at = Utc::now();

    let id = state.db.insert_review(&NewReviewRow {
        service_request_id: request.id,
        reviewer_id: identity.user_id,
        reviewee_id,
        rating: i64::from(rating),
        comments: &comments,
        created_at,
    })?;

    info!(
        review_id = id,
        request_id = request.id,
        reviewer_id = identity.user_id,
        reviewee_id,
        rating,
        "Review recorded"
    );

    Ok(Review {
        id,
        request_id: request.id,
        reviewer_id: identity.user_id,
        reviewer: identity.username.clone(),
        reviewee_id,
        reviewee,
        rating,
        comments,
        created_at,
    })
}

/// Reviews written by or about one active user, newest first.
pub fn list(state: &AppState, filter: ReviewFilter) -> Result<ReviewList> {
    match filter {
        ReviewFilter::ByReviewer(user_id) => {
            users::require_active(state, user_id)?;
            let reviews = to_reviews(state.db.get_reviews_by_reviewer(user_id)?)?;
            Ok(ReviewList {
                reviews,
                average_rating: None,
            })
        }
        ReviewFilter::ByReviewee(user_id) => {
            users::require_active(state, user_id)?;
            let reviews = to_reviews(state.db.get_reviews_by_reviewee(user_id)?)?;
            let average_rating = average(&reviews);
            Ok(ReviewList {
                reviews,
                average_rating,
            })
        }
    }
}

pub fn for_request(state: &AppState, identity: &Identity, request_id: i64) -> Result<Vec<Review>> {
    requests::load_for_party(state, identity, request_id)?;
    of_request(state, request_id)
}

pub(crate) fn of_request(state: &AppState, request_id: i64) -> Result<Vec<Review>> {
    to_reviews(state.db.get_reviews_for_request(request_id)?)
}

fn average(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    Some(f64::from(total) / reviews.len() as f64)
}
