//! Route modules. Each exposes `router() -> Router<AppState>`; the crate
//! root merges them.

pub mod applications;
pub mod documents;
pub mod users;

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use pyro_client::Page;

use crate::error::AppError;

/// Largest `limit` a list call may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Unwrap a query string, mapping parse failures to 422.
pub(crate) fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(q)| q)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Slice `items` (already in stable order) into the 1-based page `offset`
/// of `limit` entries.
pub(crate) fn paginate<T>(items: Vec<T>, offset: u32, limit: u32) -> Result<Page<T>, AppError> {
    if offset == 0 {
        return Err(AppError::Validation("offset is 1-based".into()));
    }
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let total_count = items.len() as u64;
    let skip = (offset as usize - 1).saturating_mul(limit as usize);
    let items = items.into_iter().skip(skip).take(limit as usize).collect();
    Ok(Page { items, total_count })
}

pub(crate) fn default_offset() -> u32 {
    1
}
