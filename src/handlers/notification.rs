// src/handlers/notification.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::notification::{MarkNotificationRequest, NotificationResponse, NotificationsQuery},
    store::DynStore,
    utils::jwt::Claims,
};

const NOTIFICATIONS_PAGE_SIZE: i64 = 10;

/// One page of the caller's notifications, newest first.
///
/// `type` narrows to one kind unless it is "all". `deletedDocCount` is
/// the number of entries the client removed from earlier pages; folding
/// it into the skip keeps later pages contiguous.
pub async fn get_notifications(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<NotificationsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let deleted = params.deleted_doc_count.unwrap_or(0).max(0);
    let skip = (page - 1) * NOTIFICATIONS_PAGE_SIZE + deleted;

    let kind = params.kind.filter(|kind| kind != "all");

    let views = store
        .notifications_for(
            claims.user_id(),
            kind.as_deref(),
            skip,
            NOTIFICATIONS_PAGE_SIZE,
        )
        .await?;
    let notifications: Vec<_> = views
        .iter()
        .map(NotificationResponse::from_view)
        .collect();

    Ok(Json(json!({ "notifications": notifications })))
}

/// Marks one of the caller's notifications as read. Unknown ids and
/// other users' notifications are silently ignored.
pub async fn mark_notification(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<MarkNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    store
        .mark_notification_seen(payload.notification_id, claims.user_id())
        .await?;

    Ok(Json(json!({ "status": "Notification marked as read" })))
}
