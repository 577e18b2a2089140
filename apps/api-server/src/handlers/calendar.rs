//! Calendar feed of scheduled posts.

use actix_web::{HttpResponse, web};

use postline_core::ports::CalendarEntry;
use postline_shared::dto::CalendarEvent;

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

const TITLE_CHARS: usize = 25;
const DEFAULT_COLOR: &str = "#ec4899";

fn event(entry: CalendarEntry) -> Option<CalendarEvent> {
    let start = entry.post.scheduled_for?;
    let mut title: String = entry.post.text.chars().take(TITLE_CHARS).collect();
    title.push_str("...");

    Some(CalendarEvent {
        id: entry.post.id,
        title,
        start,
        color: entry
            .label_color
            .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
    })
}

/// GET /api/calendar
pub async fn events(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let entries = state.posts.list_calendar(identity.user_id).await?;
    let events: Vec<CalendarEvent> = entries.into_iter().filter_map(event).collect();
    Ok(HttpResponse::Ok().json(events))
}
