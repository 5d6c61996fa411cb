//! Manager endpoint: `?op=getTrafficData&tf=N` and `?op=getServerInfo`.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::debug;

use crate::format::{byte_size_string, uptime_string};
use crate::state::{AppState, OpenGuard};

const OPS_HELP: &str = "bwtop agent manager\n\
    ops:\n  \
    ?op=getTrafficData&tf=N  newest N throughput samples (bytes/sec) as a JSON array\n  \
    ?op=getServerInfo        status fragment\n";

pub async fn manager_handler(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let _open = OpenGuard::enter(&state);
    match q.get("op").map(String::as_str) {
        Some("getTrafficData") => {
            let cap = state.history.read().await.capacity();
            let n = parse_tf(q.get("tf").map(String::as_str), cap);
            let window = state.history.read().await.window(n);
            match serde_json::to_string(&window) {
                Ok(js) => reply(&state, StatusCode::OK, "application/json", js),
                Err(e) => reply(
                    &state,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain; charset=utf-8",
                    e.to_string(),
                ),
            }
        }
        Some("getServerInfo") => {
            let body = server_info(&state).await;
            reply(&state, StatusCode::OK, "text/html; charset=utf-8", body)
        }
        None => reply(
            &state,
            StatusCode::OK,
            "text/plain; charset=utf-8",
            OPS_HELP.to_string(),
        ),
        Some(other) => {
            debug!(op = other, "unknown manager op");
            reply(
                &state,
                StatusCode::BAD_REQUEST,
                "text/plain; charset=utf-8",
                format!("unknown op '{other}'\n"),
            )
        }
    }
}

fn reply(state: &AppState, status: StatusCode, content_type: &'static str, body: String) -> Response {
    state.requests.fetch_add(1, Ordering::Relaxed);
    state
        .bytes_sent
        .fetch_add(body.len() as u64, Ordering::Relaxed);
    (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// Requested window size: missing, zero or garbage means one sample; never more than `cap`.
pub fn parse_tf(tf: Option<&str>, cap: usize) -> usize {
    tf.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
        .min(cap.max(1))
}

/// Responses per second since start; zero until a full second has passed.
pub fn message_rate(requests: u64, uptime: Duration) -> f64 {
    let secs = uptime.as_secs_f64();
    if secs < 1.0 {
        0.0
    } else {
        requests as f64 / secs
    }
}

async fn server_info(state: &AppState) -> String {
    let (latest, held, cap) = {
        let h = state.history.read().await;
        (h.latest().unwrap_or(0), h.len(), h.capacity())
    };
    let current = if latest == 0 {
        "0 B".to_string()
    } else {
        byte_size_string(latest)
    };
    let uptime = state.started.elapsed();
    let requests = state.requests.load(Ordering::Relaxed);
    format!(
        "host: {}\n\
         uptime: {}\n\
         throughput: {}/s\n\
         bytes sent: {}\n\
         requests served: {} ({:.2} msg/s)\n\
         open requests: {} (max {})\n\
         samples held: {}/{}\n",
        state.hostname,
        uptime_string(uptime),
        current,
        byte_size_string(state.bytes_sent.load(Ordering::Relaxed)),
        requests,
        message_rate(requests, uptime),
        state.open.load(Ordering::Relaxed),
        state.max_open.load(Ordering::Relaxed),
        held,
        cap,
    )
}
