//! The cacheable chat-completions pipeline and upstream forwarding.
//!
//! POST /v1/chat/completions is embedded, probed against the semantic
//! cache, and forwarded upstream on a miss; successful responses are
//! admitted for future hits. Streaming requests and all other /v1/*
//! paths pass through untouched.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::{Duration as ChronoDuration, Utc};

use crate::error::ProxyError;
use crate::reports::LogLevel;
use crate::state::AppState;
use crate::types::openai::{ChatCompletionRequest, ChatCompletionResponse};
use crate::types::CacheEntry;

const CACHE_HEADER: HeaderName = HeaderName::from_static("x-kallm-cache");
const SIMILARITY_HEADER: HeaderName = HeaderName::from_static("x-kallm-similarity");

/// Chat completions endpoint with semantic caching.
///
/// POST /v1/chat/completions
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(_) => return ProxyError::BodyRead.into_response(),
    };

    let chat_request: ChatCompletionRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(_) => return ProxyError::InvalidRequest.into_response(),
    };

    // Streaming responses are never cached and never recorded.
    if chat_request.stream {
        tracing::debug!("skipping cache for streaming request");
        return forward_streaming(&state, &parts.method, parts.uri.path(), &parts.headers, body)
            .await;
    }

    let cache_key = cache_key_text(&chat_request);

    // An embedding failure is not a cache decision: forward without
    // caching and record a plain miss.
    let embedding = match state.embedder.embed(&cache_key).await {
        Ok(embedding) => embedding,
        Err(e) => {
            tracing::warn!(error = %e, "failed to generate embedding, forwarding request");
            let response =
                forward_streaming(&state, &parts.method, parts.uri.path(), &parts.headers, body)
                    .await;
            let latency_ms = start.elapsed().as_millis() as u64;
            state
                .collector
                .record_request(false, 0.0, latency_ms, 0, &cache_key);
            state.collector.add_log(
                LogLevel::Miss,
                format!("[MISS] {}ms - {}", latency_ms, log_prompt(&cache_key)),
            );
            return response;
        }
    };

    if let Some((entry, similarity)) = state
        .cache
        .get(&embedding, state.config.similarity_threshold)
        .await
    {
        let latency_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            similarity = %format!("{similarity:.4}"),
            latency_ms,
            "cache hit"
        );

        let tokens_saved = entry.response.usage.total_tokens;
        state
            .collector
            .record_request(true, similarity, latency_ms, tokens_saved, &cache_key);
        state.collector.add_log(
            LogLevel::Hit,
            format!(
                "[HIT] {:.2}% sim, {}ms - {}",
                similarity * 100.0,
                latency_ms,
                log_prompt(&cache_key)
            ),
        );

        let mut response = Json(&entry.response).into_response();
        response
            .headers_mut()
            .insert(CACHE_HEADER, HeaderValue::from_static("HIT"));
        if let Ok(value) = HeaderValue::from_str(&format!("{similarity:.4}")) {
            response.headers_mut().insert(SIMILARITY_HEADER, value);
        }
        return response;
    }

    // Cache miss: forward to the upstream.
    tracing::debug!("cache miss, forwarding to upstream");

    let upstream = match forward(
        &state,
        &parts.method,
        parts.uri.path(),
        &parts.headers,
        body,
    )
    .await
    {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::error!(error = %e, "upstream request failed");
            return ProxyError::Upstream(e).into_response();
        }
    };

    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);
    let response_body = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to read upstream response");
            return ProxyError::Upstream(e).into_response();
        }
    };

    // Admit only successful, parseable chat responses; failures here are
    // warnings, never client errors.
    if status == StatusCode::OK {
        match serde_json::from_slice::<ChatCompletionResponse>(&response_body) {
            Ok(chat_response) => {
                let now = Utc::now();
                let ttl = ChronoDuration::from_std(state.config.cache_ttl)
                    .unwrap_or_else(|_| ChronoDuration::seconds(24 * 60 * 60));
                let model = chat_response.model.clone();
                let entry = CacheEntry {
                    request: chat_request,
                    response: chat_response,
                    embedding,
                    created_at: now,
                    expires_at: now + ttl,
                    hit_count: 0,
                    last_hit_at: now,
                };
                match state.cache.set(entry).await {
                    Ok(()) => tracing::debug!(model = %model, "cached response"),
                    Err(e) => tracing::warn!(error = %e, "failed to cache response"),
                }
            }
            Err(e) => tracing::warn!(error = %e, "upstream response is not a chat completion"),
        }
    }

    let latency_ms = start.elapsed().as_millis() as u64;
    state
        .collector
        .record_request(false, 0.0, latency_ms, 0, &cache_key);
    state.collector.add_log(
        LogLevel::Miss,
        format!("[MISS] {}ms - {}", latency_ms, log_prompt(&cache_key)),
    );
    tracing::info!(status = %status, latency_ms, "upstream request completed");

    headers.insert(CACHE_HEADER, HeaderValue::from_static("MISS"));
    (status, headers, response_body).into_response()
}

/// Fallback handler: pass other /v1/* requests through to the upstream,
/// 404 everything else.
pub async fn fallback(State(state): State<Arc<AppState>>, request: Request) -> Response {
    if !request.uri().path().starts_with("/v1/") {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(_) => return ProxyError::BodyRead.into_response(),
    };

    forward_streaming(&state, &parts.method, parts.uri.path(), &parts.headers, body).await
}

/// The canonical cache-key text: one `role: text` line per message, in
/// order. Multimodal content contributes only its text parts.
fn cache_key_text(request: &ChatCompletionRequest) -> String {
    let mut key = String::new();
    for message in &request.messages {
        key.push_str(&message.role);
        key.push_str(": ");
        key.push_str(&message.text());
        key.push('\n');
    }
    key
}

/// Send a request to the upstream with the original method, path, and
/// headers. Injects the configured API key when the client supplied no
/// Authorization header.
async fn forward(
    state: &AppState,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<reqwest::Response, reqwest::Error> {
    let url = format!("{}{}", state.config.openai_base_url, path);

    let mut forwarded = headers.clone();
    forwarded.remove(header::HOST);
    forwarded.remove(header::CONTENT_LENGTH);

    let mut builder = state
        .upstream
        .request(method.clone(), &url)
        .headers(forwarded)
        .body(body);
    if !headers.contains_key(header::AUTHORIZATION) {
        builder = builder.bearer_auth(&state.config.openai_api_key);
    }

    builder.send().await
}

/// Forward and stream the upstream response back verbatim. Used for the
/// streaming bypass and for passthrough endpoints.
async fn forward_streaming(
    state: &AppState,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Response {
    match forward(state, method, path, headers, body).await {
        Ok(upstream) => {
            let status = upstream.status();
            let mut headers = upstream.headers().clone();
            strip_hop_by_hop(&mut headers);
            (status, headers, Body::from_stream(upstream.bytes_stream())).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "upstream request failed");
            ProxyError::Upstream(e).into_response()
        }
    }
}

/// Remove headers that describe the upstream connection rather than the
/// payload; the server re-frames the response itself.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    headers.remove(header::TRANSFER_ENCODING);
    headers.remove(header::CONNECTION);
    headers.remove(header::CONTENT_LENGTH);
}

/// Truncate a prompt for log lines, newlines flattened.
fn log_prompt(s: &str) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() > 80 {
        let head: String = s.chars().take(77).collect();
        format!("{head}...")
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::openai::{ChatMessage, ContentPart, MessageContent};

    fn message(role: &str, content: &str) -> ChatMessage {
        ChatMessage {
            role: role.to_string(),
            content: Some(MessageContent::Text(content.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_cache_key_text() {
        let request = ChatCompletionRequest {
            model: "gpt-4".to_string(),
            messages: vec![
                message("system", "You are helpful."),
                message("user", "What is 2+2?"),
            ],
            ..Default::default()
        };

        assert_eq!(
            cache_key_text(&request),
            "system: You are helpful.\nuser: What is 2+2?\n"
        );
    }

    #[test]
    fn test_cache_key_ignores_non_text_parts() {
        let request = ChatCompletionRequest {
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(MessageContent::Parts(vec![
                    ContentPart {
                        part_type: "text".to_string(),
                        text: Some("look at ".to_string()),
                        ..Default::default()
                    },
                    ContentPart {
                        part_type: "image_url".to_string(),
                        ..Default::default()
                    },
                    ContentPart {
                        part_type: "text".to_string(),
                        text: Some("this".to_string()),
                        ..Default::default()
                    },
                ])),
                ..Default::default()
            }],
            ..Default::default()
        };

        assert_eq!(cache_key_text(&request), "user: look at this\n");
    }

    #[test]
    fn test_cache_key_depends_on_message_order() {
        let forward = ChatCompletionRequest {
            messages: vec![message("user", "a"), message("user", "b")],
            ..Default::default()
        };
        let reversed = ChatCompletionRequest {
            messages: vec![message("user", "b"), message("user", "a")],
            ..Default::default()
        };

        assert_ne!(cache_key_text(&forward), cache_key_text(&reversed));
    }

    #[test]
    fn test_log_prompt_flattens_and_truncates() {
        assert_eq!(log_prompt("user: hi\n"), "user: hi ");

        let long = "x".repeat(120);
        let truncated = log_prompt(&long);
        assert_eq!(truncated.chars().count(), 80);
        assert!(truncated.ends_with("..."));
    }
}
