// ABOUTME: Best-effort push + in-app notification after job completion or terminal failure
// ABOUTME: Grounded on the teacher's notifications/sse.rs "failures never propagate" posture
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! The teacher holds live SSE connections and broadcasts to them; this
//! worker has no long-lived connection to any client, so instead of
//! `SseConnectionManager::broadcast` it posts a one-shot batch push and
//! inserts an in-app notification record (spec.md §4.10). Both steps share
//! the teacher's posture: failures are logged, never surfaced to the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::config::WorkerConfig;

/// Maximum number of push tokens addressed per notification (spec.md §4.10).
pub const MAX_PUSH_TOKENS: usize = 5;

/// Best-effort outbound notification contract (spec.md §4.10).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Look up the user's push tokens (capped at [`MAX_PUSH_TOKENS`]), post a
    /// batch push, and insert an in-app notification record. Every step may
    /// fail silently — this method never returns an error because a
    /// notification failure must never fail the job it follows (spec.md §7).
    async fn send(&self, user_id: Uuid, title: &str, body: &str, data: Value);
}

#[derive(Debug, Serialize)]
struct PushBatchRequest<'a> {
    tokens: &'a [String],
    title: &'a str,
    body: &'a str,
    data: &'a Value,
}

/// HTTP-backed notifier posting to the shared data store's push/notification
/// endpoints (external collaborators per spec.md §1).
pub struct HttpNotifier {
    client: Client,
    data_store_url: String,
    data_store_service_key: String,
}

impl HttpNotifier {
    #[must_use]
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            client: Client::new(),
            data_store_url: config.data_store_url.clone(),
            data_store_service_key: config.data_store_service_key.clone(),
        }
    }

    async fn fetch_push_tokens(&self, user_id: Uuid) -> Vec<String> {
        let url = format!("{}/push_tokens?user_id=eq.{user_id}", self.data_store_url);
        let result = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.data_store_service_key))
            .send()
            .await;

        match result {
            Ok(response) => response
                .json::<Vec<String>>()
                .await
                .unwrap_or_default()
                .into_iter()
                .take(MAX_PUSH_TOKENS)
                .collect(),
            Err(e) => {
                warn!("failed to fetch push tokens for user {user_id}: {e}");
                Vec::new()
            }
        }
    }

    async fn post_batch_push(&self, tokens: &[String], title: &str, body: &str, data: &Value) {
        if tokens.is_empty() {
            return;
        }
        let url = format!("{}/functions/v1/push-batch", self.data_store_url);
        let request = PushBatchRequest { tokens, title, body, data };

        if let Err(e) = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.data_store_service_key))
            .json(&request)
            .send()
            .await
        {
            warn!("push batch delivery failed: {e}");
        }
    }

    async fn insert_in_app_record(&self, user_id: Uuid, title: &str, body: &str, data: &Value) {
        let url = format!("{}/user_notifications", self.data_store_url);
        let record = serde_json::json!({
            "user_id": user_id,
            "title": title,
            "body": body,
            "type": "plan_generation",
            "screen": "plan",
            "data": data,
            "delivered": false,
            "read": false,
        });

        if let Err(e) = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.data_store_service_key))
            .json(&record)
            .send()
            .await
        {
            warn!("in-app notification insert failed: {e}");
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, user_id: Uuid, title: &str, body: &str, data: Value) {
        let tokens = self.fetch_push_tokens(user_id).await;
        self.post_batch_push(&tokens, title, body, &data).await;
        self.insert_in_app_record(user_id, title, body, &data).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingNotifier {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn send(&self, _user_id: Uuid, _title: &str, _body: &str, _data: Value) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn notifier_trait_is_callable_through_a_fake() {
        let calls = Arc::new(AtomicUsize::new(0));
        let notifier = CountingNotifier { calls: calls.clone() };
        notifier
            .send(Uuid::new_v4(), "Plan ready", "Your week is ready", Value::Null)
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
