//! Form-session coordination for the UI-modeling endpoint.
//!
//! Outbound form events are queued per session and flushed in order. The
//! queue is the only mutable client state; it is owned by one
//! `UiModelingService`, so mutation always goes through `&mut self`.

use crate::error::Result;
use crate::http::{Method, RequestOptions, Response};
use crate::service::{Endpoint, ShellService};
use crate::utils::url::QueryString;
use crate::utils::value::guid_str_equals;
use serde_json::Value;
use std::collections::HashMap;

/// A pending event, its descriptor, and the URL it will be posted to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueuedEvent {
    pub model_instance_id: String,
    pub action_name: Option<String>,
    pub field_name: Option<String>,
    pub url: String,
    pub body: Option<Value>,
}

/// Filters for [`EventQueue::remove_from_queue`]. An unset filter matches anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoveOptions {
    pub action_name: Option<String>,
    pub field_name: Option<String>,
}

impl RemoveOptions {
    pub fn action(action_name: impl Into<String>) -> Self {
        Self {
            action_name: Some(action_name.into()),
            field_name: None,
        }
    }

    pub fn field(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormEvent {
    pub action_name: Option<String>,
    pub field_name: Option<String>,
    pub value: Option<Value>,
}

/// Pending events keyed by form session id (compared case-insensitively).
#[derive(Debug, Default)]
pub struct EventQueue {
    queues: HashMap<String, Vec<QueuedEvent>>,
}

fn session_key(session_id: &str) -> String {
    session_id.to_uppercase()
}

/// An absent filter matches anything; a present one needs a descriptor value
/// that contains it, ignoring case.
fn contains_filter(descriptor: Option<&str>, filter: Option<&str>) -> bool {
    match (descriptor, filter) {
        (_, None) => true,
        (Some(descriptor), Some(filter)) => descriptor
            .to_uppercase()
            .contains(&filter.to_uppercase()),
        (None, Some(_)) => false,
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, session_id: &str, event: QueuedEvent) {
        self.queues
            .entry(session_key(session_id))
            .or_default()
            .push(event);
    }

    pub fn pending(&self, session_id: &str) -> &[QueuedEvent] {
        self.queues
            .get(&session_key(session_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Remove the first queued event for `model_instance_id` whose action and
    /// field names contain the supplied filters, ignoring case.
    ///
    /// At most one event is removed per call.
    pub fn remove_from_queue(
        &mut self,
        session_id: &str,
        model_instance_id: &str,
        options: &RemoveOptions,
    ) -> Option<QueuedEvent> {
        let key = session_key(session_id);
        let queue = self.queues.get_mut(&key)?;
        let instance = model_instance_id.to_uppercase();

        let index = queue.iter().position(|event| {
            guid_str_equals(&event.model_instance_id, &instance, false, true)
                && contains_filter(event.action_name.as_deref(), options.action_name.as_deref())
                && contains_filter(event.field_name.as_deref(), options.field_name.as_deref())
        })?;

        let removed = queue.remove(index);
        if queue.is_empty() {
            self.queues.remove(&key);
        }
        Some(removed)
    }

    /// Take every pending event for a session, leaving it with no queue.
    pub fn take(&mut self, session_id: &str) -> Vec<QueuedEvent> {
        self.queues.remove(&session_key(session_id)).unwrap_or_default()
    }

    /// Put events back ahead of anything queued since they were taken.
    pub fn restore(&mut self, session_id: &str, mut events: Vec<QueuedEvent>) {
        if events.is_empty() {
            return;
        }
        let key = session_key(session_id);
        if let Some(newer) = self.queues.remove(&key) {
            events.extend(newer);
        }
        self.queues.insert(key, events);
    }

    pub fn clear(&mut self, session_id: &str) -> usize {
        self.take(session_id).len()
    }
}

/// Owns a service handle plus the event queue for its form sessions.
pub struct UiModelingService {
    service: ShellService,
    queue: EventQueue,
}

impl UiModelingService {
    pub fn new(service: ShellService) -> Self {
        Self {
            service,
            queue: EventQueue::new(),
        }
    }

    pub fn service(&self) -> &ShellService {
        &self.service
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn start_form_session(&self, form_id: &str, context_record_id: Option<&str>) -> Result<Response> {
        let mut query = QueryString::new();
        query
            .push("formId", form_id)
            .push_opt("contextRecordId", context_record_id);
        self.service
            .get_action(Endpoint::UiModeling, "startFormSession", Some(&query))
    }

    pub fn event_url(&self, session_id: &str, model_instance_id: &str, event: &FormEvent) -> String {
        let mut query = QueryString::new();
        query
            .push("formSessionId", session_id)
            .push("modelInstanceId", model_instance_id)
            .push_opt("actionName", event.action_name.as_deref())
            .push_opt("fieldName", event.field_name.as_deref());
        self.service
            .action_url(Endpoint::UiModeling, "postEvent", Some(&query))
    }

    pub fn queue_event(&mut self, session_id: &str, model_instance_id: &str, event: &FormEvent) {
        let url = self.event_url(session_id, model_instance_id, event);
        self.queue.enqueue(
            session_id,
            QueuedEvent {
                model_instance_id: model_instance_id.to_string(),
                action_name: event.action_name.clone(),
                field_name: event.field_name.clone(),
                url,
                body: event.value.clone(),
            },
        );
    }

    pub fn remove_from_queue(
        &mut self,
        session_id: &str,
        model_instance_id: &str,
        options: &RemoveOptions,
    ) -> Option<QueuedEvent> {
        let removed = self
            .queue
            .remove_from_queue(session_id, model_instance_id, options);
        if removed.is_some() {
            log_status!("uimodel", "Dropped queued event for session {}", session_id);
        }
        removed
    }

    /// Post a session's queued events in order.
    ///
    /// Stops at the first failure; the failed event is dropped and the unsent
    /// remainder stays queued.
    pub fn flush(&mut self, session_id: &str) -> Result<Vec<Response>> {
        let mut pending = self.queue.take(session_id).into_iter();
        let mut responses = Vec::new();
        let mut failure = None;

        for event in pending.by_ref() {
            let sent = self.service.request(
                Method::Post,
                &event.url,
                event.body.as_ref(),
                &RequestOptions::default(),
            );
            match sent {
                Ok(response) => responses.push(response),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if let Some(err) = failure {
            self.queue.restore(session_id, pending.collect());
            return Err(err);
        }

        log_status!("uimodel", "Flushed {} event(s) for session {}", responses.len(), session_id);
        Ok(responses)
    }

    /// Drop the session's queue and tell the server the session is over.
    pub fn end_form_session(&mut self, session_id: &str) -> Result<Response> {
        let dropped = self.queue.clear(session_id);
        if dropped > 0 {
            log_status!("uimodel", "Discarded {} unsent event(s) for session {}", dropped, session_id);
        }
        let mut query = QueryString::new();
        query.push("formSessionId", session_id);
        self.service
            .get_action(Endpoint::UiModeling, "endFormSession", Some(&query))
    }
}
