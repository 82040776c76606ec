use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::admin_notifications;

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Selectable, Queryable, Insertable)]
#[diesel(table_name = admin_notifications)]
pub struct AdminNotification {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub schedule_date: Option<DateTime<Utc>>,
    pub sent_date: Option<DateTime<Utc>>,
}

/// A single-user push message handed to the notification gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub sender_id: Option<Uuid>,
    pub receiver_id: Uuid,
    pub title: String,
    pub body: String,
    pub attachments: Vec<String>,
    pub data: HashMap<String, String>,
    pub tokens: Vec<String>,
    pub persist: bool,
}

impl PushMessage {
    pub fn to_user(receiver_id: Uuid, tokens: Vec<String>, title: &str, body: String) -> Self {
        Self {
            receiver_id,
            tokens,
            title: title.to_string(),
            body,
            persist: true,
            ..Default::default()
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<String>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}
