// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Notification messages and panel state

use serde::{Deserialize, Serialize};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown notification type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub closeable: bool,
}

impl Notification {
    pub fn new(id: impl Into<String>, kind: NotificationType, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: None,
            content: content.into(),
            timestamp: None,
            closeable: true,
        }
    }
}

/// Message list plus the open/closed flag of the panel showing it
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    messages: Vec<Notification>,
    panel_open: bool,
}

impl NotificationCenter {
    pub fn set(&mut self, messages: Vec<Notification>) {
        self.messages = messages;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Delete by id; returns how many were removed
    pub fn delete(&mut self, ids: &[String]) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| !ids.contains(&m.id));
        before - self.messages.len()
    }

    /// All messages, or only those of the given types
    pub fn get(&self, types: Option<&[NotificationType]>) -> Vec<&Notification> {
        self.messages
            .iter()
            .filter(|m| types.map_or(true, |t| t.contains(&m.kind)))
            .collect()
    }

    /// Most severe type present. Success ranks below warning.
    pub fn max_type(&self) -> Option<NotificationType> {
        self.messages.iter().map(|m| m.kind).max()
    }

    pub fn open_panel(&mut self) {
        self.panel_open = true;
    }

    pub fn close_panel(&mut self) {
        self.panel_open = false;
    }

    pub fn toggle_panel(&mut self) {
        self.panel_open = !self.panel_open;
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }
}
