//! Brief data model
//!
//! A brief is a time-boxed creative task posted to a channel. It starts
//! `Active` and ends either `Completed` or `Cancelled`; terminal briefs are
//! never re-activated.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{BriefError, Result};

// ============================================================================
// Content
// ============================================================================

/// What a generator produces: the creative part of a brief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefContent {
    pub company_name: String,
    pub company_description: String,
    pub job_description: String,
    /// Human-readable duration, e.g. "5 jours". May be empty.
    #[serde(alias = "deadlineDays")]
    pub deadline_label: String,
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BriefStatus {
    Active,
    Completed,
    Cancelled,
}

impl BriefStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BriefStatus::Active => "active",
            BriefStatus::Completed => "completed",
            BriefStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BriefStatus::Active)
    }
}

impl fmt::Display for BriefStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Brief
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brief {
    pub id: String,
    #[serde(flatten)]
    pub content: BriefContent,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub channel_id: String,
    /// Guild the brief was issued for, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub status: BriefStatus,
}

impl Brief {
    /// Build a new active brief created at `now`.
    ///
    /// The deadline comes from the content's label when it starts with a
    /// positive day count, otherwise from `fallback_hours`.
    pub fn new(
        content: BriefContent,
        channel_id: &str,
        fallback_hours: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let deadline = resolve_deadline(&content.deadline_label, fallback_hours, now);
        Self {
            id: Uuid::now_v7().to_string(),
            content,
            created_at: now,
            deadline,
            channel_id: channel_id.to_string(),
            guild_id: None,
            message_id: None,
            status: BriefStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BriefStatus::Active
    }

    /// Strictly past its deadline at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline < now
    }

    /// Move an active brief into a terminal status.
    pub fn transition(&mut self, to: BriefStatus) -> Result<()> {
        if self.status.is_terminal() || !to.is_terminal() {
            return Err(BriefError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

// ============================================================================
// Deadline parsing
// ============================================================================

/// Leading day count of a label such as "5 jours" or " 7 days".
///
/// Mirrors integer-prefix parsing: leading whitespace and an optional sign
/// are accepted, parsing stops at the first non-digit. Only positive counts
/// are returned.
pub fn parse_deadline_days(label: &str) -> Option<u32> {
    let s = label.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || negative {
        return None;
    }
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(days) => Some(days),
    }
}

/// Absolute deadline for a brief created at `now`.
pub fn resolve_deadline(label: &str, fallback_hours: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let span = match parse_deadline_days(label) {
        Some(days) => Duration::days(days as i64),
        None => Duration::hours(fallback_hours.max(1) as i64),
    };
    now.checked_add_signed(span).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
