//! The notification partial used to report operation results to the user.
//!
//! Every endpoint reports failures through this one abstraction so the user
//! sees a consistent surface regardless of which module the failure came
//! from. Forms opt in with `hx-target-error="#notification-container"`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// How loudly to present a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation succeeded.
    Success,
    /// The operation was refused but the user can fix the input.
    Warning,
    /// The operation failed.
    Error,
}

impl Severity {
    fn container_style(self) -> &'static str {
        match self {
            Severity::Success => {
                "flex items-center p-4 mb-4 rounded-lg border border-green-300 \
                bg-green-50 text-green-800 dark:bg-gray-800 dark:text-green-400"
            }
            Severity::Warning => {
                "flex items-center p-4 mb-4 rounded-lg border border-yellow-300 \
                bg-yellow-50 text-yellow-800 dark:bg-gray-800 dark:text-yellow-300"
            }
            Severity::Error => {
                "flex items-center p-4 mb-4 rounded-lg border border-red-300 \
                bg-red-50 text-red-800 dark:bg-gray-800 dark:text-red-400"
            }
        }
    }
}

/// A user-facing report of an operation's outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    severity: Severity,
    message: String,
    details: String,
}

impl Notification {
    /// A success notification.
    pub fn success(message: &str, details: &str) -> Self {
        Self {
            severity: Severity::Success,
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// A warning notification for refused but recoverable operations.
    pub fn warning(message: &str, details: &str) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// An error notification.
    pub fn error(message: &str, details: &str) -> Self {
        Self {
            severity: Severity::Error,
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// The notification markup on its own, for inlining into a page.
    pub fn into_html(self) -> Markup {
        html! {
            div class=(self.severity.container_style()) role="alert"
            {
                div
                {
                    p class="font-medium" { (self.message) }

                    @if !self.details.is_empty() {
                        p class="text-sm" { (self.details) }
                    }
                }
            }
        }
    }

    /// Render the notification as an HTTP response with `status_code`.
    pub fn render(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }
}
