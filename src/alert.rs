//! Alert messages for reporting failed form submissions.
//!
//! Alerts are rendered as HTML fragments and swapped into the
//! `#alert-container` element by HTMX.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

const ALERT_STYLE: &str = "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
    dark:bg-gray-800 dark:text-red-400";

/// An error message with some extra details.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub message: String,
    pub details: String,
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let Alert { message, details } = self;

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(ALERT_STYLE) role="alert"
                {
                    div class="flex justify-between items-start"
                    {
                        div
                        {
                            span class="font-medium" { (message) }

                            @if !details.is_empty() {
                                p class="mt-1" { (details) }
                            }
                        }

                        button
                            type="button"
                            aria-label="Close"
                            class="ms-4 font-bold"
                            onclick="document.getElementById('alert-container').classList.add('hidden')"
                        {
                            "×"
                        }
                    }
                }
            }
        }
    }

    pub fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use scraper::Selector;

    use crate::{
        Error,
        alert::Alert,
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    #[tokio::test]
    async fn error_alert_shows_message_and_details() {
        let response = Alert {
            message: "Invalid amount entered".to_owned(),
            details: "Enter a number".to_owned(),
        }
        .into_response_with_status(StatusCode::BAD_REQUEST);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let fragment = parse_html_fragment(response).await;
        assert_valid_html(&fragment);
        let alert = fragment
            .select(&Selector::parse("div[role=alert]").unwrap())
            .next()
            .expect("No alert found");
        let text = alert.text().collect::<String>();
        assert!(text.contains("Invalid amount entered"), "got {text:?}");
        assert!(text.contains("Enter a number"), "got {text:?}");
    }

    #[tokio::test]
    async fn store_error_alert_does_not_leak_details() {
        let response =
            Error::StoreUnavailable("no such table: expense".to_owned()).into_alert_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let fragment = parse_html_fragment(response).await;
        let text = fragment.root_element().text().collect::<String>();
        assert!(!text.contains("no such table"), "got {text:?}");
        assert!(text.contains("Something went wrong"), "got {text:?}");
    }
}
