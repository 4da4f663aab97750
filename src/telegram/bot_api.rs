//! Minimal Telegram Bot API client: long-poll updates and send messages.
//!
//! Requests run on a private tokio runtime and are driven with `block_on`
//! so the rest of the application stays synchronous.

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};

use crate::domain::conversation::QuickReplyMenu;

/// Slack added on top of the long-poll timeout for the HTTP request itself.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum BotApiError {
    #[error("failed to start HTTP runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("Bot API rejected {method}: {description}")]
    Rejected {
        method: &'static str,
        error_code: Option<i64>,
        description: String,
    },
}

impl From<reqwest::Error> for BotApiError {
    /// Request URLs embed the bot token, so they are stripped here.
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.without_url())
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyKeyboardMarkup>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ReplyKeyboardMarkup {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
    one_time_keyboard: bool,
}

impl From<&QuickReplyMenu> for ReplyKeyboardMarkup {
    fn from(menu: &QuickReplyMenu) -> Self {
        Self {
            keyboard: menu
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|label| KeyboardButton {
                            text: label.clone(),
                        })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
            one_time_keyboard: false,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct KeyboardButton {
    text: String,
}

pub struct BotApiClient {
    rt: Runtime,
    http: reqwest::Client,
    base_url: String,
    poll_timeout_secs: u64,
}

impl BotApiClient {
    pub fn new(
        api_base_url: &str,
        token: &str,
        poll_timeout_secs: u64,
    ) -> Result<Self, BotApiError> {
        let rt = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("shiftlog-http")
            .enable_all()
            .build()
            .map_err(BotApiError::Runtime)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs) + REQUEST_TIMEOUT_SLACK)
            .build()?;

        Ok(Self {
            rt,
            http,
            base_url: format!("{}/bot{}", api_base_url.trim_end_matches('/'), token),
            poll_timeout_secs,
        })
    }

    /// Long-polls for message updates newer than `offset`.
    pub fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, BotApiError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: ["message"],
        };
        self.call("getUpdates", &request)
    }

    pub fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        menu: Option<&QuickReplyMenu>,
    ) -> Result<(), BotApiError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_markup: menu.map(ReplyKeyboardMarkup::from),
        };
        let _sent: serde_json::Value = self.call("sendMessage", &request)?;
        Ok(())
    }

    fn call<B, T>(&self, method: &'static str, body: &B) -> Result<T, BotApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let response: ApiResponse<T> = self.rt.block_on(async {
            self.http
                .post(&url)
                .json(body)
                .send()
                .await?
                .json::<ApiResponse<T>>()
                .await
        })?;

        unwrap_response(method, response)
    }
}

fn unwrap_response<T>(method: &'static str, response: ApiResponse<T>) -> Result<T, BotApiError> {
    match response {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse {
            description,
            error_code,
            ..
        } => Err(BotApiError::Rejected {
            method,
            error_code,
            description: description.unwrap_or_else(|| "no result in response".to_owned()),
        }),
    }
}
