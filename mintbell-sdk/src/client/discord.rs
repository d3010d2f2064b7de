//! Discord REST client.
//!
//! Only the endpoints needed to validate the token, locate the gateway and
//! post messages are covered.

use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::{Channel, CreateMessage, CurrentUser, GatewayBot};

const DEFAULT_API_BASE: &str = "https://discord.com/api/v10/";

/// Typed HTTP client for the Discord REST API, authenticated as a bot.
#[derive(Debug, Clone)]
pub struct DiscordClient {
    http: Client,
    api_base: Url,
    token: Arc<str>,
}

impl DiscordClient {
    pub fn new(http: Client, token: impl Into<Arc<str>>) -> Result<Self, ClientError> {
        Ok(Self {
            http,
            api_base: Url::parse(DEFAULT_API_BASE)?,
            token: token.into(),
        })
    }

    /// Point the client at a different API root.
    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = api_base;
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// `GET /users/@me` – validates the token.
    pub async fn current_user(&self) -> Result<CurrentUser, ClientError> {
        let url = self.api_base.join("users/@me")?;
        let resp = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /gateway/bot` – the WebSocket URL to connect to.
    pub async fn gateway_url(&self) -> Result<String, ClientError> {
        let url = self.api_base.join("gateway/bot")?;
        let resp = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, self.authorization())
            .send()
            .await?;
        let gateway: GatewayBot = parse_response(resp).await?;
        Ok(gateway.url)
    }

    /// `GET /channels/{id}`; `None` when the channel does not exist or the
    /// bot cannot see it.
    pub async fn channel(&self, channel_id: u64) -> Result<Option<Channel>, ClientError> {
        let url = self.api_base.join(&format!("channels/{channel_id}"))?;
        let resp = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, self.authorization())
            .send()
            .await?;
        if matches!(resp.status(), StatusCode::NOT_FOUND | StatusCode::FORBIDDEN) {
            return Ok(None);
        }
        parse_response(resp).await.map(Some)
    }

    /// `POST /channels/{id}/messages`
    pub async fn create_message(&self, channel_id: u64, content: &str) -> Result<(), ClientError> {
        let url = self.api_base.join(&format!("channels/{channel_id}/messages"))?;
        let resp = self
            .http
            .post(url)
            .header(header::AUTHORIZATION, self.authorization())
            .json(&CreateMessage { content })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }
        Ok(())
    }
}
