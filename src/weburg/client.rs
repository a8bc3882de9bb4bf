//! Thin HTTP client for the Weburg site: the site only answers AJAX
//! requests carrying a browser user agent and a no-auth session cookie.

use std::time::Duration;

use reqwest::header;

use super::{Result, WeburgError};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:27.0) Gecko/20100101 Firefox/27.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Client {
    http: reqwest::Client,
}

impl Client {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self { http })
    }

    pub async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .header(header::COOKIE, "session_id=noauth")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeburgError::BadStatus(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
