//! 共享 HTTP 客户端
//! TMDB / Aniskip / Jikan 三个上游共用一个连接池

use once_cell::sync::Lazy;
use reqwest::{Client, Response};
use std::time::Duration;
use thiserror::Error;

const TIMEOUT_SECONDS: u64 = 15;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 (PlayerConfig API)";

/// 全局 HTTP 客户端
pub static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECONDS))
        .user_agent(USER_AGENT)
        .gzip(true)
        .brotli(true)
        .build()
        .expect("Failed to create HTTP client")
});

/// 错误文案直接进操作员的弹窗，用西语
#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("tiempo de espera agotado")]
    Timeout,
    #[error("fallo en la petición: {0}")]
    RequestFailed(String),
    #[error("código de estado {0}")]
    BadStatus(u16),
}

/// GET 请求
pub async fn get(url: &str, referer: Option<&str>) -> Result<Response, HttpClientError> {
    let mut req = HTTP_CLIENT.get(url);

    if let Some(ref_url) = referer {
        req = req.header("Referer", ref_url);
    }

    req = req
        .header("Accept-Language", "es-ES,es;q=0.9,en;q=0.8")
        .header("Connection", "keep-alive");

    let response = req.send().await.map_err(|e| {
        if e.is_timeout() {
            HttpClientError::Timeout
        } else {
            HttpClientError::RequestFailed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(HttpClientError::BadStatus(response.status().as_u16()));
    }

    Ok(response)
}

/// GET 请求并返回 JSON
pub async fn get_json<T: serde::de::DeserializeOwned>(
    url: &str,
    referer: Option<&str>,
) -> Result<T, HttpClientError> {
    let response = get(url, referer).await?;
    response
        .json()
        .await
        .map_err(|e| HttpClientError::RequestFailed(e.to_string()))
}
