use async_trait::async_trait;
use std::collections::HashMap;

/// HTTP headers to send with the WebSocket upgrade request
pub type Headers = HashMap<String, String>;

/// Trait for providing upgrade-request headers dynamically
///
/// Called every time a transport opens, so values such as session tokens
/// obtained by an earlier login step can be fetched fresh.
///
/// # Example
/// ```ignore
/// struct SessionCookie {
///     token: String,
/// }
///
/// #[async_trait::async_trait]
/// impl HeaderProvider for SessionCookie {
///     async fn get_headers(&self) -> Headers {
///         let mut headers = HashMap::new();
///         headers.insert("Cookie".to_string(), format!("session={}", self.token));
///         headers
///     }
/// }
/// ```
#[async_trait]
pub trait HeaderProvider: Send + Sync {
    /// Generate headers to send with the upgrade request
    async fn get_headers(&self) -> Headers;
}

/// A no-op header provider that doesn't add any headers
pub struct NoHeaders;

#[async_trait]
impl HeaderProvider for NoHeaders {
    async fn get_headers(&self) -> Headers {
        HashMap::new()
    }
}

/// Header provider returning a fixed set of headers
pub struct StaticHeaders {
    headers: Headers,
}

impl StaticHeaders {
    pub fn new(headers: Headers) -> Self {
        Self { headers }
    }
}

#[async_trait]
impl HeaderProvider for StaticHeaders {
    async fn get_headers(&self) -> Headers {
        self.headers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_headers_is_empty() {
        assert!(NoHeaders.get_headers().await.is_empty());
    }

    #[tokio::test]
    async fn test_static_headers_are_returned_each_time() {
        let mut headers = Headers::new();
        headers.insert("Authorization".to_string(), "Bearer abc".to_string());
        let provider = StaticHeaders::new(headers);

        for _ in 0..2 {
            let got = provider.get_headers().await;
            assert_eq!(got.get("Authorization").map(String::as_str), Some("Bearer abc"));
        }
    }
}
