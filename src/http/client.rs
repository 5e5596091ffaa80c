//! `reqwest`-backed transport for talking to a real server

use super::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;

/// Sends console requests to `base_url`, keeping session cookies between calls
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: String,
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(TransportError::InvalidRequest("base url is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self { base_url, http })
    }

    /// Absolute URL for a site-relative path
    pub fn endpoint(&self, path: &str) -> String {
        let path = path.trim();
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = Url::parse(&self.endpoint(&request.path))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let mut builder = match request.method {
            Method::Get => self.http.get(url.clone()),
            Method::Post => {
                let form = request
                    .form
                    .into_iter()
                    .fold(Form::new(), |form, (name, value)| form.text(name, value));
                self.http.post(url.clone()).multipart(form)
            }
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let redirected = response.url() != &url;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse {
            status,
            content_type,
            redirected,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let transport = ReqwestTransport::new("http://127.0.0.1:8000/").unwrap();
        assert_eq!(
            transport.endpoint("/client/get/"),
            "http://127.0.0.1:8000/client/get/"
        );
        assert_eq!(
            transport.endpoint("client/get/"),
            "http://127.0.0.1:8000/client/get/"
        );
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        assert!(ReqwestTransport::new("  ").is_err());
    }
}
