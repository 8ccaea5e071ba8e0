pub mod session_file;

use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Context, Result};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method as HttpMethod};
use url::Url;

use crate::ports::transport::{
    ApiRequest, ApiResponse, FormField, Method, RequestBody, Transport, TransportError,
};

/// `reqwest` adapter for the catalog backend.
///
/// The session cookie lives in a shared jar and is attached to every request,
/// the equivalent of `credentials: include`. Each request carries its own
/// timeout.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    jar: Arc<Jar>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let base_url = with_trailing_slash(base_url);
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .wrap_err("Failed to build http client")?;
        Ok(Self {
            client,
            base_url,
            jar,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Loads cookies previously returned by [`HttpTransport::cookies`].
    pub fn restore_cookies(&self, cookies: &str) {
        for cookie in cookies.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            self.jar.add_cookie_str(cookie, &self.base_url);
        }
    }

    /// Cookies the jar would send to the API, as a `Cookie` header value.
    pub fn cookies(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(String::from))
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| TransportError::InvalidUrl(error.to_string()))
    }

    fn classify(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Send(error.to_string())
        }
    }
}

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn into_form(fields: Vec<FormField>) -> Result<Form, TransportError> {
    fields
        .into_iter()
        .try_fold(Form::new(), |form, field| match field {
            FormField::Text { name, value } => Ok(form.text(name, value)),
            FormField::File { name, attachment } => {
                let part = Part::bytes(attachment.bytes)
                    .file_name(attachment.file_name)
                    .mime_str(&attachment.content_type)
                    .map_err(|error| TransportError::Send(error.to_string()))?;
                Ok(form.part(name, part))
            }
        })
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.endpoint(&request.path)?;
        let method = match request.method {
            Method::Get => HttpMethod::GET,
            Method::Post => HttpMethod::POST,
            Method::Delete => HttpMethod::DELETE,
        };
        tracing::debug!(%method, %url, "Sending request");

        let builder = self
            .client
            .request(method, url)
            .query(&request.query)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout);
        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(fields) => builder.multipart(into_form(fields)?),
        };

        let response = builder.send().await.map_err(|error| self.classify(error))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|error| {
            if error.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::Body(error.to_string())
            }
        })?;
        tracing::debug!(status, bytes = body.len(), "Received response");

        Ok(ApiResponse::new(status, body.to_vec()))
    }
}
