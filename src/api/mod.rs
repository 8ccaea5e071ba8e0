pub mod albums;
pub mod artists;
pub mod auth;
pub mod songs;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::{ApiError, ApiResult, TOKEN_EXPIRED};
use crate::models::{Album, Artist, Attachment, OwnerFlag, Song};
use crate::ports::transport::{ApiRequest, ApiResponse, FormField, RequestBody, Transport};

pub type ArtistClient = ResourceClient<Artist>;
pub type AlbumClient = ResourceClient<Album>;
pub type SongClient = ResourceClient<Song>;

/// Sends `request` and maps any non-success response to an `ApiError`.
///
/// A `"Token Expired"` detail becomes `ApiError::TokenExpired`; every other
/// failure carries `failure` as its message. Nothing is retried.
pub(crate) async fn execute(
    transport: &dyn Transport,
    request: ApiRequest,
    failure: &str,
) -> ApiResult<ApiResponse> {
    let response = transport.send(request).await?;
    if response.is_success() {
        return Ok(response);
    }
    if response.detail().as_deref() == Some(TOKEN_EXPIRED) {
        tracing::info!("Session token expired");
        return Err(ApiError::TokenExpired);
    }
    tracing::warn!(status = response.status, "{}", failure);
    Err(ApiError::Resource {
        status: response.status,
        message: failure.to_string(),
    })
}

pub(crate) fn decode<T: DeserializeOwned>(response: &ApiResponse) -> ApiResult<T> {
    Ok(serde_json::from_slice(&response.body)?)
}

/// Collects submitted fields. Absent and blank optional values are dropped so
/// the backend treats them as "no change".
#[derive(Debug, Default)]
pub(crate) struct Fields(Vec<FormField>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl ToString) -> Self {
        self.0.push(FormField::Text {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn optional(self, name: &str, value: Option<impl ToString>) -> Self {
        match value.map(|v| v.to_string()) {
            Some(value) if !value.trim().is_empty() => self.text(name, value),
            _ => self,
        }
    }

    pub fn file(mut self, name: &str, attachment: Option<Attachment>) -> Self {
        if let Some(attachment) = attachment {
            self.0.push(FormField::File {
                name: name.to_string(),
                attachment,
            });
        }
        self
    }

    /// JSON object of the text fields.
    pub fn into_json(self) -> RequestBody {
        let object = self
            .0
            .into_iter()
            .filter_map(|field| match field {
                FormField::Text { name, value } => Some((name, serde_json::Value::String(value))),
                FormField::File { .. } => None,
            })
            .collect::<serde_json::Map<_, _>>();
        RequestBody::Json(serde_json::Value::Object(object))
    }

    pub fn into_multipart(self) -> RequestBody {
        RequestBody::Multipart(self.0)
    }
}

/// A catalog entity served under `<COLLECTION>/...` endpoints.
pub trait CatalogResource: DeserializeOwned + Send + 'static {
    /// Path segment, e.g. `artists`.
    const COLLECTION: &'static str;
    /// Singular noun used in failure messages.
    const NOUN: &'static str;

    type Draft: Send;
    type Patch: Send;

    fn encode_draft(draft: Self::Draft) -> RequestBody;

    fn encode_patch(patch: Self::Patch) -> RequestBody;
}

/// Stateless request builder for one resource collection.
pub struct ResourceClient<R> {
    transport: Arc<dyn Transport>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: CatalogResource> ResourceClient<R> {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            _resource: PhantomData,
        }
    }

    /// `<collection>/<action>/`. Resource actions are only routed with the
    /// trailing slash.
    fn endpoint(action: &str) -> String {
        format!("{}/{}/", R::COLLECTION, action)
    }

    #[instrument(skip(self), fields(resource = R::COLLECTION))]
    pub async fn get(&self, id: i64) -> ApiResult<R> {
        let request = ApiRequest::get(Self::endpoint("get")).query("id", id);
        let failure = format!("Failed to fetch {}", R::NOUN);
        let response = execute(&*self.transport, request, &failure).await?;
        decode(&response)
    }

    #[instrument(skip(self), fields(resource = R::COLLECTION))]
    pub async fn list(&self) -> ApiResult<Vec<R>> {
        let failure = format!("Failed to fetch {}", R::COLLECTION);
        let response =
            execute(&*self.transport, ApiRequest::get(Self::endpoint("list")), &failure).await?;
        decode(&response)
    }

    #[instrument(skip(self, draft), fields(resource = R::COLLECTION))]
    pub async fn create(&self, draft: R::Draft) -> ApiResult<R> {
        let request = ApiRequest::post(Self::endpoint("create")).body(R::encode_draft(draft));
        let failure = format!("Failed to create {}", R::NOUN);
        let response = execute(&*self.transport, request, &failure).await?;
        decode(&response)
    }

    #[instrument(skip(self, patch), fields(resource = R::COLLECTION))]
    pub async fn edit(&self, id: i64, patch: R::Patch) -> ApiResult<R> {
        let request = ApiRequest::post(Self::endpoint("edit"))
            .query("id", id)
            .body(R::encode_patch(patch));
        let failure = format!("Failed to edit {}", R::NOUN);
        let response = execute(&*self.transport, request, &failure).await?;
        decode(&response)
    }

    #[instrument(skip(self), fields(resource = R::COLLECTION))]
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let request = ApiRequest::delete(Self::endpoint("delete")).query("id", id);
        let failure = format!("Failed to delete {}", R::NOUN);
        execute(&*self.transport, request, &failure).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(resource = R::COLLECTION))]
    pub async fn is_owner(&self, id: i64) -> ApiResult<OwnerFlag> {
        let request = ApiRequest::get(Self::endpoint("is_owner")).query("id", id);
        let failure = format!("Failed to check {} ownership", R::NOUN);
        let response = execute(&*self.transport, request, &failure).await?;
        decode(&response)
    }

    /// `GET <collection>/<action>/?<key>=<id>`, a filtered read by parent.
    async fn list_by(&self, action: &str, key: &str, id: i64, failure: &str) -> ApiResult<Vec<R>> {
        let request = ApiRequest::get(Self::endpoint(action)).query(key, id);
        let response = execute(&*self.transport, request, failure).await?;
        decode(&response)
    }
}
