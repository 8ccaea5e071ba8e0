use tracing::instrument;

use super::{CatalogResource, Fields, ResourceClient, decode, execute};
use crate::error::ApiResult;
use crate::models::{Artist, ArtistDraft, ArtistPatch};
use crate::ports::transport::{ApiRequest, RequestBody};

impl CatalogResource for Artist {
    const COLLECTION: &'static str = "artists";
    const NOUN: &'static str = "artist";

    type Draft = ArtistDraft;
    type Patch = ArtistPatch;

    fn encode_draft(draft: ArtistDraft) -> RequestBody {
        Fields::new()
            .text("name", draft.name)
            .optional("bio", draft.bio)
            .optional("birth_date", draft.birth_date)
            .optional("country", draft.country)
            .into_json()
    }

    fn encode_patch(patch: ArtistPatch) -> RequestBody {
        Fields::new()
            .optional("name", patch.name)
            .optional("bio", patch.bio)
            .optional("birth_date", patch.birth_date)
            .optional("country", patch.country)
            .into_json()
    }
}

impl ResourceClient<Artist> {
    /// Artists published by the signed-in account. Publishers only.
    #[instrument(skip(self))]
    pub async fn my_artists(&self) -> ApiResult<Vec<Artist>> {
        let response = execute(
            &*self.transport,
            ApiRequest::get(Self::endpoint("my_artists")),
            "Failed to fetch your artists",
        )
        .await?;
        decode(&response)
    }
}
