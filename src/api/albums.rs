use tracing::instrument;

use super::{CatalogResource, Fields, ResourceClient};
use crate::error::ApiResult;
use crate::models::{Album, AlbumDraft, AlbumPatch};
use crate::ports::transport::RequestBody;

impl CatalogResource for Album {
    const COLLECTION: &'static str = "albums";
    const NOUN: &'static str = "album";

    type Draft = AlbumDraft;
    type Patch = AlbumPatch;

    fn encode_draft(draft: AlbumDraft) -> RequestBody {
        Fields::new()
            .text("title", draft.title)
            .text("artist_id", draft.artist_id)
            .optional("release_date", draft.release_date)
            .file("cover_image", draft.cover_image)
            .into_multipart()
    }

    fn encode_patch(patch: AlbumPatch) -> RequestBody {
        Fields::new()
            .optional("title", patch.title)
            .optional("artist_id", patch.artist_id)
            .optional("release_date", patch.release_date)
            .file("cover_image", patch.cover_image)
            .into_multipart()
    }
}

impl ResourceClient<Album> {
    #[instrument(skip(self))]
    pub async fn list_by_artist(&self, artist_id: i64) -> ApiResult<Vec<Album>> {
        self.list_by(
            "list_by_artist",
            "artist_id",
            artist_id,
            "Failed to fetch albums by artist",
        )
        .await
    }
}
