use tracing::instrument;

use super::{CatalogResource, Fields, ResourceClient};
use crate::error::ApiResult;
use crate::models::{Song, SongDraft, SongPatch};
use crate::ports::transport::RequestBody;

impl CatalogResource for Song {
    const COLLECTION: &'static str = "songs";
    const NOUN: &'static str = "song";

    type Draft = SongDraft;
    type Patch = SongPatch;

    fn encode_draft(draft: SongDraft) -> RequestBody {
        Fields::new()
            .text("title", draft.title)
            .text("album_id", draft.album_id)
            .optional("release_date", draft.release_date)
            .text("genre", draft.genre)
            .file("audio_file", Some(draft.audio_file))
            .file("cover_image", draft.cover_image)
            .into_multipart()
    }

    fn encode_patch(patch: SongPatch) -> RequestBody {
        Fields::new()
            .optional("title", patch.title)
            .optional("album_id", patch.album_id)
            .optional("release_date", patch.release_date)
            .optional("genre", patch.genre)
            .file("audio_file", patch.audio_file)
            .file("cover_image", patch.cover_image)
            .into_multipart()
    }
}

impl ResourceClient<Song> {
    #[instrument(skip(self))]
    pub async fn list_by_album(&self, album_id: i64) -> ApiResult<Vec<Song>> {
        self.list_by(
            "list_by_album",
            "album_id",
            album_id,
            "Failed to fetch songs by album",
        )
        .await
    }
}
