use bytes::Bytes;
use rand::{rngs::OsRng, Rng};
use tracing::{debug, instrument};

use crate::error::{fail, internal, store_error, ApiError};
use crate::state::AppState;
use crate::store::UserPatch;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn random_suffix() -> String {
    let mut rng = OsRng;
    (0..8).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

/// Writes the picture to the upload directory as `user_<id>_<hex>.<ext>`,
/// removes the previously stored file if any, and persists the new URL path.
#[instrument(skip(state, data))]
pub async fn store_profile_picture(
    state: &AppState,
    user_id: u32,
    data: Bytes,
    content_type: &str,
) -> Result<String, ApiError> {
    let Some(ext) = ext_from_mime(content_type) else {
        return Err(fail(
            axum::http::StatusCode::BAD_REQUEST,
            "Invalid file type. Only JPEG, PNG, GIF, and WebP allowed.",
        ));
    };
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(fail(
            axum::http::StatusCode::BAD_REQUEST,
            "File too large. Max 5MB allowed.",
        ));
    }

    let dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(dir).await.map_err(internal)?;

    let filename = format!("user_{}_{}.{}", user_id, random_suffix(), ext);
    tokio::fs::write(dir.join(&filename), &data)
        .await
        .map_err(internal)?;

    // Replacement cleans up the old file; deletion of the user does not.
    if let Ok(Some(existing)) = state.store.user_by_id(user_id).await {
        if let Some(old_name) = existing
            .profile_picture
            .as_deref()
            .and_then(|p| p.rsplit('/').next())
        {
            let old_path = dir.join(old_name);
            if let Err(e) = tokio::fs::remove_file(&old_path).await {
                debug!(path = %old_path.display(), error = %e, "old picture not removed");
            }
        }
    }

    let url = format!("/static/img/uploads/{filename}");
    state
        .store
        .update_user(
            user_id,
            UserPatch {
                profile_picture: Some(url.clone()),
                ..Default::default()
            },
        )
        .await
        .map_err(store_error)?;

    Ok(url)
}
