//! Settings API Handlers

use axum::{Json, extract::State};
use shared::models::{
    LanguageSetting, NavigationSettings, SocialLink, VideoMapping, VideoMappingList, WifiSettings,
};
use validator::Validate;

use crate::core::ServerState;
use crate::store::VideoTable;
use crate::utils::{AppError, AppResult};

/// GET /api/settings/navigation - stored settings, defaults when none saved
pub async fn navigation(State(state): State<ServerState>) -> AppResult<Json<NavigationSettings>> {
    Ok(Json(state.store.settings().await?))
}

/// PUT /api/settings/navigation - replace; at least one language must stay enabled
pub async fn update_navigation(
    State(state): State<ServerState>,
    Json(settings): Json<NavigationSettings>,
) -> AppResult<Json<NavigationSettings>> {
    settings.validate()?;
    let saved = state.store.replace_settings(settings).await?;
    tracing::info!(
        languages = saved.enabled_languages().len(),
        wifi = saved.wifi.enabled,
        social = saved.enabled_social_links().len(),
        "Navigation settings updated"
    );
    Ok(Json(saved))
}

/// GET /api/settings/languages - enabled languages only
pub async fn languages(State(state): State<ServerState>) -> AppResult<Json<Vec<LanguageSetting>>> {
    Ok(Json(state.store.settings().await?.enabled_languages()))
}

/// GET /api/settings/wifi
pub async fn wifi(State(state): State<ServerState>) -> AppResult<Json<WifiSettings>> {
    Ok(Json(state.store.settings().await?.wifi))
}

/// GET /api/settings/social - enabled links only
pub async fn social(State(state): State<ServerState>) -> AppResult<Json<Vec<SocialLink>>> {
    Ok(Json(state.store.settings().await?.enabled_social_links()))
}

/// `false` for blank paths, object URLs and stringified null/undefined
fn is_valid_video_path(path: &str) -> bool {
    let path = path.trim();
    !path.is_empty() && !path.starts_with("blob:") && path != "undefined" && path != "null"
}

/// PUT /api/settings/videos - replace the whole category-to-video table
pub async fn replace_videos(
    State(state): State<ServerState>,
    Json(table): Json<VideoTable>,
) -> AppResult<Json<VideoMappingList>> {
    if let Some((key, _)) = table
        .iter()
        .find(|(key, path)| key.trim().is_empty() || !is_valid_video_path(path))
    {
        return Err(AppError::validation(format!("Invalid video mapping '{}'", key))
            .with_detail("key", key.clone()));
    }
    let saved = state.store.replace_video_mappings(table).await?;
    tracing::info!(mappings = saved.len(), "Video mappings replaced");
    Ok(Json(video_mapping_list(saved)))
}

pub(crate) fn video_mapping_list(table: VideoTable) -> VideoMappingList {
    VideoMappingList::success(
        table
            .into_iter()
            .map(|(category_id, video_path)| VideoMapping {
                category_id,
                video_path,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_path_rules() {
        assert!(is_valid_video_path("/videos/a.mp4"));
        assert!(!is_valid_video_path("  "));
        assert!(!is_valid_video_path("blob:http://x/1"));
        assert!(!is_valid_video_path("undefined"));
        assert!(!is_valid_video_path("null"));
    }

    #[test]
    fn test_list_is_sorted_by_key() {
        let table = VideoTable::from([
            ("snacks".to_string(), "/v/s.mp4".to_string()),
            ("home".to_string(), "/v/h.mp4".to_string()),
        ]);
        let list = video_mapping_list(table);
        assert_eq!(list.status, VideoMappingList::SUCCESS);
        let keys: Vec<&str> = list.mappings.iter().map(|m| m.category_id.as_str()).collect();
        assert_eq!(keys, ["home", "snacks"]);
    }
}
