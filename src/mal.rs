//! Jikan (MyAnimeList) 客户端
//! 只用来渲染预览卡片，不写入会话字段。

use crate::http_client::get_json;
use crate::types::PreviewData;
use serde::Deserialize;

const JIKAN_BASE: &str = "https://api.jikan.moe/v4/anime";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JikanResponse {
    #[serde(default)]
    pub data: JikanAnime,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JikanAnime {
    #[serde(default)]
    pub images: JikanImages,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub episodes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JikanImages {
    #[serde(default)]
    pub jpg: JikanImageSet,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JikanImageSet {
    #[serde(default)]
    pub large_image_url: Option<String>,
}

pub async fn fetch_preview(mal_id: u64) -> anyhow::Result<PreviewData> {
    let url = format!("{}/{}", JIKAN_BASE, mal_id);
    let response: JikanResponse = get_json(&url, None)
        .await
        .map_err(|e| anyhow::anyhow!("No se pudo obtener la información de MyAnimeList. ({})", e))?;

    let anime = response.data;
    Ok(PreviewData {
        image_url: anime.images.jpg.large_image_url.unwrap_or_default(),
        title: anime.title,
        year: anime.year.map(|y| y.to_string()),
        kind: anime.kind.unwrap_or_else(|| "Anime".to_string()),
        episodes: anime.episodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_jikan_shape() {
        let raw = r#"{
            "data": {
                "images": {"jpg": {"large_image_url": "https://cdn.myanimelist.net/x.jpg"}},
                "title": "Akira",
                "year": 1988,
                "type": "Movie",
                "episodes": 1
            }
        }"#;
        let response: JikanResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.data.title, "Akira");
        assert_eq!(response.data.year, Some(1988));
        assert_eq!(response.data.kind.as_deref(), Some("Movie"));
        assert_eq!(
            response.data.images.jpg.large_image_url.as_deref(),
            Some("https://cdn.myanimelist.net/x.jpg")
        );
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let response: JikanResponse = serde_json::from_str(r#"{"data": {"title": "X"}}"#).unwrap();
        assert_eq!(response.data.title, "X");
        assert!(response.data.year.is_none());
        assert!(response.data.images.jpg.large_image_url.is_none());
    }
}
