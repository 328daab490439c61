//! TMDB 客户端
//! 预填内容信息（标题、海报、简介、集长、章节名）并计算绝对集数。
//! 查询语言固定 es-ES，API key 可用环境变量 TMDB_API_KEY 覆盖。

use crate::http_client::{get_json, HttpClientError};
use crate::session::EditorSession;
use crate::types::{ContentType, FieldInput, PreviewData};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const TMDB_LANG: &str = "es-ES";
const DEFAULT_TMDB_API_KEY: &str = "b619bab44d405bb6c49b14dfc7365b51";

static TMDB_API_KEY: Lazy<String> =
    Lazy::new(|| std::env::var("TMDB_API_KEY").unwrap_or_else(|_| DEFAULT_TMDB_API_KEY.to_string()));

/// 电影/剧集详情 (只保留要用的字段)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Detail {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub runtime: Option<f64>,
    #[serde(default)]
    pub episode_run_time: Vec<f64>,
    #[serde(default)]
    pub number_of_episodes: Option<i64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub seasons: Vec<Season>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Season {
    #[serde(default)]
    pub season_number: i64,
    #[serde(default)]
    pub episode_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodeDetail {
    #[serde(default)]
    pub name: Option<String>,
}

/// TMDB 填充结果：预览卡片 + 可能的非致命警告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TmdbFill {
    pub preview: PreviewData,
    pub warning: Option<String>,
}

pub async fn fetch_detail(content_type: ContentType, id: &str) -> Result<Detail, HttpClientError> {
    let url = format!(
        "{}/{}/{}?api_key={}&language={}",
        TMDB_BASE,
        content_type.as_str(),
        id,
        TMDB_API_KEY.as_str(),
        TMDB_LANG
    );
    get_json(&url, None).await
}

pub async fn fetch_episode_detail(
    id: &str,
    season: &str,
    episode: &str,
) -> Result<EpisodeDetail, HttpClientError> {
    let url = format!(
        "{}/tv/{}/season/{}/episode/{}?api_key={}&language={}",
        TMDB_BASE,
        id,
        season,
        episode,
        TMDB_API_KEY.as_str(),
        TMDB_LANG
    );
    get_json(&url, None).await
}

/// 用 TMDB 数据填充会话：标题、海报、简介、集长，剧集另加系列名和章节名
pub async fn fill_from_tmdb(session: &mut EditorSession) -> anyhow::Result<TmdbFill> {
    let id = session.tmdb_id.trim().to_string();
    if id.is_empty() {
        anyhow::bail!("Introduce un ID de TMDB.");
    }

    let detail = fetch_detail(session.content_type, &id)
        .await
        .map_err(|e| anyhow::anyhow!("No se encontró el contenido. ({})", e))?;

    // 集长以秒存储
    match session.content_type {
        ContentType::Tv => {
            if let Some(minutes) = detail.episode_run_time.first() {
                session.episode_length = format_seconds(minutes * 60.0);
            }
        }
        ContentType::Movie => {
            if let Some(minutes) = detail.runtime {
                session.episode_length = format_seconds(minutes * 60.0);
            }
        }
    }

    let title = detail
        .title
        .clone()
        .or_else(|| detail.name.clone())
        .unwrap_or_default();
    session.set_field("title", FieldInput::Text(title.clone()));
    session.set_field(
        "posterUrl",
        FieldInput::Text(poster_url(&detail, "original")),
    );
    session.set_field(
        "synopsis",
        FieldInput::Text(detail.overview.clone().unwrap_or_default()),
    );

    let mut warning = None;
    if session.content_type.is_series() {
        session.set_field(
            "seriesName",
            FieldInput::Text(detail.name.clone().unwrap_or_default()),
        );

        let season = session.season.trim().to_string();
        let episode = session.episode.trim().to_string();
        if !season.is_empty() && !episode.is_empty() {
            match fetch_episode_detail(&id, &season, &episode).await {
                Ok(episode_detail) => {
                    session.set_field(
                        "chapterName",
                        FieldInput::Text(episode_detail.name.unwrap_or_default()),
                    );
                }
                Err(e) => {
                    warn!("⚠️ 获取章节详情失败 (tmdb={} s{}e{}): {}", id, season, episode, e);
                    warning = Some(format!("No se encontró el episodio. ({})", e));
                }
            }
        }
    }

    let year = match session.content_type {
        ContentType::Movie => detail.release_date.as_deref(),
        ContentType::Tv => detail.first_air_date.as_deref(),
    }
    .and_then(|date| date.get(0..4))
    .map(|y| y.to_string());

    let preview = PreviewData {
        image_url: poster_url(&detail, "w500"),
        title,
        year,
        kind: if session.content_type.is_series() {
            "TV".to_string()
        } else {
            "Movie".to_string()
        },
        episodes: if session.content_type.is_series() {
            detail.number_of_episodes
        } else {
            None
        },
    };

    Ok(TmdbFill { preview, warning })
}

/// 绝对集数：把目标季之前所有正季的集数加起来，再加上目标集。
/// 电影恒为 1；集数无效返回 None；缺 ID/季号或查询失败时退回相对集数。
pub async fn absolute_episode_number(session: &EditorSession) -> Option<i64> {
    if !session.content_type.is_series() {
        return Some(1);
    }

    let episode: i64 = session.episode.trim().parse().ok()?;
    let id = session.tmdb_id.trim();
    if id.is_empty() {
        return Some(episode);
    }
    let season: i64 = match session.season.trim().parse() {
        Ok(season) => season,
        Err(_) => return Some(episode),
    };

    match fetch_detail(ContentType::Tv, id).await {
        Ok(detail) if !detail.seasons.is_empty() => {
            Some(absolute_from_seasons(&detail.seasons, season, episode))
        }
        Ok(_) => {
            warn!("⚠️ TMDB 未返回季信息，退回相对集数 {}", episode);
            Some(episode)
        }
        Err(e) => {
            warn!("⚠️ 获取 TMDB 季信息失败: {}，退回相对集数 {}", e, episode);
            Some(episode)
        }
    }
}

/// 第 0 季（特别篇）不计入
pub fn absolute_from_seasons(seasons: &[Season], target_season: i64, target_episode: i64) -> i64 {
    let prior: i64 = seasons
        .iter()
        .filter(|s| s.season_number > 0 && s.season_number < target_season)
        .map(|s| s.episode_count)
        .sum();
    prior + target_episode
}

fn poster_url(detail: &Detail, size: &str) -> String {
    match detail.poster_path.as_deref() {
        Some(path) => format!("https://image.tmdb.org/t/p/{}{}", size, path),
        None => String::new(),
    }
}

fn format_seconds(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(number: i64, episodes: i64) -> Season {
        Season {
            season_number: number,
            episode_count: episodes,
        }
    }

    #[test]
    fn test_absolute_sums_prior_seasons() {
        let seasons = vec![season(1, 12), season(2, 10)];
        assert_eq!(absolute_from_seasons(&seasons, 2, 5), 17);
    }

    #[test]
    fn test_absolute_excludes_specials() {
        let seasons = vec![season(0, 4), season(1, 12), season(2, 10)];
        assert_eq!(absolute_from_seasons(&seasons, 2, 5), 17);
    }

    #[test]
    fn test_absolute_first_season_is_raw_episode() {
        let seasons = vec![season(1, 12), season(2, 10)];
        assert_eq!(absolute_from_seasons(&seasons, 1, 7), 7);
    }

    #[test]
    fn test_absolute_ignores_unordered_listing() {
        let seasons = vec![season(2, 10), season(0, 4), season(1, 12)];
        assert_eq!(absolute_from_seasons(&seasons, 3, 1), 23);
    }
}
