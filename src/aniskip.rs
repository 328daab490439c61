//! Aniskip 客户端
//! 按 MAL ID + 绝对集数查询片头/片尾跳过区间，筛选后写回会话的时间字段。

use crate::http_client::{get_json, HttpClientError};
use crate::session::EditorSession;
use crate::tmdb;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

const ANISKIP_BASE: &str = "https://api.aniskip.com/v2/skip-times";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkipResponse {
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub results: Vec<SkipResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipResult {
    pub skip_type: String,
    #[serde(default)]
    pub interval: Option<SkipInterval>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipInterval {
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Error)]
pub enum SkipError {
    #[error("Introduce un ID de MyAnimeList válido (solo números positivos).")]
    InvalidMalId,
    #[error("Introduce la duración del episodio en segundos.")]
    InvalidEpisodeLength,
    #[error("No se pudo determinar el número de episodio absoluto.")]
    InvalidAbsoluteEpisode,
    #[error("URL de consulta inválida: {0}")]
    Url(#[from] url::ParseError),
    #[error("Error al consultar Aniskip: {0}")]
    Api(#[from] HttpClientError),
    #[error("No se encontraron datos de skip times para este episodio.")]
    NotFound,
    #[error("No se encontraron intervalos de skip aplicables.")]
    NoUsableIntervals,
}

/// 写回结果：被接受的片头/片尾区间 (可能只有其一)
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipFill {
    pub opening: Option<SkipInterval>,
    pub ending: Option<SkipInterval>,
}

pub async fn fetch_skip_times(
    mal_id: u64,
    absolute_episode: i64,
    episode_length: f64,
) -> Result<SkipResponse, SkipError> {
    let mut url = Url::parse(&format!(
        "{}/{}/{}",
        ANISKIP_BASE, mal_id, absolute_episode
    ))?;
    url.query_pairs_mut()
        .append_pair("types[]", "op")
        .append_pair("types[]", "ed")
        .append_pair("episodeLength", &episode_length.to_string());

    Ok(get_json(url.as_str(), None).await?)
}

/// 每类各取最长的候选区间，再按集长过滤：
/// 片头要求结束不超过集长，片尾要求开始不超过集长。
/// 片头片尾连候选都没有才算失败；有候选但被过滤掉不算。
pub fn choose_intervals(results: &[SkipResult], episode_length: f64) -> Result<SkipFill, SkipError> {
    let opening = select_longest(results, "op");
    let ending = select_longest(results, "ed");
    if opening.is_none() && ending.is_none() {
        return Err(SkipError::NoUsableIntervals);
    }

    Ok(SkipFill {
        opening: opening.filter(|i| i.end_time <= episode_length),
        ending: ending.filter(|i| i.start_time <= episode_length),
    })
}

fn select_longest(results: &[SkipResult], skip_type: &str) -> Option<SkipInterval> {
    // 等长并列时保留先出现的候选
    results
        .iter()
        .filter(|r| r.skip_type == skip_type)
        .filter_map(|r| r.interval)
        .fold(None, |best: Option<SkipInterval>, candidate| match best {
            Some(b) if candidate.end_time - candidate.start_time <= b.end_time - b.start_time => {
                Some(b)
            }
            _ => Some(candidate),
        })
}

/// 完整流程：校验输入 → 算绝对集数 → 查询 → 筛选 → 写回时间字段。
/// 写回前先清空三个字段，片尾结束时间留给运营手工确认。
pub async fn fill_skip_times(session: &mut EditorSession) -> Result<SkipFill, SkipError> {
    let mal_id: u64 = session
        .mal_id
        .trim()
        .parse()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(SkipError::InvalidMalId)?;
    let episode_length: f64 = session
        .episode_length
        .trim()
        .parse()
        .ok()
        .filter(|len| *len > 0.0)
        .ok_or(SkipError::InvalidEpisodeLength)?;
    let absolute_episode = tmdb::absolute_episode_number(session)
        .await
        .filter(|ep| *ep > 0)
        .ok_or(SkipError::InvalidAbsoluteEpisode)?;

    info!(
        "🔍 查询 Aniskip: mal={} ep={} len={}",
        mal_id, absolute_episode, episode_length
    );
    let response = fetch_skip_times(mal_id, absolute_episode, episode_length).await?;
    if !response.found || response.results.is_empty() {
        return Err(SkipError::NotFound);
    }

    let fill = apply_intervals(session, &response.results, episode_length)?;

    info!(
        "✅ Aniskip 填充完成: opening={} ending={}",
        fill.opening.is_some(),
        fill.ending.is_some()
    );
    Ok(fill)
}

/// 先清空三个时间字段再筛选；没有候选时字段保持清空状态，不留旧值
fn apply_intervals(
    session: &mut EditorSession,
    results: &[SkipResult],
    episode_length: f64,
) -> Result<SkipFill, SkipError> {
    session.set_whole_seconds("introStartTime", String::new());
    session.set_whole_seconds("introEndTime", String::new());
    session.set_whole_seconds("endingStartTime", String::new());

    let fill = choose_intervals(results, episode_length)?;

    if let Some(opening) = fill.opening {
        session.set_whole_seconds("introStartTime", opening.start_time.to_string());
        session.set_whole_seconds("introEndTime", opening.end_time.to_string());
    }
    if let Some(ending) = fill.ending {
        session.set_whole_seconds("endingStartTime", ending.start_time.to_string());
    }
    Ok(fill)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(skip_type: &str, start: f64, end: f64) -> SkipResult {
        SkipResult {
            skip_type: skip_type.to_string(),
            interval: Some(SkipInterval {
                start_time: start,
                end_time: end,
            }),
        }
    }

    #[test]
    fn test_longest_interval_wins() {
        let results = vec![result("op", 0.0, 60.0), result("op", 0.0, 90.0)];
        let fill = choose_intervals(&results, 1440.0).unwrap();
        let opening = fill.opening.unwrap();
        assert_eq!(opening.start_time, 0.0);
        assert_eq!(opening.end_time, 90.0);
        assert!(fill.ending.is_none());
    }

    #[test]
    fn test_interval_past_episode_length_is_dropped() {
        // 有候选但超长：不算错误，只是该类留空
        let results = vec![result("op", 0.0, 90.0)];
        let fill = choose_intervals(&results, 80.0).unwrap();
        assert!(fill.opening.is_none());
        assert!(fill.ending.is_none());
    }

    #[test]
    fn test_ending_accepted_by_start_time() {
        let results = vec![result("ed", 1300.0, 1400.0)];
        let fill = choose_intervals(&results, 1350.0).unwrap();
        let ending = fill.ending.unwrap();
        assert_eq!(ending.start_time, 1300.0);
    }

    #[test]
    fn test_equal_length_keeps_first_candidate() {
        // 两个 90 秒候选并列，取先出现的那个
        let results = vec![result("op", 0.0, 90.0), result("op", 5.0, 95.0)];
        let fill = choose_intervals(&results, 1440.0).unwrap();
        let opening = fill.opening.unwrap();
        assert_eq!(opening.start_time, 0.0);
        assert_eq!(opening.end_time, 90.0);
    }

    #[test]
    fn test_failed_selection_still_clears_time_fields() {
        use crate::types::FieldInput;

        let mut session = EditorSession::new();
        session.set_whole_seconds("introStartTime", "10".to_string());
        session.set_whole_seconds("introEndTime", "95".to_string());
        session.set_whole_seconds("endingStartTime", "1300".to_string());

        let results = vec![SkipResult {
            skip_type: "op".to_string(),
            interval: None,
        }];
        let error = apply_intervals(&mut session, &results, 1440.0).unwrap_err();
        assert!(matches!(error, SkipError::NoUsableIntervals));

        // 旧值不得残留
        for key in ["introStartTime", "introEndTime", "endingStartTime"] {
            match &session.field(key).unwrap().input {
                FieldInput::Time(time) => {
                    assert_eq!(time.whole_seconds.as_deref(), Some(""));
                }
                other => panic!("campo {} inesperado: {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_no_candidates_is_an_error() {
        let results = vec![SkipResult {
            skip_type: "op".to_string(),
            interval: None,
        }];
        let error = choose_intervals(&results, 1440.0).unwrap_err();
        assert!(matches!(error, SkipError::NoUsableIntervals));
    }

    #[test]
    fn test_mixed_types_select_independently() {
        let results = vec![
            result("op", 10.0, 100.0),
            result("ed", 1300.0, 1380.0),
            result("op", 5.0, 80.0),
        ];
        let fill = choose_intervals(&results, 1400.0).unwrap();
        assert_eq!(fill.opening.unwrap().end_time, 100.0);
        assert_eq!(fill.ending.unwrap().start_time, 1300.0);
    }
}
