//! 配置数据模型
//! 生成器与解析器双向共用的配置结构，以及编辑会话的表单字段模型

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 内容类型 (TMDB 的路径段同名)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    #[default]
    Tv,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Tv => "tv",
        }
    }

    /// 是否为剧集 (决定 seriesName/chapterName/season/episode 等字段是否生效)
    pub fn is_series(&self) -> bool {
        matches!(self, ContentType::Tv)
    }
}

/// 下载服务器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    #[default]
    External,
    Mp4,
}

impl DownloadKind {
    /// 表单下拉框的取值只认 "mp4"，其余一律按外部链接处理
    pub fn from_form(raw: &str) -> Self {
        match raw {
            "mp4" => DownloadKind::Mp4,
            _ => DownloadKind::External,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadKind::External => "external",
            DownloadKind::Mp4 => "mp4",
        }
    }
}

/// 视频服务器条目
/// 类型以布尔存在标志表示，而不是字符串字段；未选类型时四个标志全部缺省
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoServer {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp4: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gdrive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yandex: Option<bool>,
}

impl VideoServer {
    /// 回读表单下拉框取值 (加载已有配置时用)
    pub fn form_kind(&self) -> &'static str {
        if self.hls.unwrap_or(false) {
            "hls"
        } else if self.mp4.unwrap_or(false) {
            "mp4"
        } else if self.gdrive.unwrap_or(false) {
            "gdrive"
        } else if self.yandex.unwrap_or(false) {
            "yandex"
        } else {
            "other"
        }
    }
}

/// 下载服务器条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadServer {
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: DownloadKind,
}

/// 生成/解析往返的完整配置包
/// 键顺序全程保留 (serde_json preserve_order + IndexMap)，保证逐字节可往返
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigBundle {
    pub content_config: Map<String, Value>,
    pub language_servers: IndexMap<String, Vec<VideoServer>>,
    pub download_servers: IndexMap<String, Vec<DownloadServer>>,
    #[serde(rename = "GOOGLE_API_KEY", default)]
    pub google_api_key: String,
}

/// 服务器列表类别 (视频 / 下载)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerListKind {
    Video,
    Download,
}

impl ServerListKind {
    pub fn from_path(raw: &str) -> Option<Self> {
        match raw {
            "video" => Some(ServerListKind::Video),
            "download" => Some(ServerListKind::Download),
            _ => None,
        }
    }

    /// 新建空白条目时下拉框的初始取值
    pub fn default_entry_kind(&self) -> &'static str {
        match self {
            ServerListKind::Video => "other",
            ServerListKind::Download => "external",
        }
    }
}

/// 表单侧的服务器条目 (下拉框取值保持字符串，构建配置时才解释)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerForm {
    pub name: String,
    pub url: String,
    pub kind: String,
}

impl ServerForm {
    pub fn from_video(server: &VideoServer) -> Self {
        ServerForm {
            name: server.name.clone(),
            url: server.url.clone(),
            kind: server.form_kind().to_string(),
        }
    }

    pub fn from_download(server: &DownloadServer) -> Self {
        ServerForm {
            name: server.name.clone(),
            url: server.url.clone(),
            kind: server.kind.as_str().to_string(),
        }
    }
}

/// 时间字段输入
/// 分+秒子字段同时存在时按 `分 + 秒/60` 解析；否则按整秒字段除以 60。
/// 无法解析的数字一律记 0 (沿用原工具的静默缺省)。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeInput {
    pub minutes: Option<String>,
    pub seconds: Option<String>,
    pub whole_seconds: Option<String>,
}

impl TimeInput {
    /// 解析为分钟数
    pub fn resolve_minutes(&self) -> f64 {
        match (&self.minutes, &self.seconds) {
            (Some(minutes), Some(seconds)) => {
                parse_or_zero(minutes) + parse_or_zero(seconds) / 60.0
            }
            _ => parse_or_zero(self.whole_seconds.as_deref().unwrap_or("")) / 60.0,
        }
    }
}

fn parse_or_zero(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

/// 表单字段取值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldInput {
    Text(String),
    Checkbox(bool),
    Time(TimeInput),
}

/// 一个内容字段：键名 + 取值 + 是否仅剧集可见
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentField {
    pub key: String,
    pub input: FieldInput,
    #[serde(default)]
    pub series_only: bool,
}

/// 预览卡片数据 (TMDB 或 Jikan 填充)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewData {
    pub image_url: String,
    pub title: String,
    pub year: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub episodes: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_minutes_seconds() {
        let input = TimeInput {
            minutes: Some("1".to_string()),
            seconds: Some("30".to_string()),
            whole_seconds: None,
        };
        assert_eq!(input.resolve_minutes(), 1.5);
    }

    #[test]
    fn test_time_whole_seconds() {
        let input = TimeInput {
            minutes: None,
            seconds: None,
            whole_seconds: Some("90".to_string()),
        };
        assert_eq!(input.resolve_minutes(), 1.5);
    }

    #[test]
    fn test_time_invalid_defaults_to_zero() {
        let input = TimeInput {
            minutes: Some("abc".to_string()),
            seconds: Some("30".to_string()),
            whole_seconds: None,
        };
        assert_eq!(input.resolve_minutes(), 0.5);

        let input = TimeInput {
            minutes: None,
            seconds: None,
            whole_seconds: Some("".to_string()),
        };
        assert_eq!(input.resolve_minutes(), 0.0);
    }

    #[test]
    fn test_video_server_flags_roundtrip() {
        let server = VideoServer {
            name: "Zeus".to_string(),
            url: "https://example.com/v.m3u8".to_string(),
            hls: Some(true),
            mp4: None,
            gdrive: None,
            yandex: None,
        };
        let json = serde_json::to_string(&server).unwrap();
        assert!(json.contains("\"hls\":true"));
        assert!(!json.contains("mp4"));
        assert_eq!(server.form_kind(), "hls");
    }

    #[test]
    fn test_download_kind_from_form() {
        assert_eq!(DownloadKind::from_form("mp4"), DownloadKind::Mp4);
        assert_eq!(DownloadKind::from_form("external"), DownloadKind::External);
        assert_eq!(DownloadKind::from_form("cualquiera"), DownloadKind::External);
    }
}
