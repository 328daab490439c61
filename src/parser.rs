//! 生成页面的配置提取器
//! 只认生成器模板里三条固定的 window.* 赋值标记，按模式匹配抠出 JSON；
//! 刻意不做通用 HTML 解析，手工改过结构的页面不在支持范围内

use crate::types::{ConfigBundle, DownloadServer, VideoServer};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

static CONTENT_CONFIG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"window\.contentConfig = (\{[\s\S]*?\});").expect("正则表达式无效")
});
static LANGUAGE_SERVERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"window\.languageServers = (\{[\s\S]*?\});").expect("正则表达式无效")
});
static DOWNLOAD_SERVERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"window\.downloadServers = (\{[\s\S]*?\});").expect("正则表达式无效")
});
static API_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"window\.GOOGLE_API_KEY = "([^"]*)";"#).expect("正则表达式无效")
});

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No se encontró la asignación de {0} en el HTML.")]
    MissingSection(&'static str),
    #[error("La sección {section} no contiene datos válidos: {source}")]
    InvalidSection {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// 从生成的播放器页面还原配置包
/// 三条数据赋值缺一即失败；API key 赋值允许缺失，缺省为空串。
/// 要么全部解析成功，要么原样报错，绝不部分应用。
pub fn parse_player_html(html: &str) -> Result<ConfigBundle, ParseError> {
    let content_config: Map<String, Value> =
        extract_section(html, &CONTENT_CONFIG_RE, "contentConfig")?;
    let language_servers: IndexMap<String, Vec<VideoServer>> =
        extract_section(html, &LANGUAGE_SERVERS_RE, "languageServers")?;
    let download_servers: IndexMap<String, Vec<DownloadServer>> =
        extract_section(html, &DOWNLOAD_SERVERS_RE, "downloadServers")?;
    let google_api_key = API_KEY_RE
        .captures(html)
        .map(|captures| captures[1].to_string())
        .unwrap_or_default();

    Ok(ConfigBundle {
        content_config,
        language_servers,
        download_servers,
        google_api_key,
    })
}

fn extract_section<T: DeserializeOwned>(
    html: &str,
    re: &Regex,
    section: &'static str,
) -> Result<T, ParseError> {
    let captures = re
        .captures(html)
        .ok_or(ParseError::MissingSection(section))?;
    serde_json::from_str(&captures[1]).map_err(|source| ParseError::InvalidSection { section, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::render_player_html;
    use crate::session::EditorSession;
    use crate::types::{FieldInput, ServerForm, ServerListKind};

    fn sample_session() -> EditorSession {
        let mut session = EditorSession::new();
        session.set_field("title", FieldInput::Text("Akira".to_string()));
        session.set_field("synopsis", FieldInput::Text("Neo-Tokio, 2019.".to_string()));
        session.season = "2".to_string();
        session.episode = "5".to_string();
        session.theme = "purple".to_string();
        session.google_api_key = "clave-de-prueba".to_string();
        session.set_whole_seconds("introStartTime", "90".to_string());
        session.video_servers.groups[0].servers = vec![
            ServerForm {
                name: "Zeus".to_string(),
                url: "https://example.com/1.m3u8".to_string(),
                kind: "hls".to_string(),
            },
            ServerForm {
                name: "Hades".to_string(),
                url: "https://example.com/2.mp4".to_string(),
                kind: "other".to_string(),
            },
        ];
        session.add_language_group(
            ServerListKind::Download,
            "Latino".to_string(),
            vec![ServerForm {
                name: "Mega".to_string(),
                url: "https://mega.nz/x".to_string(),
                kind: "mp4".to_string(),
            }],
        );
        session
    }

    #[test]
    fn test_roundtrip_recovers_bundle_exactly() {
        let bundle = sample_session().build();
        let html = render_player_html(&bundle);
        let parsed = parse_player_html(&html).unwrap();
        assert_eq!(parsed, bundle);
    }

    #[test]
    fn test_missing_api_key_defaults_to_empty() {
        let bundle = sample_session().build();
        let html = render_player_html(&bundle);
        let without_key = API_KEY_RE.replace(&html, "").to_string();
        let parsed = parse_player_html(&without_key).unwrap();
        assert_eq!(parsed.google_api_key, "");
        assert_eq!(parsed.content_config, bundle.content_config);
    }

    #[test]
    fn test_missing_section_is_an_error() {
        let bundle = sample_session().build();
        let html = render_player_html(&bundle);
        let broken = html.replace("window.languageServers", "window.otraCosa");
        let error = parse_player_html(&broken).unwrap_err();
        assert!(matches!(error, ParseError::MissingSection("languageServers")));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let html = "\
            window.contentConfig = {no es json};\n\
            window.languageServers = {};\n\
            window.downloadServers = {};\n";
        let error = parse_player_html(html).unwrap_err();
        assert!(matches!(
            error,
            ParseError::InvalidSection {
                section: "contentConfig",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_arbitrary_html() {
        let error = parse_player_html("<!DOCTYPE html><html></html>").unwrap_err();
        assert!(matches!(error, ParseError::MissingSection("contentConfig")));
    }
}
