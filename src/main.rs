mod aniskip;
mod generator;
mod http_client;
mod mal;
mod parser;
mod session;
mod tmdb;
mod types;

use axum::{
    extract::Path,
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post, put},
    Json, Router,
};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::session::{ContentUpdate, EditorSession};
use crate::types::{ServerForm, ServerListKind};

/// 单运营者工具，全局一份编辑会话
static SESSION: Lazy<Mutex<EditorSession>> = Lazy::new(|| Mutex::new(EditorSession::new()));

#[tokio::main]
async fn main() {
    // 初始化日志
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // CORS 配置
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // 路由
    let app = Router::new()
        // 页面与产物
        .route("/", get(index_handler))
        .route("/api", get(api_info_handler))
        .route("/health", get(health_handler))
        .route("/service-worker.js", get(service_worker_handler))
        // 会话
        .route("/session", get(session_handler))
        .route("/session/reset", post(reset_handler))
        .route("/session/content", post(content_update_handler))
        // 语言标签页 (list = video | download)
        .route("/session/servers/{list}/languages", post(add_language_handler))
        .route(
            "/session/servers/{list}/languages/{index}",
            put(rename_language_handler).delete(remove_language_handler),
        )
        .route(
            "/session/servers/{list}/languages/{index}/activate",
            post(activate_language_handler),
        )
        // 服务器条目
        .route(
            "/session/servers/{list}/languages/{index}/entries",
            post(add_entry_handler),
        )
        .route(
            "/session/servers/{list}/languages/{index}/entries/{entry}",
            put(update_entry_handler).delete(remove_entry_handler),
        )
        // 生成 / 解析 / 加载
        .route("/generate", post(generate_handler))
        .route("/parse", post(parse_handler))
        .route("/load", post(load_handler))
        // 外部数据
        .route("/session/tmdb-fill", post(tmdb_fill_handler))
        .route("/session/skip-times", post(skip_times_handler))
        .route("/preview/mal/{id}", get(mal_preview_handler))
        .layer(cors);

    // 启动服务器
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("🚀 播放器页面生成器启动在 http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// GET / - 编辑器页面
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /api - API 信息
async fn api_info_handler() -> impl IntoResponse {
    Json(json!({
        "name": "PlayerConfig API",
        "version": "0.3.0",
        "description": "播放器页面生成与配置后端",
        "endpoints": {
            "core": {
                "GET /": "编辑器页面",
                "GET /health": "健康检查",
                "GET /service-worker.js": "旁站离线缓存脚本",
                "GET /session": "当前编辑会话快照",
                "POST /session/reset": "重置会话",
                "POST /session/content": "局部更新内容字段"
            },
            "servers": {
                "POST /session/servers/{list}/languages": "新增语言标签页 (list = video | download)",
                "PUT /session/servers/{list}/languages/{index}": "改语言代码",
                "DELETE /session/servers/{list}/languages/{index}": "删语言标签页",
                "POST /session/servers/{list}/languages/{index}/activate": "激活标签页",
                "POST /session/servers/{list}/languages/{index}/entries": "加服务器条目",
                "PUT /session/servers/{list}/languages/{index}/entries/{entry}": "改条目",
                "DELETE /session/servers/{list}/languages/{index}/entries/{entry}": "删条目"
            },
            "artifacts": {
                "POST /generate": "生成独立播放器 HTML",
                "POST /parse": "从生成的 HTML 还原配置包",
                "POST /load": "解析 HTML 并重置会话继续编辑"
            },
            "external": {
                "POST /session/tmdb-fill": "用 TMDB 填充标题/海报/简介/集长",
                "POST /session/skip-times": "用 Aniskip 回填片头片尾时间",
                "GET /preview/mal/{id}": "MyAnimeList 预览卡片"
            }
        }
    }))
}

/// 健康检查
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// GET /service-worker.js - 旁站缓存脚本
async fn service_worker_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        generator::render_service_worker(),
    )
}

/// GET /session - 会话快照
async fn session_handler() -> impl IntoResponse {
    let session = SESSION.lock().await;
    Json(session.clone())
}

/// POST /session/reset - 重置为初始状态
async fn reset_handler() -> impl IntoResponse {
    let mut session = SESSION.lock().await;
    *session = EditorSession::new();
    info!("♻️ 会话已重置");
    Json(session.clone())
}

/// POST /session/content - 差量更新内容字段
async fn content_update_handler(Json(update): Json<ContentUpdate>) -> impl IntoResponse {
    let mut session = SESSION.lock().await;
    session.apply_content_update(update);
    Json(session.clone())
}

fn list_kind(raw: &str) -> Result<ServerListKind, (StatusCode, Json<serde_json::Value>)> {
    ServerListKind::from_path(raw).ok_or((
        StatusCode::BAD_REQUEST,
        Json(json!({"error": format!("Lista de servidores desconocida: {}", raw)})),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewLanguageRequest {
    code: String,
    servers: Vec<ServerForm>,
}

/// POST /session/servers/{list}/languages - 新增语言标签页
async fn add_language_handler(
    Path(list): Path<String>,
    Json(req): Json<NewLanguageRequest>,
) -> impl IntoResponse {
    let kind = match list_kind(&list) {
        Ok(kind) => kind,
        Err(e) => return e.into_response(),
    };
    let mut session = SESSION.lock().await;
    session.add_language_group(kind, req.code, req.servers);
    Json(session.clone()).into_response()
}

#[derive(Debug, Deserialize)]
struct LanguageCodeRequest {
    code: String,
}

/// PUT /session/servers/{list}/languages/{index} - 改语言代码
async fn rename_language_handler(
    Path((list, index)): Path<(String, usize)>,
    Json(req): Json<LanguageCodeRequest>,
) -> impl IntoResponse {
    let kind = match list_kind(&list) {
        Ok(kind) => kind,
        Err(e) => return e.into_response(),
    };
    let mut session = SESSION.lock().await;
    if !session.list_mut(kind).set_code(index, req.code) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No existe esa pestaña de idioma."})),
        )
            .into_response();
    }
    Json(session.clone()).into_response()
}

/// DELETE /session/servers/{list}/languages/{index} - 删语言标签页
/// 下标过期时静默跳过，照常返回快照
async fn remove_language_handler(Path((list, index)): Path<(String, usize)>) -> impl IntoResponse {
    let kind = match list_kind(&list) {
        Ok(kind) => kind,
        Err(e) => return e.into_response(),
    };
    let mut session = SESSION.lock().await;
    session.list_mut(kind).remove_group(index);
    Json(session.clone()).into_response()
}

/// POST /session/servers/{list}/languages/{index}/activate - 激活标签页
async fn activate_language_handler(Path((list, index)): Path<(String, usize)>) -> impl IntoResponse {
    let kind = match list_kind(&list) {
        Ok(kind) => kind,
        Err(e) => return e.into_response(),
    };
    let mut session = SESSION.lock().await;
    if !session.list_mut(kind).activate(index) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No existe esa pestaña de idioma."})),
        )
            .into_response();
    }
    Json(session.clone()).into_response()
}

/// POST /session/servers/{list}/languages/{index}/entries - 加服务器条目
async fn add_entry_handler(
    Path((list, index)): Path<(String, usize)>,
    Json(data): Json<ServerForm>,
) -> impl IntoResponse {
    let kind = match list_kind(&list) {
        Ok(kind) => kind,
        Err(e) => return e.into_response(),
    };
    let mut session = SESSION.lock().await;
    if !session.add_server_entry(kind, index, data) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No existe esa pestaña de idioma."})),
        )
            .into_response();
    }
    Json(session.clone()).into_response()
}

/// PUT /session/servers/{list}/languages/{index}/entries/{entry} - 改条目
async fn update_entry_handler(
    Path((list, index, entry)): Path<(String, usize, usize)>,
    Json(data): Json<ServerForm>,
) -> impl IntoResponse {
    let kind = match list_kind(&list) {
        Ok(kind) => kind,
        Err(e) => return e.into_response(),
    };
    let mut session = SESSION.lock().await;
    if !session.list_mut(kind).update_entry(index, entry, data) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No existe ese servidor."})),
        )
            .into_response();
    }
    Json(session.clone()).into_response()
}

/// DELETE /session/servers/{list}/languages/{index}/entries/{entry} - 删条目
async fn remove_entry_handler(
    Path((list, index, entry)): Path<(String, usize, usize)>,
) -> impl IntoResponse {
    let kind = match list_kind(&list) {
        Ok(kind) => kind,
        Err(e) => return e.into_response(),
    };
    let mut session = SESSION.lock().await;
    if !session.list_mut(kind).remove_entry(index, entry) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No existe ese servidor."})),
        )
            .into_response();
    }
    Json(session.clone()).into_response()
}

/// POST /generate - 生成独立播放器页面
async fn generate_handler() -> impl IntoResponse {
    let session = SESSION.lock().await;
    let bundle = session.build();
    let html = generator::render_player_html(&bundle);
    info!("📦 生成播放器页面 ({} 字节)", html.len());
    Json(json!({ "html": html }))
}

#[derive(Debug, Deserialize)]
struct HtmlRequest {
    html: String,
}

/// POST /parse - 还原配置包 (不动会话)
async fn parse_handler(Json(req): Json<HtmlRequest>) -> impl IntoResponse {
    match parser::parse_player_html(&req.html) {
        Ok(bundle) => Json(bundle).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// POST /load - 解析并重置会话继续编辑
async fn load_handler(Json(req): Json<HtmlRequest>) -> impl IntoResponse {
    let bundle = match parser::parse_player_html(&req.html) {
        Ok(bundle) => bundle,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": e.to_string()})),
            )
                .into_response();
        }
    };
    let mut session = SESSION.lock().await;
    session.load_bundle(bundle);
    info!("📂 已从现有页面加载配置");
    Json(session.clone()).into_response()
}

/// POST /session/tmdb-fill - TMDB 填充
async fn tmdb_fill_handler() -> impl IntoResponse {
    let mut session = SESSION.lock().await;
    info!("🔍 TMDB 填充: id={}", session.tmdb_id);
    match tmdb::fill_from_tmdb(&mut session).await {
        Ok(fill) => Json(json!({
            "preview": fill.preview,
            "warning": fill.warning,
            "session": session.clone()
        }))
        .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// POST /session/skip-times - Aniskip 回填
async fn skip_times_handler() -> impl IntoResponse {
    let mut session = SESSION.lock().await;
    match aniskip::fill_skip_times(&mut session).await {
        Ok(fill) => Json(json!({
            "opening": fill.opening.map(|i| json!({"startTime": i.start_time, "endTime": i.end_time})),
            "ending": fill.ending.map(|i| json!({"startTime": i.start_time, "endTime": i.end_time})),
            "session": session.clone()
        }))
        .into_response(),
        Err(e) => {
            let status = match e {
                aniskip::SkipError::InvalidMalId
                | aniskip::SkipError::InvalidEpisodeLength
                | aniskip::SkipError::InvalidAbsoluteEpisode => StatusCode::BAD_REQUEST,
                aniskip::SkipError::NotFound | aniskip::SkipError::NoUsableIntervals => {
                    StatusCode::NOT_FOUND
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(json!({"error": e.to_string()}))).into_response()
        }
    }
}

/// GET /preview/mal/{id} - MyAnimeList 预览卡片
async fn mal_preview_handler(Path(id): Path<u64>) -> impl IntoResponse {
    match mal::fetch_preview(id).await {
        Ok(preview) => Json(preview).into_response(),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// 编辑器前端
const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="es">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Generador de Reproductor</title>
  <style>
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
      background: linear-gradient(135deg, #1a1a2e 0%, #16213e 50%, #0f3460 100%);
      min-height: 100vh;
      color: #e8e8e8;
      padding: 20px;
    }
    .container { max-width: 900px; margin: 0 auto; }
    h1 {
      text-align: center;
      font-size: 2rem;
      margin: 30px 0 20px;
      background: linear-gradient(90deg, #ff9d6b, #c44dff);
      -webkit-background-clip: text;
      -webkit-text-fill-color: transparent;
      background-clip: text;
    }
    h2 { font-size: 15px; margin-bottom: 12px; color: rgba(255,255,255,0.85); }
    .card {
      background: rgba(255,255,255,0.05);
      border-radius: 12px;
      padding: 16px;
      margin-bottom: 16px;
      backdrop-filter: blur(10px);
    }
    label { display: block; font-size: 12px; color: rgba(255,255,255,0.6); margin-bottom: 4px; }
    input[type="text"], select, textarea {
      width: 100%;
      padding: 10px 12px;
      border: none;
      border-radius: 8px;
      background: rgba(255,255,255,0.1);
      color: #fff;
      font-size: 14px;
      outline: none;
    }
    input::placeholder { color: rgba(255,255,255,0.4); }
    input:focus, select:focus { background: rgba(255,255,255,0.15); }
    select option { background: #16213e; }
    textarea { font-family: monospace; font-size: 12px; resize: vertical; }
    .row { display: flex; gap: 10px; margin-bottom: 10px; flex-wrap: wrap; }
    .row > div { flex: 1; min-width: 140px; }
    .time-pair { display: flex; gap: 6px; }
    button {
      padding: 10px 18px;
      border: none;
      border-radius: 8px;
      background: linear-gradient(135deg, #ff9d6b, #c44dff);
      color: #fff;
      font-size: 14px;
      font-weight: 600;
      cursor: pointer;
      transition: transform 0.2s, opacity 0.2s;
    }
    button:hover { transform: scale(1.02); }
    button:disabled { opacity: 0.6; cursor: not-allowed; }
    button.ghost { background: rgba(255,255,255,0.1); font-weight: 400; }
    button.danger { background: rgba(239,68,68,0.7); }
    .actions { display: flex; gap: 8px; flex-wrap: wrap; }
    .tabs { display: flex; gap: 6px; flex-wrap: wrap; margin-bottom: 10px; }
    .tab {
      padding: 6px 12px;
      background: rgba(255,255,255,0.08);
      border-radius: 8px;
      cursor: pointer;
      font-size: 13px;
      display: flex;
      gap: 8px;
      align-items: center;
    }
    .tab.active { background: rgba(196,77,255,0.35); }
    .tab .close { color: rgba(255,255,255,0.5); cursor: pointer; }
    .tab .close:hover { color: #ff6b6b; }
    .entry { display: flex; gap: 6px; margin-bottom: 6px; align-items: center; }
    .entry input { flex: 2; }
    .entry input.url { flex: 3; }
    .entry select { flex: 1; min-width: 90px; }
    .preview-card { display: flex; gap: 14px; align-items: flex-start; }
    .preview-card img { width: 90px; border-radius: 8px; }
    .preview-card .meta { font-size: 13px; color: rgba(255,255,255,0.7); }
    .preview-card .title { font-size: 16px; font-weight: 600; color: #fff; margin-bottom: 4px; }
    .popup-overlay {
      position: fixed; inset: 0;
      background: rgba(0,0,0,0.6);
      display: none;
      align-items: center;
      justify-content: center;
      z-index: 10;
    }
    .popup-overlay.show { display: flex; }
    .popup {
      background: #16213e;
      border-radius: 12px;
      padding: 20px;
      width: min(680px, 92vw);
      max-height: 84vh;
      overflow: auto;
    }
    .popup h3 { margin-bottom: 12px; }
    .popup textarea { width: 100%; min-height: 300px; margin-bottom: 12px; }
    .status { font-size: 13px; margin-top: 8px; min-height: 18px; }
    .status.error { color: #ff6b6b; }
    .status.ok { color: #6bff9d; }
    .hidden { display: none; }
  </style>
</head>
<body>
  <div class="container">
    <h1>🎬 Generador de Reproductor</h1>

    <div class="card">
      <h2>Contenido</h2>
      <div class="row">
        <div>
          <label>Tipo</label>
          <select id="contentType" onchange="pushTop('contentType', this.value)">
            <option value="tv">Serie</option>
            <option value="movie">Película</option>
          </select>
        </div>
        <div>
          <label>ID de TMDB</label>
          <input type="text" id="tmdbId" onchange="pushTop('tmdbId', this.value)">
        </div>
        <div class="series-only">
          <label>Temporada</label>
          <input type="text" id="season" onchange="pushTop('season', this.value)">
        </div>
        <div class="series-only">
          <label>Episodio</label>
          <input type="text" id="episode" onchange="pushTop('episode', this.value)">
        </div>
      </div>
      <div class="row">
        <div>
          <label>ID de MyAnimeList</label>
          <input type="text" id="malId" onchange="pushTop('malId', this.value)">
        </div>
        <div>
          <label>Duración del episodio (segundos)</label>
          <input type="text" id="episodeLength" onchange="pushTop('episodeLength', this.value)">
        </div>
        <div>
          <label>Tema</label>
          <select id="theme" onchange="pushTop('theme', this.value)">
            <option value="orange">orange</option>
            <option value="purple">purple</option>
            <option value="blue">blue</option>
            <option value="green">green</option>
            <option value="red">red</option>
          </select>
        </div>
      </div>
      <div class="row">
        <div>
          <label>URL de regreso</label>
          <input type="text" id="backUrl" onchange="pushTop('backUrl', this.value)">
        </div>
        <div>
          <label>Google API Key</label>
          <input type="text" id="googleApiKey" onchange="pushTop('googleApiKey', this.value)">
        </div>
      </div>
      <div class="actions">
        <button id="tmdbBtn" onclick="fillFromTmdb()">Rellenar desde TMDB</button>
        <button id="malBtn" class="ghost" onclick="previewMal()">Vista previa MAL</button>
        <button id="skipBtn" class="ghost" onclick="fillSkipTimes()">Tiempos de skip (Aniskip)</button>
      </div>
      <div id="contentStatus" class="status"></div>
    </div>

    <div class="card hidden" id="previewSection">
      <div class="preview-card" id="previewCard"></div>
    </div>

    <div class="card">
      <h2>Campos</h2>
      <div id="fieldsArea"></div>
    </div>

    <div class="card">
      <h2>Servidores de video</h2>
      <div id="videoArea"></div>
    </div>

    <div class="card">
      <h2>Servidores de descarga</h2>
      <div id="downloadArea"></div>
    </div>

    <div class="actions" style="margin-bottom: 40px;">
      <button id="generateBtn" onclick="generate()">Generar HTML</button>
      <button class="ghost" onclick="openLoad()">Cargar HTML existente</button>
      <button class="ghost" onclick="resetSession()">Reiniciar</button>
    </div>
  </div>

  <div class="popup-overlay" id="generateModal">
    <div class="popup">
      <h3>HTML generado</h3>
      <textarea id="generatedHtml" readonly></textarea>
      <div class="actions">
        <button onclick="copyGenerated()">Copiar</button>
        <button class="ghost" onclick="closeModal('generateModal')">Cerrar</button>
      </div>
      <div id="generateStatus" class="status"></div>
    </div>
  </div>

  <div class="popup-overlay" id="loadModal">
    <div class="popup">
      <h3>Cargar HTML existente</h3>
      <textarea id="loadHtml" placeholder="Pega aquí el HTML generado..."></textarea>
      <div class="actions">
        <button onclick="loadFromHtml()">Cargar</button>
        <button class="ghost" onclick="closeModal('loadModal')">Cancelar</button>
      </div>
      <div id="loadStatus" class="status"></div>
    </div>
  </div>

  <div class="popup-overlay" id="confirmModal">
    <div class="popup">
      <h3>Eliminar idioma</h3>
      <p id="confirmText" style="margin-bottom: 14px; font-size: 14px;"></p>
      <div class="actions">
        <button class="danger" id="confirmYes">Eliminar</button>
        <button class="ghost" onclick="closeModal('confirmModal')">Cancelar</button>
      </div>
    </div>
  </div>

  <script>
    const FIELD_LABELS = {
      title: 'Título',
      posterUrl: 'URL del póster',
      synopsis: 'Sinopsis',
      seriesName: 'Nombre de la serie',
      chapterName: 'Nombre del capítulo',
      introStartTime: 'Inicio de intro',
      introEndTime: 'Fin de intro',
      endingStartTime: 'Inicio de ending',
      endingEndTime: 'Fin de ending'
    };
    const VIDEO_KINDS = ['other', 'hls', 'mp4', 'gdrive', 'yandex'];
    const DOWNLOAD_KINDS = ['external', 'mp4'];

    let state = null;

    async function api(path, options) {
      const res = await fetch(path, options);
      const body = await res.json();
      if (!res.ok) throw new Error(body.error || 'Error inesperado');
      return body;
    }

    function jsonPost(payload) {
      return {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(payload)
      };
    }

    async function refresh() {
      state = await api('/session');
      render();
    }

    function setStatus(id, text, ok) {
      const el = document.getElementById(id);
      el.textContent = text || '';
      el.className = 'status ' + (text ? (ok ? 'ok' : 'error') : '');
    }

    async function pushTop(key, value) {
      try {
        state = await api('/session/content', jsonPost({ [key]: value }));
        render();
      } catch (e) {
        setStatus('contentStatus', e.message, false);
      }
    }

    async function pushField(key, input) {
      try {
        state = await api('/session/content', jsonPost({ fields: [{ key, input }] }));
        render();
      } catch (e) {
        setStatus('contentStatus', e.message, false);
      }
    }

    function render() {
      const isSeries = state.contentType === 'tv';
      document.getElementById('contentType').value = state.contentType;
      document.getElementById('tmdbId').value = state.tmdbId;
      document.getElementById('season').value = state.season;
      document.getElementById('episode').value = state.episode;
      document.getElementById('malId').value = state.malId;
      document.getElementById('episodeLength').value = state.episodeLength;
      document.getElementById('theme').value = state.theme || 'orange';
      document.getElementById('backUrl').value = state.backUrl;
      document.getElementById('googleApiKey').value = state.googleApiKey;
      document.querySelectorAll('.series-only').forEach(el => {
        el.style.display = isSeries ? '' : 'none';
      });
      renderFields(isSeries);
      renderList('video', state.videoServers, document.getElementById('videoArea'), VIDEO_KINDS);
      renderList('download', state.downloadServers, document.getElementById('downloadArea'), DOWNLOAD_KINDS);
    }

    function renderFields(isSeries) {
      const area = document.getElementById('fieldsArea');
      area.innerHTML = '';
      for (const field of state.fields) {
        if (field.seriesOnly && !isSeries) continue;
        const wrap = document.createElement('div');
        wrap.style.marginBottom = '10px';
        const label = document.createElement('label');
        label.textContent = FIELD_LABELS[field.key] || field.key;
        wrap.appendChild(label);
        wrap.appendChild(buildFieldInput(field));
        area.appendChild(wrap);
      }
    }

    function buildFieldInput(field) {
      if (field.input.type === 'time') {
        return buildTimeInput(field);
      }
      if (field.input.type === 'checkbox') {
        const cb = document.createElement('input');
        cb.type = 'checkbox';
        cb.checked = field.input.value;
        cb.onchange = () => pushField(field.key, { type: 'checkbox', value: cb.checked });
        return cb;
      }
      const input = field.key === 'synopsis'
        ? document.createElement('textarea')
        : document.createElement('input');
      if (input.tagName === 'INPUT') input.type = 'text';
      input.value = field.input.value;
      input.onchange = () => pushField(field.key, { type: 'text', value: input.value });
      return input;
    }

    function buildTimeInput(field) {
      const value = field.input.value;
      const pair = document.createElement('div');
      pair.className = 'time-pair';
      if (value.wholeSeconds !== null && value.wholeSeconds !== undefined) {
        const whole = document.createElement('input');
        whole.type = 'text';
        whole.placeholder = 'segundos';
        whole.value = value.wholeSeconds;
        whole.onchange = () => pushField(field.key, {
          type: 'time',
          value: { wholeSeconds: whole.value }
        });
        pair.appendChild(whole);
        return pair;
      }
      const minutes = document.createElement('input');
      minutes.type = 'text';
      minutes.placeholder = 'min';
      minutes.value = value.minutes ?? '';
      const seconds = document.createElement('input');
      seconds.type = 'text';
      seconds.placeholder = 'seg';
      seconds.value = value.seconds ?? '';
      const push = () => pushField(field.key, {
        type: 'time',
        value: { minutes: minutes.value, seconds: seconds.value }
      });
      minutes.onchange = push;
      seconds.onchange = push;
      pair.appendChild(minutes);
      pair.appendChild(seconds);
      return pair;
    }

    function renderList(listName, list, area, kinds) {
      area.innerHTML = '';
      const tabs = document.createElement('div');
      tabs.className = 'tabs';
      list.groups.forEach((group, i) => {
        const tab = document.createElement('div');
        tab.className = 'tab' + (list.active === i ? ' active' : '');
        const name = document.createElement('span');
        name.textContent = group.code || '(sin idioma)';
        name.onclick = () => activateTab(listName, i);
        const close = document.createElement('span');
        close.className = 'close';
        close.textContent = '✕';
        close.onclick = () => confirmRemoveGroup(listName, i, group.code);
        tab.appendChild(name);
        tab.appendChild(close);
        tabs.appendChild(tab);
      });
      const addBtn = document.createElement('button');
      addBtn.className = 'ghost';
      addBtn.textContent = '+ Idioma';
      addBtn.onclick = () => addGroup(listName);
      tabs.appendChild(addBtn);
      area.appendChild(tabs);

      if (list.active === null || list.active === undefined) return;
      const group = list.groups[list.active];
      if (!group) return;

      const codeLabel = document.createElement('label');
      codeLabel.textContent = 'Idioma';
      area.appendChild(codeLabel);
      const codeInput = document.createElement('input');
      codeInput.type = 'text';
      codeInput.id = listName + '-code';
      codeInput.value = group.code;
      codeInput.style.marginBottom = '10px';
      codeInput.onchange = () => renameGroup(listName, list.active, codeInput.value);
      area.appendChild(codeInput);

      group.servers.forEach((server, j) => {
        area.appendChild(buildEntryRow(listName, list.active, j, server, kinds));
      });

      const addEntry = document.createElement('button');
      addEntry.className = 'ghost';
      addEntry.textContent = '+ Servidor';
      addEntry.onclick = () => postAndRender(
        '/session/servers/' + listName + '/languages/' + list.active + '/entries',
        { name: '', url: '', kind: '' }
      );
      area.appendChild(addEntry);
    }

    function buildEntryRow(listName, groupIndex, entryIndex, server, kinds) {
      const row = document.createElement('div');
      row.className = 'entry';
      const name = document.createElement('input');
      name.type = 'text';
      name.placeholder = 'Nombre';
      name.value = server.name;
      const url = document.createElement('input');
      url.type = 'text';
      url.className = 'url';
      url.placeholder = 'URL';
      url.value = server.url;
      const kind = document.createElement('select');
      for (const k of kinds) {
        const opt = document.createElement('option');
        opt.value = k;
        opt.textContent = k;
        kind.appendChild(opt);
      }
      kind.value = server.kind;
      const push = () => putAndRender(
        '/session/servers/' + listName + '/languages/' + groupIndex + '/entries/' + entryIndex,
        { name: name.value, url: url.value, kind: kind.value }
      );
      name.onchange = push;
      url.onchange = push;
      kind.onchange = push;
      const del = document.createElement('button');
      del.className = 'danger';
      del.textContent = '✕';
      del.onclick = () => deleteAndRender(
        '/session/servers/' + listName + '/languages/' + groupIndex + '/entries/' + entryIndex
      );
      row.appendChild(name);
      row.appendChild(url);
      row.appendChild(kind);
      row.appendChild(del);
      return row;
    }

    async function postAndRender(path, payload) {
      try {
        state = await api(path, jsonPost(payload));
        render();
      } catch (e) {
        setStatus('contentStatus', e.message, false);
      }
    }

    async function putAndRender(path, payload) {
      try {
        state = await api(path, {
          method: 'PUT',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify(payload)
        });
        render();
      } catch (e) {
        setStatus('contentStatus', e.message, false);
      }
    }

    async function deleteAndRender(path) {
      try {
        state = await api(path, { method: 'DELETE' });
        render();
      } catch (e) {
        setStatus('contentStatus', e.message, false);
      }
    }

    function addGroup(listName) {
      postAndRender('/session/servers/' + listName + '/languages', { code: '' });
    }

    async function activateTab(listName, index) {
      await postAndRender('/session/servers/' + listName + '/languages/' + index + '/activate', {});
      // Tras activar, el foco pasa al campo de idioma de la pestaña
      const code = document.getElementById(listName + '-code');
      if (code) code.focus();
    }

    function renameGroup(listName, index, code) {
      putAndRender('/session/servers/' + listName + '/languages/' + index, { code });
    }

    function confirmRemoveGroup(listName, index, code) {
      document.getElementById('confirmText').textContent =
        '¿Eliminar el idioma "' + (code || '(sin idioma)') + '" y todos sus servidores?';
      document.getElementById('confirmYes').onclick = async () => {
        closeModal('confirmModal');
        await deleteAndRender('/session/servers/' + listName + '/languages/' + index);
      };
      document.getElementById('confirmModal').classList.add('show');
    }

    async function withButton(id, fn) {
      const btn = document.getElementById(id);
      const original = btn.textContent;
      btn.disabled = true;
      btn.textContent = '...';
      try {
        await fn();
      } finally {
        btn.disabled = false;
        btn.textContent = original;
      }
    }

    function fillFromTmdb() {
      withButton('tmdbBtn', async () => {
        setStatus('contentStatus', '', true);
        try {
          const data = await api('/session/tmdb-fill', jsonPost({}));
          state = data.session;
          render();
          renderPreview(data.preview);
          if (data.warning) {
            setStatus('contentStatus', data.warning, false);
          } else {
            setStatus('contentStatus', 'Datos cargados desde TMDB.', true);
          }
        } catch (e) {
          setStatus('contentStatus', e.message, false);
        }
      });
    }

    function previewMal() {
      withButton('malBtn', async () => {
        const malId = document.getElementById('malId').value.trim();
        if (!malId) {
          setStatus('contentStatus', 'Introduce un ID de MyAnimeList.', false);
          return;
        }
        try {
          const preview = await api('/preview/mal/' + encodeURIComponent(malId));
          renderPreview(preview);
          setStatus('contentStatus', '', true);
        } catch (e) {
          setStatus('contentStatus', e.message, false);
        }
      });
    }

    function fillSkipTimes() {
      withButton('skipBtn', async () => {
        try {
          const data = await api('/session/skip-times', jsonPost({}));
          state = data.session;
          render();
          const parts = [];
          if (data.opening) parts.push('intro ' + data.opening.startTime + 's–' + data.opening.endTime + 's');
          if (data.ending) parts.push('ending desde ' + data.ending.startTime + 's');
          setStatus('contentStatus', 'Skip times aplicados: ' + (parts.join(', ') || 'ninguno'), true);
        } catch (e) {
          setStatus('contentStatus', e.message, false);
        }
      });
    }

    function renderPreview(preview) {
      const section = document.getElementById('previewSection');
      const card = document.getElementById('previewCard');
      section.classList.remove('hidden');
      card.innerHTML = '';
      if (preview.imageUrl) {
        const img = document.createElement('img');
        img.src = preview.imageUrl;
        card.appendChild(img);
      }
      const info = document.createElement('div');
      const title = document.createElement('div');
      title.className = 'title';
      title.textContent = preview.title;
      info.appendChild(title);
      const meta = document.createElement('div');
      meta.className = 'meta';
      const bits = [preview.type, preview.year];
      if (preview.episodes) bits.push(preview.episodes + ' episodios');
      meta.textContent = bits.filter(Boolean).join(' · ');
      info.appendChild(meta);
      card.appendChild(info);
    }

    function generate() {
      withButton('generateBtn', async () => {
        try {
          const data = await api('/generate', jsonPost({}));
          document.getElementById('generatedHtml').value = data.html;
          setStatus('generateStatus', '', true);
          document.getElementById('generateModal').classList.add('show');
        } catch (e) {
          setStatus('contentStatus', e.message, false);
        }
      });
    }

    async function copyGenerated() {
      const text = document.getElementById('generatedHtml').value;
      try {
        await navigator.clipboard.writeText(text);
        setStatus('generateStatus', 'Copiado al portapapeles.', true);
      } catch (e) {
        setStatus('generateStatus', 'No se pudo copiar: ' + e.message, false);
      }
    }

    function openLoad() {
      document.getElementById('loadHtml').value = '';
      setStatus('loadStatus', '', true);
      document.getElementById('loadModal').classList.add('show');
    }

    async function loadFromHtml() {
      const html = document.getElementById('loadHtml').value;
      try {
        state = await api('/load', jsonPost({ html }));
        render();
        closeModal('loadModal');
        setStatus('contentStatus', 'Configuración cargada.', true);
      } catch (e) {
        setStatus('loadStatus', e.message, false);
      }
    }

    async function resetSession() {
      try {
        state = await api('/session/reset', jsonPost({}));
        render();
        document.getElementById('previewSection').classList.add('hidden');
        setStatus('contentStatus', '', true);
      } catch (e) {
        setStatus('contentStatus', e.message, false);
      }
    }

    function closeModal(id) {
      document.getElementById(id).classList.remove('show');
    }

    refresh();
  </script>
</body>
</html>"##;
