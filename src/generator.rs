//! 播放器页面生成器
//! 把配置包序列化进固定的独立播放器 HTML 模板；同输入必同输出。
//! 另附旁站的离线缓存 service worker 产物。

use crate::types::ConfigBundle;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// 未配置主题时的缺省值
pub const DEFAULT_THEME: &str = "orange";

/// 旁站缓存名，换版本号即可让 activate 清掉旧缓存
pub const SW_CACHE_NAME: &str = "yami-lat-cache-v1";

/// 安装时预缓存的固定 URL 白名单
pub const SW_PRECACHE_URLS: &[&str] = &[
    "/",
    "/index.html",
    "/css/styles.css",
    "/js/indexContent.js",
    "/js/aboutAndDMCA.js",
    "/js/adultContent.js",
    "/js/buscador.js",
    "/js/config.js",
    "/js/configuracion.js",
    "/js/favoritos.js",
    "/js/home.js",
    "/js/script.js",
    "/js/series.js",
    "/js/templates/configuracionTemplate.js",
    "/js/templates/favoritosTemplate.js",
];

/// 渲染完整的独立播放器页面
/// 主题从 contentConfig 读取但不从嵌入数据里删除，保证解析往返无损
pub fn render_player_html(bundle: &ConfigBundle) -> String {
    let theme = bundle
        .content_config
        .get("theme")
        .and_then(|v| v.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_THEME);

    // 先替换标量，再替换 JSON 块，避免配置文本里出现标量标记时被二次替换
    PLAYER_TEMPLATE
        .replace("@theme", theme)
        .replace("@googleApiKey", &bundle.google_api_key)
        .replace("@contentConfig", &to_pretty_json(&bundle.content_config))
        .replace("@languageServers", &to_pretty_json(&bundle.language_servers))
        .replace("@downloadServers", &to_pretty_json(&bundle.download_servers))
}

/// 渲染旁站的 service worker：安装预缓存 + 缓存优先 + 激活清旧
pub fn render_service_worker() -> String {
    let urls = SW_PRECACHE_URLS
        .iter()
        .map(|url| format!("  '{}',", url))
        .collect::<Vec<_>>()
        .join("\n");

    SERVICE_WORKER_TEMPLATE
        .replace("@cacheName", SW_CACHE_NAME)
        .replace("@urlsToCache", &urls)
}

/// 和原模板一致的 4 空格缩进 JSON
fn to_pretty_json<T: Serialize>(value: &T) -> String {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .expect("配置序列化为 JSON 不应失败");
    String::from_utf8(buf).expect("serde_json 输出必为 UTF-8")
}

/// 独立播放器页面模板，外部资源地址固定
const PLAYER_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="UTF-8" />
    <meta
      name="viewport"
      content="width=device-width, initial-scale=1.0, user-scalable=no"
    />
    <title>Reproductor de Video</title>
    <script defer>
      // Función para obtener parámetros de la URL
      function getUrlParameter(name) {
        name = name.replace(/[\[]/, "\\[").replace(/[\]]/, "\\]");
        var regex = new RegExp("[\\?&]" + name + "=([^&#]*)");
        var results = regex.exec(location.search);
        return results === null
          ? ""
          : decodeURIComponent(results[1].replace(/\+/g, " "));
      }

      // Obtener el parámetro 'theme' de la URL y aplicarlo
      const themeFromUrl = getUrlParameter("theme");
      if (themeFromUrl) {
        document.documentElement.setAttribute("data-theme", themeFromUrl);
      } else {
            // Si no se especifica el parámetro 'theme' en la URL, la web se cargará con el tema configurado por defecto.
            document.documentElement.setAttribute("data-theme", "@theme");
          }
          // Para cargar la web con un tema específico, usa la URL: index.html?theme=nombre_del_tema (ej: index.html?theme=purple)
    </script>

        <!-- Iconos de Google y Tipografía -->
        <link rel="preconnect" href="https://fonts.googleapis.com" />
        <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin />
        <!-- Preload Google Fonts for faster loading -->
        <link
          rel="preload"
          href="https://fonts.googleapis.com/css2?family=Poppins:wght@400;600&display=swap"
          as="style"
          onload="this.onload=null;this.rel='stylesheet'"
        />
        <noscript>
          <link
            href="https://fonts.googleapis.com/css2?family=Poppins:wght@400;600&display=swap"
            rel="stylesheet"
          />
        </noscript>
        <link
          href="https://fonts.googleapis.com/icon?family=Material+Icons"
          rel="stylesheet"
        />
        <link
          href="https://fonts.googleapis.com/icon?family=Material+Icons"
          rel="stylesheet"
        />
        <!-- Font Awesome for close icons -->
        <link
          rel="stylesheet"
          href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0-beta3/css/all.min.css"
          xintegrity="sha512-Fo3rlrZj/k7ujTnHg4CGR2D7kSs0v4LLanw2qksYuRlEzO+tcaEPQogQ0KaoGN26/zrn20ImR1DfuLWnOo7aBA=="
          crossorigin="anonymous"
          referrerpolicy="no-referrer"
        />
        <link rel="stylesheet" href="https://cdn.jsdelivr.net/gh/geminiproai37-blip/dsfdfd@main/reproductor-app-yami/style.css" />
        <script defer>
           window.contentConfig = @contentConfig;
           window.languageServers = @languageServers;
           window.downloadServers = @downloadServers;
          // IMPORTANT: Replace with your actual Google API Key.
          // Be aware of the security implications of exposing this key in client-side code.
          window.GOOGLE_API_KEY = "@googleApiKey";
        </script>
        <!-- HLS.js library for M3U8 playback -->
        <!-- Video.js library for broader video format support -->
        <script src="https://vjs.zencdn.net/8.10.0/video.min.js" defer></script>
        <!-- HLS.js library for M3U8 playback -->
        <script
          src="https://cdn.jsdelivr.net/npm/hls.js@latest"
          defer
        ></script>
        <script type="module" src="https://cdn.jsdelivr.net/gh/geminiproai37-blip/dsfdfd@main/reproductor-app-yami/dom_builder.js" defer></script>
        <script type="module" src="https://cdn.jsdelivr.net/gh/geminiproai37-blip/dsfdfd@main/reproductor-app-yami/external_handler.js" defer></script>
        <script type="module" src="https://cdn.jsdelivr.net/gh/geminiproai37-blip/dsfdfd@main/reproductor-app-yami/continueWatchingModal.js" defer></script>
        <script type="module" src="https://cdn.jsdelivr.net/gh/geminiproai37-blip/dsfdfd@main/reproductor-app-yami/anime_loader.js" defer></script>
        <script type="module" src="https://cdn.jsdelivr.net/gh/geminiproai37-blip/dsfdfd@main/reproductor-app-yami/apps.js" defer></script>
      </head>
     <body>
    <div id="player-container"></div>
    <!-- Nuevo contenedor para el menú vertical -->
    <div id="vertical-menu-container" class="vertical-menu-container">
      <!-- Los elementos del menú vertical se insertarán aquí dinámicamente por dom_builder.js -->
    </div>

    <!-- Contenedor para los botones del menú lateral en orientación vertical -->
    <div id="side-menu-buttons">
      <!-- Los botones se insertarán aquí dinámicamente por dom_builder.js -->
    </div>

    <!-- Report Confirmation Modal -->
    <div id="report-confirmation-modal" class="popup hidden">
      <div class="popup-header">
        <h3>Reporte Enviado</h3>
        <button class="close-popup-btn">
          <i class="fas fa-times"></i>
        </button>
      </div>
      <div class="popup-content report-confirmation-content">
        <img
          src="https://i.pinimg.com/originals/f2/1f/0a/f21f0a529006c607222141022020812f.gif"
          alt="Reporte Enviado"
          class="report-confirmation-gif"
        />
        <p>¡Gracias por tu reporte! Lo revisaremos pronto.</p>
        <button id="report-confirmation-ok-btn" class="btn-primary">
          Aceptar
        </button>
      </div>
    </div>
  </body>
</html>"##;

/// 旁站 service worker 模板
const SERVICE_WORKER_TEMPLATE: &str = r#"const CACHE_NAME = '@cacheName';
const urlsToCache = [
@urlsToCache
];

self.addEventListener('install', (event) => {
  event.waitUntil(
    caches.open(CACHE_NAME)
      .then((cache) => {
        console.log('Opened cache');
        return cache.addAll(urlsToCache);
      })
  );
});

self.addEventListener('fetch', (event) => {
  event.respondWith(
    caches.match(event.request)
      .then((response) => {
        // Cache hit - return response
        if (response) {
          return response;
        }
        return fetch(event.request);
      })
  );
});

self.addEventListener('activate', (event) => {
  const cacheWhitelist = [CACHE_NAME];
  event.waitUntil(
    caches.keys().then((cacheNames) => {
      return Promise.all(
        cacheNames.map((cacheName) => {
          if (cacheWhitelist.indexOf(cacheName) === -1) {
            return caches.delete(cacheName);
          }
        })
      );
    })
  );
});
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::EditorSession;

    #[test]
    fn test_render_embeds_data_assignments() {
        let bundle = EditorSession::new().build();
        let html = render_player_html(&bundle);
        assert!(html.contains("window.contentConfig = {"));
        assert!(html.contains("window.languageServers = {"));
        assert!(html.contains("window.downloadServers = {"));
        assert!(html.contains(&format!(
            "window.GOOGLE_API_KEY = \"{}\";",
            bundle.google_api_key
        )));
        // 4 空格缩进
        assert!(html.contains("    \"type\": \"tv\""));
    }

    #[test]
    fn test_render_substitutes_theme() {
        let mut session = EditorSession::new();
        session.theme = "purple".to_string();
        let html = render_player_html(&session.build());
        assert!(html.contains("setAttribute(\"data-theme\", \"purple\")"));
        // 往返属性：theme 仍留在嵌入数据里
        assert!(html.contains("\"theme\": \"purple\""));
    }

    #[test]
    fn test_render_falls_back_to_default_theme() {
        let mut session = EditorSession::new();
        session.theme = String::new();
        let html = render_player_html(&session.build());
        assert!(html.contains(&format!("setAttribute(\"data-theme\", \"{}\")", DEFAULT_THEME)));
    }

    #[test]
    fn test_render_is_deterministic() {
        let bundle = EditorSession::new().build();
        assert_eq!(render_player_html(&bundle), render_player_html(&bundle));
    }

    #[test]
    fn test_render_wires_fixed_assets() {
        let html = render_player_html(&EditorSession::new().build());
        assert!(html.contains("https://vjs.zencdn.net/8.10.0/video.min.js"));
        assert!(html.contains("https://cdn.jsdelivr.net/npm/hls.js@latest"));
        assert!(html.contains("reproductor-app-yami/style.css"));
        assert!(html.contains("reproductor-app-yami/dom_builder.js"));
    }

    #[test]
    fn test_service_worker_lists_every_precache_url() {
        let js = render_service_worker();
        assert!(js.contains(SW_CACHE_NAME));
        for url in SW_PRECACHE_URLS {
            assert!(js.contains(&format!("'{}'", url)));
        }
        assert!(js.contains("caches.delete(cacheName)"));
    }
}
