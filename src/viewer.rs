//! HTTP preview server for a generated pyramid: the WTML manifest at a
//! fixed path, a minimal WorldWide Telescope viewer page, and the tile
//! files themselves behind a small LRU byte cache.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use lru::LruCache;

use crate::core::geo::TileAddress;
use crate::wtml::{gen_wtml, infer_max_depth, WtmlMeta};
use crate::Result;

/// In-memory cache of encoded tile bytes using LRU eviction
#[derive(Debug)]
pub struct TileCache {
    cache: Arc<Mutex<LruCache<TileAddress, Arc<Vec<u8>>>>>,
}

impl TileCache {
    /// Create a new tile cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1024).unwrap());
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Get a tile's bytes from the cache
    pub fn get(&self, addr: &TileAddress) -> Option<Arc<Vec<u8>>> {
        self.cache.lock().ok()?.get(addr).cloned()
    }

    /// Insert a tile's bytes into the cache
    pub fn insert(&self, addr: TileAddress, bytes: Arc<Vec<u8>>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(addr, bytes);
        }
    }

    /// Check if a tile is in the cache
    pub fn contains(&self, addr: &TileAddress) -> bool {
        self.cache
            .lock()
            .ok()
            .map(|cache| cache.contains(addr))
            .unwrap_or(false)
    }

    /// Get the current number of cached tiles
    pub fn len(&self) -> usize {
        self.cache.lock().ok().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all tiles from the cache
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

impl Clone for TileCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

struct ViewerState {
    base_dir: PathBuf,
    wtml: String,
    cache: TileCache,
}

/// Serves `base_dir` on `bind` until the process is interrupted.
///
/// The pyramid depth is inferred from the numeric top-level subdirectory
/// names, so any directory produced by the builder previews as-is. Owns its
/// tokio runtime, so callers stay synchronous.
pub fn serve(base_dir: impl AsRef<Path>, bind: &str, meta: &WtmlMeta) -> Result<()> {
    let base_dir = base_dir.as_ref().to_path_buf();
    let depth = infer_max_depth(&base_dir)?;
    log::info!("previewing {} (depth {depth}) on http://{bind}/", base_dir.display());

    let state = Arc::new(ViewerState {
        base_dir,
        wtml: gen_wtml(meta, depth),
        cache: TileCache::default(),
    });

    let app = Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .route("/index.wtml", get(manifest))
        .route("/:level/:y/:file", get(tile))
        .with_state(state);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(bind).await?;
        axum::serve(listener, app).await
    })?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn manifest(State(state): State<Arc<ViewerState>>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/xml")],
        state.wtml.clone(),
    )
        .into_response()
}

async fn tile(
    State(state): State<Arc<ViewerState>>,
    UrlPath((level, y, file)): UrlPath<(u8, u32, String)>,
) -> Response {
    let Some(addr) = parse_tile_name(level, y, &file) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(bytes) = state.cache.get(&addr) {
        return png_response(&bytes);
    }

    match tokio::fs::read(state.base_dir.join(addr.path())).await {
        Ok(bytes) => {
            let bytes = Arc::new(bytes);
            state.cache.insert(addr, Arc::clone(&bytes));
            png_response(&bytes)
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Parses a `"{y}_{x}.png"` file name into a tile address, rejecting
/// anything that does not round-trip to a valid pyramid path
fn parse_tile_name(level: u8, y: u32, file: &str) -> Option<TileAddress> {
    let stem = file.strip_suffix(".png")?;
    let (file_y, file_x) = stem.split_once('_')?;
    let file_y: u32 = file_y.parse().ok()?;
    let x: u32 = file_x.parse().ok()?;
    if file_y != y {
        return None;
    }
    let addr = TileAddress::new(level, x, y);
    addr.is_valid().then_some(addr)
}

fn png_response(bytes: &Arc<Vec<u8>>) -> Response {
    (
        [(header::CONTENT_TYPE, "image/png")],
        bytes.as_ref().clone(),
    )
        .into_response()
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>skytoast preview</title>
<style>
html, body { height: 100%; margin: 0; padding: 0; overflow: hidden; background: #000; }
#WWTCanvas { width: 100%; height: 100%; }
</style>
<script src="https://www.worldwidetelescope.org/scripts/wwtsdk.aspx"></script>
</head>
<body onload="init();">
<div id="WWTCanvas"></div>
<script>
function init() {
  var wwt = wwtlib.WWTControl.initControl("WWTCanvas");
  wwt.add_ready(function () {
    wwt.settings.set_showCrosshairs(true);
    wwt.settings.set_showConstellationFigures(false);
    wwt.loadImageCollection('/index.wtml');
    wwt.add_collectionLoaded(function () {
      var sets = wwtlib.WWTControl.imageSets;
      if (sets.length > 0) {
        wwt.setForegroundImageByName(sets[sets.length - 1].get_name());
        wwt.setForegroundOpacity(100);
      }
    });
  });
}
</script>
</body>
</html>
"#;
