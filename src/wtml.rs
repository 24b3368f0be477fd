//! WTML manifest generation: the XML document that tells a visualization
//! client where the pyramid lives and how deep it goes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, ToastError};

/// Display metadata carried into the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WtmlMeta {
    /// Name of the enclosing folder element
    pub folder_name: String,
    /// Tile-set name; also the first segment of the tile URL template
    pub name: String,
    pub credits: String,
    pub credits_url: String,
    pub thumbnail_url: String,
}

impl Default for WtmlMeta {
    fn default() -> Self {
        Self {
            folder_name: "All-sky pyramid".to_string(),
            name: "pyramid".to_string(),
            credits: String::new(),
            credits_url: String::new(),
            thumbnail_url: String::new(),
        }
    }
}

/// Renders the manifest for a pyramid of the given depth.
///
/// The schema is fixed by the consuming clients: one `Folder` wrapping one
/// `ImageSet`, with the tile URL templated as
/// `{name}/{1}/{3}/{3}_{2}.png`.
pub fn gen_wtml(meta: &WtmlMeta, depth: u8) -> String {
    let name = escape_xml(&meta.name);
    format!(
        "<Folder Name=\"{folder}\">\n\
         <ImageSet Generic=\"False\" DataSetType=\"Sky\" BandPass=\"Visible\" \
         Name=\"{name}\" Url=\"{name}/{{1}}/{{3}}/{{3}}_{{2}}.png\" \
         BaseTileLevel=\"0\" TileLevels=\"{depth}\" BaseDegreesPerTile=\"180\" \
         FileType=\".png\" BottomsUp=\"False\" Projection=\"Toast\" \
         QuadTreeMap=\"\" CenterX=\"0\" CenterY=\"0\" OffsetX=\"0\" OffsetY=\"0\" \
         Rotation=\"0\" Sparse=\"False\" ElevationModel=\"False\">\n\
         <Credits>{credits}</Credits>\n\
         <CreditsUrl>{credits_url}</CreditsUrl>\n\
         <ThumbnailUrl>{thumbnail_url}</ThumbnailUrl>\n\
         <Description/>\n\
         </ImageSet>\n\
         </Folder>\n",
        folder = escape_xml(&meta.folder_name),
        credits = escape_xml(&meta.credits),
        credits_url = escape_xml(&meta.credits_url),
        thumbnail_url = escape_xml(&meta.thumbnail_url),
    )
}

/// Deepest pyramid level present under `dir`, read off the numeric
/// top-level subdirectory names
pub fn infer_max_depth(dir: impl AsRef<Path>) -> Result<u8> {
    let dir = dir.as_ref();
    let mut max_depth: Option<u8> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Ok(level) = entry.file_name().to_string_lossy().parse::<u8>() {
            max_depth = Some(max_depth.map_or(level, |m| m.max(level)));
        }
    }
    max_depth.ok_or_else(|| {
        ToastError::NotFound(format!("no tile level directories under {}", dir.display()))
    })
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
