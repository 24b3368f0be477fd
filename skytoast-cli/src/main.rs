use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use skytoast::prelude::*;
use skytoast::viewer;

#[derive(Parser)]
#[command(name = "skytoast", version)]
#[command(about = "Build and preview TOAST tile pyramids from all-sky images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tile an equirectangular image into a TOAST pyramid
    Build {
        /// Input image; its width must be exactly twice its height
        input: PathBuf,

        /// Directory to write the pyramid into
        out_dir: PathBuf,

        /// Deepest level to tile; 4^n tiles are produced at level n
        #[arg(long, default_value_t = 3)]
        depth: u8,

        /// Fan the four top-level branches out across threads
        #[arg(long)]
        parallel: bool,

        /// Sample every tile independently instead of synthesizing the
        /// level-0 tile from its children
        #[arg(long)]
        flat: bool,

        /// Treat the input as 16-bit data and stretch it to the display
        /// range (linear, squared, sqrt, power, log, arcsinh)
        #[arg(long)]
        stretch: Option<String>,

        /// Data value mapped to black; defaults to the input minimum
        #[arg(long)]
        vmin: Option<f64>,

        /// Data value mapped to white; defaults to the input maximum
        #[arg(long)]
        vmax: Option<f64>,

        /// Fraction of the data range mapped to mid-grey
        #[arg(long, default_value_t = 0.5)]
        bias: f64,

        /// Steepness of the ramp from black to white
        #[arg(long, default_value_t = 1.0)]
        contrast: f64,

        /// Also write a WTML manifest to this path
        #[arg(long)]
        wtml: Option<PathBuf>,

        /// Tile-set name used in the manifest
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        credits: Option<String>,

        #[arg(long)]
        credits_url: Option<String>,

        #[arg(long)]
        thumbnail_url: Option<String>,
    },

    /// Serve a generated pyramid for preview in a browser
    Preview {
        /// Pyramid directory produced by `build`
        dir: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: String,

        /// JSON file with manifest metadata (folder_name, name, credits,
        /// credits_url, thumbnail_url)
        #[arg(long)]
        meta: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Build {
            input,
            out_dir,
            depth,
            parallel,
            flat,
            stretch,
            vmin,
            vmax,
            bias,
            contrast,
            wtml,
            name,
            credits,
            credits_url,
            thumbnail_url,
        } => {
            let opts = BuildOptions {
                depth,
                parallel,
                root: if flat { RootStrategy::Sampled } else { RootStrategy::Synthesized },
            };

            let summary = match stretch {
                Some(mode) => build_stretched(&input, &out_dir, &opts, &mode, vmin, vmax, bias, contrast)?,
                None => {
                    let raster = skytoast::io::read_png(&input)
                        .with_context(|| format!("reading {}", input.display()))?;
                    let sampler = CartesianSampler::from_rgb(&raster)?;
                    build_pyramid(&sampler, &opts, &out_dir)?
                }
            };
            println!("wrote {} tiles to {}", summary.tiles_written, out_dir.display());

            if let Some(wtml_path) = wtml {
                let meta = WtmlMeta {
                    name: name.unwrap_or_else(|| tile_set_name(&out_dir)),
                    credits: credits.unwrap_or_default(),
                    credits_url: credits_url.unwrap_or_default(),
                    thumbnail_url: thumbnail_url.unwrap_or_default(),
                    ..WtmlMeta::default()
                };
                std::fs::write(&wtml_path, gen_wtml(&meta, depth))
                    .with_context(|| format!("writing {}", wtml_path.display()))?;
                println!("wrote manifest {}", wtml_path.display());
            }
            Ok(())
        }

        Command::Preview { dir, bind, meta } => {
            let meta = match meta {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_str(&raw)
                        .with_context(|| format!("parsing {}", path.display()))?
                }
                None => WtmlMeta::default(),
            };
            viewer::serve(&dir, &bind, &meta)?;
            Ok(())
        }
    }
}

/// Builds through the normalization pipeline, reading the input as 16-bit
/// grayscale data
#[allow(clippy::too_many_arguments)]
fn build_stretched(
    input: &Path,
    out_dir: &Path,
    opts: &BuildOptions,
    mode: &str,
    vmin: Option<f64>,
    vmax: Option<f64>,
    bias: f64,
    contrast: f64,
) -> Result<BuildSummary> {
    let scaling: Scaling = mode.parse()?;
    let raster = skytoast::io::read_luma16(input)
        .with_context(|| format!("reading {}", input.display()))?;

    // Unset endpoints stretch over the full data range
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for pixel in raster.pixels() {
        let value = f64::from(pixel.0[0]);
        lo = lo.min(value);
        hi = hi.max(value);
    }
    let stretch = Stretch {
        vmin: vmin.unwrap_or(lo),
        vmax: vmax.unwrap_or(hi),
        bias,
        contrast,
        scaling,
    };
    log::info!(
        "stretching [{}, {}] with {} scaling",
        stretch.vmin,
        stretch.vmax,
        stretch.scaling
    );

    let sampler = Normalizer::new(CartesianSampler::from_luma16(&raster)?, stretch);
    Ok(build_pyramid(&sampler, opts, out_dir)?)
}

/// Manifest tile-set name derived from the output directory
fn tile_set_name(out_dir: &Path) -> String {
    out_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| WtmlMeta::default().name)
}
