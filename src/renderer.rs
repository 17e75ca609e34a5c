use std::io::{Cursor, ErrorKind, Write};
use std::path::PathBuf;

use thiserror::Error;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::cmdline::{self, Transport};
use crate::io_struct::{BatchReqInput, SingleReqInput};

#[derive(Debug, Error)]
pub enum RenderError {
    /// zint ran but reported failure; `detail` carries its stderr, or stdout
    /// when stderr was empty.
    #[error("zint exited with code {exit_code}: {detail}")]
    Renderer { exit_code: i32, detail: String },
    #[error("failed to run {zint}: {source}")]
    Spawn {
        zint: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to build archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub zint_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RendererState {
    pub zint_path: PathBuf,
}

/// Resolves the zint executable once at startup: explicit path if given,
/// otherwise the first `zint` on PATH, otherwise the stock install location.
pub fn resolve_zint_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join("zint");
            if candidate.is_file() {
                return candidate;
            }
        }
    }
    PathBuf::from("/usr/bin/zint")
}

/// Content type for a zint output format. Unknown formats download as a
/// generic byte stream.
pub fn mime_for_filetype(filetype: &str) -> &'static str {
    match filetype {
        "BMP" => "image/bmp",
        "EMF" => "image/emf",
        "EPS" => "application/postscript",
        "GIF" => "image/gif",
        "PCX" => "image/vnd.zbrush.pcx",
        "PNG" => "image/png",
        "SVG" => "image/svg+xml",
        "TIF" => "image/tiff",
        "TXT" => "text/plain",
        _ => "application/octet-stream",
    }
}

impl RendererState {
    pub fn new(config: &GatewayConfig) -> Self {
        RendererState {
            zint_path: config.zint_path.clone(),
        }
    }

    /// Runs zint to completion and checks its exit status. One child process
    /// per call; no timeout is applied.
    async fn run_zint(&self, args: &[String]) -> Result<(), RenderError> {
        log::info!(
            "Executing command: {} {}",
            self.zint_path.display(),
            args.join(" ")
        );
        let output = tokio::process::Command::new(&self.zint_path)
            .args(args)
            .output()
            .await
            .map_err(|source| RenderError::Spawn {
                zint: self.zint_path.display().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.is_empty() {
            log::info!("Zint stdout: {}", stdout.trim_end());
        }
        if !stderr.is_empty() {
            log::error!("Zint stderr: {}", stderr.trim_end());
        }

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(RenderError::Renderer { exit_code, detail });
        }
        Ok(())
    }

    /// Renders one barcode and returns its bytes with the matching content
    /// type. The staging directory is removed when this returns, on every
    /// path.
    pub async fn render_single(
        &self,
        req: &SingleReqInput,
        transport: Transport,
    ) -> Result<(Vec<u8>, &'static str), RenderError> {
        let filetype = req.filetype();
        let mime = mime_for_filetype(&filetype);
        let work_dir = tempfile::TempDir::new()?;
        let output_path = work_dir
            .path()
            .join(format!("barcode.{}", filetype.to_lowercase()));
        let args = cmdline::single_args(req, transport, &output_path);
        self.run_zint(&args).await?;
        let bytes = tokio::fs::read(&output_path).await?;
        Ok((bytes, mime))
    }

    /// Renders a whole batch through a single zint `--batch` run and packages
    /// every file it produced into an in-memory ZIP archive.
    pub async fn render_batch(
        &self,
        items: &[String],
        req: &BatchReqInput,
    ) -> Result<Vec<u8>, RenderError> {
        let ext = req.filetype().to_lowercase();
        let pattern = req.output_pattern();
        let width = cmdline::padding_width(items.len());

        let work_dir = tempfile::TempDir::new()?;
        let input_path = work_dir.path().join("input.txt");
        let mut input = items.join("\n");
        input.push('\n');
        tokio::fs::write(&input_path, input).await?;

        let template = work_dir
            .path()
            .join(cmdline::output_template_name(&pattern, width, &ext));
        let args = cmdline::batch_args(req, &input_path, &template);
        self.run_zint(&args).await?;

        // Collect whatever zint actually wrote; a gap in the numbering is
        // logged and skipped, never fatal.
        let mut produced = Vec::new();
        for idx in 1..=items.len() {
            let name = cmdline::numbered_name(&pattern, idx, width, &ext);
            let path = work_dir.path().join(&name);
            match tokio::fs::read(&path).await {
                Ok(bytes) => produced.push((name, bytes)),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    log::warn!("Missing output file: {}", path.display());
                }
                Err(err) => return Err(err.into()),
            }
        }
        build_archive(produced)
    }
}

fn build_archive(files: Vec<(String, Vec<u8>)>) -> Result<Vec<u8>, RenderError> {
    let mut cursor = Cursor::new(Vec::new());
    let mut archive = ZipWriter::new(&mut cursor);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in files {
        archive.start_file(name.as_str(), options)?;
        archive.write_all(&bytes)?;
        log::info!("Added to ZIP: {}", name);
    }
    archive.finish()?;
    Ok(cursor.into_inner())
}
