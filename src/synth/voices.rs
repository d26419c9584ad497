//! Voice model resolution: local lookup, remote index, download.
//!
//! A usable voice is a `.onnx` file with its `.onnx.json` sibling - piper
//! needs both. Resolution tries the name as a path, then the app data
//! directory, and only then fetches the remote index to download the pair.

use crate::defaults::{VOICES_BASE_URL, VOICES_INDEX_URL};
use crate::error::{BookvoxError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// One voice's published files, keyed by repo-relative path.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceEntry {
    #[serde(default)]
    pub files: HashMap<String, VoiceFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceFile {
    #[serde(default)]
    pub size_bytes: u64,
}

/// Download URLs for one voice model.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceUrls {
    pub onnx: String,
    pub config: String,
}

/// Parsed remote voice index.
///
/// Constructed at the call site that needs a download and passed by
/// reference; it holds no global state and fetches exactly once.
pub struct VoiceCatalog {
    voices: HashMap<String, VoiceEntry>,
}

impl VoiceCatalog {
    /// Fetch and parse the remote index.
    pub fn fetch(agent: &ureq::Agent) -> Result<Self> {
        info!(url = VOICES_INDEX_URL, "fetching voice index");
        let body = agent
            .get(VOICES_INDEX_URL)
            .call()
            .map_err(|e| BookvoxError::Download {
                url: VOICES_INDEX_URL.to_string(),
                message: e.to_string(),
            })?
            .into_string()
            .map_err(|e| BookvoxError::Download {
                url: VOICES_INDEX_URL.to_string(),
                message: e.to_string(),
            })?;
        Self::from_json(&body)
    }

    /// Parse an index document. Split from [`fetch`] so tests run offline.
    pub fn from_json(body: &str) -> Result<Self> {
        let voices: HashMap<String, VoiceEntry> =
            serde_json::from_str(body).map_err(|e| BookvoxError::Download {
                url: VOICES_INDEX_URL.to_string(),
                message: format!("voice index did not parse: {e}"),
            })?;
        Ok(Self { voices })
    }

    /// Resolve a model name (with or without `.onnx`) to its download URLs.
    pub fn urls_for(&self, model: &str) -> Result<VoiceUrls> {
        let key = model.trim_end_matches(".onnx");
        let entry = self
            .voices
            .get(key)
            .ok_or_else(|| BookvoxError::ModelNotFound {
                name: model.to_string(),
                message: "not present in the voice index".to_string(),
            })?;

        let mut onnx = None;
        let mut config = None;
        for path in entry.files.keys() {
            if path.ends_with(".onnx") {
                onnx = Some(format!("{VOICES_BASE_URL}/{path}"));
            } else if path.ends_with(".onnx.json") {
                config = Some(format!("{VOICES_BASE_URL}/{path}"));
            }
        }

        match (onnx, config) {
            (Some(onnx), Some(config)) => Ok(VoiceUrls { onnx, config }),
            _ => Err(BookvoxError::ModelNotFound {
                name: model.to_string(),
                message: "index entry is missing its onnx or onnx.json file".to_string(),
            }),
        }
    }

    /// Published size of the voice's `.onnx` file, when the index carries it.
    pub fn onnx_size(&self, model: &str) -> Option<u64> {
        let key = model.trim_end_matches(".onnx");
        self.voices.get(key).and_then(|entry| {
            entry
                .files
                .iter()
                .find(|(path, _)| path.ends_with(".onnx"))
                .map(|(_, file)| file.size_bytes)
        })
    }
}

/// Check a candidate `.onnx` path for its required `.onnx.json` sibling.
fn with_config_sibling(candidate: &Path) -> Option<PathBuf> {
    if !candidate.is_file() {
        return None;
    }
    let sibling = PathBuf::from(format!("{}.json", candidate.display()));
    sibling.is_file().then(|| candidate.to_path_buf())
}

/// Find a model locally: first treating `model` as a path, then under the
/// app data directory.
pub fn expand_model_path(model: &str, data_dir: &Path) -> Result<PathBuf> {
    if let Some(found) = with_config_sibling(Path::new(model)) {
        return Ok(found);
    }
    if Path::new(model).is_file() {
        return Err(BookvoxError::ModelNotFound {
            name: model.to_string(),
            message: "the onnx file exists but its onnx.json sibling is missing".to_string(),
        });
    }

    let in_data_dir = data_dir.join(model);
    if let Some(found) = with_config_sibling(&in_data_dir) {
        return Ok(found);
    }
    if in_data_dir.is_file() {
        return Err(BookvoxError::ModelNotFound {
            name: model.to_string(),
            message: format!(
                "found in {} but its onnx.json sibling is missing",
                data_dir.display()
            ),
        });
    }

    Err(BookvoxError::ModelNotFound {
        name: model.to_string(),
        message: format!(
            "not found as a path or under {}",
            data_dir.display()
        ),
    })
}

/// Voice models installed under `dir` (pair rule applies).
pub fn installed_models(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut models = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "onnx")
            && with_config_sibling(&path).is_some()
        {
            models.push(path);
        }
    }
    models.sort();
    Ok(models)
}

/// Resolve a model, downloading the pair into `data_dir` on a local miss.
pub fn find_or_download(model: &str, data_dir: &Path) -> Result<PathBuf> {
    match expand_model_path(model, data_dir) {
        Ok(path) => return Ok(path),
        Err(BookvoxError::ModelNotFound { .. }) => {}
        Err(e) => return Err(e),
    }

    std::fs::create_dir_all(data_dir)?;
    let agent = ureq::agent();
    let catalog = VoiceCatalog::fetch(&agent)?;
    let urls = catalog.urls_for(model)?;

    let file_name = if model.ends_with(".onnx") {
        model.to_string()
    } else {
        format!("{model}.onnx")
    };
    let onnx_path = data_dir.join(&file_name);
    let config_path = data_dir.join(format!("{file_name}.json"));

    download(&agent, &urls.onnx, &onnx_path, catalog.onnx_size(model))?;
    download(&agent, &urls.config, &config_path, None)?;

    info!(model = %onnx_path.display(), "voice model installed");
    Ok(onnx_path)
}

/// Fetch `url` into `dest` with a progress bar.
fn download(agent: &ureq::Agent, url: &str, dest: &Path, size_hint: Option<u64>) -> Result<()> {
    let response = agent.get(url).call().map_err(|e| BookvoxError::Download {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let total = size_hint.or_else(|| {
        response
            .header("Content-Length")
            .and_then(|v| v.parse().ok())
    });

    let bar = match total {
        Some(total) => ProgressBar::new(total).with_style(
            ProgressStyle::with_template(
                "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        ),
        None => ProgressBar::new_spinner(),
    };
    bar.set_message(
        dest.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );

    let mut reader = response.into_reader();
    let mut out = std::fs::File::create(dest)?;
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(|e| BookvoxError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        if n == 0 {
            break;
        }
        std::io::Write::write_all(&mut out, &buf[..n])?;
        bar.inc(n as u64);
    }
    bar.finish_and_clear();
    Ok(())
}
