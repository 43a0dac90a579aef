//! Turn pronunciation URLs into local mp3 files a deck can embed.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use lemmacard_types::WordSense;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio url {0:?} has no file name")]
    NoFileName(String),
    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status} converting {}", .path.display())]
    Transcode {
        program: String,
        path: PathBuf,
        status: std::process::ExitStatus,
    },
}

/// Makes a remote pronunciation available as a local file.
pub trait AudioLocalizer {
    fn localize(&self, url: &str) -> Result<PathBuf, AudioError>;
}

impl<T: AudioLocalizer + ?Sized> AudioLocalizer for &T {
    fn localize(&self, url: &str) -> Result<PathBuf, AudioError> {
        (**self).localize(url)
    }
}

/// Downloads over HTTP and converts to mp3 with an external `ffmpeg`.
#[derive(Clone, Debug)]
pub struct CommandLocalizer {
    out_dir: PathBuf,
    ffmpeg: String,
}

impl CommandLocalizer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }

    pub fn with_ffmpeg(mut self, program: impl Into<String>) -> Self {
        self.ffmpeg = program.into();
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), AudioError> {
        info!("downloading {url}");
        let response = ureq::get(url).call().map_err(|e| AudioError::Download {
            url: url.to_string(),
            source: Box::new(e),
        })?;

        // Partial transfers never appear under the final name.
        let partial = dest.with_extension("download");
        let mut file = File::create(&partial).map_err(io_error(&partial))?;
        io::copy(&mut response.into_reader(), &mut file).map_err(io_error(&partial))?;
        fs::rename(&partial, dest).map_err(io_error(dest))?;
        Ok(())
    }

    fn transcode(&self, input: &Path, output: &Path) -> Result<(), AudioError> {
        debug!("{} -i {} {}", self.ffmpeg, input.display(), output.display());
        let status = Command::new(&self.ffmpeg)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .status()
            .map_err(io_error(Path::new(&self.ffmpeg)))?;
        if !status.success() {
            return Err(AudioError::Transcode {
                program: self.ffmpeg.clone(),
                path: input.to_path_buf(),
                status,
            });
        }
        Ok(())
    }
}

impl AudioLocalizer for CommandLocalizer {
    fn localize(&self, url: &str) -> Result<PathBuf, AudioError> {
        let name = url_to_file_name(url).ok_or_else(|| AudioError::NoFileName(url.to_string()))?;
        fs::create_dir_all(&self.out_dir).map_err(io_error(&self.out_dir))?;

        let fetched = self.out_dir.join(&name);
        let mp3 = fetched.with_extension("mp3");
        if mp3.exists() {
            debug!("{} already present", mp3.display());
            return Ok(mp3);
        }

        self.download(&absolute_url(url), &fetched)?;
        if fetched == mp3 {
            return Ok(mp3);
        }
        self.transcode(&fetched, &mp3)?;
        fs::remove_file(&fetched).map_err(io_error(&fetched))?;
        Ok(mp3)
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> AudioError + use<> {
    let path = path.to_path_buf();
    move |source| AudioError::Io { path, source }
}

/// Wiktionary hands out protocol-relative URLs.
fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

/// Percent-decoded last path segment of `url`.
///
/// ```rust
/// use lemmacard::audio::url_to_file_name;
///
/// let url = "//upload.wikimedia.org/wikipedia/commons/9/96/Ru-%D0%BF%D0%B8%D1%82%D1%8C.ogg";
/// assert_eq!(url_to_file_name(url).as_deref(), Some("Ru-пить.ogg"));
/// ```
pub fn url_to_file_name(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let segment = path.rsplit('/').next()?;
    let name = percent_decode_str(segment).decode_utf8_lossy().into_owned();
    (!name.is_empty() && name != "." && name != "..").then_some(name)
}

/// Localize the sense's pronunciation, if it has one. Failures are logged and
/// leave `local_file` unset. Returns whether a local file is attached.
pub fn attach_audio<L>(sense: &mut WordSense, localizer: &L) -> bool
where
    L: AudioLocalizer + ?Sized,
{
    if !sense.audio.has_source() {
        info!("no audio for {}", sense.headword);
        return false;
    }
    match localizer.localize(&sense.audio.source_url) {
        Ok(path) => {
            sense.audio.local_file = Some(path);
            true
        }
        Err(err) => {
            error!("audio for {} unavailable: {err}", sense.headword);
            false
        }
    }
}
