use crate::backend_interface::status::VideoInfo;

/// Retries allowed on each rung before stepping down.
const RETRY_LIMIT: u8 = 2;

/// One playback source, in fallback order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackSource {
    /// Adaptive (HLS) stream.
    Adaptive(String),
    /// Direct progressive stream.
    Progressive(String),
    /// Playback abandoned; present the URL as a download link.
    DownloadOnly(String),
}

impl PlaybackSource {
    pub fn url(&self) -> &str {
        match self {
            PlaybackSource::Adaptive(url)
            | PlaybackSource::Progressive(url)
            | PlaybackSource::DownloadOnly(url) => url,
        }
    }
}

/// Bounded fallback ladder for video playback errors.
///
/// adaptive stream -> progressive stream -> download link. Each rung gets
/// a capped number of retries; the ladder never loops and the download
/// rung absorbs all further errors.
#[derive(Debug, Clone)]
pub struct SourceLadder {
    current: PlaybackSource,
    progressive_url: String,
    retries_left: u8,
}

impl SourceLadder {
    pub fn from_video_info(info: &VideoInfo) -> Self {
        let current = match &info.hls_url {
            Some(hls) => PlaybackSource::Adaptive(hls.clone()),
            None => PlaybackSource::Progressive(info.stream_url.clone()),
        };
        Self {
            current,
            progressive_url: info.stream_url.clone(),
            retries_left: RETRY_LIMIT,
        }
    }

    pub fn current(&self) -> &PlaybackSource {
        &self.current
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.current, PlaybackSource::DownloadOnly(_))
    }

    /// Records a playback error; retries the current rung, then steps down.
    pub fn on_error(&mut self) -> &PlaybackSource {
        if self.retries_left > 0 {
            self.retries_left -= 1;
            return &self.current;
        }
        self.current = match &self.current {
            PlaybackSource::Adaptive(_) => {
                PlaybackSource::Progressive(self.progressive_url.clone())
            }
            PlaybackSource::Progressive(url) | PlaybackSource::DownloadOnly(url) => {
                PlaybackSource::DownloadOnly(url.clone())
            }
        };
        self.retries_left = RETRY_LIMIT;
        &self.current
    }
}
