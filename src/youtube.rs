use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;

use crate::{Segment, TranscriptResult, UNKNOWN_LANGUAGE};

const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Timeout applied to the title lookups (oEmbed and page scrape)
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Characters that are not allowed in file names on common platforms
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const MAX_TITLE_CHARS: usize = 100;

pub fn watch_url(video_id: &str) -> String {
    format!("{YOUTUBE_BASE_URL}/watch?v={video_id}")
}

/// Segments of one caption track plus the language the track reports
#[derive(Debug, Clone)]
pub struct CaptionFetch {
    pub segments: Vec<Segment>,
    pub language_code: Option<String>,
}

/// Where a video title came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleLookup {
    OEmbed(String),
    Scraped(String),
    /// Every lookup failed; the title was built from the video ID
    Synthesized(String),
}

impl TitleLookup {
    pub fn title(&self) -> &str {
        match self {
            TitleLookup::OEmbed(t) | TitleLookup::Scraped(t) | TitleLookup::Synthesized(t) => t,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, TitleLookup::Synthesized(_))
    }
}

/// Caption and metadata service for videos.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Fetch one caption track. An empty `languages` list accepts any language.
    async fn fetch_captions(&self, video_id: &str, languages: &[&str]) -> Result<CaptionFetch>;

    /// Best-effort title lookup. Never fails.
    async fn lookup_title(&self, video_id: &str) -> TitleLookup;
}

/// Fetch a transcript, preferring English and falling back to any language.
pub async fn fetch_transcript(source: &dyn VideoSource, video_id: &str) -> Result<TranscriptResult> {
    match source.fetch_captions(video_id, &["en"]).await {
        Ok(fetch) if !fetch.segments.is_empty() => {
            return Ok(TranscriptResult {
                segments: fetch.segments,
                language_code: "en".to_string(),
                was_translated: false,
            });
        }
        Ok(_) => debug!("English caption track for {video_id} is empty"),
        Err(e) => debug!("No English captions for {video_id}: {e}"),
    }

    let fetch = source.fetch_captions(video_id, &[]).await?;
    if fetch.segments.is_empty() {
        bail!("caption track for {video_id} is empty");
    }

    let language_code = fetch
        .language_code
        .filter(|code| !code.is_empty())
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());
    debug!("Fallback caption track for {video_id}: lang={language_code}");

    Ok(TranscriptResult {
        segments: fetch.segments,
        language_code,
        was_translated: false,
    })
}

/// Strip characters illegal in file names and cap the length
pub fn sanitize_title(title: &str) -> String {
    title
        .replace(ILLEGAL_FILENAME_CHARS, "")
        .trim()
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect()
}

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
}

/// YouTube-backed `VideoSource` (watch page + InnerTube player endpoint)
#[derive(Debug, Clone)]
pub struct YouTube {
    client: reqwest::Client,
    base_url: String,
}

impl YouTube {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, YOUTUBE_BASE_URL)
    }

    /// Point page, player and oEmbed requests at another host
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_watch_page(&self, video_id: &str, timeout: Option<Duration>) -> Result<String> {
        let url = format!("{}/watch?v={video_id}", self.base_url);
        debug!("Fetching watch page: {url}");

        let mut request = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", "en-US,en;q=0.9");
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let html = request.send().await?.error_for_status()?.text().await?;
        Ok(html)
    }

    async fn list_caption_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        let page_html = self.fetch_watch_page(video_id, None).await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        let player_url = format!("{}/youtubei/v1/player?key={api_key}&prettyPrint=false", self.base_url);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": "en",
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id
        });

        let resp: InnerTubePlayerResponse = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default())
    }

    async fn oembed_title(&self, video_id: &str) -> Result<String> {
        let resp: OEmbedResponse = self
            .client
            .get(format!("{}/oembed", self.base_url))
            .query(&[("url", watch_url(video_id).as_str()), ("format", "json")])
            .timeout(METADATA_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let title = sanitize_title(resp.title.as_deref().unwrap_or_default());
        if title.is_empty() {
            bail!("oEmbed response has no title");
        }
        Ok(title)
    }

    async fn scraped_title(&self, video_id: &str) -> Result<String> {
        let html = self.fetch_watch_page(video_id, Some(METADATA_TIMEOUT)).await?;
        match extract_page_title(&html)? {
            Some(title) => Ok(title),
            None => bail!("no title found in watch page"),
        }
    }
}

#[async_trait]
impl VideoSource for YouTube {
    async fn fetch_captions(&self, video_id: &str, languages: &[&str]) -> Result<CaptionFetch> {
        let tracks = self.list_caption_tracks(video_id).await?;
        if tracks.is_empty() {
            bail!("no captions available for video {video_id}");
        }

        let Some(track) = select_track(&tracks, languages) else {
            bail!("no caption track in {languages:?} for video {video_id}");
        };
        debug!("Using caption track: lang={:?}", track.language_code);

        let caption_xml = self
            .client
            .get(&track.base_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(CaptionFetch {
            segments: parse_caption_xml(&caption_xml)?,
            language_code: track.language_code.clone(),
        })
    }

    async fn lookup_title(&self, video_id: &str) -> TitleLookup {
        match self.oembed_title(video_id).await {
            Ok(title) => return TitleLookup::OEmbed(title),
            Err(e) => debug!("oEmbed title lookup failed for {video_id}: {e}"),
        }

        match self.scraped_title(video_id).await {
            Ok(title) => return TitleLookup::Scraped(title),
            Err(e) => debug!("Title scrape failed for {video_id}: {e}"),
        }

        warn!("Could not resolve title for {video_id}, using video ID");
        TitleLookup::Synthesized(format!("video_{video_id}"))
    }
}

fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[&str]) -> Option<&'a CaptionTrack> {
    if languages.is_empty() {
        return tracks.first();
    }

    languages.iter().find_map(|lang| {
        tracks.iter().find(|t| {
            t.language_code
                .as_deref()
                .is_some_and(|code| code == *lang || code.starts_with(&format!("{lang}-")))
        })
    })
}

/// Scan a watch page for the title, trying the embedded shapes in order
fn extract_page_title(html: &str) -> Result<Option<String>> {
    let patterns = [
        Regex::new(r#""title":"([^"]+)""#)?,
        Regex::new(r"<title>([^<]+)</title>")?,
        Regex::new(r#"<meta name="title" content="([^"]+)""#)?,
    ];

    for re in &patterns {
        let Some(caps) = re.captures(html) else {
            continue;
        };

        let raw = caps[1].replace(" - YouTube", "");
        let raw = raw.trim();
        // JSON string escapes (é, \") in the embedded player data
        let decoded = serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string());
        let decoded = html_escape::decode_html_entities(&decoded);

        let title = sanitize_title(&decoded);
        if !title.is_empty() {
            return Ok(Some(title));
        }
    }

    Ok(None)
}

fn extract_api_key(html: &str) -> Result<String> {
    let re = Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#)?;
    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }

    // Fallback: try the newer pattern
    let re2 = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#)?;
    if let Some(caps) = re2.captures(html) {
        return Ok(caps[1].to_string());
    }

    bail!("could not extract InnerTube API key from watch page");
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut current_dur: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                current_start = None;
                current_dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => {
                            current_start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        b"dur" => {
                            current_dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(start) = current_start.take() {
                    let duration = current_dur.take().unwrap_or_default();
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).trim().to_string();
                    if !text.is_empty() {
                        segments.push(Segment { text, start, duration });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML: {e}"),
            _ => {}
        }
    }

    Ok(segments)
}
