use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Site-Mirror
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub content: ContentConfig,
    pub discovery: DiscoveryConfig,
    pub output: OutputConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Base politeness delay between requests (seconds, randomized ×0.5–1.5)
    pub delay_secs: f64,

    /// Per-fetch timeout (seconds)
    pub timeout_secs: u64,

    /// Checkpoint every time the visited count crosses a multiple of this
    pub checkpoint_interval: usize,

    /// Honor robots.txt on live page fetches
    pub respect_robots: bool,

    /// Run the page fetcher without a visible window
    pub headless: bool,

    /// Preferred archive snapshot date (YYYYMMDD, prefix of a Wayback timestamp)
    pub archive_date: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            delay_secs: 1.0,
            timeout_secs: 60,
            checkpoint_interval: 10,
            respect_robots: false,
            headless: true,
            archive_date: None,
        }
    }
}

/// Which content classes to download
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ContentConfig {
    pub web: bool,

    /// Also save each page's readable text as a sidecar file
    pub text: bool,

    pub pdf: bool,
    pub docs: bool,
    pub media: bool,

    /// File extension of text sidecars
    pub text_extension: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            web: false,
            text: false,
            pdf: false,
            docs: false,
            media: false,
            text_extension: ".txt".to_string(),
        }
    }
}

/// Frontier seeding sources used on a fresh run
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Seed from the site's sitemaps
    pub sitemap: bool,

    /// Seed from the Wayback Machine's capture index
    pub wayback: bool,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory of the mirror
    pub output_dir: PathBuf,

    /// File receiving the final list of downloaded URLs
    pub output_list: PathBuf,

    /// Directory holding the resume state files
    pub state_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("mirror_site"),
            output_list: PathBuf::from("links.txt"),
            state_dir: PathBuf::from("."),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteMirror".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Command-line overrides applied on top of the file configuration
///
/// Boolean toggles only ever switch features on; `None` leaves the file value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub output_list: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub delay_secs: Option<f64>,
    pub archive_date: Option<String>,
    pub web: bool,
    pub text: bool,
    pub pdf: bool,
    pub docs: bool,
    pub media: bool,
    pub robots: bool,
    pub sitemap: bool,
    pub wayback: bool,
    pub visible: bool,
}

impl Config {
    /// Applies command-line overrides to this configuration
    pub fn apply_cli(&mut self, cli: CliOverrides) {
        if let Some(dir) = cli.output_dir {
            self.output.output_dir = dir;
        }
        if let Some(list) = cli.output_list {
            self.output.output_list = list;
        }
        if let Some(dir) = cli.state_dir {
            self.output.state_dir = dir;
        }
        if let Some(timeout) = cli.timeout_secs {
            self.crawler.timeout_secs = timeout;
        }
        if let Some(delay) = cli.delay_secs {
            self.crawler.delay_secs = delay;
        }
        if cli.archive_date.is_some() {
            self.crawler.archive_date = cli.archive_date;
        }

        self.content.web |= cli.web;
        self.content.text |= cli.text;
        self.content.pdf |= cli.pdf;
        self.content.docs |= cli.docs;
        self.content.media |= cli.media;
        self.crawler.respect_robots |= cli.robots;
        self.discovery.sitemap |= cli.sitemap;
        self.discovery.wayback |= cli.wayback;
        if cli.visible {
            self.crawler.headless = false;
        }
    }
}
