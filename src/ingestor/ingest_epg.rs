use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::errors::{SourceError, SourceResult};
use crate::models::XmltvDocument;
use crate::utils::decompression::DecompressionService;
use crate::utils::xmltv_parser::parse_xmltv_document;

/// Where a guide document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuideLocation {
    Remote(Url),
    Local(PathBuf),
}

impl GuideLocation {
    /// `http(s)://` becomes a remote location, `file://` and anything that
    /// is not a URL are treated as local paths
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Self::Local(path),
                Err(()) => Self::Local(PathBuf::from(value)),
            },
            _ => Self::Local(PathBuf::from(value)),
        }
    }
}

impl fmt::Display for GuideLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

pub struct EpgIngestor {
    client: Client,
}

impl EpgIngestor {
    pub fn new(config: &FetchConfig) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SourceError::fetch("<client>", e.to_string()))?;
        Ok(Self { client })
    }

    /// Raw bytes of a guide, decompressed if needed
    pub async fn fetch_bytes(&self, location: &GuideLocation) -> SourceResult<Vec<u8>> {
        let raw = match location {
            GuideLocation::Remote(url) => self.fetch_remote(url).await?,
            GuideLocation::Local(path) => tokio::fs::read(path)
                .await
                .map_err(|e| SourceError::io(path.display().to_string(), e.to_string()))?,
        };
        debug!("Read {} bytes from {}", raw.len(), location);
        DecompressionService::decompress(raw)
    }

    async fn fetch_remote(&self, url: &Url) -> SourceResult<Vec<u8>> {
        info!("Fetching guide from {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SourceError::fetch(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::fetch(url.as_str(), e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Fetch and parse a required guide
    pub async fn load_document(
        &self,
        location: &GuideLocation,
        source_name: &str,
    ) -> SourceResult<XmltvDocument> {
        let bytes = self.fetch_bytes(location).await?;
        let document = parse_xmltv_document(&bytes, source_name)?;
        info!(
            "Loaded {} guide from {}: {} channels, {} programmes",
            source_name,
            location,
            document.channels.len(),
            document.programmes.len()
        );
        Ok(document)
    }

    /// Fetch and parse a guide whose absence is expected from time to time
    ///
    /// Any failure is logged and reported as `None`.
    pub async fn load_optional_document(
        &self,
        location: Option<&GuideLocation>,
        source_name: &str,
    ) -> Option<XmltvDocument> {
        let location = location?;
        match self.load_document(location, source_name).await {
            Ok(document) => Some(document),
            Err(e) => {
                warn!(
                    "Skipping {} guide from {}: {}",
                    source_name, location, e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ingestor() -> EpgIngestor {
        EpgIngestor::new(&FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_location_parsing() {
        assert!(matches!(
            GuideLocation::parse("http://m3u4u.com/xml/abc"),
            GuideLocation::Remote(_)
        ));
        assert!(matches!(
            GuideLocation::parse(" https://example.com/guide.xml.gz "),
            GuideLocation::Remote(_)
        ));
        assert_eq!(
            GuideLocation::parse("radioguide.xml"),
            GuideLocation::Local(PathBuf::from("radioguide.xml"))
        );
        assert_eq!(
            GuideLocation::parse("/srv/epg/radioguide.xml"),
            GuideLocation::Local(PathBuf::from("/srv/epg/radioguide.xml"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_file_url_is_local() {
        assert_eq!(
            GuideLocation::parse("file:///srv/epg/radio.xml"),
            GuideLocation::Local(PathBuf::from("/srv/epg/radio.xml"))
        );
    }

    #[tokio::test]
    async fn test_load_local_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "  \n<tv><channel id=\"radio1\"><display-name>Radio 1</display-name></channel></tv>"
        )
        .unwrap();

        let location = GuideLocation::Local(file.path().to_path_buf());
        let document = ingestor().load_document(&location, "template").await.unwrap();
        assert_eq!(document.channels.len(), 1);
        assert_eq!(document.channels[0].id, "radio1");
    }

    #[tokio::test]
    async fn test_missing_required_file_is_an_error() {
        let location = GuideLocation::Local(PathBuf::from("/nonexistent/radioguide.xml"));
        let result = ingestor().load_document(&location, "template").await;
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }

    #[tokio::test]
    async fn test_missing_optional_file_is_skipped() {
        let location = GuideLocation::Local(PathBuf::from("/nonexistent/supplementary.xml"));
        let ingestor = ingestor();
        assert!(ingestor
            .load_optional_document(Some(&location), "supplementary")
            .await
            .is_none());
        assert!(ingestor
            .load_optional_document(None, "supplementary")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_malformed_optional_file_is_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<tv><channel>").unwrap();
        let location = GuideLocation::Local(file.path().to_path_buf());
        assert!(ingestor()
            .load_optional_document(Some(&location), "supplementary")
            .await
            .is_none());
    }
}
