use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    path::Path,
    sync::Arc,
    time::Duration,
};
use validator::ValidateUrl;

use crate::{
    config::Config,
    constants::quiz_prompt::PromptInput,
    errors::{AppError, AppResult},
    models::dto::request::{ImageAttachment, QuizSource},
};

static DATA_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^data:(image/[A-Za-z0-9.+\-]+);base64,(.+)$").expect("valid data URL regex")
});

const URL_FAILURE: &str = "Could not read the URL. Please make sure the link is public.";

/// Study material ready to be put into a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedContent {
    Text(String),
    Image(ImageAttachment),
}

impl ExtractedContent {
    pub fn prompt_input(&self) -> PromptInput<'_> {
        match self {
            ExtractedContent::Text(text) => PromptInput::Text(text),
            ExtractedContent::Image(_) => PromptInput::Image,
        }
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        match self {
            ExtractedContent::Image(image) => Some(image),
            ExtractedContent::Text(_) => None,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, source: &QuizSource) -> AppResult<ExtractedContent>;
}

/// Turns PDF bytes into plain text. No implementation ships with the crate.
pub trait PdfTextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> AppResult<String>;
}

pub struct DefaultContentExtractor {
    http: reqwest::Client,
    fetch_base_url: String,
    pdf: Option<Arc<dyn PdfTextExtractor>>,
}

impl DefaultContentExtractor {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| AppError::ExtractionFailed(format!("HTTP client unavailable: {}", e)))?;

        Ok(Self {
            http,
            fetch_base_url: config.content_fetch_base_url.clone(),
            pdf: None,
        })
    }

    pub fn with_pdf_extractor(mut self, pdf: Arc<dyn PdfTextExtractor>) -> Self {
        self.pdf = Some(pdf);
        self
    }

    async fn read_file(&self, path: &Path) -> AppResult<String> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::ExtractionFailed(format!("Could not open {}: {}", path.display(), e))
        })?;

        if has_extension(path, &["pdf"]) {
            let pdf = self.pdf.as_ref().ok_or_else(|| {
                AppError::ExtractionFailed("PDF files are not supported in this build.".to_string())
            })?;
            return pdf.extract_text(&bytes);
        }

        String::from_utf8(bytes).map_err(|_| {
            AppError::ExtractionFailed(format!("{} is not a readable text file.", path.display()))
        })
    }

    async fn fetch_url(&self, url: &str) -> AppResult<String> {
        let url = url.to_string();
        if !url.validate_url() {
            return Err(AppError::ValidationError(format!("'{}' is not a valid URL", url)));
        }

        let target = format!("{}{}", self.fetch_base_url, url);
        log::info!("Fetching study material from {}", url);

        let response = self.http.get(&target).send().await.map_err(|e| {
            log::warn!("Content fetch failed: {}", e);
            AppError::ExtractionFailed(URL_FAILURE.to_string())
        })?;

        if !response.status().is_success() {
            log::warn!("Content fetch returned {}", response.status());
            return Err(AppError::ExtractionFailed(URL_FAILURE.to_string()));
        }

        response
            .text()
            .await
            .map_err(|_| AppError::ExtractionFailed(URL_FAILURE.to_string()))
    }
}

#[async_trait]
impl ContentExtractor for DefaultContentExtractor {
    async fn extract(&self, source: &QuizSource) -> AppResult<ExtractedContent> {
        let text = match source {
            QuizSource::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(AppError::ValidationError(
                        "Please enter some text to generate a quiz.".to_string(),
                    ));
                }
                return Ok(ExtractedContent::Text(text.to_string()));
            }
            QuizSource::File(path) => self.read_file(path).await?,
            QuizSource::Url(url) => self.fetch_url(url.trim()).await?,
            QuizSource::ImageFile(path) => {
                return image_from_file(path).await.map(ExtractedContent::Image);
            }
            QuizSource::ImageDataUrl(data_url) => {
                return image_from_data_url(data_url).map(ExtractedContent::Image);
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::ExtractionFailed(
                "No text could be extracted from the source.".to_string(),
            ));
        }
        Ok(ExtractedContent::Text(text.to_string()))
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

pub fn image_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

async fn image_from_file(path: &Path) -> AppResult<ImageAttachment> {
    let mime_type = image_mime_type(path).ok_or_else(|| {
        AppError::ExtractionFailed(format!("{} is not a supported image type.", path.display()))
    })?;
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AppError::ExtractionFailed(format!("Could not open {}: {}", path.display(), e))
    })?;

    Ok(ImageAttachment {
        mime_type: mime_type.to_string(),
        base64_data: STANDARD.encode(bytes),
    })
}

pub fn image_from_data_url(data_url: &str) -> AppResult<ImageAttachment> {
    let captures = DATA_URL.captures(data_url.trim()).ok_or_else(|| {
        AppError::ExtractionFailed("The image data is not a base64 image data URL.".to_string())
    })?;

    let base64_data = captures[2].trim().to_string();
    STANDARD
        .decode(&base64_data)
        .map_err(|_| AppError::ExtractionFailed("The image data is not valid base64.".to_string()))?;

    Ok(ImageAttachment {
        mime_type: captures[1].to_string(),
        base64_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::http_stub::{closed_port_url, serve_once};
    use std::io::Write;

    struct UpperCasePdf;

    impl PdfTextExtractor for UpperCasePdf {
        fn extract_text(&self, bytes: &[u8]) -> AppResult<String> {
            Ok(String::from_utf8_lossy(bytes).to_uppercase())
        }
    }

    fn extractor() -> DefaultContentExtractor {
        DefaultContentExtractor::new(&Config::test_config()).unwrap()
    }

    fn extractor_fetching_from(base_url: &str) -> DefaultContentExtractor {
        let mut config = Config::test_config();
        config.content_fetch_base_url = format!("{}/", base_url);
        DefaultContentExtractor::new(&config).unwrap()
    }

    fn temp_file(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[tokio::test]
    async fn pasted_text_is_trimmed() {
        let content = extractor()
            .extract(&QuizSource::Text("  Mitochondria make ATP.\n".into()))
            .await
            .unwrap();
        assert_eq!(content, ExtractedContent::Text("Mitochondria make ATP.".into()));
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let err = extractor()
            .extract(&QuizSource::Text(" \n\t ".into()))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn text_files_are_read() {
        let file = temp_file(".md", b"# Rome\nFounded in 753 BC.");
        let content = extractor()
            .extract(&QuizSource::File(file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(content, ExtractedContent::Text("# Rome\nFounded in 753 BC.".into()));
    }

    #[tokio::test]
    async fn binary_files_fail_extraction() {
        let file = temp_file(".bin", &[0xff, 0xfe, 0x00, 0x81]);
        let err = extractor()
            .extract(&QuizSource::File(file.path().to_path_buf()))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "EXTRACTION_FAILED");
    }

    #[tokio::test]
    async fn pdf_needs_an_extractor() {
        let file = temp_file(".pdf", b"atoms");
        let source = QuizSource::File(file.path().to_path_buf());

        let err = extractor().extract(&source).await.unwrap_err();
        assert_eq!(err.error_code(), "EXTRACTION_FAILED");

        let content = extractor()
            .with_pdf_extractor(Arc::new(UpperCasePdf))
            .extract(&source)
            .await
            .unwrap();
        assert_eq!(content, ExtractedContent::Text("ATOMS".into()));
    }

    #[tokio::test]
    async fn image_files_are_base64_encoded() {
        let file = temp_file(".PNG", b"hello");
        let content = extractor()
            .extract(&QuizSource::ImageFile(file.path().to_path_buf()))
            .await
            .unwrap();

        let image = content.image().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.base64_data, "aGVsbG8=");
        assert!(matches!(content.prompt_input(), PromptInput::Image));
    }

    #[tokio::test]
    async fn unsupported_image_type_fails() {
        let file = temp_file(".bmp", b"hello");
        let err = extractor()
            .extract(&QuizSource::ImageFile(file.path().to_path_buf()))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "EXTRACTION_FAILED");
    }

    #[test]
    fn data_urls_are_split() {
        let image = image_from_data_url("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.base64_data, "aGVsbG8=");

        assert!(image_from_data_url("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(image_from_data_url("data:image/png;base64,***").is_err());
    }

    #[tokio::test]
    async fn url_content_comes_from_fetch_service() {
        let (base, captured) = serve_once(200, "Title: Tides\n\nThe moon pulls the sea.").await;
        let content = extractor_fetching_from(&base)
            .extract(&QuizSource::Url("https://example.com/tides".into()))
            .await
            .unwrap();

        assert_eq!(
            content,
            ExtractedContent::Text("Title: Tides\n\nThe moon pulls the sea.".into())
        );
        assert!(captured
            .await
            .unwrap()
            .starts_with("GET /https://example.com/tides"));
    }

    #[tokio::test]
    async fn url_failures_use_friendly_message() {
        let (base, _) = serve_once(451, "blocked").await;
        let err = extractor_fetching_from(&base)
            .extract(&QuizSource::Url("https://example.com/private".into()))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), URL_FAILURE);

        let base = closed_port_url().await;
        let err = extractor_fetching_from(&base)
            .extract(&QuizSource::Url("https://example.com".into()))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "EXTRACTION_FAILED");
    }

    #[tokio::test]
    async fn invalid_urls_are_rejected_before_fetching() {
        let err = extractor()
            .extract(&QuizSource::Url("not a url".into()))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
