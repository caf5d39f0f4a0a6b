use crate::config::Config;
use crate::converter::Converter;
use crate::formats::FormatCategory;
use crate::session::SessionRegistry;
use crate::workflow::{Notice, RenderedEntry};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub converter: Converter,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let converter = Converter::from_config(&config.converter);
        Self::with_converter(config, converter)
    }

    pub fn with_converter(config: Config, converter: Converter) -> Self {
        Self {
            config,
            converter,
            sessions: SessionRegistry::new(),
        }
    }
}

// API Request/Response types

#[derive(Debug, serde::Serialize)]
pub struct NoticeView {
    #[serde(flatten)]
    pub notice: Notice,
    pub message: String,
    pub is_error: bool,
}

impl From<Notice> for NoticeView {
    fn from(notice: Notice) -> Self {
        Self {
            message: notice.message(),
            is_error: notice.is_error(),
            notice,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ConvertResponse {
    pub notices: Vec<NoticeView>,
    pub conversions: Vec<RenderedEntry>,
}

#[derive(Debug, serde::Serialize)]
pub struct ConversionsResponse {
    pub conversions: Vec<RenderedEntry>,
}

#[derive(Debug, serde::Serialize)]
pub struct FormatsResponse {
    pub categories: &'static [FormatCategory],
    pub extensions: Vec<&'static str>,
}

#[derive(Debug, serde::Serialize)]
pub struct SessionEndResponse {
    pub ended: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub backend: String,
    pub sessions: usize,
}
