use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Couldn't parse the config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Couldn't decode the API response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The wiki API returned an error. Code: {code}, info: {info}")]
    Api { code: String, info: String },
    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),
    #[error("The wiki rejected the edit to {title}. Result: {result}")]
    EditRejected { title: String, result: String },

    #[error("The page action failed on {title}: {source}")]
    PageAction {
        title: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps an error raised by a `PageAction` with the title it was working on.
    pub fn page_action(title: impl Into<String>, source: Error) -> Self {
        Error::PageAction {
            title: title.into(),
            source: Box::new(source),
        }
    }
}
