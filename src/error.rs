use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read template {path:?}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse template JSON: {0}")]
    TemplateJson(#[from] serde_json::Error),
    #[error("Failed to parse template YAML: {0}")]
    TemplateYaml(#[from] serde_yaml::Error),
    #[error("Template bytes are not valid UTF-8: {0}")]
    TemplateEncoding(#[from] std::str::Utf8Error),
    #[error("{action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
