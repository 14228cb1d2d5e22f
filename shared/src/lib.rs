// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("price not found for item: {0}")]
    PriceNotFound(String),
    #[error("price source unavailable: {0}")]
    Unavailable(String),
    #[error("failed while getting price for '{item}': {source}")]
    Fetch {
        item: String,
        #[source]
        source: Box<Error>,
    },
    #[error("batch worker for '{0}' stopped without reporting")]
    WorkerLost(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wrap an upstream failure with the item it was raised for
    pub fn fetch(item: impl Into<String>, source: Error) -> Self {
        Error::Fetch {
            item: item.into(),
            source: Box::new(source),
        }
    }

    /// Item identifier carried by the error, if any
    pub fn item(&self) -> Option<&str> {
        match self {
            Error::PriceNotFound(item) | Error::WorkerLost(item) => Some(item),
            Error::Fetch { item, .. } => Some(item),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Price as reported by a price source
pub type Price = f64;

pub mod config;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn fetch_error_names_item_and_cause() {
        let err = Error::fetch("apple", Error::Unavailable("timeout".into()));
        assert_eq!(
            err.to_string(),
            "failed while getting price for 'apple': price source unavailable: timeout"
        );
        assert_eq!(err.item(), Some("apple"));
        assert_eq!(
            err.source().map(|s| s.to_string()).as_deref(),
            Some("price source unavailable: timeout")
        );
    }
}
