use thiserror::Error;

/// Errors raised while obtaining or validating price data
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Market data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Invalid price series: {0}")]
    InvalidSeries(String),

    #[error("Not enough bars: need {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },
}

/// Errors raised by the broker execution gateway
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Broker authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Order rejected by broker (code {code}): {message}")]
    OrderRejected { code: i64, message: String },

    #[error("Broker transport error: {0}")]
    Transport(String),
}

impl BrokerError {
    /// Whether the live loop must stop instead of waiting for the next cycle
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrokerError::AuthenticationFailed(_))
    }
}

/// Any error surfaced by one evaluation cycle
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Broker(e) => e.is_fatal(),
            Error::Config(_) => true,
            Error::Data(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_authentication_is_fatal() {
        assert!(BrokerError::AuthenticationFailed("bad password".into()).is_fatal());
        assert!(!BrokerError::OrderRejected {
            code: 10019,
            message: "no money".into()
        }
        .is_fatal());
        assert!(!Error::from(DataError::InvalidSeries("dup".into())).is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = DataError::DataUnavailable {
            symbol: "AAPL".into(),
            reason: "404".into(),
        };
        assert_eq!(err.to_string(), "Market data unavailable for AAPL: 404");
    }
}
