use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Failures reported by a payment gateway adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("gateway unreachable: {0}")]
    Transport(String),
    #[error("gateway call timed out after {0:?}")]
    Timeout(Duration),
    #[error("gateway returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("gateway response could not be decoded: {0}")]
    Malformed(String),
    #[error("webhook signature rejected: {0}")]
    Signature(String),
}

impl GatewayError {
    /// Whether another attempt may succeed without the caller changing anything.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Upstream { status, .. } => *status >= 500 || *status == 429,
            Self::Malformed(_) | Self::Signature(_) => false,
        }
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    #[diagnostic(code(dinein::invalid_input))]
    InvalidInput(String),

    #[error("no table available for the requested slot")]
    #[diagnostic(code(dinein::no_table_available))]
    NoTableAvailable,

    #[error("invalid order status: {0}")]
    #[diagnostic(
        code(dinein::invalid_status),
        help("allowed: Awaiting Payment, Preparing, Ready, Delivered, Cancelled")
    )]
    InvalidStatus(String),

    #[error("invalid gateway order id: {0}")]
    #[diagnostic(code(dinein::invalid_order_format))]
    InvalidOrderFormat(String),

    #[error("{entity} {id} not found")]
    #[diagnostic(code(dinein::not_found))]
    NotFound { entity: &'static str, id: String },

    #[error("order {0} is already paid")]
    #[diagnostic(code(dinein::already_paid))]
    PaymentAlreadyConfirmed(String),

    #[error("payment session creation failed after {attempts} attempt(s)")]
    #[diagnostic(code(dinein::payment_creation_failed))]
    PaymentCreationFailed {
        attempts: u32,
        #[source]
        source: GatewayError,
    },

    #[error("payment verification failed after {attempts} attempt(s)")]
    #[diagnostic(code(dinein::payment_verification_failed))]
    PaymentVerificationFailed {
        attempts: u32,
        #[source]
        source: GatewayError,
    },

    #[error("webhook signature rejected")]
    #[diagnostic(code(dinein::invalid_signature))]
    InvalidSignature(#[source] GatewayError),

    #[error("store unavailable: {0}")]
    #[diagnostic(code(dinein::store_unavailable))]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("configuration error: {0}")]
    #[diagnostic(code(dinein::config))]
    Config(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(Box::new(std::io::Error::other(message.into())))
    }

    /// Stable, machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NoTableAvailable => "no_table_available",
            Self::InvalidStatus(_) => "invalid_status",
            Self::InvalidOrderFormat(_) => "invalid_order_format",
            Self::NotFound { .. } => "not_found",
            Self::PaymentAlreadyConfirmed(_) => "payment_already_confirmed",
            Self::PaymentCreationFailed { .. } => "payment_creation_failed",
            Self::PaymentVerificationFailed { .. } => "payment_verification_failed",
            Self::InvalidSignature(_) => "invalid_signature",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::StoreUnavailable(Box::new(err))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for ServiceError {
    fn from(err: rocksdb::Error) -> Self {
        Self::StoreUnavailable(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GatewayError::Transport("reset".into()).is_transient());
        assert!(GatewayError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(
            GatewayError::Upstream {
                status: 503,
                message: "busy".into()
            }
            .is_transient()
        );
        assert!(
            GatewayError::Upstream {
                status: 429,
                message: "slow down".into()
            }
            .is_transient()
        );
        assert!(
            !GatewayError::Upstream {
                status: 400,
                message: "bad amount".into()
            }
            .is_transient()
        );
        assert!(!GatewayError::Malformed("eof".into()).is_transient());
    }

    #[test]
    fn test_error_kind_names() {
        assert_eq!(ServiceError::NoTableAvailable.kind(), "no_table_available");
        assert_eq!(
            ServiceError::not_found("order", "ORDER_1_2").to_string(),
            "order ORDER_1_2 not found"
        );
    }
}
