//! Unified error handling for cart synchronisation.
//!
//! Every failure a cart operation can hit falls into one of the categories of
//! [`FailureKind`]. None of them are fatal and none are retried: the caller
//! logs the error, shows [`CartError::user_message`] as a transient notice,
//! and leaves the display as it was.

use cruzy_core::{LineKeyError, SnapshotError};
use thiserror::Error;

/// Cart operation error.
#[derive(Debug, Error)]
pub enum CartError {
    /// The request never produced a response (connection refused, reset, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The server accepted the request but refused the mutation.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The server sent a snapshot that breaks a cart invariant.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(#[from] SnapshotError),

    /// The server sent a line key that cannot be used.
    #[error("Invalid line key: {0}")]
    InvalidLineKey(#[from] LineKeyError),

    /// A mutation was asked for a quantity the cart cannot hold.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// An expected display region is absent.
    #[error("Missing display region: {0}")]
    MissingRegion(String),

    /// The mini-cart panel template failed to render.
    #[error("Render error: {0}")]
    Render(#[from] askama::Error),
}

/// Failure categories for cart operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request failed in transit or the reply was unreadable.
    Network,
    /// The server reported a failure or sent unusable data.
    Application,
    /// An expected display region is absent.
    MissingRegion,
    /// The panel could not be rendered.
    Render,
}

impl CartError {
    /// Category of this failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Http(_) | Self::Parse(_) => FailureKind::Network,
            Self::Status { .. }
            | Self::Rejected(_)
            | Self::InvalidSnapshot(_)
            | Self::InvalidLineKey(_)
            | Self::InvalidQuantity(_)
            | Self::Url(_) => FailureKind::Application,
            Self::MissingRegion(_) => FailureKind::MissingRegion,
            Self::Render(_) => FailureKind::Render,
        }
    }

    /// Message to show the shopper.
    ///
    /// Server-provided rejection messages are passed through; everything else
    /// is replaced by a generic message so internal details stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) => message.clone(),
            Self::InvalidQuantity(_) => "Please choose a quantity of at least 1.".to_string(),
            Self::MissingRegion(_) => "The cart could not be displayed.".to_string(),
            _ => match self.kind() {
                FailureKind::Network => {
                    "Error updating your cart. Please try again.".to_string()
                }
                _ => "Something went wrong with your cart.".to_string(),
            },
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::Rejected("Product not found".to_string());
        assert_eq!(err.to_string(), "Rejected: Product not found");

        let err = CartError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Server returned 500: boom");
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(
            CartError::Rejected("no".to_string()).kind(),
            FailureKind::Application
        );
        assert_eq!(
            CartError::MissingRegion("mini-cart-count".to_string()).kind(),
            FailureKind::MissingRegion
        );
        assert_eq!(CartError::InvalidQuantity(0).kind(), FailureKind::Application);

        let parse = serde_json::from_str::<u32>("nope").map_err(CartError::from);
        assert!(matches!(parse.map_err(|e| e.kind()), Err(FailureKind::Network)));
    }

    #[test]
    fn test_user_message_passes_through_rejections() {
        let err = CartError::Rejected("Out of stock".to_string());
        assert_eq!(err.user_message(), "Out of stock");
    }

    #[test]
    fn test_user_message_hides_internal_details() {
        let err = CartError::Status {
            status: 500,
            message: "Traceback (most recent call last)".to_string(),
        };
        assert!(!err.user_message().contains("Traceback"));

        let err = CartError::InvalidSnapshot(SnapshotError::TotalMismatch {
            expected: rust_decimal::Decimal::ONE,
            actual: rust_decimal::Decimal::TWO,
        });
        assert_eq!(err.user_message(), "Something went wrong with your cart.");
    }

    #[test]
    fn test_not_found_on_a_read_is_generic() {
        let err = CartError::Status {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.user_message(), "Something went wrong with your cart.");
    }
}
