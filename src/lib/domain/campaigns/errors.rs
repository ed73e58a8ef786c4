//! Campaign errors

use thiserror::Error;

/// Reasons a send is refused before any message goes out
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Subject or body is blank
    #[error("Subject and message are required")]
    MissingContent,

    /// The effective recipient list is empty
    #[error("No recipients to send")]
    NoRecipients,
}

/// Errors returned when a send cannot begin
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    /// The request is invalid
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another send is still in progress
    #[error("a send is already in progress")]
    AlreadySending,
}
