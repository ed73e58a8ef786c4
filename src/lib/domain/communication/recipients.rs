//! Recipients module.

mod record;
mod source;

pub use record::RecipientRecord;
pub use source::{parse_recipients, preview, RecipientPreview, RecipientSourceError};
