//! Metadata validation.
//!
//! Royalty bounds are enforced by [`RoyaltyPercentage`](crate::RoyaltyPercentage)
//! itself; this module checks the remaining size limits.

use serde::{Deserialize, Serialize};

use crate::content::ContentMetadata;
use crate::error::ValidationError;

/// Maximum byte lengths for text metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataLimits {
    pub max_title_len: usize,
    pub max_description_len: usize,
    pub max_content_hash_len: usize,
}

impl Default for MetadataLimits {
    fn default() -> Self {
        Self {
            max_title_len: 256,
            max_description_len: 1024,
            max_content_hash_len: 128,
        }
    }
}

/// Validate metadata against `limits`.
///
/// Checks, in order:
/// 1. Title length
/// 2. Description length
/// 3. Content hash length
pub fn validate_metadata(
    metadata: &ContentMetadata,
    limits: &MetadataLimits,
) -> Result<(), ValidationError> {
    check_len("title", &metadata.title, limits.max_title_len)?;
    check_len("description", &metadata.description, limits.max_description_len)?;
    check_len("content_hash", &metadata.content_hash, limits.max_content_hash_len)?;
    Ok(())
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.len() > max {
        return Err(ValidationError::FieldTooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}
