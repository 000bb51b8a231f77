//! Operator construction per masking strategy

use crate::types::MaskingMode;
use hmac::{Hmac, Mac};
use piiscrub_pii::{DetectedEntity, Operator, OperatorSet, TextIndex};
use sha2::{Digest, Sha256};
use std::fmt::Write;

type HmacSha256 = Hmac<Sha256>;

/// Fixed length of a redaction, independent of span length
pub const REDACTION_LENGTH: usize = 6;

/// Hex characters kept from a digest
pub const HASH_DISPLAY_LENGTH: usize = 8;

/// Builds the rewrite rules for one request
#[derive(Clone, Default)]
pub struct OperatorBuilder {
    hash_key: Option<Vec<u8>>,
}

impl OperatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use HMAC-SHA256 keyed with `key` for hash mode
    pub fn with_hash_key(key: impl AsRef<[u8]>) -> Self {
        Self {
            hash_key: Some(key.as_ref().to_vec()),
        }
    }

    /// Build operators for `entities` found in `text`.
    ///
    /// `text` must be the same text the offsets refer to.
    pub fn build(
        &self,
        mode: MaskingMode,
        masking_char: char,
        text: &str,
        entities: &[DetectedEntity],
    ) -> OperatorSet {
        let mut operators = OperatorSet::new();

        match mode {
            MaskingMode::Replace => {
                for entity in entities {
                    operators
                        .insert_for_type(entity.entity_type, Operator::placeholder(entity.entity_type));
                }
            }
            MaskingMode::Redact => {
                for entity in entities {
                    operators.insert_for_type(
                        entity.entity_type,
                        Operator::RepeatedChar {
                            ch: masking_char,
                            count: REDACTION_LENGTH,
                        },
                    );
                }
            }
            MaskingMode::Hash => {
                let index = TextIndex::new(text);
                for entity in entities {
                    // Spans outside the text are left to the anonymizer to reject
                    if let Some(covered) = index.slice(entity.start, entity.end) {
                        operators.insert_for_span(
                            entity.span(),
                            Operator::Hash {
                                digest: self.digest(covered),
                            },
                        );
                    }
                }
            }
        }

        operators
    }

    /// Truncated hex digest of `value`
    pub fn digest(&self, value: &str) -> String {
        let bytes: Vec<u8> = match &self.hash_key {
            Some(key) => {
                let mut mac =
                    HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
                mac.update(value.as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
            None => Sha256::digest(value.as_bytes()).to_vec(),
        };

        let mut hex = String::with_capacity(HASH_DISPLAY_LENGTH);
        for byte in bytes.iter().take(HASH_DISPLAY_LENGTH.div_ceil(2)) {
            let _ = write!(hex, "{:02x}", byte);
        }
        hex.truncate(HASH_DISPLAY_LENGTH);
        hex
    }
}
