//! Output identifier derivation

use crate::config::CollisionPolicy;
use crate::error::{PipeError, Result};
use indexmap::IndexMap;

/// Map a sheet name to an output identifier
///
/// When `enabled`, the name is lower-cased, spaces become `_` and every
/// character outside `[a-zA-Z0-9_]` is removed, so `"Q1 (final)!"` becomes
/// `"q1_final"`. When disabled the name is used verbatim. Either way the
/// identifier must not be empty.
pub fn sanitize(canonical_name: &str, enabled: bool) -> Result<String> {
    let identifier = if enabled {
        canonical_name
            .to_lowercase()
            .replace(' ', "_")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect()
    } else {
        canonical_name.to_string()
    };

    if identifier.is_empty() {
        return Err(PipeError::EmptyIdentifier(canonical_name.to_string()));
    }
    Ok(identifier)
}

/// Identifiers claimed so far in one run, in claim order
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    claimed: IndexMap<String, String>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `identifier` for `sheet`, applying the collision policy
    ///
    /// Returns the identifier to write under.
    pub fn claim(
        &mut self,
        sheet: &str,
        identifier: String,
        policy: CollisionPolicy,
    ) -> Result<String> {
        let Some(previous) = self.claimed.get(&identifier) else {
            self.claimed.insert(identifier.clone(), sheet.to_string());
            return Ok(identifier);
        };

        match policy {
            CollisionPolicy::Overwrite => Ok(identifier),
            CollisionPolicy::Fail => Err(PipeError::NameCollision {
                sheet: sheet.to_string(),
                previous: previous.clone(),
                identifier,
            }),
            CollisionPolicy::Suffix => {
                let mut n = 2;
                let mut candidate = format!("{}_{}", identifier, n);
                while self.claimed.contains_key(&candidate) {
                    n += 1;
                    candidate = format!("{}_{}", identifier, n);
                }
                self.claimed.insert(candidate.clone(), sheet.to_string());
                Ok(candidate)
            }
        }
    }
}
