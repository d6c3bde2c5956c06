//! Priority-based vocabulary merging
//!
//! Layers an overlay vocabulary (a special occasion, a persona add-on) on top
//! of a base one. The result is a new vocabulary; neither input changes.

use tracing::{debug, info};

use crate::types::{Intent, Vocabulary};

/// Merge `overlay` into `base` at `priority`.
///
/// Per overlay intent:
/// - absent from base: appended, tagged with `priority`
/// - base priority lower: replaced wholesale by the overlay version
/// - equal priority: patterns and responses unioned, exact duplicates dropped
/// - base priority higher: overlay ignored
///
/// Applying the same overlay twice at the same priority changes nothing.
pub fn merge(base: &Vocabulary, overlay: &Vocabulary, priority: i64) -> Vocabulary {
    let mut intents: Vec<Intent> = base.intents().to_vec();
    let (mut added, mut replaced, mut unioned, mut skipped) = (0, 0, 0, 0);

    for incoming in overlay.intents() {
        match intents.iter_mut().find(|i| i.name == incoming.name) {
            None => {
                intents.push(Intent {
                    priority,
                    ..incoming.clone()
                });
                added += 1;
            }
            Some(existing) if existing.priority < priority => {
                *existing = Intent {
                    priority,
                    ..incoming.clone()
                };
                replaced += 1;
            }
            Some(existing) if existing.priority == priority => {
                union_into(&mut existing.patterns, &incoming.patterns);
                union_into(&mut existing.responses, &incoming.responses);
                unioned += 1;
            }
            Some(existing) => {
                debug!(
                    intent = %existing.name,
                    existing = existing.priority,
                    priority,
                    "overlay intent outranked, skipped"
                );
                skipped += 1;
            }
        }
    }

    info!(added, replaced, unioned, skipped, priority, "merged overlay vocabulary");
    // Inputs are validated and every branch keeps patterns and responses
    // non-empty, so the invariants still hold.
    Vocabulary::from_validated(intents)
}

/// Does the overlay redefine the fallback set?
pub fn overrides_default(overlay: &Vocabulary) -> bool {
    overlay.default_responses().is_some()
}

fn union_into(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
