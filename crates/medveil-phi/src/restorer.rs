//! Token restoration.
//!
//! Substitutes `[CATEGORY_N]` placeholders back with their originals using
//! the token map from the matching redaction call. Substitution is a single
//! linear scan over bracketed candidates with exact whole-token lookup, so a
//! short token like `[NAME_1]` can never partially corrupt `[NAME_10]` — the
//! longest-token-first rule holds structurally rather than by sort order.
//!
//! Tokens absent from the map are left untouched. The reasoning backend may
//! drop, repeat, or invent bracketed text; none of that is an error here.

use crate::category::PhiCategory;
use crate::models::TokenMap;

/// Replace every token in `text` that the map knows about.
pub fn restore(text: &str, token_map: &TokenMap) -> String {
    substitute(text, token_map, None)
}

/// Like [`restore`], but only tokens whose category is in `allowed` are
/// substituted; everything else stays a literal placeholder.
///
/// An empty `allowed` list restores nothing and returns the input unchanged —
/// "no categories allowed" is an explicit policy, not "restore everything".
pub fn partial_restore(text: &str, token_map: &TokenMap, allowed: &[PhiCategory]) -> String {
    if allowed.is_empty() {
        return text.to_string();
    }
    substitute(text, token_map, Some(allowed))
}

/// The category embedded in a token: the text between `[` and the first `_`.
/// `None` if the string does not have that shape.
pub fn token_category(token: &str) -> Option<&str> {
    let inner = token.strip_prefix('[')?.strip_suffix(']')?;
    let (category, seq) = inner.split_once('_')?;
    if category.is_empty() || seq.is_empty() {
        return None;
    }
    Some(category)
}

fn substitute(text: &str, token_map: &TokenMap, allowed: Option<&[PhiCategory]>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        rest = &rest[open..];
        let Some(close) = rest.find(']') else {
            // Unterminated bracket; nothing past here can be a token.
            break;
        };
        let candidate = &rest[..=close];
        if let Some(original) = token_map.get(candidate) {
            let is_allowed = match allowed {
                Some(categories) => token_category(candidate)
                    .is_some_and(|cat| categories.iter().any(|c| c.as_str() == cat)),
                None => true,
            };
            if is_allowed {
                out.push_str(original);
            } else {
                out.push_str(candidate);
            }
            rest = &rest[close + 1..];
        } else {
            // Not a live token. Emit the bracket and rescan right after it,
            // so a token nested like "[[NAME_1]]" is still found.
            out.push('[');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}
