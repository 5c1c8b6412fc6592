//! Campaign slug normalization.

/// Normalize a display name into a campaign slug.
///
/// Lowercases ASCII, collapses every run of characters outside `[a-z0-9]`
/// into a single `-`, and trims leading/trailing dashes.
///
/// ```text
/// "PUBG: Battlegrounds" -> "pubg-battlegrounds"
/// "  Escape From Tarkov " -> "escape-from-tarkov"
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_lowercase() || lower.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(lower);
        } else {
            pending_dash = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_spaces_collapse() {
        assert_eq!(slugify("PUBG: Battlegrounds"), "pubg-battlegrounds");
        assert_eq!(slugify("Escape From Tarkov"), "escape-from-tarkov");
    }

    #[test]
    fn edges_trimmed() {
        assert_eq!(slugify("  --Rust--  "), "rust");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn already_slug_is_stable() {
        assert_eq!(slugify("albion-online"), "albion-online");
    }

    #[test]
    fn non_ascii_treated_as_separator() {
        assert_eq!(slugify("Pokémon Unite"), "pok-mon-unite");
    }
}
