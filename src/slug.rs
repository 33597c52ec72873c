use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_\-]+").expect("static regex"));
static HYPHEN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").expect("static regex"));
static PARENTHESISED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]*\)").expect("static regex"));

/// Deterministic URL slug for a keyword or location name.
///
/// Lowercases, trims, turns whitespace runs into single hyphens, drops
/// anything outside `[a-z0-9_-]`, collapses repeated hyphens and trims
/// hyphens from both ends. `slugify(slugify(x)) == slugify(x)`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let hyphenated = WHITESPACE_RUN.replace_all(lowered.trim(), "-");
    let stripped = NON_SLUG_CHARS.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUN.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

/// Slug for a place name; parenthesised qualifiers ("Durban (eThekwini)")
/// are dropped before slugifying.
pub fn location_slug(name: &str) -> String {
    slugify(&PARENTHESISED.replace_all(name, ""))
}

/// True when `candidate` is already in canonical slug form.
pub fn is_slug(candidate: &str) -> bool {
    !candidate.is_empty() && slugify(candidate) == candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic_phrases() {
        assert_eq!(slugify("Hair Salon Near Me"), "hair-salon-near-me");
        assert_eq!(slugify("  Knotless   Braids  "), "knotless-braids");
        assert_eq!(slugify("Men's Grooming & Beard Trim"), "mens-grooming-beard-trim");
        assert_eq!(slugify("nails -- gel / acrylic"), "nails-gel-acrylic");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        for text in ["Hair Salon Near Me", "Spa & Massage", "braids_2024", "a  -  b", "Café Crème"] {
            let once = slugify(text);
            assert_eq!(slugify(&once), once, "slug of {:?} not stable", text);
        }
    }

    #[test]
    fn test_location_slug_drops_qualifiers() {
        assert_eq!(location_slug("Durban (eThekwini)"), "durban");
        assert_eq!(location_slug("Port Elizabeth (Gqeberha) Central"), "port-elizabeth-central");
    }

    #[test]
    fn test_is_slug() {
        assert!(is_slug("hair-salon"));
        assert!(!is_slug("Hair-Salon"));
        assert!(!is_slug("sitemap.xml"));
        assert!(!is_slug(""));
    }
}
