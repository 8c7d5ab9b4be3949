// ============================================================
// Layer 4 - Lemmatizer
// ============================================================
// Reduces noun plurals to their base form with a small set of
// suffix rules plus an irregular-form table. There is no lexicon
// behind it, so rules are conservative: short words, words ending
// in -ss / -us / -is, and a list of invariant words pass through.
//
// Every output is a fixed point: lemmatize(lemmatize(w)) == lemmatize(w).
//
// Rules (first match wins):
//   irregular table        children → child, feet → foot, ...
//   -sses → -ss            addresses → address
//   -ies  → -y  (len > 4)  replies → reply
//   -xes / -ches / -shes   fixes → fix, crashes → crash
//   -s    → ""             bugs → bug, updates → update

use std::collections::{HashMap, HashSet};

const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("lives", "life"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("indices", "index"),
    ("goes", "go"),
];

const INVARIANT: &[&str] = &[
    "news", "series", "species", "always", "perhaps", "sometimes", "besides",
    "towards", "afterwards", "anyways", "thanks", "yes", "thus", "plus", "less",
    "lens", "gas", "bus", "ios", "windows", "glitches",
];

/// Plurals where "-ies" must lose only the "s".
const IES_KEEP_E: &[&str] = &[
    "movies", "cookies", "pies", "ties", "lies", "dies", "selfies", "calories",
    "zombies", "freebies", "goodies", "rookies", "smoothies",
];

pub struct Lemmatizer {
    irregular:  HashMap<&'static str, &'static str>,
    invariant:  HashSet<&'static str>,
    ies_keep_e: HashSet<&'static str>,
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self {
            irregular:  IRREGULAR.iter().copied().collect(),
            invariant:  INVARIANT.iter().copied().collect(),
            ies_keep_e: IES_KEEP_E.iter().copied().collect(),
        }
    }

    pub fn lemmatize(&self, token: &str) -> String {
        if let Some(base) = self.irregular.get(token) {
            return (*base).to_string();
        }
        if self.invariant.contains(token)
            || token.chars().count() <= 3
            || !token.chars().all(|c| c.is_alphabetic())
            || !token.ends_with('s')
            || token.ends_with("ss")
            || token.ends_with("us")
            || token.ends_with("is")
        {
            return token.to_string();
        }

        if token.ends_with("sses") {
            return token[..token.len() - 2].to_string();
        }
        if token.ends_with("ies") && token.len() > 4 && !self.ies_keep_e.contains(token) {
            return format!("{}y", &token[..token.len() - 3]);
        }
        if token.ends_with("xes") || token.ends_with("ches") || token.ends_with("shes") {
            return token[..token.len() - 2].to_string();
        }
        token[..token.len() - 1].to_string()
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemmatize("bugs"), "bug");
        assert_eq!(l.lemmatize("updates"), "update");
        assert_eq!(l.lemmatize("crashes"), "crash");
        assert_eq!(l.lemmatize("replies"), "reply");
        assert_eq!(l.lemmatize("addresses"), "address");
        assert_eq!(l.lemmatize("movies"), "movie");
    }

    #[test]
    fn test_irregular_and_guarded_words() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemmatize("children"), "child");
        assert_eq!(l.lemmatize("status"), "status");
        assert_eq!(l.lemmatize("class"), "class");
        assert_eq!(l.lemmatize("analysis"), "analysis");
        assert_eq!(l.lemmatize("was"), "was");
        assert_eq!(l.lemmatize("news"), "news");
        assert_eq!(l.lemmatize("v2s"), "v2s");
    }

    #[test]
    fn test_outputs_are_fixed_points() {
        let l = Lemmatizer::new();
        for word in [
            "bugs", "crashes", "replies", "addresses", "boxes", "children",
            "features", "prices", "analyses", "leaves", "apps", "cookies", "fixes",
        ] {
            let once = l.lemmatize(word);
            assert_eq!(l.lemmatize(&once), once, "{word} → {once} is not stable");
        }
    }
}
