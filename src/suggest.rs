//! The pluggable suggestion engine (spec.md §1 "a pluggable suggestion
//! collaborator", §7 "did you mean"). Grounded in the teacher's
//! `display::levenshtein_distance` / `display::find_similar` /
//! `display::print_did_you_mean`, consolidated here as a single
//! `suggest` entry point and generalized from a fixed `max_distance: 2`
//! into the threshold spec.md §7 names (closest candidate within an edit
//! distance proportional to the input's length).
//!
//! Used both for unknown long-flag suggestions and unknown-command
//! suggestions (spec.md §4.2 rule 3d, §4.3 step 8).

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let len_a = a.chars().count();
    let len_b = b.chars().count();

    if len_a == 0 {
        return len_b;
    }
    if len_b == 0 {
        return len_a;
    }

    let mut matrix = vec![vec![0usize; len_b + 1]; len_a + 1];
    for i in 0..=len_a {
        matrix[i][0] = i;
    }
    for j in 0..=len_b {
        matrix[0][j] = j;
    }

    for (i, ca) in a.chars().enumerate() {
        for (j, cb) in b.chars().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            matrix[i + 1][j + 1] = (matrix[i][j + 1] + 1)
                .min(matrix[i + 1][j] + 1)
                .min(matrix[i][j] + cost);
        }
    }

    matrix[len_a][len_b]
}

/// Edit-distance threshold scaled to the input's length: short tokens
/// tolerate one typo, longer ones up to a third of their length.
fn threshold_for(input: &str) -> usize {
    (input.chars().count() / 3).max(1)
}

/// Returns every candidate within the scaled edit-distance threshold of
/// `input`, closest first.
pub fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Vec<&'a str> {
    let threshold = threshold_for(input);
    let mut scored: Vec<(usize, &str)> = candidates
        .iter()
        .map(|c| (levenshtein_distance(input, c), *c))
        .filter(|(d, _)| *d <= threshold)
        .collect();
    scored.sort_by_key(|(d, _)| *d);
    scored.into_iter().map(|(_, c)| c).collect()
}

/// Renders a "did you mean" clause for `input` against `candidates`, or an
/// empty string if nothing is close enough (spec.md §9 defensive fallback:
/// suggestion failures never block error reporting).
pub fn suggest(input: &str, candidates: &[&str]) -> String {
    let matches = find_similar(input, candidates);
    match matches.first() {
        Some(best) => format!("(Did you mean {best}?)"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_has_zero_distance() {
        assert_eq!(levenshtein_distance("serve", "serve"), 0);
    }

    #[test]
    fn finds_close_typo() {
        let candidates = ["serve", "build", "test"];
        let out = find_similar("serv", &candidates);
        assert_eq!(out.first(), Some(&"serve"));
    }

    #[test]
    fn no_match_beyond_threshold() {
        let candidates = ["serve", "build"];
        assert!(find_similar("xyz", &candidates).is_empty());
    }

    #[test]
    fn suggest_renders_did_you_mean_clause() {
        let candidates = ["serve", "build"];
        assert_eq!(suggest("serv", &candidates), "(Did you mean serve?)");
        assert_eq!(suggest("zzzzzzzzzzz", &candidates), "");
    }
}
