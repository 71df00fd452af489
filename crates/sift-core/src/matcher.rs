//! Strict, regex and fuzzy matching with highlight extraction.
//!
//! All functions here are pure: (candidate, query, options) in, score and
//! matched character indices out. The worker calls them once per item per
//! filter pass.

use std::path::MAIN_SEPARATOR;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Matching strategy for a list session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    Fuzzy,
    Strict,
    Regex,
}

impl MatcherKind {
    pub fn label(&self) -> &'static str {
        match self {
            MatcherKind::Fuzzy => "FUZZY",
            MatcherKind::Strict => "STRICT",
            MatcherKind::Regex => "REGEX",
        }
    }

    /// Cycle fuzzy → strict → regex → fuzzy.
    pub fn next(&self) -> Self {
        match self {
            MatcherKind::Fuzzy => MatcherKind::Strict,
            MatcherKind::Strict => MatcherKind::Regex,
            MatcherKind::Regex => MatcherKind::Fuzzy,
        }
    }
}

/// Score plus matched character indices, recomputed every filter pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub score: f64,
    /// Ascending character indices into the candidate text.
    pub matches: Vec<usize>,
}

/// Split a query into terms on unescaped whitespace: `a\ b c` → `["a b", "c"]`.
pub fn parse_terms(input: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in input.chars() {
        if escaped {
            if ch != ' ' && ch != '\t' {
                current.push('\\');
            }
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == ' ' || ch == '\t' {
            if !current.is_empty() {
                terms.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }
    if escaped {
        current.push('\\');
    }
    if !current.is_empty() {
        terms.push(current);
    }
    terms
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Case-folding rule of the fuzzy matcher: a lowercase query character
/// matches both cases, an uppercase one only itself.
fn case_match(query: char, text: char) -> bool {
    if query == text {
        return true;
    }
    query.is_lowercase() && fold(text) == query
}

// ── fuzzy ──

/// Match `query` (a single term) against `text`.
///
/// For every query character after the first, the best of three
/// continuations is taken: the immediately following character, the next
/// character after a path-separator boundary, or the next fuzzy-matching
/// character anywhere. Exact case scores above folded case, and boundary
/// alignment above mid-string alignment.
pub fn fuzzy_match(text: &str, query: &str) -> Option<MatchResult> {
    if query.is_empty() {
        return Some(MatchResult {
            score: 1.0,
            matches: Vec::new(),
        });
    }
    let chars: Vec<char> = text.chars().collect();
    let codes: Vec<char> = query.chars().collect();
    let first = codes[0];

    let mut seed: Option<MatchResult> = None;
    if !chars.is_empty() && chars[0] == first {
        seed = Some(MatchResult {
            score: 1.0,
            matches: vec![0],
        });
    } else if !chars.is_empty() && case_match(first, chars[0]) {
        seed = Some(MatchResult {
            score: 0.75,
            matches: vec![0],
        });
    } else {
        // prefer a path boundary over an arbitrary fuzzy hit
        for i in 1..chars.len() {
            if chars[i - 1] == MAIN_SEPARATOR && case_match(first, chars[i]) {
                seed = Some(MatchResult {
                    score: 1.0,
                    matches: vec![i],
                });
                break;
            }
        }
        if seed.is_none() {
            for (i, &ch) in chars.iter().enumerate() {
                if case_match(first, ch) {
                    seed = Some(MatchResult {
                        score: 0.5,
                        matches: vec![i],
                    });
                    break;
                }
            }
        }
    }
    let seed = seed?;
    if codes.len() == 1 {
        return Some(seed);
    }
    let idx = seed.matches[0] + 1;
    next_result(&codes[1..], &chars, idx, &seed)
}

/// Best-first expansion over the three continuations, keeping the branch
/// with the higher cumulative score at each level.
fn next_result(codes: &[char], chars: &[char], idx: usize, curr: &MatchResult) -> Option<MatchResult> {
    let c = codes[0];
    let remain = &codes[1..];
    let mut best: Option<MatchResult> = None;

    let mut consider = |result: MatchResult, next_idx: usize, best: &mut Option<MatchResult>| {
        let finished = if remain.is_empty() {
            Some(result)
        } else {
            next_result(remain, chars, next_idx, &result)
        };
        if let Some(res) = finished {
            if best.as_ref().map_or(true, |b| res.score > b.score) {
                *best = Some(res);
            }
        }
    };

    if idx >= chars.len() {
        return None;
    }
    let followed = chars[idx];
    if followed == c {
        let mut matches = curr.matches.clone();
        matches.push(idx);
        consider(
            MatchResult {
                score: curr.score + 1.0,
                matches,
            },
            idx + 1,
            &mut best,
        );
    } else if case_match(c, followed) {
        let mut matches = curr.matches.clone();
        matches.push(idx);
        consider(
            MatchResult {
                score: curr.score + 0.5,
                matches,
            },
            idx + 1,
            &mut best,
        );
    }
    // next char after a path boundary
    for i in (idx + 1)..chars.len() {
        if chars[i - 1] == MAIN_SEPARATOR && case_match(c, chars[i]) {
            let add = if chars[i] == c { 1.0 } else { 0.5 };
            let mut matches = curr.matches.clone();
            matches.push(i);
            consider(
                MatchResult {
                    score: curr.score + add,
                    matches,
                },
                i + 1,
                &mut best,
            );
            break;
        }
    }
    // next fuzzy hit anywhere
    for i in (idx + 1)..chars.len() {
        if case_match(c, chars[i]) {
            let add = if chars[i] == c { 0.5 } else { 0.2 };
            let mut matches = curr.matches.clone();
            matches.push(i);
            consider(
                MatchResult {
                    score: curr.score + add,
                    matches,
                },
                i + 1,
                &mut best,
            );
            break;
        }
    }
    best
}

/// Multi-term fuzzy match: every term must match; scores sum, indices merge.
pub fn fuzzy_match_terms(text: &str, terms: &[String]) -> Option<MatchResult> {
    let mut score = 0.0;
    let mut matches: Vec<usize> = Vec::new();
    for term in terms {
        let res = fuzzy_match(text, term)?;
        score += res.score;
        matches.extend(res.matches);
    }
    matches.sort_unstable();
    matches.dedup();
    Some(MatchResult { score, matches })
}

// ── strict ──

/// Every term must occur as a literal substring, each searched after the
/// previous term's end. Returns matched character indices.
pub fn strict_match(text: &str, terms: &[String], ignore_case: bool) -> Option<MatchResult> {
    let chars: Vec<char> = text.chars().collect();
    let folded: Vec<char> = if ignore_case {
        chars.iter().map(|&c| fold(c)).collect()
    } else {
        chars.clone()
    };
    let mut matches = Vec::new();
    let mut from = 0usize;
    for term in terms {
        let needle: Vec<char> = if ignore_case {
            term.chars().map(fold).collect()
        } else {
            term.chars().collect()
        };
        if needle.is_empty() {
            continue;
        }
        let idx = find_sub(&folded[from..], &needle)? + from;
        matches.extend(idx..idx + needle.len());
        from = idx + needle.len();
    }
    Some(MatchResult {
        score: 0.0,
        matches,
    })
}

fn find_sub(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

// ── regex ──

/// Compile terms, silently skipping invalid patterns.
pub fn compile_terms(terms: &[String], ignore_case: bool) -> Vec<Regex> {
    terms
        .iter()
        .filter_map(|t| {
            RegexBuilder::new(t)
                .case_insensitive(ignore_case)
                .build()
                .ok()
        })
        .collect()
}

/// Every compiled pattern must match, each searched after the previous
/// match's end. Invalid patterns were dropped at compile time and do not
/// fail the candidate, so an all-invalid query matches everything.
pub fn regex_match(text: &str, regexes: &[Regex]) -> Option<MatchResult> {
    if regexes.is_empty() {
        return Some(MatchResult {
            score: 0.0,
            matches: Vec::new(),
        });
    }
    // map byte offsets back to char indices for the match result
    let byte_to_char: std::collections::HashMap<usize, usize> = text
        .char_indices()
        .enumerate()
        .map(|(ci, (bi, _))| (bi, ci))
        .collect();
    let mut matches = Vec::new();
    let mut from = 0usize;
    for re in regexes {
        let m = re.find(&text[from..])?;
        let (start, end) = (from + m.start(), from + m.end());
        let cs = *byte_to_char.get(&start)?;
        let ce = cs + text[start..end].chars().count();
        matches.extend(cs..ce);
        from = end;
    }
    Some(MatchResult {
        score: 0.0,
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_terms ──

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(parse_terms("a b"), vec!["a", "b"]);
        assert_eq!(parse_terms("  a   b "), vec!["a", "b"]);
    }

    #[test]
    fn escaped_space_stays_in_term() {
        assert_eq!(parse_terms("a\\ b"), vec!["a b"]);
        assert_eq!(parse_terms("a\\ b c"), vec!["a b", "c"]);
    }

    #[test]
    fn backslash_before_non_space_is_kept() {
        assert_eq!(parse_terms("a\\d"), vec!["a\\d"]);
    }

    // ── fuzzy ──

    #[test]
    fn fuzzy_matches_leading_char() {
        let res = fuzzy_match("ade", "a").unwrap();
        assert_eq!(res.matches, vec![0]);
        assert_eq!(res.score, 1.0);
    }

    #[test]
    fn fuzzy_leading_beats_mid_string() {
        let lead = fuzzy_match("ade", "a").unwrap();
        let mid = fuzzy_match("bca", "a").unwrap();
        assert!(lead.score > mid.score);
    }

    #[test]
    fn fuzzy_sequential_chars() {
        let res = fuzzy_match("abcdef", "ace").unwrap();
        assert_eq!(res.matches, vec![0, 2, 4]);
    }

    #[test]
    fn fuzzy_no_match_returns_none() {
        assert!(fuzzy_match("abc", "x").is_none());
        assert!(fuzzy_match("abc", "cb").is_none());
    }

    #[test]
    fn fuzzy_exact_case_scores_higher() {
        let exact = fuzzy_match("Abc", "A").unwrap();
        let folded = fuzzy_match("Abc", "a").unwrap();
        assert!(exact.score > folded.score);
    }

    #[test]
    fn uppercase_query_requires_exact_case() {
        assert!(fuzzy_match("abc", "A").is_none());
    }

    #[test]
    fn path_boundary_scores_above_fuzzy_hit() {
        let sep = MAIN_SEPARATOR;
        let boundary = fuzzy_match(&format!("x{sep}abc"), "a").unwrap();
        let plain = fuzzy_match("xzabc", "a").unwrap();
        assert!(boundary.score > plain.score);
    }

    #[test]
    fn fuzzy_empty_query_scores_one() {
        let res = fuzzy_match("anything", "").unwrap();
        assert_eq!(res.score, 1.0);
        assert!(res.matches.is_empty());
    }

    #[test]
    fn fuzzy_terms_sum_scores() {
        let terms = vec!["ab".to_string(), "ef".to_string()];
        let combined = fuzzy_match_terms("abcdef", &terms).unwrap();
        let a = fuzzy_match("abcdef", "ab").unwrap();
        let b = fuzzy_match("abcdef", "ef").unwrap();
        assert!((combined.score - (a.score + b.score)).abs() < 1e-9);
        assert_eq!(combined.matches, vec![0, 1, 4, 5]);
    }

    #[test]
    fn fuzzy_terms_all_required() {
        let terms = vec!["ab".to_string(), "zz".to_string()];
        assert!(fuzzy_match_terms("abcdef", &terms).is_none());
    }

    #[test]
    fn fuzzy_is_deterministic() {
        let a = fuzzy_match("src/list/worker.rs", "slw").unwrap();
        let b = fuzzy_match("src/list/worker.rs", "slw").unwrap();
        assert_eq!(a, b);
    }

    // ── strict ──

    #[test]
    fn strict_case_insensitive() {
        let res = strict_match("Abc", &["a".to_string()], true).unwrap();
        assert_eq!(res.matches, vec![0]);
    }

    #[test]
    fn strict_case_sensitive() {
        let res = strict_match("Abc", &["A".to_string()], false).unwrap();
        assert_eq!(res.matches, vec![0]);
        assert!(strict_match("Abc", &["a".to_string()], false).is_none());
    }

    #[test]
    fn strict_terms_are_sequential() {
        let res = strict_match("foobar", &["foo".into(), "bar".into()], false).unwrap();
        assert_eq!(res.matches, vec![0, 1, 2, 3, 4, 5]);
        // second term must come after the first
        assert!(strict_match("barfoo", &["foo".into(), "bar".into()], false).is_none());
    }

    // ── regex ──

    #[test]
    fn regex_basic_match() {
        let regexes = compile_terms(&["b.".to_string()], false);
        let res = regex_match("abc", &regexes).unwrap();
        assert_eq!(res.matches, vec![1, 2]);
    }

    #[test]
    fn invalid_pattern_skipped() {
        let regexes = compile_terms(&["[".to_string(), "b".to_string()], false);
        assert_eq!(regexes.len(), 1);
        let res = regex_match("abc", &regexes).unwrap();
        assert_eq!(res.matches, vec![1]);
    }

    #[test]
    fn regex_ignore_case() {
        let regexes = compile_terms(&["ABC".to_string()], true);
        assert!(regex_match("xabc", &regexes).is_some());
    }

    #[test]
    fn all_invalid_patterns_match_everything() {
        let regexes = compile_terms(&["[".to_string()], false);
        let res = regex_match("abc", &regexes).unwrap();
        assert!(res.matches.is_empty());
    }
}
