//! Bounded edit distance for typo-tolerant suggestions.

/// Levenshtein distance between `a` and `b`, or `None` once it is known to
/// exceed `max`.
///
/// Works on chars, so accented names count one edit per letter. Stops early
/// when the length gap alone or an entire DP row is already over the bound.
pub fn bounded_levenshtein(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > max {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        return Some(a.len().max(b.len()));
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= max).then_some(distance)
}

/// Allowed edits for a query: 1 for short queries (≤ 4 chars), else 2.
pub fn threshold_for(query: &str) -> usize {
    if query.chars().count() <= 4 { 1 } else { 2 }
}
