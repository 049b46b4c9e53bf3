//! BI-SIM string similarity (Kondrak & Dorr 2004).
//!
//! A longest-common-subsequence over bigrams: a match at (i, j) counts one
//! point per identical character of the bigrams ending there. Both words get
//! a distinguishing prefix (their upper-cased first letter) so the initial
//! characters weigh more. The result is normalized to [0, 1].

pub fn bi_sim(a: &str, b: &str) -> f64 {
    let x = padded(a);
    let y = padded(b);
    let (m, n) = (x.len() - 1, y.len() - 1);
    if m == 0 || n == 0 {
        return 0.0;
    }

    // one row of the DP table at a time
    let mut prev = vec![0.0f64; n + 1];
    let mut cur = vec![0.0f64; n + 1];
    for i in 1..=m {
        cur[0] = 0.0;
        for j in 1..=n {
            let bigram = id(x[i - 1], y[j - 1]) + id(x[i], y[j]);
            cur[j] = prev[j].max(cur[j - 1]).max(prev[j - 1] + bigram);
        }
        core::mem::swap(&mut prev, &mut cur);
    }
    prev[n] / (2 * m.max(n)) as f64
}

#[inline]
fn id(x: char, y: char) -> f64 {
    if x == y { 1.0 } else { 0.0 }
}

fn padded(word: &str) -> Vec<char> {
    let lower: Vec<char> = word.chars().flat_map(char::to_lowercase).collect();
    let mut out = Vec::with_capacity(lower.len() + 1);
    match lower.first() {
        Some(&c) => out.push(c.to_uppercase().next().unwrap_or(c)),
        None => out.push('\0'),
    }
    out.extend(lower);
    out
}
