//! Markdown link extraction and renumbering.

use citewright_core::fact::Reference;
use regex_lite::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)").expect("link pattern is valid")
});

/// Every `[label](http(s)://url)` link, deduplicated by URL.
///
/// The first label seen for a URL wins and order is first occurrence.
pub fn extract(text: &str) -> Vec<Reference> {
    let mut seen = HashMap::new();
    let mut refs = Vec::new();

    for caps in LINK.captures_iter(text) {
        let url = &caps[2];
        if seen.contains_key(url) {
            continue;
        }
        seen.insert(url.to_string(), refs.len());
        refs.push(Reference::new(&caps[1], url));
    }
    refs
}

/// Replace each link whose URL is in `refs` with `[n]`, n being the 1-based
/// position of the URL in `refs`. Other links are left as they are.
pub fn renumber(text: &str, refs: &[Reference]) -> String {
    if refs.is_empty() {
        return text.to_string();
    }

    let index: HashMap<&str, usize> = refs
        .iter()
        .enumerate()
        .map(|(i, r)| (r.url.as_str(), i + 1))
        .collect();

    LINK.replace_all(text, |caps: &Captures<'_>| match index.get(&caps[2]) {
        Some(n) => format!("[{n}]"),
        None => caps[0].to_string(),
    })
    .into_owned()
}
