use std::sync::OnceLock;

use regex::Regex;

static BLOCK_END: OnceLock<Regex> = OnceLock::new();
static TAG: OnceLock<Regex> = OnceLock::new();
static ENTITY: OnceLock<Regex> = OnceLock::new();

fn block_end() -> &'static Regex {
    BLOCK_END.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</(?:p|div|tr|li|h[1-6])\s*>").expect("valid block regex")
    })
}

fn tag() -> &'static Regex {
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

fn entity() -> &'static Regex {
    ENTITY.get_or_init(|| Regex::new(r"&(?:[A-Za-z]+|#[0-9]+|#x[0-9A-Fa-f]+);").expect("valid entity regex"))
}

/// Flatten HTML into one row per block element, dropping markup and blank lines
pub(super) fn block_rows(html: &str) -> Vec<String> {
    let text = block_end().replace_all(html, "\n");
    let text = tag().replace_all(&text, " ");
    let text = entity().replace_all(&text, " ");

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}
