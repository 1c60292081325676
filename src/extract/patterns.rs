//! Candidate matching for each value kind.
//!
//! The regexes find candidates; the surrounding characters decide whether a
//! candidate stands on its own (the `regex` crate has no look-around).

use std::sync::OnceLock;

use regex::{Match, Regex};

static EMAIL: OnceLock<Regex> = OnceLock::new();
static PHONE: OnceLock<Regex> = OnceLock::new();
static IPV4: OnceLock<Regex> = OnceLock::new();
static IPV6: OnceLock<Regex> = OnceLock::new();

fn email() -> &'static Regex {
    EMAIL.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+\-]+@(?:[A-Za-z0-9\-]+\.)+[A-Za-z]{2,}")
            .expect("valid email regex")
    })
}

fn phone() -> &'static Regex {
    // North American first so "+1 555 ..." never takes the open-ended international form
    PHONE.get_or_init(|| {
        Regex::new(concat!(
            r"(?:\+?1[ \-]?)?(?:\(\d{3}\)[ \-]?|\d{3}[ \-]?)\d{3}[ \-]?\d{4}",
            r"|\+\d{1,3}[ \-]?(?:\(\d{1,4}\)[ \-]?)?\d{1,4}(?:[ \-]?\d{2,4}){1,4}",
            r"|\d{7,15}",
            r"|\d{3}[ \-]\d{4}",
        ))
        .expect("valid phone regex")
    })
}

fn ipv4() -> &'static Regex {
    IPV4.get_or_init(|| Regex::new(r"\d{1,3}(?:\.\d{1,3}){3}").expect("valid ipv4 regex"))
}

fn ipv6() -> &'static Regex {
    IPV6.get_or_init(|| {
        Regex::new(r"[0-9A-Fa-f]{0,4}(?::[0-9A-Fa-f]{0,4}){2,7}").expect("valid ipv6 regex")
    })
}

fn before(row: &str, start: usize) -> Option<char> {
    row[..start].chars().next_back()
}

fn after(row: &str, end: usize) -> (Option<char>, Option<char>) {
    let mut rest = row[end..].chars();
    (rest.next(), rest.next())
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Matches of `re` accepted by `standalone`.
///
/// A rejected match is retried one character further on, so a valid value inside a
/// rejected span (`1 555-111-2222` after `10.0.0.`) is still found.
fn accepted<'r>(
    re: &Regex,
    row: &'r str,
    standalone: impl Fn(&Match<'r>) -> bool,
) -> Vec<&'r str> {
    let mut found = Vec::new();
    let mut at = 0;
    while let Some(m) = re.find_at(row, at) {
        if standalone(&m) && !m.is_empty() {
            found.push(m.as_str());
            at = m.end();
        } else {
            at = m.start() + row[m.start()..].chars().next().map_or(1, char::len_utf8);
        }
        if at > row.len() {
            break;
        }
    }
    found
}

/// Email candidates; leading dots picked up from surrounding punctuation are dropped
pub(super) fn emails(row: &str) -> Vec<&str> {
    email()
        .find_iter(row)
        .map(|m| m.as_str().trim_start_matches('.'))
        .filter(|candidate| !candidate.starts_with('@'))
        .collect()
}

/// Phone-shaped candidates that are not part of a word, an address or a version string
pub(super) fn phones(row: &str) -> Vec<&str> {
    accepted(phone(), row, |m| {
        let prev_ok = match before(row, m.start()) {
            Some(c) => !(is_word(c) || c == '@' || c == '.' || c == '+' || c == '-'),
            None => true,
        };
        let next_ok = match after(row, m.end()) {
            (Some(c), _) if is_word(c) || c == '@' => false,
            (Some('.' | '-'), Some(n)) if is_word(n) => false,
            _ => true,
        };
        prev_ok && next_ok
    })
}

/// Dotted quads that are not embedded in a longer digit/dot run
pub(super) fn ipv4s(row: &str) -> Vec<&str> {
    accepted(ipv4(), row, |m| {
        let prev_ok = match before(row, m.start()) {
            Some(c) => !(c.is_alphanumeric() || c == '.'),
            None => true,
        };
        let next_ok = match after(row, m.end()) {
            (Some(c), _) if c.is_alphanumeric() => false,
            (Some('.'), Some(n)) if n.is_ascii_digit() => false,
            _ => true,
        };
        prev_ok && next_ok
    })
}

/// Colon-hex candidates standing on their own; parsing decides the rest
pub(super) fn ipv6s(row: &str) -> Vec<&str> {
    accepted(ipv6(), row, |m| {
        let glued = |c: char| is_word(c) || c == ':' || c == '.';
        let prev_ok = before(row, m.start()).is_none_or(|c| !glued(c));
        let next_ok = after(row, m.end()).0.is_none_or(|c| !glued(c));
        prev_ok && next_ok && m.as_str().chars().any(|c| c.is_ascii_hexdigit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_candidates() {
        assert_eq!(emails("mail j@x.com, or Info.Desk@Mail.Example.org."), vec![
            "j@x.com",
            "Info.Desk@Mail.Example.org"
        ]);
        assert!(emails("not an email: a@b").is_empty());
    }

    #[test]
    fn test_phone_formats() {
        assert_eq!(phones("Call (555) 123-4567 now"), vec!["(555) 123-4567"]);
        assert_eq!(phones("+1 (555) 123-4567"), vec!["+1 (555) 123-4567"]);
        assert_eq!(phones("John\t555-111-2222\tj@x.com"), vec!["555-111-2222"]);
    }

    #[test]
    fn test_phone_rejects_embedded_digits() {
        assert!(phones("build v1.2.3456789").is_empty());
        assert!(phones("SKU A5551234567").is_empty());
        assert!(phones("5551234567@x.com").is_empty());
        assert!(phones("192.168.1.1").iter().all(|c| c.len() < 7));
    }

    #[test]
    fn test_phone_does_not_absorb_neighbouring_numbers() {
        assert_eq!(phones("Call 555-123-4567 24 hours"), vec!["555-123-4567"]);
        assert_eq!(phones("555-111-2222 555-333-4444"), vec![
            "555-111-2222",
            "555-333-4444"
        ]);
        assert!(phones("Scores 10 20 30 40").is_empty());
        assert!(phones("555-111-2222-3333").is_empty());
    }

    #[test]
    fn test_phone_found_after_rejected_span() {
        assert_eq!(phones("10.0.0.1 555-111-2222"), vec!["555-111-2222"]);
    }

    #[test]
    fn test_phone_international_and_local_forms() {
        assert_eq!(phones("London +44 20 7946 0958"), vec!["+44 20 7946 0958"]);
        assert_eq!(phones("desk 555-1234"), vec!["555-1234"]);
        assert_eq!(phones("cell 5551112222"), vec!["5551112222"]);
        assert_eq!(phones("toll free 1-800-555-0199"), vec!["1-800-555-0199"]);
    }

    #[test]
    fn test_phone_rejects_dates() {
        assert!(phones("on 2024-01-15 and 15-01-2024").is_empty());
    }

    #[test]
    fn test_tabs_do_not_join_cells() {
        let found = phones("1\t2\t3\t4\t5\t6\t7\t8");
        assert!(found.is_empty());
    }

    #[test]
    fn test_ipv4_candidates() {
        assert_eq!(ipv4s("host 192.168.1.1 up"), vec!["192.168.1.1"]);
        assert_eq!(ipv4s("ip:10.0.0.1."), vec!["10.0.0.1"]);
        assert!(ipv4s("version 1.2.3.4.5").is_empty());
        assert!(ipv4s("ts 1234.5.6.7").is_empty());
        assert!(ipv4s("v1.2.3.4").is_empty());
    }

    #[test]
    fn test_ipv6_candidates() {
        assert_eq!(ipv6s("gw fe80::1 ok"), vec!["fe80::1"]);
        assert!(ipv6s("use std::fs;").is_empty());
        assert!(ipv6s("a :: b").is_empty());
    }
}
