//! Player name helpers
//!
//! Display names carry Quake 3 colour escapes (`^1`, `^7`, ...). Every name
//! comparison in the admin layer goes through [`clean_name`] first, and all
//! comparisons are ASCII case-insensitive.

/// Character that introduces a colour code
pub const COLOR_ESCAPE: char = '^';

/// Longest name the engine keeps in userinfo
pub const MAX_NAME_LENGTH: usize = 31;

/// Strip colour codes and non-printable characters from a display name.
///
/// A `^` followed by an alphanumeric character is a colour code and both
/// characters are dropped. Anything outside printable ASCII is dropped too.
pub fn clean_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        if c == COLOR_ESCAPE && chars.peek().is_some_and(|next| next.is_ascii_alphanumeric()) {
            chars.next();
            continue;
        }
        if (' '..='~').contains(&c) {
            out.push(c);
        }
    }

    out
}

/// ASCII case-insensitive equality
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// ASCII case-insensitive substring test
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Characters the server console reads as a command separator or a quote
const CONSOLE_SPECIAL: [char; 4] = [';', '"', '\n', '\r'];

/// True when `value` can be placed in a console line without splitting it
pub fn is_console_safe(value: &str) -> bool {
    !value.contains(CONSOLE_SPECIAL)
}

/// Drop every console separator and quote from `text`
pub fn console_safe(text: &str) -> String {
    text.chars().filter(|c| !CONSOLE_SPECIAL.contains(c)).collect()
}

/// Make a client-supplied name safe to keep.
///
/// Drops spaces, console separators and control or high characters,
/// replaces `/` with `*`, truncates to [`MAX_NAME_LENGTH`] and falls back to
/// `placeholder` when nothing is left.
pub fn sanitize_name(name: &str, placeholder: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| *c > ' ' && *c < '\u{7f}' && !CONSOLE_SPECIAL.contains(c))
        .map(|c| if c == '/' { '*' } else { c })
        .take(MAX_NAME_LENGTH)
        .collect();

    if cleaned.is_empty() {
        placeholder.to_string()
    } else {
        cleaned
    }
}

/// Drop the `:port` suffix from an address as reported by the engine.
///
/// Bracketed IPv6 (`[::1]:27960`) loses its brackets too. A bare IPv6
/// address has more than one colon and is returned unchanged.
pub fn strip_port(address: &str) -> &str {
    if let Some(rest) = address.strip_prefix('[') {
        return rest.split_once(']').map_or(rest, |(host, _)| host);
    }
    match address.rsplit_once(':') {
        Some((host, _)) if !host.contains(':') => host,
        _ => address,
    }
}
