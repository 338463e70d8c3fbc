//! Text rendering utilities for human-friendly error messages.
//!
//! Helpers to format resolution paths, label sets, candidate lists
//! and "did you mean?" hints in refwire error output.

/// Renders a resolution path as a readable string.
///
/// # Examples
/// ```
/// use refwire_support::rendering::render_chain;
///
/// let chain = vec!["QuxService", "BarService", "FooService"];
/// assert_eq!(render_chain(&chain), "QuxService → BarService → FooService");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Renders a set of labels the way they appear in error messages.
///
/// ```
/// use refwire_support::rendering::render_labels;
///
/// assert_eq!(render_labels(&["db", "primary"]), "{db, primary}");
/// assert_eq!(render_labels::<&str>(&[]), "{}");
/// ```
pub fn render_labels<S: AsRef<str>>(labels: &[S]) -> String {
    let inner = labels
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{inner}}}")
}

/// Renders one entry per line, each prefixed with `indent` and a dash.
///
/// Used for candidate and suggestion lists. An empty input renders as an
/// empty string so callers can append unconditionally.
pub fn render_list<S: AsRef<str>>(items: &[S], indent: usize) -> String {
    let pad = " ".repeat(indent);
    let mut result = String::new();
    for item in items {
        result.push('\n');
        result.push_str(&pad);
        result.push_str("- ");
        result.push_str(item.as_ref());
    }
    result
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use refwire_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("dyn my_app::traits::Logger + core::marker::Send");
/// assert_eq!(short, "dyn Logger + Send");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut short = String::with_capacity(full_name.len());
    let mut start = 0;
    for (idx, separator) in full_name.match_indices(TYPE_SEPARATORS) {
        short.push_str(last_segment(&full_name[start..idx]));
        short.push_str(separator);
        start = idx + separator.len();
    }
    short.push_str(last_segment(&full_name[start..]));
    short
}

/// Characters that end a path inside a type name.
const TYPE_SEPARATORS: &[char] = &['<', '>', ',', ' ', '+', '(', ')', '&', '[', ']', ';'];

/// `my_app::services::UserService` -> `UserService`
fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Suggests names from `available` that look like `requested`.
///
/// Matching is done on shortened, lower-cased names with any `dyn` prefix
/// and auto-trait bounds removed: substring matches score highest, then
/// shared prefixes of at least three characters.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_short = comparable_name(requested);

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| {
            let name_short = comparable_name(name);
            if name_short == requested_short {
                return None;
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 100));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common >= 3 {
                return Some((name, common * 10));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// `dyn app::Fooer + Send` -> `fooer`
fn comparable_name(name: &str) -> String {
    let short = shorten_type_name(name);
    let short = short.strip_prefix("dyn ").unwrap_or(&short);
    let head = short.split(" +").next().unwrap_or(short);
    head.trim().to_lowercase()
}
