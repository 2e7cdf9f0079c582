/// Turns a snake_case author key into a display label:
/// `machado_de_assis` becomes `Machado De Assis`.
///
/// Empty segments (leading, trailing or doubled underscores) are kept as empty
/// words rather than indexed into.
pub fn format_author_key(key: &str) -> String {
    key.to_lowercase().split('_').map(capitalize).collect::<Vec<_>>().join(" ")
}

/// Renders the valid author keys for a not-found reply, each followed by its
/// display label.
pub fn format_author_listing<'a, I>(keys: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let listing =
        keys.into_iter().map(|key| format!("{key} ({})", format_author_key(key))).collect::<Vec<_>>();

    if listing.is_empty() {
        "none".to_owned()
    } else {
        listing.join(", ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
