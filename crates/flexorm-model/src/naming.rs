//! Naming-convention parsing for convention-named operations.
//!
//! Operation names are camel-joined words: a leading action followed by the
//! attribute name, optionally with a `Formatted` modifier.
//!
//! - `get<Attr>` -- read the attribute
//! - `the<Attr>` -- read the attribute and write it to an output sink
//! - `set<Attr>` -- write the attribute
//! - `get<Attr>Formatted` / `getFormatted<Attr>` -- read and format as a timestamp
//! - `the<Attr>Formatted` / `theFormatted<Attr>` -- output the formatted value
//!
//! Words are split on camel-case boundaries. A run of capitals is one word
//! unless its last capital starts a capitalized word (`URLPath` is `URL`,
//! `Path`). Characters outside `[A-Za-z0-9]` separate words and are dropped.

use crate::error::{ModelError, ModelResult};

/// The leading action of a convention-named operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Return the value.
    Get,
    /// Write the value to an output sink.
    The,
    /// Assign the value.
    Set,
}

impl Action {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "get" => Some(Action::Get),
            "the" => Some(Action::The),
            "set" => Some(Action::Set),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Get => "get",
            Action::The => "the",
            Action::Set => "set",
        }
    }
}

/// A parsed convention-named operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    pub action: Action,
    pub formatted: bool,
    /// Attribute name in camel form, e.g. `postTitle`.
    pub attribute: String,
}

/// Split a camel-joined name into words.
pub fn tokenize(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let len = chars.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        if let Some(end) = match_capital_run(&chars, i) {
            tokens.push(chars[i..end].iter().collect());
            i = end;
        } else if let Some(end) = match_word(&chars, i) {
            tokens.push(chars[i..end].iter().collect());
            i = end;
        } else {
            i += 1;
        }
    }

    tokens
}

/// A capital followed by capitals/digits, ending at the end of input or
/// right before a capitalized word. Backtracks to the longest run that
/// satisfies the boundary.
fn match_capital_run(chars: &[char], start: usize) -> Option<usize> {
    if !chars[start].is_ascii_uppercase() {
        return None;
    }
    let mut max_end = start + 1;
    while max_end < chars.len()
        && (chars[max_end].is_ascii_uppercase() || chars[max_end].is_ascii_digit())
    {
        max_end += 1;
    }
    (start + 1..=max_end).rev().find(|&end| {
        end == chars.len()
            || (chars[end].is_ascii_uppercase()
                && chars
                    .get(end + 1)
                    .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
    })
}

/// A letter followed by at least one lowercase letter or digit.
fn match_word(chars: &[char], start: usize) -> Option<usize> {
    if !chars[start].is_ascii_alphabetic() {
        return None;
    }
    let mut end = start + 1;
    while end < chars.len() && (chars[end].is_ascii_lowercase() || chars[end].is_ascii_digit()) {
        end += 1;
    }
    (end > start + 1).then_some(end)
}

/// Lower-case, underscore-joined spelling of a camel-joined name.
///
/// `imageUrl` becomes `image_url`; `postTitle` becomes `post_title`.
pub fn underscored(name: &str) -> String {
    tokenize(name).join("_").to_lowercase()
}

/// Camel form of a word list: words joined with no separator and the first
/// letter lower-cased.
fn camel_join(tokens: &[String]) -> String {
    lcfirst(&tokens.concat())
}

/// Camel form of an underscore-joined name. `post_title` becomes `postTitle`.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, part) in name.split('_').filter(|p| !p.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(&part.to_lowercase());
        } else {
            out.push_str(&ucfirst(&part.to_lowercase()));
        }
    }
    out
}

fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse a convention-named operation into action, formatted flag, and
/// attribute name.
///
/// # Examples
///
/// ```
/// use flexorm_model::naming::{parse_operation, Action};
///
/// let op = parse_operation("getPostTitle").unwrap();
/// assert_eq!(op.action, Action::Get);
/// assert!(!op.formatted);
/// assert_eq!(op.attribute, "postTitle");
///
/// let op = parse_operation("theImageUrlFormatted").unwrap();
/// assert_eq!(op.action, Action::The);
/// assert!(op.formatted);
/// assert_eq!(op.attribute, "imageUrl");
/// ```
pub fn parse_operation(name: &str) -> ModelResult<Operation> {
    let tokens = tokenize(name);
    let unrecognized = || ModelError::UnrecognizedOperation(name.to_string());

    let action = tokens
        .first()
        .and_then(|t| Action::from_token(t))
        .ok_or_else(unrecognized)?;

    let is_modifier = |t: &String| t.eq_ignore_ascii_case("formatted");
    let rest = &tokens[1..];
    let (formatted, words) = match rest {
        [first, words @ ..] if is_modifier(first) && !words.is_empty() => (true, words),
        [words @ .., last] if is_modifier(last) && !words.is_empty() => (true, words),
        words => (false, words),
    };

    if words.is_empty() {
        return Err(unrecognized());
    }

    Ok(Operation {
        action,
        formatted,
        attribute: camel_join(words),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_camel_words() {
        assert_eq!(tokenize("getPostTitle"), vec!["get", "Post", "Title"]);
        assert_eq!(tokenize("imageUrl"), vec!["image", "Url"]);
    }

    #[test]
    fn tokenize_capital_runs() {
        assert_eq!(tokenize("getURLPath"), vec!["get", "URL", "Path"]);
        assert_eq!(tokenize("getID"), vec!["get", "ID"]);
        assert_eq!(tokenize("getXCoord"), vec!["get", "X", "Coord"]);
        assert_eq!(tokenize("A1B"), vec!["A1B"]);
    }

    #[test]
    fn tokenize_drops_separators_and_single_lowercase_letters() {
        assert_eq!(tokenize("post_author"), vec!["post", "author"]);
        assert_eq!(tokenize("a_b"), Vec::<&str>::new());
        assert_eq!(tokenize("image2x"), vec!["image2x"]);
    }

    #[test]
    fn underscored_forms() {
        assert_eq!(underscored("imageUrl"), "image_url");
        assert_eq!(underscored("postTitle"), "post_title");
        assert_eq!(underscored("eventType"), "event_type");
        assert_eq!(underscored("ID"), "id");
        assert_eq!(underscored("category"), "category");
        assert_eq!(underscored("heroURLPath"), "hero_url_path");
    }

    #[test]
    fn camel_case_forms() {
        assert_eq!(camel_case("post_title"), "postTitle");
        assert_eq!(camel_case("id"), "id");
        assert_eq!(camel_case("post_modified_gmt"), "postModifiedGmt");
    }

    #[test]
    fn parse_plain_get() {
        let op = parse_operation("getPostTitle").unwrap();
        assert_eq!(
            op,
            Operation {
                action: Action::Get,
                formatted: false,
                attribute: "postTitle".into(),
            }
        );
    }

    #[test]
    fn parse_trailing_formatted_modifier() {
        let op = parse_operation("theImageUrlFormatted").unwrap();
        assert_eq!(op.action, Action::The);
        assert!(op.formatted);
        assert_eq!(op.attribute, "imageUrl");
    }

    #[test]
    fn parse_leading_formatted_modifier() {
        let op = parse_operation("getFormattedPostDate").unwrap();
        assert_eq!(op.action, Action::Get);
        assert!(op.formatted);
        assert_eq!(op.attribute, "postDate");
    }

    #[test]
    fn formatted_alone_is_an_attribute_name() {
        let op = parse_operation("getFormatted").unwrap();
        assert!(!op.formatted);
        assert_eq!(op.attribute, "formatted");
    }

    #[test]
    fn parse_set() {
        let op = parse_operation("setVenueName").unwrap();
        assert_eq!(op.action, Action::Set);
        assert_eq!(op.attribute, "venueName");
    }

    #[test]
    fn reject_unknown_action() {
        let err = parse_operation("fetchPostTitle").unwrap_err();
        assert!(matches!(err, ModelError::UnrecognizedOperation(name) if name == "fetchPostTitle"));
        assert!(parse_operation("GetPostTitle").is_err());
        assert!(parse_operation("").is_err());
    }

    #[test]
    fn reject_action_without_attribute() {
        assert!(parse_operation("get").is_err());
        assert!(parse_operation("setFormatted").is_ok());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn underscored_is_lowercase_and_joined(
                words in prop::collection::vec("[a-z]{2,8}", 1..5)
            ) {
                let camel = camel_join(
                    &words.iter().map(|w| ucfirst(w)).collect::<Vec<_>>(),
                );
                prop_assert_eq!(underscored(&camel), words.join("_"));
            }

            #[test]
            fn get_round_trips_attribute_names(
                words in prop::collection::vec("[a-z]{2,8}", 1..5)
            ) {
                prop_assume!(!words[0].eq_ignore_ascii_case("formatted"));
                prop_assume!(!words.last().unwrap().eq_ignore_ascii_case("formatted"));
                let capitalized: Vec<String> = words.iter().map(|w| ucfirst(w)).collect();
                let attribute = camel_join(&capitalized);
                let op = parse_operation(&format!("get{}", capitalized.concat())).unwrap();
                prop_assert_eq!(op.action, Action::Get);
                prop_assert!(!op.formatted);
                prop_assert_eq!(op.attribute, attribute);
            }
        }
    }
}
