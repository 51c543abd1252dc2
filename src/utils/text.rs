//! Post-processing for model output: markdown cleanup for terminal display,
//! code-fence removal before writing files, and tolerant JSON extraction.

use crate::utils::error::{CouncilError, Result};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

static BOLD_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern"));
static BOLD_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(.+?)__").expect("bold pattern"));
static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic pattern"));
// `_x_` 只在非單字字元邊界才算斜體，避免破壞 snake_case
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(^|[^\w])_(.+?)_([^\w]|$)").expect("italic pattern"));
static FENCE_OPEN_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```\w*\n").expect("fence pattern"));
static FENCE_ANY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```\w*").expect("fence pattern"));
static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json|```").expect("json fence pattern"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`(.+?)`").expect("inline code pattern"));
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]+").expect("header pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.+?)\]\(.+?\)").expect("link pattern"));
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("json object pattern"));
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s'"<>)\]]+"#).expect("url pattern"));

/// Remove markdown decoration so replies read cleanly in a terminal.
pub fn strip_markdown(text: &str) -> String {
    let text = BOLD_STARS.replace_all(text, "$1");
    let text = BOLD_UNDERSCORES.replace_all(&text, "$1");
    let text = ITALIC_STAR.replace_all(&text, "$1");
    let text = strip_italic_underscores(&text);
    let text = FENCE_OPEN_LINE.replace_all(&text, "");
    let text = text.replace("```", "");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = HEADER.replace_all(&text, "");
    let text = LINK.replace_all(&text, "$1");
    text.into_owned()
}

// 相鄰的 `_a_ _b_` 共用邊界字元，一次替換只會處理其中一個
fn strip_italic_underscores(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = ITALIC_UNDERSCORE
            .replace_all(&current, "${1}${2}${3}")
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Drop every ```lang / ``` marker and trim, leaving raw file content.
pub fn strip_code_fences(text: &str) -> String {
    FENCE_ANY.replace_all(text, "").trim().to_string()
}

pub fn strip_json_fences(text: &str) -> String {
    JSON_FENCE.replace_all(text, "").trim().to_string()
}

/// The span from the first `{` to the last `}`, if any.
pub fn first_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}

/// Parse a JSON reply from a model.
///
/// Fences are stripped first; if the remainder is not valid JSON the outermost
/// `{...}` span is tried, since models often wrap the object in prose.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str, context: &str) -> Result<T> {
    let cleaned = strip_json_fences(raw);
    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            if let Some(candidate) = first_json_object(&cleaned) {
                if let Ok(value) = serde_json::from_str(candidate) {
                    return Ok(value);
                }
            }
            Err(CouncilError::ReplyParseError {
                context: context.to_string(),
                message: first_err.to_string(),
            })
        }
    }
}

pub fn head_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    match text.char_indices().nth(total - max_chars) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

pub fn first_url(text: &str) -> Option<String> {
    URL.find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_string())
}
