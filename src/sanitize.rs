use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    static ref EXECUTABLE_ELEMENT: Regex = Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap();
    static ref UNCLOSED_EXECUTABLE: Regex = Regex::new(r"(?is)<(script|style)\b[^>]*>.*$").unwrap();
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?(-->|$)").unwrap();
    static ref TAG: Regex = Regex::new(r"</?[a-zA-Z][^<>]*>").unwrap();
}

/// Strips markup from user supplied text. Script and style elements are dropped
/// together with their content, every other tag is removed but its text is kept.
/// Whatever angle brackets survive are escaped.
pub fn clean(input: &str) -> String {
    let without_scripts = EXECUTABLE_ELEMENT.replace_all(input, "");
    let without_scripts = UNCLOSED_EXECUTABLE.replace_all(&without_scripts, "");
    let without_comments = COMMENT.replace_all(&without_scripts, "");
    let text = TAG.replace_all(&without_comments, "");
    text.replace('<', "&lt;").replace('>', "&gt;")
}

/// Cleans every top-level string value in place.
pub fn clean_strings(object: &mut Map<String, Value>) {
    for value in object.values_mut() {
        if let Value::String(s) = value {
            *s = clean(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{clean, clean_strings};

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(clean("LeBron James"), "LeBron James");
        assert_eq!(clean("6'9\" & 250 lbs"), "6'9\" & 250 lbs");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn script_elements_are_removed_with_content() {
        assert_eq!(clean("<script>alert('XSS')</script>Test Player"), "Test Player");
        assert_eq!(clean("Test <SCRIPT type=\"text/javascript\">\nsteal()\n</Script >Player"), "Test Player");
        assert_eq!(clean("<style>body{}</style>Guard"), "Guard");
        assert_eq!(clean("Guard<script>never closed"), "Guard");
    }

    #[test]
    fn other_tags_are_stripped_keeping_text() {
        assert_eq!(clean("<b>Stephen</b> <i>Curry</i>"), "Stephen Curry");
        assert_eq!(clean("<img src=x onerror=alert(1)>Lakers"), "Lakers");
        assert_eq!(clean("Celtics<!-- hidden -->"), "Celtics");
    }

    #[test]
    fn stray_brackets_are_escaped() {
        assert_eq!(clean("a < b > c"), "a &lt; b &gt; c");
        assert_eq!(clean("<<b>x</b>"), "&lt;x");
    }

    #[test]
    fn only_string_values_are_cleaned() {
        let mut object = json!({
            "name": "<script>x</script>Nikola",
            "age": 29,
            "history": ["<b>kept as is</b>"],
        });
        clean_strings(object.as_object_mut().unwrap());

        assert_eq!(object, json!({
            "name": "Nikola",
            "age": 29,
            "history": ["<b>kept as is</b>"],
        }));
    }
}
