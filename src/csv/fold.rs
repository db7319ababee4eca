/// Remove escape markers from a raw token
///
/// A doubled marker becomes one literal `escape_char`; a lone marker is punctuation and is
/// dropped. The same rule serves both escape modes: `\,` folds to `,` and `""` folds to `"`.
pub fn fold_escapes(raw: &str, escape_char: char) -> String {
    let mut chars = raw.chars().peekable();
    let mut folded = String::with_capacity(raw.len());

    while let Some(ch) = chars.next() {
        if ch != escape_char {
            folded.push(ch);
        } else if chars.peek() == Some(&escape_char) {
            folded.push(escape_char);
            chars.next();
        }
    }
    folded
}
