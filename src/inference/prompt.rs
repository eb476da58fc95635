//! Prompt template rendering
//!
//! Templates name their slot with `{key}`. Doubled braces (`{{`, `}}`) are
//! literal braces, so prompts can embed JSON examples. Any other `{...}` group
//! is left untouched.

/// Substitute `value` for every `{key}` in `template`
pub fn render(template: &str, key: &str, value: &str) -> String {
    let placeholder = format!("{{{}}}", key);
    let mut out = String::with_capacity(template.len() + value.len());
    let mut rest = template;

    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with(&placeholder) {
            out.push_str(value);
            rest = &tail[placeholder.len()..];
        } else {
            // Lone brace: keep it
            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}
