//! Best effort extraction of a JSON object from model output. Models
//! wrap replies in code fences or add chatter before and after the
//! object, both of which are cut away here.

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Text after `open` up to the next fence, or to the end if the fence
/// is never closed.
fn between_fences<'a>(text: &'a str, open: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let rest = &text[start..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Slice the outermost `{ ... }` out of a model reply. Returns `None`
/// when there is no such span.
pub fn extract_json(output: &str) -> Option<&str> {
    let output = output.trim();
    let unfenced = between_fences(output, JSON_FENCE)
        .or_else(|| between_fences(output, FENCE))
        .unwrap_or(output);

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&unfenced[start..=end])
}
