/*!
Expands a matched group back into the chemical mentions it is made of.
*/
use crate::datastructure::SENTINEL;
use crate::grouper::EntityListSpan;

/// Mentions of the span, in their original order, glue removed.
pub fn expand(span: &EntityListSpan) -> Vec<&str> {
    span.mentions().map(|m| m.as_str()).collect()
}

/// Same as [`expand`], but on the rendered form of a span such as `{$A$ , $B$ and $C$}`. The
/// text between each pair of sentinels is a mention; an unclosed sentinel is ignored.
pub fn strip_sentinels(rendered: &str) -> Vec<&str> {
    let parts: Vec<&str> = rendered.split(SENTINEL).collect();
    // An even number of parts means one sentinel is left unclosed.
    let closed = if parts.len() % 2 == 0 {
        parts.len() - 1
    } else {
        parts.len()
    };
    parts[..closed]
        .iter()
        .skip(1)
        .step_by(2)
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect()
}
