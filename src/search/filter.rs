use super::tokenizer::tokenize;
use crate::events::types::Event;

/// Result of the lexical stage.
pub struct FilterOutcome {
    pub events: Vec<Event>,
    /// Set when nothing matched and every candidate was kept instead.
    pub widened: bool,
}

/// Returns true when any query token occurs inside the event's searchable text.
///
/// Containment is substring-based, so "clean" matches "cleanup".
pub fn matches(query_tokens: &[String], event: &Event) -> bool {
    let haystack = tokenize(&event.searchable_text()).join(" ");
    query_tokens.iter().any(|token| haystack.contains(token.as_str()))
}

/// Narrows `candidates` to lexical matches, keeping their relative order.
///
/// An empty match set widens to the full candidate list.
pub fn filter_candidates(query: &str, candidates: Vec<Event>) -> FilterOutcome {
    let query_tokens = tokenize(query);

    let (matched, rest): (Vec<Event>, Vec<Event>) = candidates
        .into_iter()
        .partition(|event| matches(&query_tokens, event));

    if matched.is_empty() {
        tracing::debug!(
            "No lexical match for {:?}, widening to {} candidates",
            query,
            rest.len()
        );
        return FilterOutcome {
            events: rest,
            widened: true,
        };
    }

    FilterOutcome {
        events: matched,
        widened: false,
    }
}
