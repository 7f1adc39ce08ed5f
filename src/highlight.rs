use crate::filter::{FilteredTree, Matcher};
use crate::sort::sort_siblings;
use crate::tree::{NodeId, TreeIndex};
use std::collections::HashSet;

/// A slice of a title, emphasized when `matched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// Split `title` into alternating plain and matched segments.
///
/// Without a matcher the whole title is a single plain segment.
pub fn highlight_segments<'a>(title: &'a str, matcher: Option<&Matcher>) -> Vec<Segment<'a>> {
    let Some(matcher) = matcher else {
        return vec![Segment {
            text: title,
            matched: false,
        }];
    };

    let mut segments = Vec::new();
    let mut cursor = 0;
    for range in matcher.match_ranges(title) {
        if range.start > cursor {
            segments.push(Segment {
                text: &title[cursor..range.start],
                matched: false,
            });
        }
        segments.push(Segment {
            text: &title[range.clone()],
            matched: true,
        });
        cursor = range.end;
    }
    if cursor < title.len() || segments.is_empty() {
        segments.push(Segment {
            text: &title[cursor..],
            matched: false,
        });
    }
    segments
}

/// First matching node in pre-order of the filtered tree, in rendered order
pub fn first_match(
    filtered: &FilteredTree,
    index: &TreeIndex,
    inactive: &HashSet<NodeId>,
) -> Option<NodeId> {
    if filtered.match_ids().is_empty() {
        return None;
    }
    let mut stack: Vec<NodeId> = sort_siblings(filtered.roots(), index, inactive);
    stack.reverse();
    let mut seen = HashSet::new();

    while let Some(id) = stack.pop() {
        if !seen.insert(id.clone()) {
            continue;
        }
        if filtered.is_match(id.as_str()) {
            return Some(id);
        }
        let mut children = sort_siblings(filtered.children_of(id.as_str()), index, inactive);
        children.reverse();
        stack.extend(children);
    }
    None
}

/// Offset that brings `row` into a viewport of `height` rows, if it is not
/// already visible. `None` means "leave the offset alone".
pub fn scroll_offset_for(row: usize, offset: usize, height: usize) -> Option<usize> {
    if height == 0 {
        return None;
    }
    if row < offset {
        Some(row)
    } else if row >= offset + height {
        Some(row + 1 - height)
    } else {
        None
    }
}
