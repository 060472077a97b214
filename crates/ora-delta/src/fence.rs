//! Fenced delta-block extraction
//!
//! Delta blocks ride inside free text as fenced regions tagged with the
//! [`DELTA_MARKER`] language marker. Two fence styles are accepted —
//! backtick and tilde runs of three or more — and a closing fence must
//! repeat the opening character at least as many times, so a longer fence
//! carries a shorter one in its body verbatim.

/// Fixed language marker on the opening fence line
pub const DELTA_MARKER: &str = "ora-delta";

const MIN_FENCE_LEN: usize = 3;

/// One extracted fenced region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    /// Raw body between the fences, newline-joined
    pub body: String,

    /// 1-based line number of the opening fence
    pub line: usize,
}

struct OpenFence {
    marker: char,
    len: usize,
    line: usize,
    body: Vec<String>,
}

fn fence_run(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = line.trim();
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run = trimmed.chars().take_while(|&c| c == first).count();
    if run < MIN_FENCE_LEN {
        return None;
    }
    Some((first, run, trimmed[run..].trim()))
}

/// Extract every delta-tagged fenced block from `text`
///
/// An unterminated fence runs to end of input and still yields a block;
/// whether its body parses is the caller's problem.
#[must_use]
pub fn extract_blocks(text: &str) -> Vec<FencedBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<OpenFence> = None;

    for (idx, line) in text.lines().enumerate() {
        let closes = open.as_ref().is_some_and(|fence| {
            fence_run(line)
                .is_some_and(|(c, n, rest)| c == fence.marker && n >= fence.len && rest.is_empty())
        });

        if closes {
            if let Some(fence) = open.take() {
                blocks.push(FencedBlock {
                    body: fence.body.join("\n"),
                    line: fence.line,
                });
            }
        } else if let Some(fence) = open.as_mut() {
            fence.body.push(line.to_string());
        } else if let Some((marker, len, rest)) = fence_run(line) {
            if rest == DELTA_MARKER {
                open = Some(OpenFence {
                    marker,
                    len,
                    line: idx + 1,
                    body: Vec::new(),
                });
            }
        }
    }

    if let Some(fence) = open {
        blocks.push(FencedBlock {
            body: fence.body.join("\n"),
            line: fence.line,
        });
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_backtick_block() {
        let text = "preamble\n```ora-delta\n{\"a\": 1}\n```\ntrailing";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "{\"a\": 1}");
        assert_eq!(blocks[0].line, 2);
    }

    #[test]
    fn extracts_tilde_block() {
        let text = "~~~ora-delta\n{}\n~~~";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "{}");
    }

    #[test]
    fn ignores_untagged_fences() {
        let text = "```rust\nfn main() {}\n```\n```ora-delta\n{}\n```";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn longer_fence_nests_shorter() {
        let text = "````ora-delta\n{\"doc\": \"has a fence\"}\n```\nstill inside\n````";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].body.contains("```"));
        assert!(blocks[0].body.contains("still inside"));
    }

    #[test]
    fn closing_fence_may_be_longer() {
        let text = "```ora-delta\n{}\n`````";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "{}");
    }

    #[test]
    fn mismatched_marker_does_not_close() {
        let text = "```ora-delta\n~~~\nbody\n```";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "~~~\nbody");
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let text = "```ora-delta\n{\"open\": true}";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "{\"open\": true}");
    }

    #[test]
    fn multiple_blocks_in_order() {
        let text = "```ora-delta\n1\n```\nmiddle\n~~~ora-delta\n2\n~~~";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].body, "1");
        assert_eq!(blocks[1].body, "2");
    }

    #[test]
    fn no_blocks_in_plain_text() {
        assert!(extract_blocks("just prose, no fences").is_empty());
    }
}
