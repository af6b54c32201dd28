//! Splitting Markdown into translatable fragments at blank lines.

const FENCE: &str = "```";

/// Splits `input` at blank lines that lie outside fenced code blocks.
///
/// With a positive `fragment_size`, lines are packed greedily: whenever the
/// fragment built so far plus the next blank line would exceed
/// `fragment_size` bytes, the fragment is flushed and a new one starts with
/// that blank line. The result always has at least one element.
///
/// With `fragment_size == 0` the text is bisected once at the split point
/// closest to the middle line. Returns `None` when there is no split point,
/// e.g. when the text is a single code block.
///
/// Joining the result with `"\n"` always reproduces `input`.
pub fn split_at_blank_lines(input: &str, fragment_size: usize) -> Option<Vec<String>> {
    let lines: Vec<&str> = input.split('\n').collect();
    if fragment_size == 0 {
        bisect(&lines)
    } else {
        Some(pack(&lines, fragment_size))
    }
}

/// Indices of blank lines outside code blocks.
fn split_points<'a>(lines: &'a [&'a str]) -> impl Iterator<Item = usize> + 'a {
    let mut in_code_block = false;
    lines.iter().enumerate().filter_map(move |(i, line)| {
        if line.starts_with(FENCE) {
            in_code_block = !in_code_block;
        }
        (!in_code_block && line.trim().is_empty()).then_some(i)
    })
}

fn pack(lines: &[&str], fragment_size: usize) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut points = split_points(lines).peekable();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for (i, &line) in lines.iter().enumerate() {
        if points.next_if_eq(&i).is_some() && current_len + line.len() > fragment_size {
            fragments.push(current.join("\n"));
            current.clear();
            current_len = 0;
        }
        current_len += if current.is_empty() {
            line.len()
        } else {
            line.len() + 1
        };
        current.push(line);
    }
    fragments.push(current.join("\n"));
    fragments
}

fn bisect(lines: &[&str]) -> Option<Vec<String>> {
    let half = lines.len() / 2;
    // The first line is never a useful split point: the first half would be empty.
    let index = split_points(lines)
        .filter(|&i| i > 0)
        .min_by_key(|&i| half.abs_diff(i))?;
    Some(vec![
        lines[..index].join("\n"),
        lines[index..].join("\n"),
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn paragraphs(n: usize) -> String {
        (1..=n)
            .map(|i| format!("Paragraph {i}."))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_no_blank_lines_yields_single_fragment() {
        let input = "line one\nline two\nline three";
        assert_eq!(
            split_at_blank_lines(input, 5).unwrap(),
            vec![input.to_string()]
        );
    }

    #[test]
    fn test_short_text_is_one_fragment() {
        let input = paragraphs(3);
        assert_eq!(split_at_blank_lines(&input, 2048).unwrap(), vec![input]);
    }

    #[test]
    fn test_greedy_packing_respects_size() {
        let input = paragraphs(10);
        let fragments = split_at_blank_lines(&input, 40).unwrap();
        assert!(fragments.len() > 1);
        assert_eq!(fragments.join("\n"), input);
        for fragment in &fragments[1..] {
            assert!(fragment.starts_with('\n'), "should start at the blank line");
        }
    }

    #[test]
    fn test_never_splits_inside_code_block() {
        let input = "Intro\n\n```\na\n\nb\n\nc\n```\n\nOutro";
        let fragments = split_at_blank_lines(input, 1).unwrap();
        assert_eq!(fragments.join("\n"), input);
        for fragment in &fragments {
            assert_eq!(fragment.matches(FENCE).count() % 2, 0, "{fragment:?}");
        }
    }

    #[test]
    fn test_trailing_blank_line_keeps_empty_tail() {
        let input = "aaaa\n\nbbbb\n";
        let fragments = split_at_blank_lines(input, 3).unwrap();
        assert_eq!(fragments, vec!["aaaa", "\nbbbb", ""]);
        assert_eq!(fragments.join("\n"), input);
    }

    #[test]
    fn test_bisect_splits_near_middle() {
        let input = paragraphs(10);
        let halves = split_at_blank_lines(&input, 0).unwrap();
        assert_eq!(halves.len(), 2);
        assert_eq!(halves[0], paragraphs(5));
        assert!(halves[1].starts_with("\nParagraph 6."));
        assert!(halves[1].ends_with("Paragraph 10."));
        assert_eq!(halves.join("\n"), input);
    }

    #[test]
    fn test_bisect_code_block_only_returns_none() {
        let input = "```js\n(((((0123456789abcdef)))))\n```";
        assert!(split_at_blank_lines(input, 0).is_none());
    }

    #[test]
    fn test_bisect_ignores_blank_lines_in_code() {
        let input = "```\na\n\nb\n```";
        assert!(split_at_blank_lines(input, 0).is_none());
    }

    #[test]
    fn test_bisect_ignores_leading_blank_line() {
        assert!(split_at_blank_lines("\nonly paragraph", 0).is_none());
    }

    #[test]
    fn test_bisect_strictly_reduces_lines() {
        let input = "a\n\nb";
        let halves = split_at_blank_lines(input, 0).unwrap();
        assert_eq!(halves, vec!["a", "\nb"]);
        for half in &halves {
            assert!(half.split('\n').count() < input.split('\n').count());
        }
    }
}
