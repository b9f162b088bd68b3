//! Free-text menu selection, kept free of I/O.

/// Outcome of parsing one line typed at a numbered menu.
#[derive(Debug, PartialEq, Eq)]
pub struct Selection<'a, T> {
    /// Chosen items in first-seen order, without duplicates.
    pub chosen: Vec<&'a T>,
    /// Tokens that were neither keywords nor in-range indices.
    pub invalid: Vec<String>,
    /// The user asked to stop without choosing anything.
    pub quit: bool,
}

impl<T> Selection<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }
}

/// Parse `raw` against `items`, numbered from 1.
///
/// Tokens are separated by whitespace or commas. `all`/`a` selects every
/// item, `none` selects nothing, `q`/`quit` aborts the selection. Invalid
/// tokens are collected and otherwise ignored.
pub fn select<'a, T>(items: &'a [T], raw: &str) -> Selection<'a, T> {
    let mut indices: Vec<usize> = Vec::new();
    let mut invalid = Vec::new();

    for token in raw
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|token| !token.is_empty())
    {
        match token.to_ascii_lowercase().as_str() {
            "q" | "quit" => {
                return Selection {
                    chosen: Vec::new(),
                    invalid,
                    quit: true,
                };
            }
            "a" | "all" => {
                for idx in 0..items.len() {
                    if !indices.contains(&idx) {
                        indices.push(idx);
                    }
                }
            }
            "none" => {}
            other => match other.parse::<usize>() {
                Ok(number) if (1..=items.len()).contains(&number) => {
                    if !indices.contains(&(number - 1)) {
                        indices.push(number - 1);
                    }
                }
                _ => invalid.push(token.to_string()),
            },
        }
    }

    Selection {
        chosen: indices.into_iter().map(|idx| &items[idx]).collect(),
        invalid,
        quit: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEMS: [&str; 4] = ["base", "devA", "ml", "web"];

    fn names(selection: &Selection<'_, &'static str>) -> Vec<&'static str> {
        selection.chosen.iter().map(|item| **item).collect()
    }

    #[test]
    fn test_indices_in_input_order() {
        let selection = select(&ITEMS, "3 1");
        assert_eq!(names(&selection), vec!["ml", "base"]);
        assert!(selection.invalid.is_empty());
        assert!(!selection.quit);
    }

    #[test]
    fn test_commas_and_duplicates() {
        let selection = select(&ITEMS, "2,2, 4");
        assert_eq!(names(&selection), vec!["devA", "web"]);
    }

    #[test]
    fn test_all_keyword() {
        let selection = select(&ITEMS, "ALL");
        assert_eq!(names(&selection), vec!["base", "devA", "ml", "web"]);

        let selection = select(&ITEMS, "4 a");
        assert_eq!(names(&selection), vec!["web", "base", "devA", "ml"]);
    }

    #[test]
    fn test_invalid_tokens_are_skipped_not_fatal() {
        let selection = select(&ITEMS, "0 2 9 x -1");
        assert_eq!(names(&selection), vec!["devA"]);
        assert_eq!(selection.invalid, vec!["0", "9", "x", "-1"]);
    }

    #[test]
    fn test_quit_discards_everything() {
        let selection = select(&ITEMS, "1 2 q 3");
        assert!(selection.quit);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_none_and_blank() {
        assert!(select(&ITEMS, "none").is_empty());
        assert!(select(&ITEMS, "   ").is_empty());
        assert!(!select(&ITEMS, "").quit);
    }

    #[test]
    fn test_empty_item_list() {
        let empty: [&str; 0] = [];
        let selection = select(&empty, "1 all");
        assert!(selection.is_empty());
        assert_eq!(selection.invalid, vec!["1"]);
    }
}
