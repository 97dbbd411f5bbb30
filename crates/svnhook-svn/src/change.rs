//! Parsing of `svnlook changed` listings.

use once_cell::unsync::OnceCell;
use std::collections::HashMap;

/// One path touched by a revision or transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeItem {
    flags: String,
    path: String,
    replaced: bool,
}

impl ChangeItem {
    pub fn new(flags: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            flags: flags.into(),
            path: path.into(),
            replaced: false,
        }
    }

    /// Raw flag field, including its trailing padding.
    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Flag field without padding, as exposed to rules (`A`, `_U`, `UU`, ...).
    pub fn change_type(&self) -> &str {
        self.flags.trim_end()
    }

    /// `true` when the same path was both deleted and added in one listing.
    pub fn is_replaced(&self) -> bool {
        self.replaced
    }

    pub fn is_add(&self) -> bool {
        self.flags.starts_with('A')
    }

    pub fn is_delete(&self) -> bool {
        self.flags.starts_with('D')
    }

    pub fn is_update(&self) -> bool {
        self.flags.contains('U')
    }

    pub fn is_update_content(&self) -> bool {
        self.flags.starts_with('U')
    }

    pub fn is_update_property(&self) -> bool {
        self.flags.chars().nth(1) == Some('U')
    }

    pub fn is_update_all(&self) -> bool {
        self.is_update_content() && self.is_update_property()
    }

    pub fn is_folder(&self) -> bool {
        is_folder_path(&self.path)
    }
}

/// Repository listings mark folders with a trailing `/`.
pub fn is_folder_path(path: &str) -> bool {
    path.ends_with('/')
}

/// Splits change lines into flags and path.
///
/// The column where the path begins is learned from the first line this
/// parser ever sees and reused for every later line.
#[derive(Debug, Default)]
pub struct ChangeParser {
    delimiter: OnceCell<usize>,
}

impl ChangeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte offset of the path column, once known.
    pub fn delimiter(&self) -> Option<usize> {
        self.delimiter.get().copied()
    }

    pub fn parse_line(&self, line: &str) -> ChangeItem {
        let index = *self.delimiter.get_or_init(|| find_delimiter(line));
        let flags = line.get(..index.saturating_sub(1)).unwrap_or(line);
        let path = line.get(index..).unwrap_or("");
        ChangeItem::new(flags, path)
    }

    /// Parses a full listing, marking paths that were both added and deleted.
    pub fn parse_listing(&self, listing: &str) -> Vec<ChangeItem> {
        let mut items: Vec<ChangeItem> = Vec::new();
        let mut adds: HashMap<String, usize> = HashMap::new();
        let mut deletes: HashMap<String, usize> = HashMap::new();

        for line in listing.lines().filter(|l| !l.trim().is_empty()) {
            let item = self.parse_line(line);
            let idx = items.len();
            let path = item.path.clone();
            let (is_add, is_delete) = (item.is_add(), item.is_delete());
            items.push(item);

            if is_add {
                adds.insert(path.clone(), idx);
            }
            if is_delete {
                deletes.insert(path.clone(), idx);
            }
            if let (Some(&a), Some(&d)) = (adds.get(&path), deletes.get(&path)) {
                items[a].replaced = true;
                items[d].replaced = true;
            }
        }

        items
    }
}

fn find_delimiter(line: &str) -> usize {
    let mut state = 0;
    for (idx, ch) in line.char_indices() {
        match state {
            0 if ch != ' ' => state = 1,
            1 if ch == ' ' => state = 2,
            2 if ch != ' ' => return idx,
            _ => {}
        }
    }
    line.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_paths() {
        assert!(is_folder_path("trunk/"));
        assert!(!is_folder_path("trunk/a.c"));
        assert!(ChangeParser::new().parse_line("A   trunk/docs/").is_folder());
    }

    #[test]
    fn test_delimiter_from_first_line() {
        let parser = ChangeParser::new();
        let item = parser.parse_line("A   trunk/fileA1.txt");
        assert_eq!(parser.delimiter(), Some(4));
        assert_eq!(item.flags(), "A  ");
        assert_eq!(item.change_type(), "A");
        assert_eq!(item.path(), "trunk/fileA1.txt");
    }

    #[test]
    fn test_delimiter_is_not_rederived() {
        let parser = ChangeParser::new();
        parser.parse_line("UU  a.txt");
        let item = parser.parse_line("_U  dir with space/b.txt");
        assert_eq!(parser.delimiter(), Some(4));
        assert_eq!(item.change_type(), "_U");
        assert_eq!(item.path(), "dir with space/b.txt");
    }

    #[test]
    fn test_path_with_leading_spaces_uses_fixed_column() {
        let parser = ChangeParser::new();
        parser.parse_line("D   old.txt");
        let item = parser.parse_line("A    spaced.txt");
        assert_eq!(item.path(), " spaced.txt");
    }

    #[test]
    fn test_short_line_yields_empty_path() {
        let parser = ChangeParser::new();
        parser.parse_line("A   x");
        let item = parser.parse_line("A");
        assert_eq!(item.path(), "");
        assert_eq!(item.flags(), "A");
    }

    #[test]
    fn test_flag_predicates() {
        let add = ChangeItem::new("A  ", "f");
        assert!(add.is_add() && !add.is_delete() && !add.is_update());

        let del = ChangeItem::new("D  ", "f");
        assert!(del.is_delete() && !del.is_add());

        let content = ChangeItem::new("U  ", "f");
        assert!(content.is_update() && content.is_update_content());
        assert!(!content.is_update_property() && !content.is_update_all());

        let prop = ChangeItem::new("_U ", "f");
        assert!(prop.is_update() && prop.is_update_property());
        assert!(!prop.is_update_content() && !prop.is_update_all());

        let both = ChangeItem::new("UU ", "f");
        assert!(both.is_update_all());

        let added_with_props = ChangeItem::new("AU ", "f");
        assert!(added_with_props.is_add() && added_with_props.is_update());
    }

    #[test]
    fn test_folder() {
        assert!(ChangeItem::new("A  ", "trunk/").is_folder());
        assert!(!ChangeItem::new("A  ", "trunk/a").is_folder());
    }

    #[test]
    fn test_replaced_detection_delete_first() {
        let items = ChangeParser::new().parse_listing("D   a.txt\nA   a.txt\nA   b.txt\nD   c.txt\n");
        let flags: Vec<_> = items.iter().map(|i| (i.path(), i.is_replaced())).collect();
        assert_eq!(
            flags,
            vec![("a.txt", true), ("a.txt", true), ("b.txt", false), ("c.txt", false)]
        );
    }

    #[test]
    fn test_replaced_detection_add_first() {
        let items = ChangeParser::new().parse_listing("A   a.txt\nU   z.txt\nD   a.txt\n");
        assert!(items[0].is_replaced());
        assert!(!items[1].is_replaced());
        assert!(items[2].is_replaced());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let items = ChangeParser::new().parse_listing("\nA   a.txt\n\n");
        assert_eq!(items.len(), 1);
    }
}
