use std::collections::HashSet;

use crate::path::{JsonPath, PathSegment, PathStack};

/// Mutable traversal state owned by one build.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    stack: PathStack,
    skip_label: bool,
    hidden: HashSet<String>,
    visiting: Vec<String>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack(&self) -> &PathStack {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn path(&self) -> JsonPath {
        self.stack.to_path()
    }

    pub fn skip_label(&self) -> bool {
        self.skip_label
    }

    /// Run `f` with `segment` pushed. The segment is popped on every exit.
    pub fn with_segment<T>(
        &mut self,
        segment: impl Into<PathSegment>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.stack.push(segment);
        let out = f(self);
        self.stack.pop();
        out
    }

    /// Run `f` with field labels suppressed.
    pub fn without_labels<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.skip_label, true);
        let out = f(self);
        self.skip_label = previous;
        out
    }

    /// Run `f` while the class `fqn` is open on the current branch.
    pub fn with_class<T>(&mut self, fqn: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.visiting.push(fqn.to_string());
        let out = f(self);
        self.visiting.pop();
        out
    }

    /// True while a class `fqn` encloses the cursor.
    pub fn is_visiting(&self, fqn: &str) -> bool {
        self.visiting.iter().any(|open| open == fqn)
    }

    /// Hide a property by fully-qualified name for the rest of this build.
    pub fn hide(&mut self, fqn: String) {
        self.hidden.insert(fqn);
    }

    pub fn is_hidden(&self, fqn: &str) -> bool {
        self.hidden.contains(fqn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_are_scoped() {
        let mut cursor = Cursor::new();
        let inner = cursor.with_segment("items", |c| {
            c.with_segment(3usize, |c| {
                assert_eq!(c.depth(), 2);
                c.path().to_string()
            })
        });
        assert_eq!(inner, "$.items[3]");
        assert_eq!(cursor.depth(), 0);
    }

    #[test]
    fn test_early_error_still_pops() {
        let mut cursor = Cursor::new();
        let result: Result<(), &str> = cursor.with_segment("a", |c| {
            c.with_segment("b", |_| Err("boom"))?;
            Ok(())
        });
        assert!(result.is_err());
        assert!(cursor.stack().is_empty());
    }

    #[test]
    fn test_open_classes_are_scoped() {
        let mut cursor = Cursor::new();
        cursor.with_class("org.example.Node", |c| {
            assert!(c.is_visiting("org.example.Node"));
            c.with_class("org.example.Leaf", |c| assert!(c.is_visiting("org.example.Node")));
            assert!(!c.is_visiting("org.example.Leaf"));
        });
        assert!(!cursor.is_visiting("org.example.Node"));
    }

    #[test]
    fn test_label_suppression_restores() {
        let mut cursor = Cursor::new();
        cursor.without_labels(|c| {
            assert!(c.skip_label());
            c.without_labels(|c| assert!(c.skip_label()));
            assert!(c.skip_label());
        });
        assert!(!cursor.skip_label());
    }
}
