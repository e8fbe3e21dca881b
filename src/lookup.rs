//! Name lookup shared by the course directory and a course's content list.
//!
//! An exact name match wins outright; otherwise a substring match is accepted
//! only when it is unique. Watch-lists are typed by hand, usually abbreviated.

pub trait Named {
    fn name(&self) -> &str;
}

#[derive(Debug)]
pub enum Lookup<'a, T> {
    Found(&'a T),
    NotFound,
    /// Number of entries containing the query.
    Ambiguous(usize),
}

#[cfg(test)]
impl<'a, T> Lookup<'a, T> {
    fn found(self) -> Option<&'a T> {
        match self {
            Self::Found(item) => Some(item),
            Self::NotFound | Self::Ambiguous(_) => None,
        }
    }
}

pub fn lookup<'a, T: Named>(items: &'a [T], query: &str) -> Lookup<'a, T> {
    let mut exact = items.iter().filter(|item| item.name() == query);
    if let (Some(item), None) = (exact.next(), exact.next()) {
        return Lookup::Found(item);
    }

    let partial = items
        .iter()
        .filter(|item| item.name().contains(query))
        .collect::<Vec<_>>();
    match partial.as_slice() {
        [] => Lookup::NotFound,
        [item] => Lookup::Found(*item),
        many => Lookup::Ambiguous(many.len()),
    }
}

/// [`lookup`], logging why nothing was returned. `kind` names the collection
/// in the log line ("course", "content").
pub fn search<'a, T: Named>(items: &'a [T], query: &str, kind: &str) -> Option<&'a T> {
    match lookup(items, query) {
        Lookup::Found(item) => Some(item),
        Lookup::NotFound => {
            tracing::warn!(kind, query, "no {kind} name contains the query");
            None
        }
        Lookup::Ambiguous(count) => {
            tracing::warn!(
                kind,
                query,
                count,
                "{count} {kind} names contain the query; use more of the name"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(&'static str);

    impl Named for Item {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn names(found: Lookup<'_, Item>) -> Option<&'static str> {
        found.found().map(|item| item.0)
    }

    #[test]
    fn exact_match_wins_over_partial_matches() {
        let items = [Item("Algorithms II"), Item("Algorithms"), Item("Algorithms I")];
        assert_eq!(names(lookup(&items, "Algorithms")), Some("Algorithms"));
    }

    #[test]
    fn unique_partial_match_is_accepted() {
        let items = [Item("線形代数学"), Item("微分積分学")];
        assert_eq!(names(lookup(&items, "線形")), Some("線形代数学"));
    }

    #[test]
    fn no_match_is_not_found() {
        let items = [Item("Compilers")];
        assert!(matches!(lookup(&items, "Databases"), Lookup::NotFound));
        assert!(search(&items, "Databases", "course").is_none());
    }

    #[test]
    fn several_partial_matches_are_ambiguous() {
        let items = [Item("Physics A"), Item("Physics B"), Item("Chemistry")];
        assert!(matches!(lookup(&items, "Physics"), Lookup::Ambiguous(2)));
        assert!(search(&items, "Physics", "course").is_none());
    }

    #[test]
    fn duplicate_exact_names_fall_through_to_ambiguity() {
        let items = [Item("Seminar"), Item("Seminar")];
        assert!(matches!(lookup(&items, "Seminar"), Lookup::Ambiguous(2)));
    }

    #[test]
    fn empty_collection_is_not_found() {
        let items: [Item; 0] = [];
        assert!(matches!(lookup(&items, ""), Lookup::NotFound));
    }
}
