/// Human-readable author list.
///
/// `A`, `A & B`, `A, B, & C`; empty for no authors.
pub fn format_authors(authors: &[String]) -> String {
    match authors {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} & {second}"),
        [init @ .., last] => format!("{}, & {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_authors() {
        assert_eq!(format_authors(&[]), "");
    }

    #[test]
    fn test_single_author() {
        assert_eq!(format_authors(&names(&["Doe, Jane"])), "Doe, Jane");
    }

    #[test]
    fn test_two_authors() {
        assert_eq!(format_authors(&names(&["A", "B"])), "A & B");
    }

    #[test]
    fn test_three_or_more_use_oxford_ampersand() {
        assert_eq!(format_authors(&names(&["A", "B", "C"])), "A, B, & C");
        assert_eq!(format_authors(&names(&["A", "B", "C", "D"])), "A, B, C, & D");
    }
}
