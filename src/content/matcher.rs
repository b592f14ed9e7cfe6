/// Return the first known name (in iteration order) that occurs in `input`
/// as a case-insensitive substring.
///
/// Names are checked in the order given, so `"I love Lisbon and Tulum"`
/// matched against `[Tulum, Lisbon]` yields `Tulum`. Empty names never match.
pub fn first_match<'a, I>(input: &str, names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let haystack = input.to_lowercase();
    names
        .into_iter()
        .filter(|name| !name.is_empty())
        .find(|name| haystack.contains(&name.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CITIES: [&str; 4] = ["Tulum", "Lisbon", "Kyoto", "Madrid"];

    #[test]
    fn first_key_in_set_order_wins() {
        assert_eq!(first_match("I love Lisbon and Tulum", CITIES), Some("Tulum"));
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(first_match("kyoto in spring?", CITIES), Some("Kyoto"));
        assert_eq!(first_match("MADRID with kids", CITIES), Some("Madrid"));
    }

    #[test]
    fn substring_inside_words_counts() {
        assert_eq!(first_match("madridista weekend", CITIES), Some("Madrid"));
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(first_match("somewhere warm", CITIES), None);
        assert_eq!(first_match("", CITIES), None);
    }

    #[test]
    fn empty_names_are_skipped() {
        assert_eq!(first_match("Lisbon", ["", "Lisbon"]), Some("Lisbon"));
    }
}
