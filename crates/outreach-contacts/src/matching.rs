/// Short forms and the given names they stand for.
const NICKNAMES: &[(&str, &str)] = &[
    ("mike", "michael"),
    ("mike", "mikhail"),
    ("bob", "robert"),
    ("jim", "james"),
    ("bill", "william"),
    ("dave", "david"),
    ("steve", "steven"),
    ("chris", "christopher"),
    ("matt", "matthew"),
    ("alex", "alexander"),
];

/// Whether a name inferred from an email plausibly refers to the same person
/// as a name shown on a search result.
///
/// Deliberately conservative: a false positive means a connection request to
/// a stranger.
pub fn names_match(inferred: &str, found: &str) -> bool {
    let inferred = inferred.trim().to_lowercase();
    let found = found.trim().to_lowercase();
    if inferred.is_empty() || found.is_empty() {
        return false;
    }
    if inferred == found {
        return true;
    }

    let inferred_parts: Vec<&str> = inferred.split_whitespace().collect();
    let found_parts: Vec<&str> = found.split_whitespace().collect();

    match inferred_parts.as_slice() {
        [word] => single_word_match(word, &found_parts),
        [first, .., last] if found_parts.len() >= 2 => {
            let overlaps = |needle: &str| {
                found_parts
                    .iter()
                    .any(|part| part.contains(needle) || needle.contains(part))
            };
            overlaps(first) && overlaps(last)
        }
        _ => false,
    }
}

fn single_word_match(word: &str, found_parts: &[&str]) -> bool {
    let word_len = word.chars().count();
    if word_len < 4 {
        return false;
    }

    found_parts.iter().any(|part| {
        let part_len = part.chars().count();
        let covers = |short: usize, long: usize| short as f64 >= long as f64 * 0.6;

        if part.contains(word) {
            if covers(word_len, part_len) {
                return true;
            }
        } else if word.contains(part) && covers(part_len, word_len) {
            return true;
        }

        NICKNAMES.iter().any(|(short, full)| {
            (word == *short && part.contains(full)) || (word == *full && part.contains(short))
        })
    })
}
