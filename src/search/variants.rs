use std::collections::HashSet;

/// Sound-alike rewrites, tried one at a time against each word.
const PHONETIC_RULES: [(&str, &str); 7] = [
    ("ph", "f"),
    ("ck", "k"),
    ("qu", "kw"),
    ("x", "ks"),
    ("c", "k"),
    ("z", "s"),
    ("j", "g"),
];

/// Lower-case and collapse whitespace runs to a single space.
pub fn normalize(query: &str) -> String {
    query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Typo-tolerant rewrites of `query`.
///
/// The normalized query always comes first. Everything after it is unique and
/// ordered longest first; equal lengths keep generation order. Output is a pure
/// function of the input text.
pub fn generate(query: &str) -> Vec<String> {
    let normalized = normalize(query);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();

    let mut out = OrderedSet::default();
    out.insert(normalized.clone());

    for (idx, word) in words.iter().enumerate() {
        for mutated in word_mutations(word) {
            out.insert(replace_word(&words, idx, &mutated));
        }
    }

    if words.len() > 1 {
        for word in words.iter().filter(|w| char_len(w) > 2) {
            out.insert((*word).to_string());
        }
        for pair in words.windows(2) {
            out.insert(pair.join(" "));
        }
    }

    let mut variants = out.into_vec();
    // slice::sort_by is stable, ties stay in first-seen order
    variants[1..].sort_by(|a, b| char_len(b).cmp(&char_len(a)));
    variants
}

fn word_mutations(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let len = chars.len();
    let mut out = Vec::new();
    if len <= 2 {
        return out;
    }

    let collapsed = collapse_doubles(&chars);
    if collapsed != word {
        out.push(collapsed);
    }

    for i in 0..len - 1 {
        if chars[i] == chars[i + 1] {
            out.push(without(&chars, i));
        }
    }

    for letter in 'a'..='z' {
        let double: String = [letter, letter].iter().collect();
        if word.contains(&double) {
            out.push(word.replace(&double, &letter.to_string()));
        }
    }

    if len <= 3 {
        return out;
    }

    // Extra letter typed. len > 3 keeps every deletion at 3+ chars.
    for i in 0..len {
        out.push(without(&chars, i));
    }

    // Letters typed out of order.
    for i in 0..len - 1 {
        if chars[i] != chars[i + 1] {
            let mut swapped = chars.clone();
            swapped.swap(i, i + 1);
            out.push(swapped.into_iter().collect());
        }
    }

    for (from, to) in PHONETIC_RULES {
        if word.contains(from) {
            out.push(word.replace(from, to));
        }
    }

    out
}

/// Repeatedly halve doubled characters until none are left.
fn collapse_doubles(chars: &[char]) -> String {
    let mut current = chars.to_vec();
    loop {
        let mut next = Vec::with_capacity(current.len());
        let mut i = 0;
        while i < current.len() {
            next.push(current[i]);
            if i + 1 < current.len() && current[i] == current[i + 1] {
                i += 2;
            } else {
                i += 1;
            }
        }
        if next.len() == current.len() {
            return next.into_iter().collect();
        }
        current = next;
    }
}

fn without(chars: &[char], idx: usize) -> String {
    chars
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .map(|(_, c)| *c)
        .collect()
}

fn replace_word(words: &[&str], idx: usize, replacement: &str) -> String {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| if i == idx { replacement } else { *w })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[derive(Default)]
struct OrderedSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn insert(&mut self, value: String) {
        if self.seen.insert(value.clone()) {
            self.items.push(value);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}
