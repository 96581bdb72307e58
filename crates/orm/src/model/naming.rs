//! Table name derivation: snake_case the type name, then pluralize it

/// `BlogPost` -> `blog_post`
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let after_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let ends_acronym = i > 0
                && chars[i - 1].is_uppercase()
                && chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            if (after_lower || ends_acronym) && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// English plural of a lowercase word
///
/// consonant + y -> ies, vowel + y -> ys, o -> oes, anything else -> s
pub fn pluralize(word: &str) -> String {
    let mut chars = word.chars().rev();
    match (chars.next(), chars.next()) {
        (Some('y'), Some(before)) if !is_vowel(before) => {
            format!("{}ies", &word[..word.len() - 1])
        }
        (Some('o'), _) => format!("{}es", word),
        _ => format!("{}s", word),
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Table name for a model type name
pub fn table_name(type_name: &str) -> String {
    pluralize(&snake_case(type_name))
}
