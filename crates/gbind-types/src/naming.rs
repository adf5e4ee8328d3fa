//! Identifier case conversion shared by every generated name.

/// Convert a CamelCase identifier to UPPER_SNAKE_CASE.
///
/// An uppercase run is split before its last letter when that letter
/// starts a lowercase word (`NNConv` → `NN_CONV`), a lowercase letter
/// followed by an uppercase letter or digit is split (`Conv1d` →
/// `CONV_1D`), and dashes become underscores.
pub fn camel_to_snake(camel: &str) -> String {
    let chars: Vec<char> = camel.chars().collect();

    let mut split_runs = Vec::with_capacity(chars.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
        let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
        if prev_upper && (c.is_ascii_uppercase() || c.is_ascii_digit()) && next_lower {
            split_runs.push('_');
        }
        split_runs.push(c);
    }

    let mut out = String::with_capacity(split_runs.len() + 4);
    for (i, &c) in split_runs.iter().enumerate() {
        let prev_lower = i > 0 && split_runs[i - 1].is_ascii_lowercase();
        if prev_lower && (c.is_ascii_uppercase() || c.is_ascii_digit()) {
            out.push('_');
        }
        out.push(if c == '-' { '_' } else { c });
    }

    out.to_ascii_uppercase()
}

/// Convert a CamelCase identifier to lower_snake_case.
pub fn camel_to_lower_snake(camel: &str) -> String {
    camel_to_snake(camel).to_ascii_lowercase()
}
