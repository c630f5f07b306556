/// Format a count with a singular or plural noun: `1 page`, `3 pages`.
pub fn plural_count(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
