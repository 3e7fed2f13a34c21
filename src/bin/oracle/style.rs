//! Terminal output helpers for the oracle CLI

const RESET: &str = "\x1b[0m";

fn paint(code: &str, s: &str) -> String {
    format!("\x1b[{}m{}{}", code, s, RESET)
}

pub fn style_cyan(s: &str) -> String {
    paint("36", s)
}

pub fn style_dim(s: &str) -> String {
    paint("2", s)
}

pub fn style_bold(s: &str) -> String {
    paint("1", s)
}

pub fn print_success(msg: &str) {
    println!("{} {}", paint("32", "✓"), msg);
}

/// Errors go to stderr so piped output stays clean.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", paint("31", "✗"), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", paint("33", "!"), msg);
}

pub fn print_info(msg: &str) {
    println!("{} {}", style_cyan("•"), msg);
}

/// Bold title underlined to its own width.
pub fn print_header(title: &str) {
    println!("\n{}\n{}", style_bold(title), "=".repeat(title.chars().count()));
}

/// Shorten an address for display, keeping the first 8 and last 4 characters.
pub fn truncate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() >= 16 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_address() {
        assert_eq!(
            truncate_address("0x2177b5c7712d3ec53a2f2d47107e2611169c1a45"),
            "0x2177b5...1a45"
        );
        assert_eq!(truncate_address("0xabc"), "0xabc");
    }

    #[test]
    fn test_paint_wraps_and_resets() {
        assert_eq!(style_bold("x"), "\x1b[1mx\x1b[0m");
        assert!(style_cyan("oracle").ends_with(RESET));
    }
}
