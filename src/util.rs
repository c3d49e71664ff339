//! Small utility helpers used across modules.

/// English ordinal for a day number: 1st, 2nd, 3rd, 4th, 11th, 22nd...
pub fn ordinal(n: u32) -> String {
  let suffix = match (n % 10, n % 100) {
    (_, 11..=13) => "th",
    (1, _) => "st",
    (2, _) => "nd",
    (3, _) => "rd",
    _ => "th",
  };
  format!("{}{}", n, suffix)
}

/// English month name for 1..=12; anything else falls back to the number.
pub fn month_name(month: u32) -> String {
  const NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
  ];
  match month {
    1..=12 => NAMES[(month - 1) as usize].to_string(),
    _ => format!("month {}", month),
  }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge user patterns/subjects. Cuts on a char boundary.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}
