//! Stateless normalization helpers shared by every rule set.
//!
//! These are the small, heavily-tested string fixups that run before and after
//! pattern matching: month-name resolution, century correction for short
//! years, duplicate trailing-year removal and generic input preprocessing.
//! They hold no state and touch no I/O; rule sets call them from `parse` and
//! the correction chain calls them per field.

/// Canonical English month names, in calendar order.
pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Resolve a month abbreviation, ordinal or two-letter skip pattern to a
/// canonical month name.
///
/// Resolution rules, first success wins:
/// 1. Case-insensitive prefix match against the canonical name (`"aug."` →
///    `"August"`, `"SEPT."` → `"September"`).
/// 2. Numeric match 1–12 (`"4"` and `"04"` → `"April"`).
/// 3. First-and-last-letter skip match for exactly two letters (`"JE"` →
///    `"June"`, `"MR"` → `"March"`).
///
/// Returns `None` when nothing resolves (`"SUP"`, `"13"`).
pub fn lookup_month(mon: &str) -> Option<&'static str> {
    let abbrev = mon.trim().trim_end_matches('.');
    if abbrev.is_empty() {
        return None;
    }

    let lower = abbrev.to_ascii_lowercase();
    for month in MONTHS {
        if month.to_ascii_lowercase().starts_with(&lower) {
            return Some(month);
        }
    }

    if let Ok(n) = abbrev.parse::<usize>() {
        if (1..=12).contains(&n) {
            return Some(MONTHS[n - 1]);
        }
    }

    let letters: Vec<char> = lower.chars().collect();
    if let [first, last] = letters[..] {
        for month in MONTHS {
            let ml = month.to_ascii_lowercase();
            let mut chars = ml.chars();
            if chars.next() == Some(first) && chars.any(|c| c == last) {
                return Some(month);
            }
        }
    }

    None
}

/// Prefix a century digit onto a 2–3 digit year fragment.
///
/// Values below 700 get a `2`, values 700–999 get a `1`. This encodes the
/// corpus bias toward the 1700s–1900s; both `1650` and `2650` are wrong for a
/// stray `650`, so the rule picks the one that keeps modern material sane.
/// Already-4-digit or non-numeric input is returned unchanged.
pub fn correct_year(year: impl ToString) -> String {
    let year = year.to_string();
    match year.parse::<u32>() {
        Ok(n) if year.len() < 4 && n < 700 => format!("2{year}"),
        Ok(n) if year.len() < 4 && n < 1000 => format!("1{year}"),
        _ => year,
    }
}

/// Complete a 2–3 digit end-year fragment from a 4-digit start year.
///
/// A 2-digit end reuses the start year's century unless it is numerically
/// less than the start year's last two digits, in which case the century
/// rolls over (`"1999"` + `"02"` → `"2002"`). A 3-digit end goes through
/// [`correct_year`]. Anything else is returned unchanged.
pub fn calc_end_year(start_year: &str, end_year: &str) -> String {
    let two_digit = regex!(r"^\d\d$");
    let three_digit = regex!(r"^\d\d\d$");

    if two_digit.is_match(end_year) && start_year.len() == 4 {
        let start_tail: u32 = start_year[2..4].parse().unwrap_or(0);
        let end_num: u32 = end_year.parse().unwrap_or(0);
        let century: u32 = start_year[0..2].parse().unwrap_or(0);
        if end_num < start_tail {
            // crosses a century, e.g. 1998-01
            format!("{}{end_year}", century + 1)
        } else {
            format!("{}{end_year}", &start_year[0..2])
        }
    } else if three_digit.is_match(end_year) {
        correct_year(end_year)
    } else {
        end_year.to_string()
    }
}

/// Drop the second of two identical trailing 4-digit years.
///
/// `"V. 91, NO. 13-18 1999 1999"` → `"V. 91, NO. 13-18 1999"`; differing
/// years are left alone.
pub fn remove_dupe_years(ec_string: &str) -> String {
    let dupe = regex!(r" (?<first>\d{4}) (?<second>\d{4})$");
    if let Some(caps) = dupe.captures(ec_string) {
        if caps["first"] == caps["second"] {
            return regex!(r" \d{4}$").replace(ec_string, "").into_owned();
        }
    }
    ec_string.to_string()
}

/// Generic preprocessing applied to every EC string before matching.
///
/// Promotes a bare 3-digit `9xx` year to `19xx`, strips a leading copy
/// annotation (`C. 1 ` / `C. 2 `) and tightens spaced parentheses.
pub fn preprocess(ec_string: &str) -> String {
    let mut s = ec_string.to_string();
    if regex!(r"^9\d\d$").is_match(&s) {
        s = format!("1{s}");
    }
    let s = regex!(r"^C\. [1-2] ").replace(&s, "");
    let s = regex!(r"\(\s").replace_all(&s, "(");
    regex!(r"\s\)").replace_all(&s, ")").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_month_resolves_abbreviations() {
        assert_eq!(lookup_month("aug."), Some("August"));
        assert_eq!(lookup_month("SEPT."), Some("September"));
        assert_eq!(lookup_month("NOV"), Some("November"));
        assert_eq!(lookup_month("May"), Some("May"));
    }

    #[test]
    fn lookup_month_resolves_ordinals() {
        assert_eq!(lookup_month("4"), Some("April"));
        assert_eq!(lookup_month("04"), Some("April"));
        assert_eq!(lookup_month("12"), Some("December"));
        assert_eq!(lookup_month("13"), None);
        assert_eq!(lookup_month("0"), None);
    }

    #[test]
    fn lookup_month_resolves_skip_patterns() {
        assert_eq!(lookup_month("JE"), Some("June"));
        assert_eq!(lookup_month("JE."), Some("June"));
        assert_eq!(lookup_month("MR"), Some("March"));
        assert_eq!(lookup_month("JA"), Some("January"));
    }

    #[test]
    fn lookup_month_rejects_junk() {
        assert_eq!(lookup_month("SUP"), None);
        assert_eq!(lookup_month(""), None);
        assert_eq!(lookup_month("."), None);
    }

    #[test]
    fn correct_year_picks_century() {
        assert_eq!(correct_year("005"), "2005");
        assert_eq!(correct_year(895), "1895");
        // bogus but deliberate: below 700 is assumed modern
        assert_eq!(correct_year(650), "2650");
        assert_eq!(correct_year("1985"), "1985");
    }

    #[test]
    fn calc_end_year_completes_fragments() {
        assert_eq!(calc_end_year("1995", "998"), "1998");
        assert_eq!(calc_end_year("1995", "98"), "1998");
        assert_eq!(calc_end_year("1999", "02"), "2002");
        assert_eq!(calc_end_year("1999", "002"), "2002");
        assert_eq!(calc_end_year("1995", "1998"), "1998");
    }

    #[test]
    fn remove_dupe_years_cuts_exact_repeats() {
        assert_eq!(remove_dupe_years("V. 91, NO. 13-18 1999 1999"), "V. 91, NO. 13-18 1999");
        assert_eq!(remove_dupe_years("V. 91, NO. 13-18 1999 2000"), "V. 91, NO. 13-18 1999 2000");
        assert_eq!(remove_dupe_years("V. 91"), "V. 91");
    }

    #[test]
    fn preprocess_strips_copy_noise() {
        assert_eq!(preprocess("C. 1 V. 5 1990 PP. 4783-5463"), "V. 5 1990 PP. 4783-5463");
        assert_eq!(preprocess("985"), "1985");
        assert_eq!(preprocess("NO. 5 ( 1985 )"), "NO. 5 (1985)");
    }
}
