//! Ordered post-match correction passes.
//!
//! After a pattern matches, the raw field map goes through a fixed, documented
//! chain of corrections. Order matters: short start years must be completed
//! before end years can borrow their century, and months must be dropped or
//! resolved before anything renders them. Each pass is scoped to the field
//! deletions and rewrites listed on its variant; a pass that detects an
//! inconsistency aborts the whole parse.

use crate::fields::ParsedFields;
use crate::normalize::{calc_end_year, correct_year, lookup_month};

/// One correction pass over a parsed field map.
///
/// The default chain is [`DEFAULT_CORRECTIONS`]; rule sets run it in order
/// after every successful pattern match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Delete a generic `month` made redundant by `start_month`/`end_month`.
    DropShadowedMonth,
    /// Resolve `month`, `start_month` and `end_month` to canonical month
    /// names; fields that resolve to nothing are deleted.
    ResolveMonths,
    /// Rewrite any captured supplement marker (`SUP.`, `SUPP.`, ...) to the
    /// canonical value `Supplement`.
    NormalizeSupplement,
    /// Complete 3-digit `year` and `start_year` fragments to 4 digits.
    CorrectShortYears,
    /// Complete a short `end_year` from the start year's century, with
    /// rollover (`1999` + `02` → `2002`).
    CompleteEndYears,
    /// With `year`, `start_year` and `end_year` all present, a `year` outside
    /// the inclusive range means two derivations disagree: discard the parse.
    CheckYearAgreement,
}

/// The default correction chain, applied in this exact order.
pub const DEFAULT_CORRECTIONS: &[Correction] = &[
    Correction::DropShadowedMonth,
    Correction::ResolveMonths,
    Correction::NormalizeSupplement,
    Correction::CorrectShortYears,
    Correction::CompleteEndYears,
    Correction::CheckYearAgreement,
];

impl Correction {
    /// Apply this pass to `fields`. Returns `false` when the pass detected an
    /// inconsistency and the parse must be discarded.
    pub fn apply(self, fields: &mut ParsedFields) -> bool {
        match self {
            Correction::DropShadowedMonth => {
                if fields.contains("start_month") || fields.contains("end_month") {
                    fields.remove("month");
                }
                true
            }
            Correction::ResolveMonths => {
                for name in ["month", "start_month", "end_month"] {
                    let Some(raw) = fields.get(name).map(str::to_string) else { continue };
                    match lookup_month(&raw) {
                        Some(month) => fields.set(name, month),
                        None => {
                            fields.remove(name);
                        }
                    }
                }
                true
            }
            Correction::NormalizeSupplement => {
                if fields.contains("supplement") {
                    fields.set("supplement", "Supplement");
                }
                true
            }
            Correction::CorrectShortYears => {
                for name in ["year", "start_year"] {
                    if let Some(raw) = fields.get(name) {
                        if raw.len() == 3 {
                            let fixed = correct_year(raw);
                            fields.set(name, fixed);
                        }
                    }
                }
                true
            }
            Correction::CompleteEndYears => {
                let Some(end) = fields.get("end_year").map(str::to_string) else { return true };
                if end.len() >= 4 {
                    return true;
                }
                let completed = match fields.get("start_year") {
                    Some(start) => calc_end_year(start, &end),
                    // no start year to borrow a century from; a 3-digit
                    // fragment can still stand alone
                    None => correct_year(&end),
                };
                fields.set("end_year", completed);
                true
            }
            Correction::CheckYearAgreement => {
                let (Some(year), Some(start), Some(end)) =
                    (fields.get("year"), fields.get("start_year"), fields.get("end_year"))
                else {
                    return true;
                };
                let (Ok(year), Ok(start), Ok(end)) =
                    (year.parse::<u32>(), start.parse::<u32>(), end.parse::<u32>())
                else {
                    return true;
                };
                (start..=end).contains(&year)
            }
        }
    }
}

/// Run `chain` over `fields` in order; `false` means the parse is discarded.
pub fn run_chain(chain: &[Correction], fields: &mut ParsedFields) -> bool {
    chain.iter().all(|pass| pass.apply(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> ParsedFields {
        pairs.iter().copied().collect()
    }

    #[test]
    fn shadowed_month_is_dropped_then_resolved() {
        let mut f = fields(&[("year", "1998"), ("start_month", "JAN"), ("month", "JAN"), ("end_month", "FEB")]);
        assert!(run_chain(DEFAULT_CORRECTIONS, &mut f));
        assert_eq!(f.get("month"), None);
        assert_eq!(f.get("start_month"), Some("January"));
        assert_eq!(f.get("end_month"), Some("February"));
    }

    #[test]
    fn unresolvable_month_is_deleted() {
        let mut f = fields(&[("month", "SUP"), ("year", "1985")]);
        assert!(run_chain(DEFAULT_CORRECTIONS, &mut f));
        assert_eq!(f.get("month"), None);
        assert_eq!(f.get("year"), Some("1985"));
    }

    #[test]
    fn numeric_months_resolve() {
        let mut f = fields(&[("month", "08")]);
        assert!(run_chain(DEFAULT_CORRECTIONS, &mut f));
        assert_eq!(f.get("month"), Some("August"));
    }

    #[test]
    fn supplement_is_normalized() {
        let mut f = fields(&[("supplement", "SUP.")]);
        assert!(run_chain(DEFAULT_CORRECTIONS, &mut f));
        assert_eq!(f.get("supplement"), Some("Supplement"));
    }

    #[test]
    fn short_years_complete_in_order() {
        // start year must be corrected before the end year borrows its century
        let mut f = fields(&[("start_year", "989"), ("end_year", "92")]);
        assert!(run_chain(DEFAULT_CORRECTIONS, &mut f));
        assert_eq!(f.get("start_year"), Some("1989"));
        assert_eq!(f.get("end_year"), Some("1992"));
    }

    #[test]
    fn end_year_rolls_over_centuries() {
        let mut f = fields(&[("start_year", "1999"), ("end_year", "02")]);
        assert!(run_chain(DEFAULT_CORRECTIONS, &mut f));
        assert_eq!(f.get("end_year"), Some("2002"));
    }

    #[test]
    fn disagreeing_year_derivations_discard_the_parse() {
        let mut f = fields(&[("year", "1985"), ("start_year", "1990"), ("end_year", "1992")]);
        assert!(!run_chain(DEFAULT_CORRECTIONS, &mut f));

        let mut f = fields(&[("year", "1991"), ("start_year", "1990"), ("end_year", "1992")]);
        assert!(run_chain(DEFAULT_CORRECTIONS, &mut f));
    }
}
