//! Rule evaluator -- pure logic, no I/O.

use validator::ValidateLength;

use super::rules::{FieldRule, FieldViolation, RejectionReason, RuleSet, ViolationKind};
use crate::report::{CspDetails, CspReport};

/// Check a report against every rule in `rules`.
///
/// All rules are evaluated so the rejection lists every failing field.
/// Deterministic and side-effect free.
pub fn validate(report: &CspReport, rules: &RuleSet) -> Result<(), RejectionReason> {
    let violations: Vec<FieldViolation> = rules
        .rules()
        .iter()
        .filter_map(|rule| evaluate_rule(rule, &report.details))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(RejectionReason::new(violations))
    }
}

fn evaluate_rule(rule: &FieldRule, details: &CspDetails) -> Option<FieldViolation> {
    let value = rule.field.value(details);

    let kind = if value.is_empty() {
        if !rule.required {
            return None;
        }
        ViolationKind::Missing
    } else if !value.validate_length(None, Some(rule.max_chars), None) {
        ViolationKind::TooLong {
            max_chars: rule.max_chars,
        }
    } else {
        match &rule.pattern {
            Some(pattern) if !pattern.is_match(value) => ViolationKind::PatternMismatch,
            _ => return None,
        }
    };

    Some(FieldViolation {
        field: rule.field,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;
    use crate::validation::rules::{
        Field, RuleSetVersion, DEFAULT_DOCUMENT_URI_PATTERN, MAX_FIELD_CHARS,
    };

    fn details() -> CspDetails {
        CspDetails {
            document_uri: "https://www.gov.uk/page".into(),
            referrer: String::new(),
            blocked_uri: "https://evil.example.com/".into(),
            violated_directive: "directive".into(),
            original_policy: "policy".into(),
        }
    }

    fn check(details: CspDetails) -> Result<(), RejectionReason> {
        let report = CspReport::received(details, Utc::now());
        validate(&report, &RuleSet::standard().unwrap())
    }

    fn violation_for(details: CspDetails, field: Field) -> ViolationKind {
        let reason = check(details).unwrap_err();
        reason
            .violations()
            .iter()
            .find(|v| v.field == field)
            .map(|v| v.kind)
            .unwrap_or_else(|| panic!("no violation for {field}: {reason}"))
    }

    #[test]
    fn valid_report_is_accepted() {
        assert_matches!(check(details()), Ok(()));
    }

    #[test]
    fn trusted_origins_are_accepted() {
        for uri in [
            "https://www.gov.uk/",
            "https://www.gov.uk/browse/benefits?x=1",
            "https://www.preview.alphagov.co.uk/page",
            "https://www-origin.production.alphagov.co.uk/page",
        ] {
            let mut d = details();
            d.document_uri = uri.into();
            assert_matches!(check(d), Ok(()), "{uri} should be trusted");
        }
    }

    #[test]
    fn untrusted_and_look_alike_origins_are_rejected() {
        for uri in [
            "https://www.example.com/",
            "http://www.gov.uk/page",
            "https://gov.uk/page",
            "https://www.gov.uk.evil.com/page",
            "https://www.gov.uk",
            "https://evilwww.gov.uk/page",
            "https://www.staging.alphagov.co.uk/page",
            "https://www.gov.uk/page with space",
            "https://www.gov.uk/page\nhttps://evil.example.com/",
        ] {
            let mut d = details();
            d.document_uri = uri.into();
            assert_eq!(
                violation_for(d, Field::DocumentUri),
                ViolationKind::PatternMismatch,
                "{uri:?} should be rejected"
            );
        }
    }

    #[test]
    fn unicode_whitespace_in_document_uri_is_rejected() {
        for uri in [
            "https://www.gov.uk/page\u{a0}suffix",
            "https://www.gov.uk/page\u{2003}suffix",
        ] {
            let mut d = details();
            d.document_uri = uri.into();
            assert_eq!(
                violation_for(d, Field::DocumentUri),
                ViolationKind::PatternMismatch,
                "{uri:?} should be rejected"
            );
        }
    }

    #[test]
    fn missing_violated_directive_is_rejected() {
        let mut d = details();
        d.violated_directive.clear();
        assert_eq!(
            violation_for(d, Field::ViolatedDirective),
            ViolationKind::Missing
        );
    }

    #[test]
    fn directive_character_set_is_restricted() {
        let mut ok = details();
        ok.violated_directive = "default-src: 'self' https://0.example.com *.gov.uk;".into();
        assert_matches!(check(ok), Ok(()));

        for directive in ["Script-Src", "script-src <script>", "script-src\u{0}", "a%20b"] {
            let mut d = details();
            d.violated_directive = directive.into();
            assert_eq!(
                violation_for(d, Field::ViolatedDirective),
                ViolationKind::PatternMismatch,
                "{directive:?} should be rejected"
            );
        }
    }

    #[test]
    fn every_constrained_field_is_capped_at_200_chars() {
        for field in [
            Field::DocumentUri,
            Field::Referrer,
            Field::BlockedUri,
            Field::ViolatedDirective,
            Field::OriginalPolicy,
        ] {
            let mut d = details();
            match field {
                Field::DocumentUri => {
                    d.document_uri = format!("https://www.gov.uk/{}", "a".repeat(200))
                }
                Field::Referrer => d.referrer = "r".repeat(201),
                Field::BlockedUri => d.blocked_uri = "b".repeat(201),
                Field::ViolatedDirective => d.violated_directive = "a".repeat(201),
                Field::OriginalPolicy => d.original_policy = "p".repeat(201),
            }
            assert_eq!(
                violation_for(d, field),
                ViolationKind::TooLong {
                    max_chars: MAX_FIELD_CHARS
                },
                "{field} should be capped"
            );
        }
    }

    #[test]
    fn exactly_200_chars_is_accepted() {
        let mut d = details();
        d.referrer = "r".repeat(200);
        d.violated_directive = "a".repeat(200);
        assert_matches!(check(d), Ok(()));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut d = details();
        d.blocked_uri = "é".repeat(200);
        assert_matches!(check(d), Ok(()));
    }

    #[test]
    fn optional_fields_may_be_empty() {
        let mut d = details();
        d.referrer.clear();
        d.blocked_uri.clear();
        assert_matches!(check(d), Ok(()));
    }

    #[test]
    fn all_failures_are_reported_together() {
        let reason = check(CspDetails::default()).unwrap_err();
        assert!(reason.has(Field::DocumentUri));
        assert!(reason.has(Field::ViolatedDirective));
        assert!(reason.has(Field::OriginalPolicy));
        assert!(!reason.has(Field::Referrer));
    }

    #[test]
    fn v1_does_not_require_original_policy() {
        let rules = RuleSet::for_version(RuleSetVersion::V1, DEFAULT_DOCUMENT_URI_PATTERN).unwrap();
        let mut d = details();
        d.original_policy.clear();
        let report = CspReport::received(d, Utc::now());

        assert_matches!(validate(&report, &rules), Ok(()));
        assert!(check(report.details.clone()).is_err());
    }

    #[test]
    fn custom_trusted_origin_pattern() {
        let rules =
            RuleSet::for_version(RuleSetVersion::V2, r"^https://reports\.example\.org/\S*$")
                .unwrap();
        let mut d = details();
        d.document_uri = "https://reports.example.org/a".into();
        let accepted = CspReport::received(d, Utc::now());
        let rejected = CspReport::received(details(), Utc::now());

        assert_matches!(validate(&accepted, &rules), Ok(()));
        assert_matches!(validate(&rejected, &rules), Err(_));
    }

    #[test]
    fn validation_is_repeatable() {
        let rules = RuleSet::standard().unwrap();
        let mut bad = details();
        bad.document_uri = "https://www.example.com/".into();

        for d in [details(), bad] {
            let report = CspReport::received(d, Utc::now());
            let first = validate(&report, &rules);
            let second = validate(&report, &rules);
            assert_eq!(first, second);
        }
    }
}
