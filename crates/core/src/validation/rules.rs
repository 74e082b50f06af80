//! Rule set and rejection types.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::CoreError;
use crate::report::CspDetails;

/// Trusted document origins: GOV.UK production, preview and the production
/// origin host. Anything else, including look-alike hosts, is rejected.
/// `\s` is Unicode-aware, so the path may not contain any Unicode whitespace
/// (U+00A0 included).
pub const DEFAULT_DOCUMENT_URI_PATTERN: &str =
    r"^https://www(\.preview\.alphagov\.co|-origin\.production\.alphagov\.co|\.gov)\.uk/[^\s]*$";

/// The most complex directive seen in practice looks like
/// `default-src: 'self' https://0.example.com *.gov.uk;`.
pub const VIOLATED_DIRECTIVE_PATTERN: &str = r"^[a-z0-9 '/\*\.:;-]+$";

/// Upper bound, in characters, shared by every constrained field.
pub const MAX_FIELD_CHARS: u64 = 200;

/// A constrained field of [`CspDetails`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    DocumentUri,
    Referrer,
    BlockedUri,
    ViolatedDirective,
    OriginalPolicy,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::DocumentUri => "documentUri",
            Field::Referrer => "referrer",
            Field::BlockedUri => "blockedUri",
            Field::ViolatedDirective => "violatedDirective",
            Field::OriginalPolicy => "originalPolicy",
        }
    }

    pub fn value(self, details: &CspDetails) -> &String {
        match self {
            Field::DocumentUri => &details.document_uri,
            Field::Referrer => &details.referrer,
            Field::BlockedUri => &details.blocked_uri,
            Field::ViolatedDirective => &details.violated_directive,
            Field::OriginalPolicy => &details.original_policy,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the constraint table.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    /// An empty value is a violation.
    pub required: bool,
    pub max_chars: u64,
    /// Applied only to non-empty values.
    pub pattern: Option<Regex>,
}

impl FieldRule {
    fn required(field: Field, pattern: Option<Regex>) -> Self {
        Self {
            field,
            required: true,
            max_chars: MAX_FIELD_CHARS,
            pattern,
        }
    }

    fn optional(field: Field) -> Self {
        Self {
            field,
            required: false,
            max_chars: MAX_FIELD_CHARS,
            pattern: None,
        }
    }
}

/// Which revision of the constraint table is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuleSetVersion {
    /// The original table, before `originalPolicy` was collected.
    V1,
    /// Adds the required `originalPolicy` rule.
    #[default]
    V2,
}

impl RuleSetVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleSetVersion::V1 => "v1",
            RuleSetVersion::V2 => "v2",
        }
    }
}

impl FromStr for RuleSetVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(RuleSetVersion::V1),
            "v2" | "2" => Ok(RuleSetVersion::V2),
            other => Err(CoreError::Config(format!("unknown rule set version '{other}'"))),
        }
    }
}

/// An ordered constraint table. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct RuleSet {
    version: RuleSetVersion,
    rules: Vec<FieldRule>,
}

impl RuleSet {
    /// Build the table for `version` with the given trusted-origin pattern.
    ///
    /// The pattern must be anchored at both ends; an unanchored pattern
    /// would accept look-alike hosts that merely contain a trusted one.
    pub fn for_version(
        version: RuleSetVersion,
        document_uri_pattern: &str,
    ) -> Result<Self, CoreError> {
        if !document_uri_pattern.starts_with('^') || !document_uri_pattern.ends_with('$') {
            return Err(CoreError::Config(
                "document URI pattern must be anchored with '^' and '$'".into(),
            ));
        }

        let document_uri = compile(document_uri_pattern)?;
        let violated_directive = compile(VIOLATED_DIRECTIVE_PATTERN)?;

        let mut rules = vec![
            FieldRule::required(Field::DocumentUri, Some(document_uri)),
            FieldRule::optional(Field::Referrer),
            FieldRule::optional(Field::BlockedUri),
            FieldRule::required(Field::ViolatedDirective, Some(violated_directive)),
        ];
        if version == RuleSetVersion::V2 {
            rules.push(FieldRule::required(Field::OriginalPolicy, None));
        }

        Ok(Self { version, rules })
    }

    /// The current table with the GOV.UK trusted origins.
    pub fn standard() -> Result<Self, CoreError> {
        Self::for_version(RuleSetVersion::default(), DEFAULT_DOCUMENT_URI_PATTERN)
    }

    pub fn version(&self) -> RuleSetVersion {
        self.version
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

fn compile(pattern: &str) -> Result<Regex, CoreError> {
    Regex::new(pattern).map_err(|e| CoreError::Config(format!("invalid pattern '{pattern}': {e}")))
}

/// How a field failed its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    TooLong { max_chars: u64 },
    PatternMismatch,
}

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: Field,
    pub kind: ViolationKind,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::Missing => write!(f, "{}: is required", self.field),
            ViolationKind::TooLong { max_chars } => {
                write!(f, "{}: exceeds {max_chars} characters", self.field)
            }
            ViolationKind::PatternMismatch => {
                write!(f, "{}: does not match the allowed pattern", self.field)
            }
        }
    }
}

/// Why a report was rejected. Operator diagnostics only; never sent to the
/// reporting browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionReason {
    violations: Vec<FieldViolation>,
}

impl RejectionReason {
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn has(&self, field: Field) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RejectionReason {}
