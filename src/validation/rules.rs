//! Declarative field rules.
//!
//! A [`RuleSet`] is an ordered list of [`FieldRule`]s plus composite rules
//! that relate several fields. Running it over a JSON object produces the
//! ordered list of [`ValidationError`]s and rewrites every processed field
//! into its canonical form (trimmed, lower-cased, numerically coerced).
//!
//! # Semantics
//! - Field rules run in declaration order.
//! - Within a field, the first failing check wins; later checks are skipped.
//! - A failure in one field never stops the others.
//! - Optional fields that are absent, null or blank skip every check.
//! - Composite rules run last and only over fields that passed on their own.
//!   A comparison failure is reported at its field's declared position; an
//!   "any of" failure is reported after every field.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

const REDACTED: &str = "[REDACTED]";

/// One field-level failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub rejected_value: Value,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, rejected_value: Value) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rejected_value,
        }
    }
}

/// Whether a missing field is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// How a raw value is normalized before checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// String, trimmed.
    Text,
    /// String, trimmed and lower-cased.
    Email,
    /// String, left untouched and never echoed back in errors.
    Secret,
    /// Whole number; numeric strings are accepted.
    Integer,
    /// Any finite number; numeric strings are accepted.
    Decimal,
}

impl FieldKind {
    fn default_mismatch(self, field: &str) -> String {
        match self {
            FieldKind::Text | FieldKind::Email | FieldKind::Secret => {
                format!("{field} must be a string")
            }
            FieldKind::Integer => format!("{field} must be an integer"),
            FieldKind::Decimal => format!("{field} must be a number"),
        }
    }

    /// Coerce `raw` into this kind's canonical value, or `None` on a type mismatch.
    fn normalize(self, raw: &Value) -> Option<Value> {
        match self {
            FieldKind::Text => raw.as_str().map(|s| Value::String(s.trim().to_string())),
            FieldKind::Email => raw
                .as_str()
                .map(|s| Value::String(s.trim().to_lowercase())),
            FieldKind::Secret => raw.as_str().map(|s| Value::String(s.to_string())),
            FieldKind::Integer => coerce_integer(raw).map(Value::from),
            FieldKind::Decimal => coerce_decimal(raw)
                .and_then(Number::from_f64)
                .map(Value::Number),
        }
    }
}

fn coerce_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_decimal(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Absent, null, or a string that is empty once trimmed.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// A single predicate over a normalized value.
#[derive(Debug, Clone)]
pub enum Check {
    /// Character count within `min..=max`.
    Length { min: usize, max: usize },
    Pattern(Regex),
    Email,
    /// Numeric value within the optional bounds (inclusive).
    Range { min: Option<f64>, max: Option<f64> },
    /// At most this many digits after the decimal point.
    DecimalPlaces(u32),
    OneOf(&'static [&'static str]),
    Custom(fn(&Value) -> bool),
}

impl Check {
    fn passes(&self, value: &Value) -> bool {
        match self {
            Check::Length { min, max } => value
                .as_str()
                .map(|s| (*min..=*max).contains(&s.chars().count()))
                .unwrap_or(false),
            Check::Pattern(regex) => value.as_str().map(|s| regex.is_match(s)).unwrap_or(false),
            Check::Email => value
                .as_str()
                .map(|s| EMAIL_PATTERN.is_match(s))
                .unwrap_or(false),
            Check::Range { min, max } => value
                .as_f64()
                .map(|n| min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m))
                .unwrap_or(false),
            Check::DecimalPlaces(places) => value
                .as_f64()
                .map(|n| {
                    let scaled = n * 10f64.powi(*places as i32);
                    (scaled - scaled.round()).abs() < 1e-6
                })
                .unwrap_or(false),
            Check::OneOf(allowed) => value.as_str().map(|s| allowed.contains(&s)).unwrap_or(false),
            Check::Custom(predicate) => predicate(value),
        }
    }
}

#[derive(Debug, Clone)]
struct RuleCheck {
    check: Check,
    message: Cow<'static, str>,
}

/// Rule for one named field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: &'static str,
    kind: FieldKind,
    presence: Presence,
    required_message: Cow<'static, str>,
    mismatch_message: Cow<'static, str>,
    escape_markup: bool,
    checks: Vec<RuleCheck>,
}

/// Replace `<` and `>` with their HTML entities.
fn escape_html(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

impl FieldRule {
    fn new(field: &'static str, kind: FieldKind) -> Self {
        Self {
            field,
            kind,
            presence: Presence::Optional,
            required_message: Cow::Owned(format!("{field} is required")),
            mismatch_message: Cow::Owned(kind.default_mismatch(field)),
            escape_markup: false,
            checks: Vec::new(),
        }
    }

    pub fn text(field: &'static str) -> Self {
        Self::new(field, FieldKind::Text)
    }

    pub fn email(field: &'static str) -> Self {
        Self::new(field, FieldKind::Email)
    }

    pub fn secret(field: &'static str) -> Self {
        Self::new(field, FieldKind::Secret)
    }

    pub fn integer(field: &'static str) -> Self {
        Self::new(field, FieldKind::Integer)
    }

    pub fn decimal(field: &'static str) -> Self {
        Self::new(field, FieldKind::Decimal)
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Make the field mandatory, reporting `message` when it is missing.
    pub fn required(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.presence = Presence::Required;
        self.required_message = message.into();
        self
    }

    /// Message reported when the value cannot be coerced to the field's kind.
    pub fn mismatch(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.mismatch_message = message.into();
        self
    }

    /// Escape `<` and `>` in the canonical value.
    pub fn escape_markup(mut self) -> Self {
        self.escape_markup = true;
        self
    }

    fn check(mut self, check: Check, message: impl Into<Cow<'static, str>>) -> Self {
        self.checks.push(RuleCheck {
            check,
            message: message.into(),
        });
        self
    }

    pub fn length(self, min: usize, max: usize, message: impl Into<Cow<'static, str>>) -> Self {
        self.check(Check::Length { min, max }, message)
    }

    pub fn min_length(self, min: usize, message: impl Into<Cow<'static, str>>) -> Self {
        self.check(Check::Length { min, max: usize::MAX }, message)
    }

    pub fn max_length(self, max: usize, message: impl Into<Cow<'static, str>>) -> Self {
        self.check(Check::Length { min: 0, max }, message)
    }

    pub fn pattern(self, regex: Regex, message: impl Into<Cow<'static, str>>) -> Self {
        self.check(Check::Pattern(regex), message)
    }

    pub fn valid_email(self, message: impl Into<Cow<'static, str>>) -> Self {
        self.check(Check::Email, message)
    }

    pub fn range(self, min: f64, max: f64, message: impl Into<Cow<'static, str>>) -> Self {
        self.check(
            Check::Range {
                min: Some(min),
                max: Some(max),
            },
            message,
        )
    }

    pub fn min(self, min: f64, message: impl Into<Cow<'static, str>>) -> Self {
        self.check(Check::Range { min: Some(min), max: None }, message)
    }

    pub fn max(self, max: f64, message: impl Into<Cow<'static, str>>) -> Self {
        self.check(Check::Range { min: None, max: Some(max) }, message)
    }

    pub fn decimal_places(self, places: u32, message: impl Into<Cow<'static, str>>) -> Self {
        self.check(Check::DecimalPlaces(places), message)
    }

    pub fn one_of(self, allowed: &'static [&'static str], message: impl Into<Cow<'static, str>>) -> Self {
        self.check(Check::OneOf(allowed), message)
    }

    pub fn custom(self, predicate: fn(&Value) -> bool, message: impl Into<Cow<'static, str>>) -> Self {
        self.check(Check::Custom(predicate), message)
    }

    fn rejected(&self, value: &Value) -> Value {
        if self.kind == FieldKind::Secret && !value.is_null() {
            Value::String(REDACTED.to_string())
        } else {
            value.clone()
        }
    }

    fn error(&self, message: &str, value: &Value) -> ValidationError {
        ValidationError::new(self.field, message, self.rejected(value))
    }

    /// Normalize the field in place and run its checks.
    fn apply(&self, input: &mut Map<String, Value>) -> Option<ValidationError> {
        if is_blank(input.get(self.field)) {
            return match self.presence {
                Presence::Required => {
                    let raw = input.get(self.field).cloned().unwrap_or(Value::Null);
                    Some(self.error(&self.required_message, &raw))
                }
                Presence::Optional => {
                    if let Some(slot) = input.get_mut(self.field) {
                        *slot = Value::Null;
                    }
                    None
                }
            };
        }

        let raw = input.get(self.field).cloned().unwrap_or(Value::Null);
        let normalized = match self.kind.normalize(&raw) {
            Some(Value::String(text)) if self.escape_markup => Value::String(escape_html(&text)),
            Some(value) => value,
            None => return Some(self.error(&self.mismatch_message, &raw)),
        };
        input.insert(self.field.to_string(), normalized.clone());

        // Trimming can leave nothing behind.
        if is_blank(Some(&normalized)) && self.presence == Presence::Required {
            return Some(self.error(&self.required_message, &normalized));
        }

        self.checks
            .iter()
            .find(|c| !c.check.passes(&normalized))
            .map(|c| self.error(&c.message, &normalized))
    }
}

/// Rule spanning several fields. Runs after every field rule.
#[derive(Debug, Clone)]
pub enum CompositeRule {
    /// `holds(input[field], input[other])` must be true. Skipped unless both
    /// fields are present and passed their own rules.
    Compare {
        field: &'static str,
        other: &'static str,
        holds: fn(&Value, &Value) -> bool,
        message: Cow<'static, str>,
    },
    /// At least one of `fields` must be present.
    AnyOf {
        fields: &'static [&'static str],
        message: Cow<'static, str>,
    },
}

/// Field name reported by [`CompositeRule::AnyOf`] failures.
pub const BODY_FIELD: &str = "body";

/// Ordered collection of rules for one kind of input.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<FieldRule>,
    composites: Vec<CompositeRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    /// Require `holds(field, other)`, reporting the failure on `field`.
    pub fn compare(
        mut self,
        field: &'static str,
        other: &'static str,
        holds: fn(&Value, &Value) -> bool,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.composites.push(CompositeRule::Compare {
            field,
            other,
            holds,
            message: message.into(),
        });
        self
    }

    pub fn require_any(mut self, fields: &'static [&'static str], message: impl Into<Cow<'static, str>>) -> Self {
        self.composites.push(CompositeRule::AnyOf {
            fields,
            message: message.into(),
        });
        self
    }

    /// Declared position of `field`, or past the end for unknown names.
    fn position(&self, field: &str) -> usize {
        self.fields
            .iter()
            .position(|rule| rule.field == field)
            .unwrap_or(self.fields.len())
    }

    /// Validate and normalize `input` in place.
    ///
    /// Returns every failure in declaration order. Fields are normalized even
    /// when other fields (or later composite rules) fail.
    pub fn validate(&self, input: &mut Map<String, Value>) -> Vec<ValidationError> {
        let mut errors: Vec<(usize, ValidationError)> = self
            .fields
            .iter()
            .enumerate()
            .filter_map(|(position, rule)| rule.apply(input).map(|e| (position, e)))
            .collect();

        let failed: HashSet<String> = errors.iter().map(|(_, e)| e.field.clone()).collect();

        for composite in &self.composites {
            match composite {
                CompositeRule::Compare {
                    field,
                    other,
                    holds,
                    message,
                } => {
                    if failed.contains(*field) || failed.contains(*other) {
                        continue;
                    }
                    let (Some(left), Some(right)) = (input.get(*field), input.get(*other)) else {
                        continue;
                    };
                    if left.is_null() || right.is_null() {
                        continue;
                    }
                    if !holds(left, right) {
                        errors.push((
                            self.position(field),
                            ValidationError::new(*field, message.to_string(), left.clone()),
                        ));
                    }
                }
                CompositeRule::AnyOf { fields, message } => {
                    let present = fields.iter().any(|f| !is_blank(input.get(*f)));
                    if !present {
                        errors.push((
                            usize::MAX,
                            ValidationError::new(BODY_FIELD, message.to_string(), Value::Null),
                        ));
                    }
                }
            }
        }

        // Stable, so errors sharing a position keep their evaluation order.
        errors.sort_by_key(|(position, _)| *position);
        errors.into_iter().map(|(_, error)| error).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn user_rules() -> RuleSet {
        RuleSet::new()
            .field(
                FieldRule::text("name")
                    .required("Name is required")
                    .length(2, 100, "Name must be between 2 and 100 characters"),
            )
            .field(
                FieldRule::email("email")
                    .required("Email is required")
                    .valid_email("Valid email is required"),
            )
            .field(
                FieldRule::integer("age")
                    .range(0.0, 150.0, "Age must be between 0 and 150"),
            )
    }

    #[test]
    fn test_valid_input_is_normalized() {
        let mut input = object(json!({"name": "  Bob  ", "email": " BOB@X.COM ", "age": "42"}));
        let errors = user_rules().validate(&mut input);

        assert!(errors.is_empty());
        assert_eq!(input["name"], "Bob");
        assert_eq!(input["email"], "bob@x.com");
        assert_eq!(input["age"], 42);
    }

    #[test]
    fn test_errors_follow_declaration_order() {
        let mut input = object(json!({"age": 200, "email": "nope"}));
        let errors = user_rules().validate(&mut input);

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "age"]);
        assert_eq!(errors[0].message, "Name is required");
        assert_eq!(errors[1].rejected_value, "nope");
    }

    #[test]
    fn test_first_failing_check_stops_the_field() {
        let rules = RuleSet::new().field(
            FieldRule::text("code")
                .required("required")
                .length(3, 5, "bad length")
                .pattern(Regex::new("^[0-9]+$").unwrap(), "digits only"),
        );
        let mut input = object(json!({"code": "a"}));
        let errors = rules.validate(&mut input);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "bad length");
    }

    #[test]
    fn test_optional_blank_field_skips_checks() {
        let rules = RuleSet::new().field(
            FieldRule::text("description").max_length(3, "too long"),
        );

        let mut missing = Map::new();
        assert!(rules.validate(&mut missing).is_empty());
        assert!(!missing.contains_key("description"));

        let mut blank = object(json!({"description": "    "}));
        assert!(rules.validate(&mut blank).is_empty());
        assert_eq!(blank["description"], Value::Null);
    }

    #[test]
    fn test_required_field_that_trims_to_nothing() {
        let mut input = object(json!({"name": "   ", "email": "a@b.co"}));
        let errors = user_rules().validate(&mut input);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Name is required");
    }

    #[test]
    fn test_coercion_failure_is_a_field_error() {
        let rules = RuleSet::new().field(
            FieldRule::integer("stock")
                .mismatch("Stock must be an integer")
                .min(0.0, "Stock cannot be negative"),
        );

        let mut input = object(json!({"stock": "lots"}));
        let errors = rules.validate(&mut input);
        assert_eq!(errors[0].message, "Stock must be an integer");
        assert_eq!(errors[0].rejected_value, "lots");

        let mut fractional = object(json!({"stock": 1.5}));
        assert_eq!(rules.validate(&mut fractional)[0].message, "Stock must be an integer");

        let mut negative = object(json!({"stock": "-1"}));
        let errors = rules.validate(&mut negative);
        assert_eq!(errors[0].message, "Stock cannot be negative");
        assert_eq!(negative["stock"], -1);
    }

    #[test]
    fn test_text_field_rejects_non_strings() {
        let mut input = object(json!({"name": 12, "email": "a@b.co"}));
        let errors = user_rules().validate(&mut input);
        assert_eq!(errors[0].message, "name must be a string");
    }

    #[test]
    fn test_normalization_survives_other_failures() {
        let mut input = object(json!({"name": "x", "email": "  MIXED@Case.Org "}));
        let errors = user_rules().validate(&mut input);

        assert_eq!(errors.len(), 1);
        assert_eq!(input["email"], "mixed@case.org");
        assert_eq!(input["name"], "x");
    }

    #[test]
    fn test_errors_are_not_deduplicated() {
        let rules = RuleSet::new()
            .field(FieldRule::text("a").required("missing"))
            .field(FieldRule::text("b").required("missing"));
        let errors = rules.validate(&mut Map::new());
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, errors[1].message);
    }

    #[test]
    fn test_decimal_places() {
        let rules = RuleSet::new().field(
            FieldRule::decimal("price")
                .required("Price is required")
                .decimal_places(2, "too precise"),
        );

        let mut ok = object(json!({"price": 29.99}));
        assert!(rules.validate(&mut ok).is_empty());

        let mut textual = object(json!({"price": "10.5"}));
        assert!(rules.validate(&mut textual).is_empty());
        assert_eq!(textual["price"], 10.5);

        let mut bad = object(json!({"price": 1.999}));
        assert_eq!(rules.validate(&mut bad)[0].message, "too precise");
    }

    #[test]
    fn test_compare_runs_only_after_both_fields_pass() {
        let rules = RuleSet::new()
            .field(FieldRule::decimal("minPrice").min(0.0, "min negative"))
            .field(FieldRule::decimal("maxPrice").min(0.0, "max negative"))
            .compare(
                "maxPrice",
                "minPrice",
                |max, min| max.as_f64() >= min.as_f64(),
                "max below min",
            );

        let mut inverted = object(json!({"minPrice": "10", "maxPrice": "5"}));
        let errors = rules.validate(&mut inverted);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "maxPrice");
        assert_eq!(errors[0].message, "max below min");

        // The individual failure is reported, the comparison is not.
        let mut broken = object(json!({"minPrice": "-1", "maxPrice": "5"}));
        let errors = rules.validate(&mut broken);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "min negative");

        let mut one_sided = object(json!({"maxPrice": "5"}));
        assert!(rules.validate(&mut one_sided).is_empty());
    }

    #[test]
    fn test_comparison_failure_keeps_declared_position() {
        let rules = RuleSet::new()
            .field(FieldRule::decimal("minPrice"))
            .field(FieldRule::decimal("maxPrice"))
            .field(FieldRule::text("sortBy").one_of(&["name"], "bad sort"))
            .compare(
                "maxPrice",
                "minPrice",
                |max, min| max.as_f64() >= min.as_f64(),
                "max below min",
            );

        let mut input = object(json!({"minPrice": 50, "maxPrice": 10, "sortBy": "colour"}));
        let errors = rules.validate(&mut input);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["maxPrice", "sortBy"]);
    }

    #[test]
    fn test_escape_markup() {
        let rules = RuleSet::new()
            .field(FieldRule::text("description").escape_markup())
            .field(FieldRule::text("title"));
        let mut input = object(json!({
            "description": "  <script>alert(1)</script> ",
            "title": "<b>"
        }));

        assert!(rules.validate(&mut input).is_empty());
        assert_eq!(input["description"], "&lt;script&gt;alert(1)&lt;/script&gt;");
        assert_eq!(input["title"], "<b>");
    }

    #[test]
    fn test_require_any() {
        let rules = RuleSet::new()
            .field(FieldRule::text("name"))
            .field(FieldRule::email("email"))
            .require_any(&["name", "email"], "nothing to update");

        let mut empty = object(json!({"name": "  "}));
        let errors = rules.validate(&mut empty);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, BODY_FIELD);

        let mut some = object(json!({"email": "a@b.co"}));
        assert!(rules.validate(&mut some).is_empty());
    }

    #[test]
    fn test_secret_values_are_redacted() {
        let rules = RuleSet::new().field(
            FieldRule::secret("password").min_length(8, "too short"),
        );
        let mut input = object(json!({"password": " abc "}));
        let errors = rules.validate(&mut input);

        assert_eq!(errors[0].rejected_value, REDACTED);
        // Secrets are not trimmed.
        assert_eq!(input["password"], " abc ");
    }

    #[test]
    fn test_one_of() {
        let rules = RuleSet::new().field(
            FieldRule::text("order").one_of(&["asc", "desc"], "bad order"),
        );
        let mut input = object(json!({"order": "sideways"}));
        assert_eq!(rules.validate(&mut input)[0].message, "bad order");
    }
}
