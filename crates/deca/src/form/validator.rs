//! Declarative field validation.
//!
//! Rules are data: they come from the controls' markup (`data-bv-*`
//! attributes, `required`, `type="email"`) and from [`ClientConfig::rules`].
//! The validator only evaluates them and hands the result to the view.
//!
//! [`ClientConfig::rules`]: crate::config::ClientConfig::rules

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Control, ControlKind, FormView, postal};
use crate::error::ConfigError;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"));

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    Required,
    Email,
    PostalCode,
    Pattern { pattern: String },
    Length { min: Option<usize>, max: Option<usize> },
}

impl Rule {
    /// Collect rules from a control's attributes.
    pub fn from_attributes<'a>(attributes: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<Rule> {
        let attributes: HashMap<&str, &str> = attributes.into_iter().collect();
        let enabled = |name: &str| {
            attributes
                .get(name)
                .is_some_and(|value| !value.eq_ignore_ascii_case("false"))
        };
        let mut rules = Vec::new();
        if attributes.contains_key("required") || enabled("data-bv-notempty") {
            rules.push(Rule::Required);
        }
        if attributes.get("type").is_some_and(|ty| ty.eq_ignore_ascii_case("email")) || enabled("data-bv-emailaddress") {
            rules.push(Rule::Email);
        }
        if enabled("data-bv-zipcode") {
            rules.push(Rule::PostalCode);
        }
        if let Some(pattern) = attributes.get("data-bv-regexp-regexp").or(attributes.get("pattern")) {
            rules.push(Rule::Pattern { pattern: (*pattern).to_owned() });
        }
        let min = attributes.get("data-bv-stringlength-min").and_then(|value| value.parse().ok());
        let max = attributes
            .get("data-bv-stringlength-max")
            .or(attributes.get("maxlength"))
            .and_then(|value| value.parse().ok());
        if min.is_some() || max.is_some() {
            rules.push(Rule::Length { min, max });
        }
        rules
    }

    fn message(&self) -> String {
        match self {
            Self::Required => "This value is required".to_owned(),
            Self::Email => "Please enter a valid email address".to_owned(),
            Self::PostalCode => "Please enter a valid postal code".to_owned(),
            Self::Pattern { .. } => "Please enter a value matching the pattern".to_owned(),
            Self::Length { min, max } => match (min, max) {
                (Some(min), Some(max)) => format!("Please enter between {min} and {max} characters"),
                (Some(min), None) => format!("Please enter at least {min} characters"),
                (None, Some(max)) => format!("Please enter at most {max} characters"),
                (None, None) => String::new(),
            },
        }
    }
}

/// Extra rules for one field, as written in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    pub field: String,
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub rule: Rule,
    pub message: String,
}

/// Outcome of one validation pass, errors in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first_invalid(&self) -> Option<&str> {
        self.errors.first().map(|error| error.field.as_str())
    }

    pub fn invalid_fields(&self) -> Vec<String> {
        self.errors.iter().map(|error| error.field.clone()).collect()
    }

    pub fn error_for(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|error| error.field == field)
    }
}

pub struct Validator {
    configured: HashMap<String, Vec<Rule>>,
    patterns: HashMap<String, Regex>,
    report: Option<ValidationReport>,
}

impl Validator {
    /// Compiles configured patterns up front so a typo fails at mount time.
    pub fn new(field_rules: &[FieldRules]) -> Result<Self, ConfigError> {
        let mut configured: HashMap<String, Vec<Rule>> = HashMap::new();
        let mut patterns = HashMap::new();
        for FieldRules { field, rules } in field_rules {
            for rule in rules {
                if let Rule::Pattern { pattern } = rule {
                    let regex = Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                        field: field.clone(),
                        source,
                    })?;
                    patterns.insert(pattern.clone(), regex);
                }
            }
            configured.entry(field.clone()).or_default().extend(rules.iter().cloned());
        }
        Ok(Self {
            configured,
            patterns,
            report: None,
        })
    }

    /// Evaluate every rule and annotate the form with the result.
    pub fn validate(&mut self, form: &impl FormView) -> &ValidationReport {
        let report = self.evaluate(&form.controls());
        form.annotate(&report);
        self.report.insert(report)
    }

    /// `false` until [`Self::validate`] has run.
    pub fn is_valid(&self) -> bool {
        self.report.as_ref().is_some_and(ValidationReport::is_valid)
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }

    /// Forget the last result and remove the form's error markers.
    pub fn reset(&mut self, form: &impl FormView) {
        self.report = None;
        form.clear_annotations();
    }

    pub fn evaluate(&mut self, controls: &[Control]) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut seen: Vec<&str> = Vec::new();
        for control in controls {
            if control.disabled || control.name.is_empty() || seen.contains(&control.name.as_str()) {
                continue;
            }
            seen.push(&control.name);
            let group: Vec<&Control> = controls
                .iter()
                .filter(|other| other.name == control.name && !other.disabled)
                .collect();
            let mut rules: Vec<Rule> = Vec::new();
            for rule in group
                .iter()
                .flat_map(|member| member.rules.iter())
                .chain(self.configured.get(&control.name).into_iter().flatten())
            {
                if !rules.contains(rule) {
                    rules.push(rule.clone());
                }
            }
            if let Some(error) = self.check_field(&control.name, &group, &rules) {
                report.errors.push(error);
            }
        }
        report
    }

    fn check_field(&mut self, field: &str, group: &[&Control], rules: &[Rule]) -> Option<FieldError> {
        let checkable = group.iter().any(|control| control.kind.is_checkable());
        let value = if checkable {
            group
                .iter()
                .find(|control| control.checked)
                .map(|control| control.value.as_str())
                .unwrap_or_default()
        } else {
            group
                .iter()
                .find(|control| control.kind != ControlKind::Button)
                .map(|control| control.value.as_str())
                .unwrap_or_default()
        };
        let present = if checkable {
            group.iter().any(|control| control.checked)
        } else {
            !value.trim().is_empty()
        };

        for rule in rules {
            let passed = match rule {
                Rule::Required => present,
                _ if !present => true,
                Rule::Email => EMAIL.is_match(value.trim()),
                Rule::PostalCode => postal::is_valid(value),
                Rule::Pattern { pattern } => self.pattern_matches(field, pattern, value),
                Rule::Length { min, max } => {
                    let length = value.chars().count();
                    min.is_none_or(|min| length >= min) && max.is_none_or(|max| length <= max)
                }
            };
            if !passed {
                return Some(FieldError {
                    field: field.to_owned(),
                    rule: rule.clone(),
                    message: rule.message(),
                });
            }
        }
        None
    }

    fn pattern_matches(&mut self, field: &str, pattern: &str, value: &str) -> bool {
        if !self.patterns.contains_key(pattern) {
            match Regex::new(pattern) {
                Ok(regex) => {
                    self.patterns.insert(pattern.to_owned(), regex);
                }
                Err(error) => {
                    log::warn!("ignoring invalid pattern on field `{field}`: {error}");
                    return true;
                }
            }
        }
        self.patterns[pattern].is_match(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_form() -> Vec<Control> {
        vec![
            Control::text("first_name", "Ann").with_rules([Rule::Required]),
            Control::text("email", "").with_rules([Rule::Required, Rule::Email]),
            Control::text("postal_code", "a1b2c3").with_rules([Rule::PostalCode]),
            Control::text("phone_num", "").with_rules([Rule::Length { min: Some(7), max: None }]),
        ]
    }

    #[test]
    fn reports_first_invalid_field_in_document_order() {
        let mut controls = member_form();
        controls[0].value.clear();
        let mut validator = Validator::new(&[]).unwrap();
        let report = validator.evaluate(&controls);
        assert_eq!(report.first_invalid(), Some("first_name"));
        assert_eq!(report.invalid_fields(), ["first_name", "email"]);
    }

    #[test]
    fn optional_empty_fields_skip_format_rules() {
        let mut controls = member_form();
        controls[1].value = "a@b.com".into();
        let mut validator = Validator::new(&[]).unwrap();
        assert!(validator.evaluate(&controls).is_valid());
    }

    #[test]
    fn format_rules_apply_to_present_values() {
        let mut controls = member_form();
        controls[1].value = "not-an-email".into();
        controls[2].value = "ZZZ".into();
        let mut validator = Validator::new(&[]).unwrap();
        let report = validator.evaluate(&controls);
        assert_eq!(report.error_for("email").unwrap().rule, Rule::Email);
        assert_eq!(report.error_for("postal_code").unwrap().rule, Rule::PostalCode);
    }

    #[test]
    fn required_checkbox_group_needs_one_checked() {
        let mut controls = vec![
            Control::checkbox("volunteer_interests", "Gardening", false).with_rules([Rule::Required]),
            Control::checkbox("volunteer_interests", "Events", false),
        ];
        let mut validator = Validator::new(&[]).unwrap();
        assert!(!validator.evaluate(&controls).is_valid());
        controls[1].checked = true;
        assert!(validator.evaluate(&controls).is_valid());
    }

    #[test]
    fn configured_rules_merge_with_markup_rules() {
        let rules = [FieldRules {
            field: "first_name".into(),
            rules: vec![Rule::Pattern { pattern: "^[A-Z]".into() }],
        }];
        let mut validator = Validator::new(&rules).unwrap();
        let report = validator.evaluate(&[Control::text("first_name", "ann")]);
        assert!(matches!(report.errors[0].rule, Rule::Pattern { .. }));
    }

    #[test]
    fn invalid_configured_pattern_is_a_config_error() {
        let rules = [FieldRules {
            field: "x".into(),
            rules: vec![Rule::Pattern { pattern: "(".into() }],
        }];
        assert!(matches!(Validator::new(&rules), Err(ConfigError::Pattern { .. })));
    }

    #[test]
    fn rules_from_bootstrap_validator_attributes() {
        let rules = Rule::from_attributes([
            ("type", "text"),
            ("data-bv-notempty", "true"),
            ("data-bv-zipcode", "true"),
            ("data-bv-zipcode-country", "CA"),
            ("data-bv-stringlength-max", "10"),
        ]);
        assert_eq!(
            rules,
            [Rule::Required, Rule::PostalCode, Rule::Length { min: None, max: Some(10) }]
        );
        assert_eq!(Rule::from_attributes([("type", "email")]), [Rule::Email]);
        assert!(Rule::from_attributes([("data-bv-notempty", "false")]).is_empty());
    }

    #[test]
    fn rule_config_shape() {
        let rules: Vec<Rule> =
            serde_json::from_str(r#"[{"rule": "required"}, {"rule": "length", "min": 2, "max": null}]"#).unwrap();
        assert_eq!(rules, [Rule::Required, Rule::Length { min: Some(2), max: None }]);
    }
}
