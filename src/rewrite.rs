//! Ordered textual rewrite rules.
//!
//! Macro files and generated HTML are never parsed; they are treated as
//! opaque text and rewritten by an explicit, ordered list of rules. Each rule
//! is a compiled pattern plus a [`Replacement`]. Order matters: a rule may rely
//! on an earlier one having already consumed part of its matches (see
//! [`crate::ddoc`] for the dependency notes of each rule list).
//!
//! A rule that matches nothing is not an error. A rule may carry a `marker`:
//! if the marker text is already present in the input the rule is skipped and
//! reported as already applied, so re-running a non-idempotent insertion never
//! duplicates its output.

use regex::{Captures, NoExpand, Regex};

/// How the matched text is replaced.
pub enum Replacement {
    /// Inserted verbatim; `$` has no special meaning.
    Literal(String),
    /// Regex template, `$1`/`${name}` expand to capture groups.
    Template(String),
    /// Computed from the captures.
    With(fn(&Captures) -> String),
}

/// A single named rewrite rule.
pub struct Rule {
    pub name: &'static str,
    pattern: Regex,
    replacement: Replacement,
    marker: Option<String>,
}

impl Rule {
    pub fn new(name: &'static str, pattern: Regex, replacement: Replacement) -> Self {
        Self {
            name,
            pattern,
            replacement,
            marker: None,
        }
    }

    /// Skip the rule when `marker` already occurs in the input.
    pub fn unless_present(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    /// Apply this rule, returning the new text and the number of matches.
    pub fn apply(&self, text: &str) -> (String, usize) {
        let count = self.pattern.find_iter(text).count();
        if count == 0 {
            return (text.to_string(), 0);
        }
        let out = match &self.replacement {
            Replacement::Literal(s) => self.pattern.replace_all(text, NoExpand(s)),
            Replacement::Template(t) => self.pattern.replace_all(text, t.as_str()),
            Replacement::With(f) => self.pattern.replace_all(text, |caps: &Captures| f(caps)),
        };
        (out.into_owned(), count)
    }
}

/// Per-rule outcome of a [`RuleSet::apply`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Applied { rule: &'static str, matches: usize },
    AlreadyApplied { rule: &'static str },
}

/// Results of applying a rule set, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub outcomes: Vec<RuleOutcome>,
}

impl RewriteReport {
    /// Number of matches of the named rule (0 if skipped or unknown).
    pub fn matches(&self, rule: &str) -> usize {
        self.outcomes
            .iter()
            .find_map(|o| match o {
                RuleOutcome::Applied { rule: r, matches } if *r == rule => Some(*matches),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Rules skipped because their marker was already present.
    pub fn already_applied(&self) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                RuleOutcome::AlreadyApplied { rule } => Some(*rule),
                _ => None,
            })
            .collect()
    }
}

/// An ordered list of rules applied one after another.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn apply(&self, text: &str) -> (String, RewriteReport) {
        let mut current = text.to_string();
        let mut report = RewriteReport::default();
        for rule in &self.rules {
            if rule.marker.as_ref().is_some_and(|m| current.contains(m.as_str())) {
                tracing::warn!(rule = rule.name, "rule already applied, skipping");
                report
                    .outcomes
                    .push(RuleOutcome::AlreadyApplied { rule: rule.name });
                continue;
            }
            let (next, matches) = rule.apply(&current);
            tracing::debug!(rule = rule.name, matches, "applied rewrite rule");
            report.outcomes.push(RuleOutcome::Applied {
                rule: rule.name,
                matches,
            });
            current = next;
        }
        (current, report)
    }
}

/// Compile a pattern known at build time.
pub(crate) fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap_or_else(|e| panic!("invalid rewrite pattern {re:?}: {e}"))
}

/// Compile a pattern matching `text` literally.
pub(crate) fn literal(text: &str) -> Regex {
    pattern(&regex::escape(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_replacement_keeps_dollar_signs() {
        let rule = Rule::new(
            "footer",
            pattern("FOOTER"),
            Replacement::Literal("$(GENERATED_BY)".into()),
        );
        let (out, n) = rule.apply("a FOOTER b FOOTER");
        assert_eq!(out, "a $(GENERATED_BY) b $(GENERATED_BY)");
        assert_eq!(n, 2);
    }

    #[test]
    fn template_replacement_expands_groups() {
        let rule = Rule::new(
            "swap",
            pattern(r"(\w+)=(\w+)"),
            Replacement::Template("$2=$1".into()),
        );
        assert_eq!(rule.apply("a=b").0, "b=a");
    }

    #[test]
    fn computed_replacement() {
        let rule = Rule::new(
            "upper",
            pattern(r"x+"),
            Replacement::With(|caps| caps[0].to_uppercase()),
        );
        assert_eq!(rule.apply("axxbx").0, "aXXbX");
    }

    #[test]
    fn zero_matches_is_not_an_error() {
        let rule = Rule::new("none", pattern("zzz"), Replacement::Literal("y".into()));
        assert_eq!(rule.apply("abc"), ("abc".to_string(), 0));
    }

    #[test]
    fn literal_pattern_escapes_metacharacters() {
        let rule = Rule::new("dots", literal("../"), Replacement::Literal("./".into()));
        assert_eq!(rule.apply("../a ..xb").0, "./a ..xb");
    }

    #[test]
    fn rules_run_in_order() {
        let set = RuleSet::new(vec![
            Rule::new("a-to-b", pattern("a"), Replacement::Literal("b".into())),
            Rule::new("b-to-c", pattern("b"), Replacement::Literal("c".into())),
        ]);
        let (out, report) = set.apply("ab");
        assert_eq!(out, "cc");
        assert_eq!(report.matches("a-to-b"), 1);
        assert_eq!(report.matches("b-to-c"), 2);
        assert_eq!(set.names(), vec!["a-to-b", "b-to-c"]);
    }

    #[test]
    fn marker_skips_rule_and_reports_it() {
        let set = RuleSet::new(vec![
            Rule::new("tag", pattern("</head>"), Replacement::Literal("<x></head>".into()))
                .unless_present("<x>"),
        ]);
        let (once, first) = set.apply("<head></head>");
        assert_eq!(once, "<head><x></head>");
        assert!(first.already_applied().is_empty());

        let (twice, second) = set.apply(&once);
        assert_eq!(twice, once);
        assert_eq!(second.already_applied(), vec!["tag"]);
        assert_eq!(second.matches("tag"), 0);
    }
}
