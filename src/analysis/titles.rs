use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::taxonomy::{RolePattern, RoleTaxonomy};
use super::text::collapse_whitespace;

/// Titles that match no role and mention nothing data-related.
pub const FALLBACK_ROLE: &str = "Outros";
/// Titles that match no role but mention data.
pub const DATA_FALLBACK_ROLE: &str = "Outros Dados";

const DATA_HINTS: &[&str] = &["dados", "data"];

struct CompiledPattern {
  pattern: Regex,
  unless: Option<Regex>,
}

impl CompiledPattern {
  fn matches(&self, title: &str) -> bool {
    match self.pattern.find(title) {
      Some(found) => match &self.unless {
        Some(unless) => !unless.is_match(&title[found.end()..]),
        None => true,
      },
      None => false,
    }
  }
}

struct CompiledRole {
  name: String,
  patterns: Vec<CompiledPattern>,
}

enum Resolution {
  Redirect(String),
  Reject,
}

struct CompiledOverride {
  trigger: Regex,
  resolution: Resolution,
}

/// Maps free-text titles onto a fixed list of role categories.
///
/// Every role whose patterns hit becomes a candidate. Overrides of each
/// candidate (in candidate order) may redirect the whole title to another
/// role, which wins immediately, or drop that candidate. The first remaining
/// candidate in declaration order is the answer.
pub struct TitleClassifier {
  roles: Vec<CompiledRole>,
  overrides: HashMap<String, Vec<CompiledOverride>>,
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
  RegexBuilder::new(pattern).case_insensitive(true).build()
}

impl TitleClassifier {
  pub fn new(taxonomy: &RoleTaxonomy) -> Self {
    let roles = taxonomy
      .roles
      .iter()
      .map(|rule| CompiledRole {
        name: rule.role.clone(),
        patterns: rule
          .patterns
          .iter()
          .filter_map(|pattern| compile_role_pattern(&rule.role, pattern))
          .collect(),
      })
      .collect();

    let mut overrides: HashMap<String, Vec<CompiledOverride>> = HashMap::new();
    for (role, rules) in &taxonomy.overrides {
      for rule in rules {
        let trigger = match compile(&rule.when) {
          Ok(trigger) => trigger,
          Err(err) => {
            warn!(%role, pattern = %rule.when, error = %err, "Invalid override pattern, skipping");
            continue;
          }
        };
        let resolution = match &rule.redirect {
          Some(target) => Resolution::Redirect(target.clone()),
          None => Resolution::Reject,
        };
        overrides
          .entry(role.clone())
          .or_default()
          .push(CompiledOverride { trigger, resolution });
      }
    }

    info!(roles = taxonomy.roles.len(), "Initialized title classifier");
    Self { roles, overrides }
  }

  /// Category for `title`; blank or missing titles are `"Outros"`.
  pub fn classify<'a>(&'a self, title: Option<&str>) -> &'a str {
    let title = collapse_whitespace(title.unwrap_or_default());
    if title.is_empty() {
      debug!("Empty title classified as fallback");
      return FALLBACK_ROLE;
    }

    let mut candidates: Vec<&CompiledRole> = self
      .roles
      .iter()
      .filter(|role| role.patterns.iter().any(|p| p.matches(&title)))
      .collect();

    let mut rejected = Vec::new();
    for candidate in &candidates {
      let Some(rules) = self.overrides.get(&candidate.name) else {
        continue;
      };
      for rule in rules.iter().filter(|rule| rule.trigger.is_match(&title)) {
        match &rule.resolution {
          Resolution::Redirect(target) => return target,
          Resolution::Reject => rejected.push(candidate.name.as_str()),
        }
      }
    }
    candidates.retain(|role| !rejected.contains(&role.name.as_str()));

    if let Some(role) = candidates.first().copied() {
      return &role.name;
    }

    if DATA_HINTS.iter().any(|hint| title.contains(hint)) {
      DATA_FALLBACK_ROLE
    } else {
      FALLBACK_ROLE
    }
  }
}

fn compile_role_pattern(role: &str, pattern: &RolePattern) -> Option<CompiledPattern> {
  let (pattern, unless) = match pattern {
    RolePattern::Plain(pattern) => (pattern, None),
    RolePattern::Guarded { pattern, unless } => (pattern, Some(unless)),
  };

  let compiled = match compile(pattern) {
    Ok(regex) => regex,
    Err(err) => {
      warn!(%role, %pattern, error = %err, "Invalid role pattern, skipping");
      return None;
    }
  };
  let unless = match unless.map(|u| compile(u)).transpose() {
    Ok(unless) => unless,
    Err(err) => {
      warn!(%role, %pattern, error = %err, "Invalid role guard, skipping pattern");
      return None;
    }
  };

  Some(CompiledPattern {
    pattern: compiled,
    unless,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analysis::taxonomy::{OverrideRule, RoleRule};
  use indexmap::IndexMap;

  fn classifier() -> TitleClassifier {
    TitleClassifier::new(&RoleTaxonomy::builtin())
  }

  #[test]
  fn test_known_titles() {
    let classifier = classifier();
    let cases = [
      ("Engenheiro de Machine Learning Pleno", "Engenheiro de Machine Learning"),
      ("Data Scientist - NLP Specialist", "Cientista de Dados"),
      ("Software Engineer Python", "Engenheiro de Software"),
      ("Analista de BI com Power BI", "Analista de BI"),
      ("Engenheiro de Dados Cloud", "Engenheiro de Dados"),
      ("DevOps Engineer AWS", "Engenheiro de DevOps"),
      ("AI Prompt Engineer", "Engenheiro de IA"),
      ("Analista de Dados SQL", "Analista de Dados"),
      ("Arquiteto de Dados Corporativos", "Arquiteto de Dados"),
      ("Engenheiro de Plataforma de Dados", "Engenheiro de Dados"),
      ("Data Analytics Engineer", "Analytics Engineer"),
      ("Financial Data Analyst", "Analista de Dados"),
      ("Especialista em dados", "Outros Dados"),
      ("Analista de Marketing", "Outros"),
    ];
    for (title, expected) in cases {
      assert_eq!(classifier.classify(Some(title)), expected, "title: {title}");
    }
  }

  #[test]
  fn test_override_redirects() {
    let classifier = classifier();
    assert_eq!(classifier.classify(Some("Analista de Dados com BI")), "Analista de BI");
    assert_eq!(
      classifier.classify(Some("Engenheiro de IA / Analista de Dados")),
      "Analista de Dados"
    );
  }

  #[test]
  fn test_rejected_candidate_falls_through() {
    // software engineer is dropped because the title mentions data
    assert_eq!(
      classifier().classify(Some("Software Engineer Data Systems")),
      "Engenheiro de Dados"
    );
  }

  #[test]
  fn test_guard_vetoes_trailing_analyst() {
    let classifier = classifier();
    assert_eq!(
      classifier.classify(Some("Engineer para time de data analytics")),
      "Analytics Engineer"
    );
    assert_eq!(classifier.classify(Some("Engineer Data Analyst")), "Analista de Dados");
  }

  #[test]
  fn test_blank_titles() {
    let classifier = classifier();
    assert_eq!(classifier.classify(Some("")), FALLBACK_ROLE);
    assert_eq!(classifier.classify(Some("   ")), FALLBACK_ROLE);
    assert_eq!(classifier.classify(None), FALLBACK_ROLE);
  }

  #[test]
  fn test_case_and_spacing_do_not_matter() {
    let classifier = classifier();
    assert_eq!(
      classifier.classify(Some("  ENGENHEIRO   de dados SR ")),
      classifier.classify(Some("engenheiro de dados sr"))
    );
  }

  #[test]
  fn test_declaration_order_is_priority() {
    let taxonomy = RoleTaxonomy {
      roles: vec![
        RoleRule {
          role: "Primeiro".to_string(),
          patterns: vec![RolePattern::Plain("dados".to_string())],
        },
        RoleRule {
          role: "Segundo".to_string(),
          patterns: vec![
            RolePattern::Plain("(".to_string()),
            RolePattern::Plain("engenheiro".to_string()),
          ],
        },
      ],
      overrides: IndexMap::from([(
        "Primeiro".to_string(),
        vec![OverrideRule {
          when: "estagio".to_string(),
          redirect: None,
        }],
      )]),
    };
    let classifier = TitleClassifier::new(&taxonomy);

    assert_eq!(classifier.classify(Some("Engenheiro de Dados")), "Primeiro");
    assert_eq!(classifier.classify(Some("Estagio Engenheiro de Dados")), "Segundo");
    assert_eq!(classifier.classify(Some("Estagio em dados")), "Outros Dados");
  }
}
