use color_eyre::{eyre::eyre, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::taxonomy::Gazetteer;
use super::text::title_case;

pub const DEFAULT_COUNTRY: &str = "Brasil";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
  pub city: Option<String>,
  pub state: Option<String>,
  pub country: String,
}

impl Location {
  fn new(city: Option<String>, state: Option<String>) -> Self {
    Self {
      city,
      state,
      country: DEFAULT_COUNTRY.to_string(),
    }
  }

  fn country_only() -> Self {
    Self::new(None, None)
  }
}

/// Best-effort split of listing locations into city, state and country.
pub struct LocationNormalizer {
  codes: HashSet<String>,
  names: HashMap<String, String>,
  /// lowercased city -> state code
  cities: HashMap<String, String>,
  state_country: Regex,
  regional: Regex,
  city_code: Regex,
  city_rest: Regex,
}

fn pattern(re: &str) -> Result<Regex> {
  Regex::new(re).map_err(|e| eyre!("Invalid location pattern '{}': {}", re, e))
}

impl LocationNormalizer {
  pub fn new(gazetteer: &Gazetteer) -> Result<Self> {
    Ok(Self {
      codes: gazetteer.states.keys().cloned().collect(),
      names: gazetteer
        .states
        .iter()
        .map(|(code, name)| (name.clone(), code.clone()))
        .collect(),
      cities: gazetteer
        .cities
        .iter()
        .map(|(city, code)| (city.to_lowercase(), code.clone()))
        .collect(),
      state_country: pattern(r"(?i)^(?P<state>[^,]+),\s*brasil$")?,
      regional: pattern(r"(?i)^(?P<city>.+)\s+e\s+região$")?,
      city_code: pattern(r"^(?P<city>[^,]+),\s*(?P<state>[A-Z]{2})$")?,
      city_rest: pattern(r"^(?P<city>[^,]+),\s*(?P<rest>.+)$")?,
    })
  }

  /// Resolution order, first hit wins:
  /// 1. bare state name or code
  /// 2. `<state name>, Brasil`
  /// 3. `<city> e Região`, state from the city table
  /// 4. `<city>, <XX>`
  /// 5. `<city>, <rest>` where rest is the country, a state name or a code
  /// 6. a known city on its own
  /// 7. anything else is taken as a city without state
  pub fn normalize(&self, raw: Option<&str>) -> Location {
    let Some(location) = raw.map(str::trim).filter(|l| !l.is_empty()) else {
      return Location::country_only();
    };
    if is_country(location) {
      return Location::country_only();
    }

    if let Some(code) = self.state_code(location) {
      return Location::new(None, Some(code));
    }

    if let Some(caps) = self.state_country.captures(location) {
      if let Some(code) = self.names.get(caps["state"].trim()) {
        return Location::new(None, Some(code.clone()));
      }
    }

    if let Some(caps) = self.regional.captures(location) {
      let city = title_case(caps["city"].trim());
      let state = self.city_state(&city);
      return Location::new(Some(city), state);
    }

    if let Some(caps) = self.city_code.captures(location) {
      return Location::new(
        Some(title_case(caps["city"].trim())),
        Some(caps["state"].to_uppercase()),
      );
    }

    if let Some(caps) = self.city_rest.captures(location) {
      let city = title_case(caps["city"].trim());
      let rest = caps["rest"].trim();
      let state = if is_country(rest) {
        self.city_state(&city)
      } else {
        self.state_code(rest)
      };
      return Location::new(Some(city), state);
    }

    let city = title_case(location);
    let state = self.city_state(&city);
    Location::new(Some(city), state)
  }

  fn state_code(&self, value: &str) -> Option<String> {
    if self.codes.contains(value) {
      return Some(value.to_string());
    }
    self.names.get(value).cloned()
  }

  fn city_state(&self, city: &str) -> Option<String> {
    self.cities.get(&city.to_lowercase()).cloned()
  }
}

fn is_country(value: &str) -> bool {
  matches!(value.to_lowercase().as_str(), "brasil" | "brazil")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn normalizer() -> LocationNormalizer {
    LocationNormalizer::new(&Gazetteer::builtin()).unwrap()
  }

  fn parts(location: Location) -> (Option<String>, Option<String>, String) {
    (location.city, location.state, location.country)
  }

  fn expect(city: Option<&str>, state: Option<&str>) -> (Option<String>, Option<String>, String) {
    (
      city.map(str::to_string),
      state.map(str::to_string),
      "Brasil".to_string(),
    )
  }

  #[test]
  fn test_city_with_state_code() {
    assert_eq!(
      parts(normalizer().normalize(Some("São Paulo, SP"))),
      expect(Some("São Paulo"), Some("SP"))
    );
  }

  #[test]
  fn test_regional_listing() {
    let normalizer = normalizer();
    assert_eq!(
      parts(normalizer.normalize(Some("Brasília e Região"))),
      expect(Some("Brasília"), Some("DF"))
    );
    assert_eq!(
      parts(normalizer.normalize(Some("Rio de Janeiro e Região"))),
      expect(Some("Rio De Janeiro"), Some("RJ"))
    );
    assert_eq!(
      parts(normalizer.normalize(Some("Chapecó e Região"))),
      expect(Some("Chapecó"), None)
    );
  }

  #[test]
  fn test_missing_and_country_only() {
    let normalizer = normalizer();
    assert_eq!(parts(normalizer.normalize(None)), expect(None, None));
    assert_eq!(parts(normalizer.normalize(Some("  "))), expect(None, None));
    assert_eq!(parts(normalizer.normalize(Some("Brasil"))), expect(None, None));
  }

  #[test]
  fn test_state_only() {
    let normalizer = normalizer();
    assert_eq!(parts(normalizer.normalize(Some("Minas Gerais"))), expect(None, Some("MG")));
    assert_eq!(parts(normalizer.normalize(Some("SC"))), expect(None, Some("SC")));
    assert_eq!(
      parts(normalizer.normalize(Some("Paraná, Brasil"))),
      expect(None, Some("PR"))
    );
  }

  #[test]
  fn test_city_with_rest() {
    let normalizer = normalizer();
    assert_eq!(
      parts(normalizer.normalize(Some("Campinas, São Paulo"))),
      expect(Some("Campinas"), Some("SP"))
    );
    assert_eq!(
      parts(normalizer.normalize(Some("Recife, Brasil"))),
      expect(Some("Recife"), Some("PE"))
    );
    assert_eq!(
      parts(normalizer.normalize(Some("Lisboa, Portugal"))),
      expect(Some("Lisboa"), None)
    );
  }

  #[test]
  fn test_bare_city() {
    let normalizer = normalizer();
    assert_eq!(parts(normalizer.normalize(Some("curitiba"))), expect(Some("Curitiba"), Some("PR")));
    assert_eq!(
      parts(normalizer.normalize(Some("remote work"))),
      expect(Some("Remote Work"), None)
    );
  }
}
