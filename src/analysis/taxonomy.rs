//! Static tables driving skill extraction, title classification and
//! location parsing. Each table can be replaced by a YAML file.

use color_eyre::{eyre::eyre, Result};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::config::TaxonomyConfig;

/// One way of spotting a skill in normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SkillTerm {
  /// Whole-term match after the same normalization as the text
  Literal(String),
  /// Used as written, case-insensitive
  Regex { regex: String },
}

/// Canonical skill name -> terms, in reporting order.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct SkillTaxonomy {
  pub skills: IndexMap<String, Vec<SkillTerm>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RolePattern {
  Plain(String),
  /// Rejected when `unless` matches the text after the pattern's match
  Guarded { pattern: String, unless: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRule {
  pub role: String,
  pub patterns: Vec<RolePattern>,
}

/// Applies to a matched role when `when` matches the title. Without a
/// `redirect` the role is dropped from the candidates.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRule {
  pub when: String,
  #[serde(default)]
  pub redirect: Option<String>,
}

/// Roles in priority order plus per-role overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleTaxonomy {
  pub roles: Vec<RoleRule>,
  #[serde(default)]
  pub overrides: IndexMap<String, Vec<OverrideRule>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Gazetteer {
  /// State code -> state name
  pub states: IndexMap<String, String>,
  /// Capital or regional city -> state code
  #[serde(default)]
  pub cities: IndexMap<String, String>,
}

/// All three tables, built-in unless a file is configured.
#[derive(Debug, Clone)]
pub struct Taxonomy {
  pub skills: SkillTaxonomy,
  pub roles: RoleTaxonomy,
  pub gazetteer: Gazetteer,
}

impl Taxonomy {
  #[cfg(test)]
  pub fn builtin() -> Self {
    Self {
      skills: SkillTaxonomy::builtin(),
      roles: RoleTaxonomy::builtin(),
      gazetteer: Gazetteer::builtin(),
    }
  }

  /// A configured file that cannot be read or has the wrong shape is an error.
  pub fn load(config: &TaxonomyConfig) -> Result<Self> {
    Ok(Self {
      skills: load_or(config.skills.as_deref(), SkillTaxonomy::builtin)?,
      roles: load_or(config.roles.as_deref(), RoleTaxonomy::builtin)?,
      gazetteer: load_or(config.gazetteer.as_deref(), Gazetteer::builtin)?,
    })
  }
}

fn load_or<T: DeserializeOwned>(path: Option<&Path>, builtin: fn() -> T) -> Result<T> {
  let Some(path) = path else {
    return Ok(builtin());
  };
  let contents = std::fs::read_to_string(path)
    .map_err(|e| eyre!("Failed to read taxonomy file {}: {}", path.display(), e))?;
  let table = serde_yaml::from_str(&contents)
    .map_err(|e| eyre!("Failed to parse taxonomy file {}: {}", path.display(), e))?;
  info!(path = %path.display(), "Loaded taxonomy file");
  Ok(table)
}

impl SkillTaxonomy {
  pub fn builtin() -> Self {
    let skills = SKILLS
      .iter()
      .map(|(skill, terms)| {
        let terms = terms.iter().map(|t| SkillTerm::Literal(t.to_string())).collect();
        (skill.to_string(), terms)
      })
      .collect();
    Self { skills }
  }
}

impl RoleTaxonomy {
  pub fn builtin() -> Self {
    let roles = ROLES
      .iter()
      .map(|(role, patterns)| RoleRule {
        role: role.to_string(),
        patterns: patterns
          .iter()
          .map(|&(pattern, unless)| match unless {
            Some(unless) => RolePattern::Guarded {
              pattern: pattern.to_string(),
              unless: unless.to_string(),
            },
            None => RolePattern::Plain(pattern.to_string()),
          })
          .collect(),
      })
      .collect();

    let mut overrides: IndexMap<String, Vec<OverrideRule>> = IndexMap::new();
    for &(role, when, redirect) in OVERRIDES {
      overrides.entry(role.to_string()).or_default().push(OverrideRule {
        when: when.to_string(),
        redirect: redirect.map(str::to_string),
      });
    }

    Self { roles, overrides }
  }
}

impl Gazetteer {
  pub fn builtin() -> Self {
    Self {
      states: STATES
        .iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect(),
      cities: CITIES
        .iter()
        .map(|(city, code)| (city.to_string(), code.to_string()))
        .collect(),
    }
  }
}

const SKILLS: &[(&str, &[&str])] = &[
  ("Solução de problemas", &["solução de problemas", "problem solving"]),
  ("Pensamento crítico", &["critical thinking", "pensamento crítico"]),
  (
    "Inteligência Artificial",
    &["ia", "inteligência artificial", "artificial intelligence", "ai"],
  ),
  ("Machine Learning", &["machine learning", "aprendizado de máquina"]),
  (
    "Cloud",
    &["cloud", "nuvem", "computação em nuvem", "cloud computing", "gcp", "azure"],
  ),
  (
    "NLP",
    &["natural language processing", "processamento de linguagem natural", "pln", "nlp"],
  ),
  ("Visão computacional", &["visão computacional", "computer vision"]),
  ("Feature engineering", &["feature engineering"]),
  (
    "Visualização de dados",
    &["data visualization", "tableau", "power bi", "visualização de dados"],
  ),
  ("Programação", &["programação"]),
  ("GCP", &["gcp"]),
  ("Excel", &["excel"]),
  ("Tableau", &["tableau"]),
  ("Adaptabilidade", &["adaptabilidade"]),
  ("Azure", &["azure"]),
  ("Estatística", &["estatística", "statistics"]),
  ("R", &["r"]),
  ("Trabalho em equipe", &["trabalho em equipe"]),
  ("Limpeza de dados", &["limpeza de dados", "data cleaning"]),
  ("Arquitetura de dados", &["arquitetura de dados", "data architecture"]),
  ("Séries temporais", &["séries temporais", "time series"]),
  ("BI", &["business intelligence", "inteligência de negócios"]),
  ("Python", &["python"]),
  ("Teste A/B", &["a/b"]),
  ("ETL", &["etl"]),
  ("Aprendizado por reforço", &["reinforcement learning"]),
  ("PostgreSQL", &["postgresql"]),
  ("Redes neurais", &["redes neurais"]),
  ("NoSQL", &["nosql"]),
  ("Airflow", &["airflow"]),
  ("Comunicação", &["comunicação"]),
  ("Tensorflow", &["tensorflow"]),
  ("Data Warehouse", &["data warehouse"]),
  ("Kubernetes", &["kubernetes"]),
  ("Pipeline", &["pipeline", "data pipeline"]),
  ("Governança de dados", &["governança de dados", "data governance"]),
  ("Hadoop", &["hadoop"]),
  ("Manipulação de dados", &["data wrangling", "manipulação de dados"]),
  ("Qualidade dos dados", &["data quality", "qualidade dos dados"]),
  ("PyTorch", &["pytorch"]),
  ("MySQL", &["mysql"]),
  ("Análise de negócios", &["business analytics", "análise de negócios"]),
  ("Deep Learning", &["deep learning", "aprendizado profundo"]),
  ("Big Data", &["big data"]),
  ("Data storytelling", &["storytelling"]),
  ("Mineração de dados", &["mineração de dados", "data mining"]),
  ("SQL", &["sql"]),
  ("Power BI", &["power bi"]),
  ("Spark", &["spark", "pyspark"]),
  ("API", &["api"]),
  ("Scikit-learn", &["scikit-learn"]),
  ("Pandas", &["pandas"]),
  ("Docker", &["docker"]),
  ("AWS", &["aws"]),
  ("MATLAB", &["matlab"]),
  ("SQL Server", &["sql server"]),
  ("NumPy", &["numpy"]),
];

type PatternRow = (&'static str, Option<&'static str>);

/// Declaration order is priority order.
const ROLES: &[(&str, &[PatternRow])] = &[
  (
    "Analista de BI",
    &[
      (r"\b(business intelligence|bi\b|power bi)\b", None),
      (r"\banalista de (bi\b|business intelligence)", None),
      (r"(data analyst|analista de dados).*\b(bi\b|business intelligence)\b", None),
      (r"\bbi\b analyst\b", None),
      (r"\b(bi |business intelligence )developer\b", None),
    ],
  ),
  (
    "Analytics Engineer",
    &[
      (r"\b(analytics engineer|engenheiro de analytics)\b", None),
      (r"\b(engenheiro|engineer)\b.*\banalytics\b", None),
      (r"\banalytics\b.*\b(engenheiro|engineer)\b", None),
      (r"engenh.*an[áa]l[ií]tica\b", None),
    ],
  ),
  (
    "Engenheiro de Machine Learning",
    &[
      (r"\b(ml\b engineer|machine learning engineer|engenheiro de ml\b)\b", None),
      (r"\bmlops\b", None),
      (r"\bengenheiro\b.*\b(machine learning|ml\b)\b", None),
      (r"\b(machine learning|ml\b)\b.*\bengenheiro\b", None),
    ],
  ),
  (
    "Cientista de Dados",
    &[
      (r"\b(ml\b|machine learning|deep learning|llm\b|nlp\b)\b", None),
      (r"\b(pesquisador|research)\b.*\b(dados|data)\b", None),
      (r"\b(cientista|scientist)\b.*\b(dados|data)\b", None),
      (r"\b(dados|data)\b.*\b(cientista|scientist)\b", None),
      (r"ci[êe]ncia de dados\b", None),
      (r"\bgenai\b", None),
      (r"\b(computer vision|visão computacional)\b", None),
    ],
  ),
  (
    "Engenheiro de Dados",
    &[
      (r"\b(data engineer|engenheiro(?:a|s)? de dados)\b", None),
      (r"\b(etl|data pipeline|data platform)\b", None),
      (
        r"\b(engenheiro|engineer)\b.*\b(dados|data)\b",
        Some(r"analyst|cientist|analytics"),
      ),
      (r"\b(big data|spark|hadoop|airflow)\b.*\bengenheiro\b", None),
      (r"\bdataops\b", None),
      (r"engenharia de dados\b", None),
      (r"\bdados\b.*\b(engenheiro|engineer)\b", None),
    ],
  ),
  (
    "Engenheiro de IA",
    &[
      (
        r"\b(ai\b engineer|engenheiro de (?:ia\b|intelig[êe]ncia artificial)|engenheiro ai\b)\b",
        None,
      ),
      (
        r"\bengenheiro\b(?:\W+\w+){0,3}?\W+(?:ia\b|ai\b|intelig[êe]ncia artificial)\b",
        None,
      ),
      (
        r"\b(?:ia\b|ai\b|intelig[êe]ncia artificial)\b(?:\W+\w+){0,3}?\W+\bengenheiro\b",
        None,
      ),
      (r"\bprompt engineer\b", None),
      (r"\bengenheiro de (?:chatbot|llm\b|modelos generativos)\b", None),
      (r"\bautoma[cç][ãa]o\b\W+(?:com|de)\W+(?:ia\b|ai\b)\b", None),
    ],
  ),
  (
    "Analista de Dados",
    &[
      (r"\b(data analyst|analista de dados)\b", None),
      (r"\banal[íi]se de dados\b", None),
      (r"\breporting\b.*\bdados\b", None),
      (r"\b(analista|assistente)\b.*\bdados\b", None),
      (r"\b(sql\b|powerbi|tableau|looker)\b.*\banalista\b", None),
    ],
  ),
  (
    "Arquiteto de Dados",
    &[
      (r"\b(data architect|arquiteto de dados)\b", None),
      (r"\barquitetur(a|o)\b.*\bdados\b", None),
    ],
  ),
  (
    "Engenheiro de DevOps",
    &[
      (r"\bdevops\b", None),
      (r"\b(sre\b|site reliability engineer)\b", None),
      (r"\bcloud engineer\b.*\b(aws|azure|gcp)\b", None),
    ],
  ),
  (
    "Engenheiro de Software",
    &[
      (r"\b(software engineer|engenheiro de software)\b", None),
      (r"\bengenheiro\b.*\bsoftware\b", None),
      (r"\b(backend|frontend|full stack|java|python)\b engineer\b", None),
      (r"\b(desenvolvedor|developer)\b.*\b(software|sistemas)\b", None),
      (r"\b(react|node\.js|angular|typescript)\b.*\bengenheiro\b", None),
      (r"\bengenheiro\b.*\b(sistemas|aplicações)\b", None),
    ],
  ),
];

/// (matched role, trigger, redirect target or drop)
const OVERRIDES: &[(&str, &str, Option<&str>)] = &[
  ("Analista de Dados", r"\b(bi|business intelligence)\b", Some("Analista de BI")),
  ("Analista de Dados", r"\b(etl|data pipeline)\b", Some("Engenheiro de Dados")),
  ("Engenheiro de Software", r"\b(data|dados)\b", None),
  ("Engenheiro de IA", r"analista.*(dados)", Some("Analista de Dados")),
];

const STATES: &[(&str, &str)] = &[
  ("AC", "Acre"),
  ("AL", "Alagoas"),
  ("AP", "Amapá"),
  ("AM", "Amazonas"),
  ("BA", "Bahia"),
  ("CE", "Ceará"),
  ("DF", "Distrito Federal"),
  ("ES", "Espírito Santo"),
  ("GO", "Goiás"),
  ("MA", "Maranhão"),
  ("MT", "Mato Grosso"),
  ("MS", "Mato Grosso do Sul"),
  ("MG", "Minas Gerais"),
  ("PA", "Pará"),
  ("PB", "Paraíba"),
  ("PR", "Paraná"),
  ("PE", "Pernambuco"),
  ("PI", "Piauí"),
  ("RJ", "Rio de Janeiro"),
  ("RN", "Rio Grande do Norte"),
  ("RS", "Rio Grande do Sul"),
  ("RO", "Rondônia"),
  ("RR", "Roraima"),
  ("SC", "Santa Catarina"),
  ("SP", "São Paulo"),
  ("SE", "Sergipe"),
  ("TO", "Tocantins"),
];

/// State capitals first, then cities that head their own metro listing.
const CITIES: &[(&str, &str)] = &[
  ("Rio Branco", "AC"),
  ("Maceió", "AL"),
  ("Macapá", "AP"),
  ("Manaus", "AM"),
  ("Salvador", "BA"),
  ("Fortaleza", "CE"),
  ("Brasília", "DF"),
  ("Vitória", "ES"),
  ("Goiânia", "GO"),
  ("São Luís", "MA"),
  ("Cuiabá", "MT"),
  ("Campo Grande", "MS"),
  ("Belo Horizonte", "MG"),
  ("Belém", "PA"),
  ("João Pessoa", "PB"),
  ("Curitiba", "PR"),
  ("Recife", "PE"),
  ("Teresina", "PI"),
  ("Rio de Janeiro", "RJ"),
  ("Natal", "RN"),
  ("Porto Alegre", "RS"),
  ("Porto Velho", "RO"),
  ("Boa Vista", "RR"),
  ("Florianópolis", "SC"),
  ("São Paulo", "SP"),
  ("Aracaju", "SE"),
  ("Palmas", "TO"),
  ("Campinas", "SP"),
  ("Santos", "SP"),
  ("Ribeirão Preto", "SP"),
  ("Sorocaba", "SP"),
  ("São José dos Campos", "SP"),
  ("Joinville", "SC"),
  ("Blumenau", "SC"),
  ("Londrina", "PR"),
  ("Uberlândia", "MG"),
  ("Juiz de Fora", "MG"),
  ("Niterói", "RJ"),
  ("Caxias do Sul", "RS"),
];
