//! Keyword enrichment.
//!
//! Deterministic substring matching over the job title (and location for
//! remote detection). No language understanding: the tables below are the
//! whole model.

use regex::Regex;

use crate::config::EnrichmentConfig;
use crate::error::AppError;
use crate::models::{CanonicalJob, Enrichment};
use crate::traits::Enricher;
use crate::util::{normalize_terms, normalize_title};

/// Substring → canonical technology name.
const TECH_KEYWORDS: &[(&str, &str)] = &[
    ("python", "Python"),
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("react", "React"),
    ("angular", "Angular"),
    ("vue", "Vue"),
    ("node", "Node.js"),
    ("nodejs", "Node.js"),
    ("java ", "Java"),
    (" kotlin", "Kotlin"),
    ("c#", "C#"),
    ("dotnet", ".NET"),
    (".net", ".NET"),
    ("go ", "Go"),
    ("golang", "Go"),
    ("rust", "Rust"),
    ("ruby", "Ruby"),
    ("rails", "Rails"),
    ("php", "PHP"),
    ("swift", "Swift"),
    ("objective-c", "Objective-C"),
    ("aws", "AWS"),
    ("azure", "Azure"),
    ("gcp", "GCP"),
    ("google cloud", "GCP"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("sql", "SQL"),
    ("postgres", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("graphql", "GraphQL"),
    ("rest", "REST"),
    ("microservices", "Microservices"),
    ("lambda", "AWS Lambda"),
    ("serverless", "Serverless"),
    ("bigquery", "BigQuery"),
    ("jenkins", "Jenkins"),
    ("github actions", "GitHub Actions"),
    ("gitlab ci", "GitLab CI"),
    ("circleci", "CircleCI"),
    ("ci/cd", "CI/CD"),
    ("terraform", "Terraform"),
    ("pulumi", "Pulumi"),
    ("helm", "Helm"),
    ("kafka", "Kafka"),
    ("rabbitmq", "RabbitMQ"),
    ("prometheus", "Prometheus"),
    ("grafana", "Grafana"),
    ("mongodb", "MongoDB"),
    ("dynamodb", "DynamoDB"),
    ("redis", "Redis"),
    ("elasticsearch", "Elasticsearch"),
    ("spark", "Apache Spark"),
    ("databricks", "Databricks"),
    ("tensorflow", "TensorFlow"),
    ("pytorch", "PyTorch"),
    ("spring boot", "Spring Boot"),
];

/// Domain tag → indicator substrings.
const DOMAIN_TAGS: &[(&str, &[&str])] = &[
    ("backend", &["backend", "server", "api", "microservices"]),
    ("frontend", &["frontend", "front-end", "ui", "react", "angular", "vue"]),
    ("mobile", &["mobile", "ios", "android", "swift", "kotlin"]),
    ("data", &["data", "analytics", "etl", "warehouse", "ml", "machine learning"]),
    ("devops", &["devops", "sre", "platform", "infrastructure", "kubernetes", "docker"]),
    ("security", &["security", "infosec", "appsec", "secops"]),
    ("ml", &["ml", "machine learning", "deep learning", "ai", "pytorch", "tensorflow"]),
    ("cloud", &["cloud", "serverless", "lambda", "functions", "aws", "azure", "gcp"]),
    ("data-platform", &["spark", "hadoop", "kafka", "warehouse", "databricks"]),
];

/// First match wins.
const SENIORITY_MAP: &[(&str, &str)] = &[
    ("principal", "principal"),
    ("staff", "staff"),
    ("lead", "lead"),
    ("manager", "manager"),
    ("senior", "senior"),
    ("sr.", "senior"),
    ("jr.", "junior"),
    ("junior", "junior"),
    ("intern", "intern"),
];

pub fn infer_seniority(text: &str) -> String {
    let t = text.to_lowercase();
    SENIORITY_MAP
        .iter()
        .find(|(key, _)| t.contains(key))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| "mid".to_string())
}

pub fn infer_domain_tags(text: &str) -> Vec<String> {
    let t = text.to_lowercase();
    let mut tags: Vec<String> = DOMAIN_TAGS
        .iter()
        .filter(|(_, keys)| keys.iter().any(|k| t.contains(k)))
        .map(|(tag, _)| tag.to_string())
        .collect();
    tags.sort();
    tags
}

pub fn infer_stack(text: &str) -> Vec<String> {
    let t = text.to_lowercase();
    let mut found: Vec<String> = TECH_KEYWORDS
        .iter()
        .filter(|(key, _)| t.contains(key))
        .map(|(_, name)| name.to_string())
        .collect();
    found.sort();
    found.dedup();
    found
}

/// Stack plus a few soft skills.
pub fn extract_skills(text: &str) -> Vec<String> {
    let t = text.to_lowercase();
    let mut skills = infer_stack(text);
    if ["lead", "manager", "mentorship"].iter().any(|k| t.contains(k)) {
        skills.push("Leadership".into());
    }
    if t.contains("agile") || t.contains("scrum") {
        skills.push("Agile".into());
    }
    if ["ci/cd", "pipeline", "jenkins", "github actions", "gitlab ci", "circleci"]
        .iter()
        .any(|k| t.contains(k))
    {
        skills.push("CI/CD".into());
    }
    skills.sort();
    skills.dedup();
    skills
}

fn matching_terms(terms: &[String], haystack: &str) -> Vec<String> {
    let mut found: Vec<String> = terms
        .iter()
        .filter(|t| haystack.contains(t.as_str()))
        .cloned()
        .collect();
    found.sort();
    found.dedup();
    found
}

/// [`Enricher`] driven by [`EnrichmentConfig`] keyword lists plus the
/// built-in technology, domain, and seniority tables.
#[derive(Debug, Clone)]
pub struct KeywordEnricher {
    role_keywords: Vec<String>,
    stack_keywords: Vec<String>,
    remote_aliases: Vec<String>,
    seniority_patterns: Vec<(Regex, String)>,
}

impl KeywordEnricher {
    /// Fails if a seniority pattern is not a valid regex.
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self, AppError> {
        let seniority_patterns = config
            .seniority_patterns
            .iter()
            .filter(|(pattern, _)| !pattern.trim().is_empty())
            .map(|(pattern, label)| {
                Regex::new(pattern)
                    .map(|re| (re, label.trim().to_string()))
                    .map_err(|e| {
                        AppError::ConfigError(format!("Invalid seniority pattern '{pattern}': {e}"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            role_keywords: normalize_terms(&config.keywords.role),
            stack_keywords: normalize_terms(&config.keywords.stack),
            remote_aliases: normalize_terms(&config.remote_aliases),
            seniority_patterns,
        })
    }

    fn seniority(&self, normalized_title: &str) -> String {
        self.seniority_patterns
            .iter()
            .find(|(re, _)| re.is_match(normalized_title))
            .map(|(_, label)| label.clone())
            .unwrap_or_else(|| infer_seniority(normalized_title))
    }
}

impl Enricher for KeywordEnricher {
    fn enrich(&self, job: &CanonicalJob) -> Result<Enrichment, AppError> {
        let title = normalize_title(&job.title);
        if title.is_empty() {
            return Err(AppError::EnrichmentError(format!(
                "job {} has an empty title",
                job.job_id
            )));
        }
        let with_location = format!("{} {}", title, normalize_title(&job.location));

        Ok(Enrichment {
            seniority: self.seniority(&title),
            domain_tags: infer_domain_tags(&title),
            stack: infer_stack(&title),
            skills: extract_skills(&title),
            role_tags: matching_terms(&self.role_keywords, &title),
            stack_tags: matching_terms(&self.stack_keywords, &title),
            remote_friendly: self
                .remote_aliases
                .iter()
                .any(|alias| with_location.contains(alias.as_str())),
            normalized_title: title,
        })
    }
}
