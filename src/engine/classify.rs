use std::fmt;

/// Fixed article categories, in canonical (tie-break) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    AiMl,
    Infrastructure,
    Databases,
    DistributedSystems,
    Security,
    DeveloperTools,
    #[default]
    Platform,
}

pub const ALL_CATEGORIES: [Category; 7] = [
    Category::AiMl,
    Category::Infrastructure,
    Category::Databases,
    Category::DistributedSystems,
    Category::Security,
    Category::DeveloperTools,
    Category::Platform,
];

/// Short focus names accepted on the command line, in display order.
pub const FOCUS_ALIASES: [(&str, Category); 7] = [
    ("infra", Category::Infrastructure),
    ("ai", Category::AiMl),
    ("db", Category::Databases),
    ("distributed", Category::DistributedSystems),
    ("security", Category::Security),
    ("tools", Category::DeveloperTools),
    ("platform", Category::Platform),
];

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::AiMl => "AI/ML",
            Category::Infrastructure => "Infrastructure",
            Category::Databases => "Databases",
            Category::DistributedSystems => "Distributed Systems",
            Category::Security => "Security",
            Category::DeveloperTools => "Developer Tools",
            Category::Platform => "Platform",
        }
    }

    /// Parse a stored label. Unknown labels read back as Platform.
    pub fn from_label(label: &str) -> Self {
        ALL_CATEGORIES
            .iter()
            .copied()
            .find(|c| c.label() == label)
            .unwrap_or_default()
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::AiMl => &[
                "machine learning", "deep learning", "neural", "llm", "gpt", "transformer",
                "inference", "training", "model", "embedding", "diffusion", "reinforcement",
                "classification", "nlp", "computer vision", "pytorch", "tensorflow",
            ],
            Category::Infrastructure => &[
                "kubernetes", "docker", "container", "cloud", "aws", "gcp", "azure",
                "terraform", "infrastructure", "deploy", "cdn", "load balancer", "nginx",
                "networking", "dns", "edge", "proxy", "observability", "monitoring",
            ],
            Category::Databases => &[
                "database", "sql", "nosql", "postgres", "postgresql", "mysql", "redis",
                "mongodb", "cassandra", "dynamodb", "indexing", "query", "schema",
                "migration", "replication", "sharding",
            ],
            Category::DistributedSystems => &[
                "distributed", "consensus", "raft", "paxos", "microservice", "grpc",
                "message queue", "kafka", "event driven", "saga", "idempotent",
                "consistency", "partition", "replication", "failover", "circuit breaker",
            ],
            Category::Security => &[
                "security", "vulnerability", "exploit", "authentication", "authorization",
                "encryption", "tls", "ssl", "certificate", "firewall", "zero trust",
                "oauth", "jwt", "xss", "csrf", "injection", "penetration",
            ],
            Category::DeveloperTools => &[
                "developer", "tooling", "ide", "editor", "debugger", "profiler",
                "compiler", "linter", "formatter", "cli", "terminal", "git",
                "ci/cd", "pipeline", "build system", "package manager",
            ],
            Category::Platform => &[
                "platform", "api", "sdk", "framework", "runtime", "language",
                "performance", "optimization", "architecture", "design", "engineering",
                "open source", "release", "announcement",
            ],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a focus alias or full category name (case-insensitive) to a category.
pub fn resolve_alias(input: &str) -> anyhow::Result<Category> {
    let needle = input.trim().to_lowercase();
    if let Some((_, cat)) = FOCUS_ALIASES.iter().find(|(alias, _)| *alias == needle) {
        return Ok(*cat);
    }
    if let Some(cat) = ALL_CATEGORIES
        .iter()
        .find(|c| c.label().eq_ignore_ascii_case(&needle))
    {
        return Ok(*cat);
    }
    let valid: Vec<&str> = FOCUS_ALIASES.iter().map(|(alias, _)| *alias).collect();
    anyhow::bail!("unknown focus {:?} (valid: {})", needle, valid.join(", "))
}

/// Keyword classification. Title matches count double; the highest score
/// wins, earlier categories win ties, and no matches at all means Platform.
pub fn classify(title: &str, description: &str) -> Category {
    let title_tokens = tokenize(title);
    let desc_tokens = tokenize(description);
    let title_lower = title.to_lowercase();
    let desc_lower = description.to_lowercase();

    let mut best = Category::Platform;
    let mut best_score = 0u32;

    for cat in ALL_CATEGORIES {
        let mut score = 0u32;
        for kw in cat.keywords() {
            if kw.contains(' ') {
                if title_lower.contains(kw) {
                    score += 2;
                }
                if desc_lower.contains(kw) {
                    score += 1;
                }
            } else {
                score += 2 * title_tokens.iter().filter(|t| t.contains(kw)).count() as u32;
                score += desc_tokens.iter().filter(|t| t.contains(kw)).count() as u32;
            }
        }
        // Strictly greater: categories are visited in canonical order.
        if score > best_score {
            best_score = score;
            best = cat;
        }
    }

    best
}

/// Lowercased whitespace tokens with non-alphanumeric edges trimmed.
pub(crate) fn tokenize(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ai_ml() {
        let cat = classify(
            "Training Large Language Models at Scale",
            "How we optimized transformer inference pipelines",
        );
        assert_eq!(cat, Category::AiMl);
    }

    #[test]
    fn test_classify_infrastructure() {
        let cat = classify(
            "Building Our Kubernetes Platform",
            "How we deployed containers across multiple cloud regions",
        );
        assert_eq!(cat, Category::Infrastructure);
    }

    #[test]
    fn test_classify_databases() {
        let cat = classify("Scaling PostgreSQL to 10TB", "Database sharding and replication strategies");
        assert_eq!(cat, Category::Databases);
    }

    #[test]
    fn test_classify_distributed() {
        let cat = classify(
            "Durable Idempotency in Distributed Services",
            "Implementing consensus across microservices with Kafka",
        );
        assert_eq!(cat, Category::DistributedSystems);
    }

    #[test]
    fn test_classify_security() {
        let cat = classify(
            "Zero Trust Authentication at Scale",
            "How we implemented TLS encryption and OAuth across services",
        );
        assert_eq!(cat, Category::Security);
    }

    #[test]
    fn test_classify_developer_tools() {
        let cat = classify(
            "Building a Better CLI Developer Experience",
            "Our new debugger and profiler tooling",
        );
        assert_eq!(cat, Category::DeveloperTools);
    }

    #[test]
    fn test_empty_input_is_platform() {
        assert_eq!(classify("", ""), Category::Platform);
    }

    #[test]
    fn test_generic_content_is_platform() {
        assert_eq!(
            classify("Our Year in Review", "A look back at what we accomplished"),
            Category::Platform
        );
    }

    #[test]
    fn test_title_keyword_alone_classifies() {
        assert_eq!(classify("Kubernetes in Production", ""), Category::Infrastructure);
    }

    #[test]
    fn test_title_outweighs_description() {
        // One title hit (2) beats one description hit (1).
        let cat = classify("Redis tips", "notes from our kafka rollout");
        assert_eq!(cat, Category::Databases);
    }

    #[test]
    fn test_tie_goes_to_earlier_category() {
        // "replication" is a keyword of both Databases and Distributed Systems.
        assert_eq!(classify("replication", ""), Category::Databases);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let a = classify("GPU inference on Kubernetes", "serving models at the edge");
        let b = classify("GPU inference on Kubernetes", "serving models at the edge");
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_aliases() {
        assert_eq!(resolve_alias("infra").unwrap(), Category::Infrastructure);
        assert_eq!(resolve_alias("ai").unwrap(), Category::AiMl);
        assert_eq!(resolve_alias("db").unwrap(), Category::Databases);
        assert_eq!(resolve_alias("distributed").unwrap(), Category::DistributedSystems);
        assert_eq!(resolve_alias("security").unwrap(), Category::Security);
        assert_eq!(resolve_alias("tools").unwrap(), Category::DeveloperTools);
        assert_eq!(resolve_alias("platform").unwrap(), Category::Platform);
    }

    #[test]
    fn test_resolve_full_names_case_insensitive() {
        assert_eq!(resolve_alias("AI/ML").unwrap(), Category::AiMl);
        assert_eq!(resolve_alias("  Developer Tools ").unwrap(), Category::DeveloperTools);
        assert_eq!(resolve_alias("INFRA").unwrap(), Category::Infrastructure);
    }

    #[test]
    fn test_resolve_unknown_lists_aliases() {
        let err = resolve_alias("cooking").unwrap_err().to_string();
        assert_eq!(
            err,
            "unknown focus \"cooking\" (valid: infra, ai, db, distributed, security, tools, platform)"
        );
    }

    #[test]
    fn test_label_round_trip() {
        for cat in ALL_CATEGORIES {
            assert_eq!(Category::from_label(cat.label()), cat);
        }
        assert_eq!(Category::from_label("Gardening"), Category::Platform);
    }
}
