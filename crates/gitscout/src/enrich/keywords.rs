//! Keyword classification from topics, free text, and primary language.
//!
//! The category table is a const slice, so accumulation order is an explicit
//! policy: first match wins, table order breaking ties within one topic or
//! token. The cap of three labels is applied at render time, after all topic
//! matches have accumulated.

/// Canonical categories and their recognized lowercase synonyms.
const CATEGORY_TABLE: &[(&str, &[&str])] = &[
    (
        "web",
        &[
            "web", "website", "webapp", "frontend", "backend", "fullstack", "http", "server",
            "nextjs", "react", "vue",
        ],
    ),
    (
        "ai",
        &[
            "ai",
            "ml",
            "artificial-intelligence",
            "machine-learning",
            "deep-learning",
            "nlp",
            "computer-vision",
            "llm",
            "agent",
        ],
    ),
    ("database", &["database", "sql", "nosql", "storage"]),
    ("mobile", &["mobile", "android", "ios", "flutter", "react-native"]),
    ("game", &["game", "gamedev", "gaming", "unity", "unreal"]),
    ("cli", &["cli", "command-line", "terminal", "shell"]),
    (
        "data-science",
        &[
            "data-science",
            "data-analysis",
            "data-visualization",
            "pandas",
            "numpy",
            "jupyter",
        ],
    ),
    (
        "devops",
        &["devops", "docker", "kubernetes", "ci-cd", "automation", "terraform"],
    ),
    (
        "security",
        &["security", "cybersecurity", "vulnerability", "pentesting"],
    ),
    ("blockchain", &["blockchain", "crypto", "web3"]),
    ("framework", &["framework", "library"]),
    ("testing", &["testing", "test", "tdd", "bdd"]),
    ("tool", &["tool", "utility", "plugin"]),
];

/// Categories rendered fully upper-cased instead of capitalized.
const ACRONYMS: &[&str] = &["AI", "ML", "NLP", "API", "CLI", "CI-CD", "SQL"];

const MAX_LABELS: usize = 3;

/// Label applied when nothing matches and no language is known.
const FALLBACK_LABEL: &str = "Tool";

/// Map free-text signals to 1..=3 normalized category labels.
///
/// Pass 1 accumulates a category for every matching topic tag (possibly
/// more than three). Pass 2 scans description and readme tokens only while
/// fewer than three categories are known. Zero matches fall back to the
/// primary language, or a generic label when that too is unknown.
pub fn classify(
    topics: &[String],
    description: Option<&str>,
    readme: &str,
    language: Option<&str>,
) -> Vec<String> {
    let mut found: Vec<&'static str> = Vec::new();

    for topic in topics {
        let topic = topic.to_lowercase();
        for (category, synonyms) in CATEGORY_TABLE {
            if synonyms.contains(&topic.as_str()) && !found.contains(category) {
                found.push(category);
            }
        }
    }

    if found.len() < MAX_LABELS {
        let text = format!(
            "{} {}",
            description.unwrap_or_default().to_lowercase(),
            readme.to_lowercase()
        );
        'tokens: for token in text.split(|c: char| c.is_whitespace() || c == ',' || c == '.') {
            for (category, synonyms) in CATEGORY_TABLE {
                if synonyms.contains(&token) && !found.contains(category) {
                    found.push(category);
                    if found.len() >= MAX_LABELS {
                        break 'tokens;
                    }
                }
            }
        }
    }

    let labels: Vec<String> = found.iter().take(MAX_LABELS).map(|c| render(c)).collect();
    if !labels.is_empty() {
        return labels;
    }

    match language {
        Some(lang) if !lang.is_empty() && lang != "N/A" => vec![lang.to_string()],
        _ => vec![FALLBACK_LABEL.to_string()],
    }
}

fn render(category: &str) -> String {
    let upper = category.to_uppercase();
    if ACRONYMS.contains(&upper.as_str()) {
        upper
    } else {
        capitalize(category)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
