//! robots.txt parsing and evaluation (robots exclusion protocol).
//!
//! Groups are introduced by one or more `User-agent` lines and hold `Allow` /
//! `Disallow` rules. Patterns support `*` and a trailing `$`. The longest
//! matching pattern decides; on equal length `Allow` wins.

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    allow: bool,
    pattern: String,
}

#[derive(Debug, Clone, Default)]
struct Group {
    /// Lowercased user-agent tokens.
    agents: Vec<String>,
    rules: Vec<Rule>,
}

/// Parsed robots.txt.
#[derive(Debug, Clone, Default)]
pub struct RobotsTxt {
    groups: Vec<Group>,
}

impl RobotsTxt {
    pub fn parse(text: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        // True while consecutive User-agent lines extend the same group.
        let mut collecting_agents = false;

        for line in text.lines() {
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            }
            .trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !collecting_agents {
                        groups.push(Group::default());
                        collecting_agents = true;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.agents.push(value.to_ascii_lowercase());
                    }
                }
                "allow" | "disallow" => {
                    collecting_agents = false;
                    // An empty Disallow allows everything; it adds no rule.
                    if value.is_empty() {
                        continue;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.rules.push(Rule {
                            allow: key == "allow",
                            pattern: value.to_string(),
                        });
                    }
                }
                _ => {
                    collecting_agents = false;
                }
            }
        }

        RobotsTxt { groups }
    }

    /// Whether `identity` may fetch `path` (path plus optional `?query`).
    ///
    /// Groups naming the identity's product token (the part before the first
    /// `/`, case-insensitive substring match) apply; otherwise the `*` groups.
    pub fn is_allowed(&self, identity: &str, path: &str) -> bool {
        let token = identity
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let named: Vec<&Group> = self
            .groups
            .iter()
            .filter(|g| {
                g.agents
                    .iter()
                    .any(|a| a != "*" && !a.is_empty() && token.contains(a.as_str()))
            })
            .collect();
        let applicable = if named.is_empty() {
            self.groups
                .iter()
                .filter(|g| g.agents.iter().any(|a| a == "*"))
                .collect()
        } else {
            named
        };

        let mut best: Option<&Rule> = None;
        for rule in applicable.iter().flat_map(|g| g.rules.iter()) {
            if !pattern_matches(&rule.pattern, path) {
                continue;
            }
            best = match best {
                None => Some(rule),
                Some(b) if rule.pattern.len() > b.pattern.len() => Some(rule),
                Some(b) if rule.pattern.len() == b.pattern.len() && rule.allow => Some(rule),
                keep => keep,
            };
        }
        best.map_or(true, |r| r.allow)
    }
}

/// Matches a robots.txt path pattern against `path`, anchored at the start.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };
    let parts: Vec<&str> = pattern.split('*').collect();
    let first = parts[0];
    if !path.starts_with(first) {
        return false;
    }
    let mut pos = first.len();
    if parts.len() == 1 {
        return !anchored || path.len() == pos;
    }
    let last_index = parts.len() - 1;
    for (i, part) in parts.iter().enumerate().skip(1) {
        if i == last_index && anchored {
            return path.len() >= pos + part.len() && path.ends_with(part);
        }
        match path[pos..].find(part) {
            Some(idx) => pos += idx + part.len(),
            None => return false,
        }
    }
    true
}
