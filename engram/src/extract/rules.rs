//! Deterministic regex supplement covering fact shapes the LLM is known to
//! under-extract. Always runs alongside LLM extraction, not just on failure.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::models::{FactCandidate, FactKind};

/// One supplement rule: a pattern and a builder turning the match into a
/// candidate. `keywords` names the capture groups whose text forms the
/// already-covered guard set.
pub struct SupplementRule {
    pub name: &'static str,
    pattern: Regex,
    build: fn(&Captures) -> FactCandidate,
    keyword_groups: &'static [usize],
}

fn candidate(content: String, kind: FactKind, is_core: bool) -> FactCandidate {
    FactCandidate {
        content,
        kind,
        is_core,
        confidence: 0.75,
        entities: Vec::new(),
        expires_at: None,
    }
}

fn clean(fragment: &str) -> String {
    fragment.trim().trim_end_matches(['.', ',', '!']).to_string()
}

fn build_job_title(caps: &Captures) -> FactCandidate {
    candidate(
        format!("User is a {}", clean(&caps[1])),
        FactKind::Fact,
        true,
    )
}

fn build_employer(caps: &Captures) -> FactCandidate {
    candidate(
        format!("User works at {}", clean(&caps[1])),
        FactKind::Fact,
        false,
    )
}

fn build_location(caps: &Captures) -> FactCandidate {
    candidate(
        format!("User lives in {}", clean(&caps[1])),
        FactKind::Fact,
        true,
    )
}

fn build_age(caps: &Captures) -> FactCandidate {
    candidate(
        format!("User is {} years old", &caps[1]),
        FactKind::Fact,
        true,
    )
}

fn build_allergy(caps: &Captures) -> FactCandidate {
    candidate(
        format!("User is allergic to {}", clean(&caps[1])),
        FactKind::Fact,
        true,
    )
}

fn build_pet(caps: &Captures) -> FactCandidate {
    candidate(
        format!("User has a {} named {}", &caps[1].to_lowercase(), clean(&caps[2])),
        FactKind::Fact,
        true,
    )
}

fn build_relationship(caps: &Captures) -> FactCandidate {
    let mut cand = candidate(
        format!("{} is User's {}", clean(&caps[2]), &caps[1].to_lowercase()),
        FactKind::Fact,
        true,
    );
    cand.entities.push(clean(&caps[2]));
    cand
}

fn build_relationship_reversed(caps: &Captures) -> FactCandidate {
    let mut cand = candidate(
        format!("{} is User's {}", clean(&caps[1]), &caps[2].to_lowercase()),
        FactKind::Fact,
        true,
    );
    cand.entities.push(clean(&caps[1]));
    cand
}

fn build_diet(caps: &Captures) -> FactCandidate {
    candidate(
        format!("User is {}", &caps[1].to_lowercase()),
        FactKind::Fact,
        true,
    )
}

fn build_hobby(caps: &Captures) -> FactCandidate {
    let mut content = format!("User {} {}", &caps[1].to_lowercase(), clean(&caps[2]));
    if let Some(frequency) = caps.get(3) {
        content.push(' ');
        content.push_str(frequency.as_str().trim());
    }
    if let Some(duration) = caps.get(4) {
        content.push(' ');
        content.push_str(duration.as_str().trim());
    }
    candidate(content, FactKind::Fact, true)
}

fn build_third_party_job(caps: &Captures) -> FactCandidate {
    let mut cand = candidate(
        format!("{} works at {}", clean(&caps[1]), clean(&caps[2])),
        FactKind::Fact,
        true,
    );
    cand.entities.push(clean(&caps[1]));
    cand
}

fn build_family_attribute(caps: &Captures) -> FactCandidate {
    candidate(
        format!("User's {} is {}", &caps[1].to_lowercase(), clean(&caps[2])),
        FactKind::Fact,
        true,
    )
}

fn build_tech_stack(caps: &Captures) -> FactCandidate {
    candidate(
        format!("User uses {}", clean(&caps[1])),
        FactKind::Fact,
        false,
    )
}

fn build_budget(caps: &Captures) -> FactCandidate {
    candidate(
        format!("User's budget is {}", clean(&caps[1])),
        FactKind::Fact,
        false,
    )
}

fn build_team_size(caps: &Captures) -> FactCandidate {
    candidate(
        format!("User's team has {} people", &caps[1]),
        FactKind::Fact,
        false,
    )
}

fn build_revenue(caps: &Captures) -> FactCandidate {
    candidate(
        format!("Revenue target is {}", clean(&caps[1])),
        FactKind::Fact,
        false,
    )
}

fn build_headcount(caps: &Captures) -> FactCandidate {
    candidate(
        format!("The company has {} employees", &caps[1]),
        FactKind::Fact,
        false,
    )
}

fn build_growth(caps: &Captures) -> FactCandidate {
    candidate(
        format!("{} grew {}%", clean(&caps[1]), &caps[2]),
        FactKind::Fact,
        false,
    )
}

static SUPPLEMENT_RULES: LazyLock<Vec<SupplementRule>> = LazyLock::new(|| {
    vec![
        SupplementRule {
            name: "job_title",
            pattern: Regex::new(
                r"(?i)\bI (?:am|work as) an? ([a-z][a-z ]{2,40}?(?:engineer|developer|designer|manager|analyst|scientist|teacher|nurse|doctor|writer|consultant|researcher|architect|accountant|lawyer))\b",
            )
            .unwrap(),
            build: build_job_title,
            keyword_groups: &[1],
        },
        SupplementRule {
            name: "employer",
            pattern: Regex::new(r"(?i)\bI work (?:at|for) ((?-i)[A-Z][\w&-]*(?: [A-Z][\w&-]+)*)")
                .unwrap(),
            build: build_employer,
            keyword_groups: &[1],
        },
        SupplementRule {
            name: "location",
            pattern: Regex::new(
                r"(?i)\bI(?: am|'m)? (?:live in|living in|based in|moved to|relocated to) ((?-i)[A-Z][\w-]*(?: [A-Z][\w-]*)*)",
            )
            .unwrap(),
            build: build_location,
            keyword_groups: &[1],
        },
        SupplementRule {
            name: "age",
            pattern: Regex::new(r"(?i)\bI(?: am|'m) (\d{1,3}) years old\b").unwrap(),
            build: build_age,
            keyword_groups: &[1],
        },
        SupplementRule {
            name: "allergy",
            pattern: Regex::new(r"(?i)\bI(?: am|'m) allergic to ([a-z ]{3,40}?)(?:[.,!]|$| and )")
                .unwrap(),
            build: build_allergy,
            keyword_groups: &[1],
        },
        SupplementRule {
            name: "pet",
            pattern: Regex::new(
                r"(?i)\b(?:my|I have a|I got a) (dog|cat|bird|rabbit|hamster|fish|parrot|turtle)(?:,? named| called)? ((?-i)[A-Z][\w-]+)",
            )
            .unwrap(),
            build: build_pet,
            keyword_groups: &[1, 2],
        },
        SupplementRule {
            name: "relationship",
            pattern: Regex::new(
                r"(?i)\bmy (wife|husband|partner|girlfriend|boyfriend|mother|mom|father|dad|sister|brother|daughter|son)(?:,)? ((?-i)[A-Z][\w-]+)",
            )
            .unwrap(),
            build: build_relationship,
            keyword_groups: &[1, 2],
        },
        SupplementRule {
            name: "relationship_reversed",
            pattern: Regex::new(
                r"\b([A-Z][\w-]+) is my (wife|husband|partner|girlfriend|boyfriend|mother|mom|father|dad|sister|brother|daughter|son)\b",
            )
            .unwrap(),
            build: build_relationship_reversed,
            keyword_groups: &[1, 2],
        },
        SupplementRule {
            name: "diet",
            pattern: Regex::new(r"(?i)\bI(?: am|'m) (vegetarian|vegan|pescatarian|gluten-free|lactose intolerant|kosher|halal)\b")
                .unwrap(),
            build: build_diet,
            keyword_groups: &[1],
        },
        SupplementRule {
            name: "hobby",
            pattern: Regex::new(
                r"(?i)\bI (play|practice|do|go) ([a-z ]{3,30}?)( every \w+| twice a \w+| once a \w+| daily| weekly)?( for [\w ]+?(?:hours?|minutes?))?(?:[.,!]|$)",
            )
            .unwrap(),
            build: build_hobby,
            keyword_groups: &[2],
        },
        SupplementRule {
            name: "third_party_job",
            pattern: Regex::new(
                r"\b([A-Z][\w-]+(?: [A-Z][\w-]+)?) works (?:at|for) ([A-Z][\w&-]*(?: [A-Z][\w&-]+)*)",
            )
            .unwrap(),
            build: build_third_party_job,
            keyword_groups: &[1, 2],
        },
        SupplementRule {
            name: "family_attribute",
            pattern: Regex::new(
                r"(?i)\bmy (mother|mom|father|dad|sister|brother|wife|husband|daughter|son) is (?:an? )?([\w ]{2,40}?)(?:[.,!]|$| and )",
            )
            .unwrap(),
            build: build_family_attribute,
            keyword_groups: &[1, 2],
        },
        SupplementRule {
            name: "tech_stack",
            pattern: Regex::new(
                r"(?i)\b(?:I use|we use|our stack is|built with) ((?:[A-Za-z+#.]+(?:, | and | with )?){1,6})(?:[.,!]|$)",
            )
            .unwrap(),
            build: build_tech_stack,
            keyword_groups: &[1],
        },
        SupplementRule {
            name: "budget",
            pattern: Regex::new(r"(?i)\b(?:my|our|the) budget is (\$?[\d,.]+[kKmMbB]?)").unwrap(),
            build: build_budget,
            keyword_groups: &[1],
        },
        SupplementRule {
            name: "team_size",
            pattern: Regex::new(r"(?i)\b(?:my|our|a) team (?:of|has) (\d{1,5})\b").unwrap(),
            build: build_team_size,
            keyword_groups: &[1],
        },
        SupplementRule {
            name: "revenue",
            pattern: Regex::new(r"(?i)\brevenue (?:target|goal) is (?:now )?(\$?[\d,.]+[kKmMbB]?)")
                .unwrap(),
            build: build_revenue,
            keyword_groups: &[1],
        },
        SupplementRule {
            name: "headcount",
            pattern: Regex::new(r"(?i)\b(?:we have|the company has) (\d{1,6}) employees\b").unwrap(),
            build: build_headcount,
            keyword_groups: &[1],
        },
        SupplementRule {
            name: "growth",
            pattern: Regex::new(r"(?i)\b([\w ]{3,30}?) grew (?:by )?(\d{1,3}(?:\.\d+)?)%").unwrap(),
            build: build_growth,
            keyword_groups: &[1, 2],
        },
    ]
});

/// Run every supplement rule against the normalized text. A rule's candidate
/// is only added when no existing candidate already mentions its keyword set;
/// a coarse coverage guard, not a semantic check.
pub fn supplement_candidates(text: &str, existing: &[FactCandidate]) -> Vec<FactCandidate> {
    let existing_lower: Vec<String> = existing
        .iter()
        .map(|c| c.content.to_lowercase())
        .collect();
    let mut supplements: Vec<FactCandidate> = Vec::new();

    for rule in SUPPLEMENT_RULES.iter() {
        for caps in rule.pattern.captures_iter(text) {
            let keywords: Vec<String> = rule
                .keyword_groups
                .iter()
                .filter_map(|&g| caps.get(g))
                .map(|m| m.as_str().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();

            let covered = !keywords.is_empty()
                && existing_lower
                    .iter()
                    .any(|content| keywords.iter().all(|k| content.contains(k.as_str())));
            if covered {
                continue;
            }

            let built = (rule.build)(&caps);
            let already_added = supplements
                .iter()
                .any(|c| c.content.eq_ignore_ascii_case(&built.content));
            if !already_added {
                tracing::debug!(rule = rule.name, "Supplement rule produced candidate");
                supplements.push(built);
            }
        }
    }

    supplements
}
