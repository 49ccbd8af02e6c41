use std::sync::LazyLock;

use regex::Regex;

/// Curated first-name gender lists. A name lookup is an inherent heuristic:
/// uncommon or non-binary names fall through to neutral tracking.
const FEMALE_NAMES: &[&str] = &[
    "alice", "amanda", "amy", "anna", "ashley", "barbara", "carol", "chloe", "claire", "diana",
    "elena", "elizabeth", "emily", "emma", "grace", "hannah", "isabella", "jennifer", "jessica",
    "julia", "karen", "kate", "katherine", "laura", "linda", "lisa", "lucy", "maria", "mary",
    "megan", "melissa", "michelle", "nancy", "natalie", "nicole", "olivia", "patricia", "priya",
    "rachel", "rebecca", "sandra", "sarah", "sophia", "stephanie", "susan", "victoria", "zoe",
];

const MALE_NAMES: &[&str] = &[
    "aaron", "adam", "alex", "andrew", "anthony", "benjamin", "brian", "carlos", "charles",
    "chris", "christopher", "daniel", "david", "edward", "eric", "ethan", "george", "henry",
    "jacob", "james", "jason", "john", "jonathan", "joseph", "joshua", "kevin", "liam", "marcus",
    "mark", "matthew", "michael", "nathan", "nicholas", "oliver", "patrick", "paul", "peter",
    "raj", "richard", "robert", "ryan", "samuel", "steven", "thomas", "tim", "tom", "william",
];

/// Capitalized words that look like names at sentence starts but never are.
const NON_NAME_WORDS: &[&str] = &[
    "a", "an", "and", "but", "he", "her", "his", "i", "if", "in", "it", "its", "my", "on", "or",
    "our", "she", "so", "the", "their", "then", "they", "this", "to", "user", "we", "when",
    "while", "you",
];

/// Title abbreviations protected from being treated as sentence boundaries.
const TITLE_ABBREVIATIONS: &[&str] = &["dr", "mr", "mrs", "ms", "prof", "st", "jr", "sr"];

/// Singular verb forms that mark a "they/their" as clearly singular.
const SINGULAR_VERBS: &[&str] = &[
    "is", "was", "has", "does", "works", "lives", "likes", "loves", "prefers", "enjoys", "owns",
    "runs", "manages", "teaches", "writes", "studies", "plays",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gender {
    Female,
    Male,
    Neutral,
}

#[derive(Debug, Clone)]
struct Entity {
    name: String,
    gender: Gender,
    start: usize,
    end: usize,
}

static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Optional title, then a run of capitalized words.
    Regex::new(r"\b(?:(Dr|Mr|Mrs|Ms|Prof)\.\s+)?([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap()
});

static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]+").unwrap());

fn name_gender(first_name: &str) -> Gender {
    let lower = first_name.to_lowercase();
    if FEMALE_NAMES.contains(&lower.as_str()) {
        Gender::Female
    } else if MALE_NAMES.contains(&lower.as_str()) {
        Gender::Male
    } else {
        Gender::Neutral
    }
}

/// Extract named entities with offsets: title+name, multi-word capitalized
/// names, and single capitalized tokens found in the first-name lists.
fn extract_entities(sentence: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    for caps in ENTITY_PATTERN.captures_iter(sentence) {
        let full = caps.get(0).unwrap();
        let title = caps.get(1).map(|m| m.as_str());
        let name_match = caps.get(2).unwrap();
        let name = name_match.as_str();
        let first_word = name.split_whitespace().next().unwrap_or(name);
        let multi_word = name.contains(' ');

        if title.is_none() && !multi_word {
            // A lone capitalized token only counts when the name lists know
            // it; this filters sentence-start words and stray capitals.
            if NON_NAME_WORDS.contains(&first_word.to_lowercase().as_str())
                || name_gender(first_word) == Gender::Neutral
            {
                continue;
            }
        }

        let gender = match title {
            Some("Mr") => Gender::Male,
            Some("Mrs") | Some("Ms") => Gender::Female,
            _ => name_gender(first_word),
        };

        entities.push(Entity {
            name: name.to_string(),
            gender,
            start: full.start(),
            end: name_match.end(),
        });
    }

    entities
}

/// Split on terminal punctuation, keeping title abbreviations like "Dr."
/// inside their sentence. Returns byte ranges covering the whole input.
fn split_sentences(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        if b != b'.' && b != b'!' && b != b'?' {
            continue;
        }
        if b == b'.' {
            let preceding: String = text[start..i]
                .chars()
                .rev()
                .take_while(|c| c.is_ascii_alphabetic())
                .collect::<String>()
                .chars()
                .rev()
                .collect();
            if TITLE_ABBREVIATIONS.contains(&preceding.to_lowercase().as_str()) {
                continue;
            }
        }
        sentences.push((start, i + 1));
        start = i + 1;
    }

    if start < text.len() {
        sentences.push((start, text.len()));
    }

    sentences
}

#[derive(Default)]
struct AntecedentTracker {
    last_female: Option<String>,
    last_male: Option<String>,
    last_any: Option<String>,
}

impl AntecedentTracker {
    fn observe(&mut self, entity: &Entity) {
        match entity.gender {
            Gender::Female => self.last_female = Some(entity.name.clone()),
            Gender::Male => self.last_male = Some(entity.name.clone()),
            Gender::Neutral => {}
        }
        self.last_any = Some(entity.name.clone());
    }

    fn resolve(&self, pronoun: &str, next_word: Option<&str>) -> Option<String> {
        match pronoun {
            "she" | "herself" => self.last_female.clone(),
            "her" | "hers" => self
                .last_female
                .as_ref()
                .map(|name| possessive_or_plain(name, pronoun, next_word)),
            "he" | "him" | "himself" => self.last_male.clone(),
            "his" => self.last_male.as_ref().map(|name| format!("{name}'s")),
            // "they" is only replaced when clearly singular: directly before
            // a singular verb form.
            "they" => match next_word {
                Some(verb) if SINGULAR_VERBS.contains(&verb.to_lowercase().as_str()) => {
                    self.last_any.clone()
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// "her" doubles as object and possessive; treat it as possessive when a
/// content word follows, otherwise as the plain name.
fn possessive_or_plain(name: &str, pronoun: &str, next_word: Option<&str>) -> String {
    if pronoun == "hers" {
        return format!("{name}'s");
    }
    const OBJECT_FOLLOWERS: &[&str] = &[
        "and", "or", "but", "to", "for", "with", "at", "on", "in", "about", "yesterday", "today",
        "tomorrow", "last", "next", "again", "once",
    ];
    match next_word {
        Some(word) if !OBJECT_FOLLOWERS.contains(&word.to_lowercase().as_str()) => {
            format!("{name}'s")
        }
        _ => name.to_string(),
    }
}

/// Replace singular pronouns with their tracked named antecedents.
///
/// Entities update "last seen female/male/any" as the scan passes them, so a
/// pronoun always resolves to the most recent matching name at its position,
/// including names from earlier sentences.
pub fn resolve_pronouns(text: &str) -> String {
    let mut tracker = AntecedentTracker::default();
    let mut output = String::with_capacity(text.len());

    for (sentence_start, sentence_end) in split_sentences(text) {
        let sentence = &text[sentence_start..sentence_end];
        let entities = extract_entities(sentence);
        let words: Vec<(usize, usize, &str)> = WORD_PATTERN
            .find_iter(sentence)
            .map(|m| (m.start(), m.end(), m.as_str()))
            .collect();

        let mut cursor = 0;
        let mut entity_idx = 0;
        let mut word_idx = 0;

        while word_idx < words.len() {
            let (word_start, word_end, word) = words[word_idx];

            // Entity spans swallow their words and update the trackers.
            if entity_idx < entities.len() && entities[entity_idx].start <= word_start {
                let entity = &entities[entity_idx];
                tracker.observe(entity);
                output.push_str(&sentence[cursor..entity.end]);
                cursor = entity.end;
                while word_idx < words.len() && words[word_idx].0 < entity.end {
                    word_idx += 1;
                }
                entity_idx += 1;
                continue;
            }

            let lower = word.to_lowercase();
            let next_word = words.get(word_idx + 1).map(|&(_, _, w)| w);
            if let Some(replacement) = tracker.resolve(&lower, next_word) {
                output.push_str(&sentence[cursor..word_start]);
                output.push_str(&replacement);
                cursor = word_end;
            }
            word_idx += 1;
        }

        output.push_str(&sentence[cursor..]);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolves_she_to_last_female() {
        assert_eq!(
            resolve_pronouns("Sarah joined the lab in 2024. She published 3 papers."),
            "Sarah joined the lab in 2024. Sarah published 3 papers."
        );
    }

    #[test]
    fn test_resolves_he_to_last_male() {
        assert_eq!(
            resolve_pronouns("Marcus moved to Berlin. He works at a startup."),
            "Marcus moved to Berlin. Marcus works at a startup."
        );
    }

    #[test]
    fn test_possessive_pronouns() {
        assert_eq!(
            resolve_pronouns("Sarah is a chemist. Her sister lives in Oslo."),
            "Sarah is a chemist. Sarah's sister lives in Oslo."
        );
        assert_eq!(
            resolve_pronouns("David retired. His pension started in March."),
            "David retired. David's pension started in March."
        );
    }

    #[test]
    fn test_object_her_not_made_possessive() {
        assert_eq!(
            resolve_pronouns("Emma called. I spoke with her yesterday."),
            "Emma called. I spoke with Emma yesterday."
        );
    }

    #[test]
    fn test_title_protected_from_sentence_split() {
        assert_eq!(
            resolve_pronouns("Dr. Sarah Chen leads the team. She reviews every paper."),
            "Dr. Sarah Chen leads the team. Sarah Chen reviews every paper."
        );
    }

    #[test]
    fn test_title_gender_overrides_name_lookup() {
        assert_eq!(
            resolve_pronouns("Ms. Parker arrived early. She opened the office."),
            "Ms. Parker arrived early. Parker opened the office."
        );
    }

    #[test]
    fn test_tracks_two_genders_independently() {
        assert_eq!(
            resolve_pronouns("Sarah met David for lunch. She paid and he tipped."),
            "Sarah met David for lunch. Sarah paid and David tipped."
        );
    }

    #[test]
    fn test_singular_they_before_verb() {
        assert_eq!(
            resolve_pronouns("Jordan Lee joined in May. They works remotely."),
            "Jordan Lee joined in May. Jordan Lee works remotely."
        );
    }

    #[test]
    fn test_plural_they_untouched() {
        let text = "The engineers shipped it. They celebrated together.";
        assert_eq!(resolve_pronouns(text), text);
    }

    #[test]
    fn test_unknown_single_name_not_treated_as_entity() {
        // "Blorvak" is in no name list; "she" has no antecedent and stays.
        let text = "Blorvak arrived. Then she left.";
        assert_eq!(resolve_pronouns(text), text);
    }

    #[test]
    fn test_no_entities_leaves_pronouns() {
        let text = "She likes tea and he likes coffee.";
        assert_eq!(resolve_pronouns(text), text);
    }
}
