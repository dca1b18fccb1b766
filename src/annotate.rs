//! Statute linking and citation/organization extraction.
//!
//! The annotator runs the recognizers over the visible text of the input, turns
//! `section N of the X Act` spans into hyperlinks on the act's slug page, and
//! collects filtered citations and organization names.
//!
//! Linking rewrites the whitespace-collapsed input itself (markup included):
//! each linked span is replaced by its anchor wherever it occurs, in one pass,
//! so anchors are never nested.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::acts::ActDictionary;
use crate::config::LexConfig;
use crate::error::{LexResult, NerError};
use crate::html;
use crate::ner::{Entity, EntityLabel, RecognizerSet};

pub type AnnotateResult<T> = std::result::Result<T, NerError>;

/// Citation spans must carry one of these "versus" markers.
const CITATION_MARKERS: &[&str] = &["VS.", "V.", "vs.", "Vs.", "v."];

/// Organization spans must carry one of these company suffixes.
const ORGANIZATION_MARKERS: &[&str] = &["LIMITED", "LTD", "Ltd"];

/// Characters kept after the word `act` (room for `, 2013`).
const ACT_SUFFIX_CHARS: usize = 6;

static RE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*sections?\b(?P<section>.*?)\bof\b(?P<act>.*)$").unwrap()
});

static RE_ACT_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bact\b").unwrap());

/// A statute reference split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatuteReference {
    /// Section designator with spaces removed (`5`, `3(1)and4`).
    pub section: String,
    /// Act name up to and including `act` plus a short suffix (`the Companies Act, 2013`).
    pub act: String,
    /// Act name ending at the word `act`.
    pub act_base: String,
}

/// Split `section 5 of the Companies Act, 2013` into section and act.
///
/// Returns `None` when the span has no `section ... of` shape, no section
/// designator, or no standalone `act`.
pub fn parse_statute_reference(span: &str) -> Option<StatuteReference> {
    let caps = RE_REFERENCE.captures(span)?;
    let section: String = caps["section"].split_whitespace().collect();
    if section.is_empty() {
        return None;
    }

    let act = caps["act"].trim();
    let act_word = RE_ACT_WORD.find(act)?;
    let act_base = act[..act_word.end()].trim().to_string();

    let rest = &act[act_word.end()..];
    let act = if rest.chars().count() > 3 {
        let suffix: String = rest.chars().take(ACT_SUFFIX_CHARS).collect();
        format!("{act_base}{}", suffix.trim_end())
    } else {
        act_base.clone()
    };

    Some(StatuteReference {
        section,
        act,
        act_base,
    })
}

/// A statute span that resolved to a slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatuteLink {
    /// The recognized span, whitespace-collapsed.
    pub span: String,
    pub slug: String,
    pub section: String,
    pub href: String,
}

impl StatuteLink {
    pub fn anchor(&self) -> String {
        format!("<a href=\"{}\">{}</a>", self.href, self.span)
    }
}

/// Full annotation result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "Acts")]
    pub acts: Vec<String>,
    #[serde(rename = "Citations")]
    pub citations: Vec<String>,
    #[serde(rename = "Organizations")]
    pub organizations: Vec<String>,
    #[serde(rename = "html_text")]
    pub html: String,
    #[serde(skip)]
    pub links: Vec<StatuteLink>,
}

/// Statute-only result, in the shape of the `/spacy` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatuteAnnotation {
    #[serde(rename = "html data")]
    pub html: String,
    #[serde(rename = "Acts")]
    pub acts: Vec<String>,
}

impl Annotation {
    pub fn acts_only(&self) -> StatuteAnnotation {
        StatuteAnnotation {
            html: self.html.clone(),
            acts: self.acts.clone(),
        }
    }
}

/// Runs the recognizers and applies the linking heuristics.
#[derive(Debug, Clone)]
pub struct Annotator {
    recognizers: RecognizerSet,
    dictionary: Arc<ActDictionary>,
    link_base: String,
}

impl Annotator {
    pub fn new(
        recognizers: RecognizerSet,
        dictionary: Arc<ActDictionary>,
        link_base: impl Into<String>,
    ) -> Self {
        Self {
            recognizers,
            dictionary,
            link_base: link_base.into(),
        }
    }

    /// Build from the `[ner]` and `[annotate]` config sections.
    pub fn from_config(config: &LexConfig) -> LexResult<Self> {
        let recognizers = RecognizerSet::from_config(&config.ner)?;
        let mut dictionary = ActDictionary::builtin();
        if let Some(path) = &config.annotate.act_table {
            dictionary.extend_from_json(path)?;
        }
        tracing::info!(
            backend = %config.ner.backend,
            acts = dictionary.len(),
            "annotator ready"
        );
        Ok(Self::new(
            recognizers,
            Arc::new(dictionary),
            config.annotate.link_base.clone(),
        ))
    }

    pub fn dictionary(&self) -> &ActDictionary {
        &self.dictionary
    }

    /// Link statutes and extract citations and organizations.
    pub fn annotate(&self, input: &str) -> AnnotateResult<Annotation> {
        let text = html::visible_text(input);

        let sections = self.recognizers.sections.recognize(&text)?;
        let general = self.recognizers.general.recognize(&text)?;
        let orgs = self.recognizers.organizations.recognize(&text)?;

        let links = self.resolve_links(&sections);
        let html = rewrite_links(input, &links);

        let citations = dedup_in_order(
            general
                .into_iter()
                .filter(|e| e.label == EntityLabel::Citation)
                .filter(|e| CITATION_MARKERS.iter().any(|m| e.text.contains(m)))
                .map(|e| e.text),
        );
        let organizations = dedup_in_order(
            orgs.into_iter()
                .filter(|e| e.label == EntityLabel::Organization)
                .filter(|e| ORGANIZATION_MARKERS.iter().any(|m| e.text.contains(m)))
                .map(|e| e.text),
        );
        let acts = dedup_in_order(links.iter().map(|l| l.slug.clone()));

        tracing::info!(
            acts = acts.len(),
            citations = citations.len(),
            organizations = organizations.len(),
            "annotated document"
        );

        Ok(Annotation {
            acts,
            citations,
            organizations,
            html,
            links,
        })
    }

    /// Link statutes only; the other recognizers are not consulted.
    pub fn annotate_statutes(&self, input: &str) -> AnnotateResult<StatuteAnnotation> {
        let text = html::visible_text(input);
        let sections = self.recognizers.sections.recognize(&text)?;
        let links = self.resolve_links(&sections);
        Ok(StatuteAnnotation {
            html: rewrite_links(input, &links),
            acts: dedup_in_order(links.iter().map(|l| l.slug.clone())),
        })
    }

    fn resolve_links(&self, entities: &[Entity]) -> Vec<StatuteLink> {
        let mut links = Vec::new();
        for ent in entities.iter().filter(|e| e.label == EntityLabel::Section) {
            let clean = html::strip_tags(&ent.text);
            let Some(reference) = parse_statute_reference(&clean) else {
                tracing::debug!(span = %ent.text, "not a statute reference");
                continue;
            };
            let slug = self
                .dictionary
                .lookup(&reference.act)
                .or_else(|| self.dictionary.lookup(&reference.act_base));
            let Some(slug) = slug else {
                tracing::debug!(act = %reference.act, "act not in dictionary");
                continue;
            };
            let span = html::collapse_whitespace(&ent.text);
            if span.is_empty() {
                continue;
            }
            links.push(StatuteLink {
                href: format!("{}{}#{}", self.link_base, slug, reference.section),
                span,
                slug: slug.to_string(),
                section: reference.section,
            });
        }
        links
    }
}

/// Replace every occurrence of each link span in the collapsed input.
fn rewrite_links(input: &str, links: &[StatuteLink]) -> String {
    let collapsed = html::collapse_whitespace(input);
    if links.is_empty() {
        return collapsed;
    }

    // First link for a span wins.
    let mut anchors: HashMap<&str, String> = HashMap::new();
    for link in links {
        anchors.entry(link.span.as_str()).or_insert_with(|| link.anchor());
    }

    // Longest spans first so the leftmost-first alternation prefers them.
    let mut spans: Vec<&str> = anchors.keys().copied().collect();
    spans.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = spans
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");

    let re = match Regex::new(&alternation) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("link pattern rejected: {e}");
            return collapsed;
        }
    };
    re.replace_all(&collapsed, |caps: &regex::Captures<'_>| {
        anchors
            .get(&caps[0])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

fn dedup_in_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NerResult;
    use crate::ner::EntityRecognizer;

    /// Returns a fixed list of entities regardless of input.
    struct Fixed(Vec<Entity>);

    impl EntityRecognizer for Fixed {
        fn recognize(&self, _text: &str) -> NerResult<Vec<Entity>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct Failing;

    impl EntityRecognizer for Failing {
        fn recognize(&self, _text: &str) -> NerResult<Vec<Entity>> {
            Err(NerError::Status {
                url: "http://models/section".into(),
                status: 503,
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn ent(text: &str, label: EntityLabel) -> Entity {
        Entity::new(text, label, 0, text.len())
    }

    fn pattern_annotator() -> Annotator {
        Annotator::new(
            RecognizerSet::pattern(),
            Arc::new(ActDictionary::builtin()),
            "https://www.quickcompany.in/acts/",
        )
    }

    fn fixed_annotator(general: Vec<Entity>, orgs: Vec<Entity>, sections: Vec<Entity>) -> Annotator {
        Annotator::new(
            RecognizerSet {
                general: Arc::new(Fixed(general)),
                organizations: Arc::new(Fixed(orgs)),
                sections: Arc::new(Fixed(sections)),
            },
            Arc::new(ActDictionary::builtin()),
            "https://www.quickcompany.in/acts/",
        )
    }

    #[test]
    fn parse_reference_with_year() {
        let r = parse_statute_reference("section 5 of the companies act, 2013").unwrap();
        assert_eq!(r.section, "5");
        assert_eq!(r.act, "the companies act, 2013");
        assert_eq!(r.act_base, "the companies act");
    }

    #[test]
    fn parse_reference_short_tail_is_dropped() {
        let r = parse_statute_reference("Section 138 of the Negotiable Instruments Act.").unwrap();
        assert_eq!(r.section, "138");
        assert_eq!(r.act, "the Negotiable Instruments Act");
    }

    #[test]
    fn parse_reference_long_tail_is_truncated() {
        let r = parse_statute_reference("section 9 of the Limitation Act, 1963 which bars").unwrap();
        assert_eq!(r.act, "the Limitation Act, 1963");
    }

    #[test]
    fn parse_reference_first_of_splits() {
        let r = parse_statute_reference("section 54 of the Transfer of Property Act").unwrap();
        assert_eq!(r.section, "54");
        assert_eq!(r.act, "the Transfer of Property Act");
    }

    #[test]
    fn parse_reference_removes_spaces_in_section() {
        let r = parse_statute_reference("sections 3 (1) and 4 of the Patents Act, 1970").unwrap();
        assert_eq!(r.section, "3(1)and4");
    }

    #[test]
    fn parse_reference_rejects_non_statutes() {
        assert!(parse_statute_reference("article 21 of the constitution").is_none());
        assert!(parse_statute_reference("section of the companies act").is_none());
        assert!(parse_statute_reference("section 5 of the rules").is_none());
    }

    #[test]
    fn links_statute_in_plain_text() {
        let out = pattern_annotator()
            .annotate("The appeal under section 5 of the Companies Act, 2013 is allowed.")
            .unwrap();
        assert_eq!(out.acts, vec!["companies-act-2013"]);
        assert_eq!(
            out.html,
            "The appeal under <a href=\"https://www.quickcompany.in/acts/companies-act-2013#5\">\
             section 5 of the Companies Act, 2013</a> is allowed."
        );
    }

    #[test]
    fn links_act_name_containing_comma() {
        let out = pattern_annotator()
            .annotate_statutes("Interest under section 16 of the Micro, Small and Medium Enterprises Development Act, 2006 is payable.")
            .unwrap();
        assert_eq!(out.acts, vec!["micro-small-and-medium-enterprises-development-act-2006"]);
        assert!(out.html.contains(
            "href=\"https://www.quickcompany.in/acts/micro-small-and-medium-enterprises-development-act-2006#16\""
        ));
    }

    #[test]
    fn links_inside_html_and_collapses_whitespace() {
        let input = "<html><body>\n  <p>Read   section 138 of the\n Negotiable Instruments Act, 1881.</p>\n</body></html>";
        let out = pattern_annotator().annotate(input).unwrap();
        assert_eq!(out.acts, vec!["negotiable-instruments-act-1881"]);
        assert!(out.html.starts_with("<html><body> <p>Read <a href="));
        assert!(out.html.contains(
            "negotiable-instruments-act-1881#138\">section 138 of the Negotiable Instruments Act, 1881</a>"
        ));
    }

    #[test]
    fn unknown_act_is_left_unlinked() {
        let input = "under section 7 of the Imaginary Widgets Act, 2099 only";
        let out = pattern_annotator().annotate(input).unwrap();
        assert!(out.acts.is_empty());
        assert_eq!(out.html, input);
    }

    #[test]
    fn repeated_reference_is_linked_everywhere_once_listed() {
        let input = "section 5 of the Limitation Act, 1963 and again section 5 of the Limitation Act, 1963";
        let out = pattern_annotator().annotate(input).unwrap();
        assert_eq!(out.acts, vec!["limitation-act-1963"]);
        assert_eq!(out.html.matches("<a href=").count(), 2);
        assert!(!out.html.contains("<a href=\"https://www.quickcompany.in/acts/limitation-act-1963#5\"><a"));
    }

    #[test]
    fn overlapping_spans_prefer_longer() {
        let mut dictionary = ActDictionary::builtin();
        dictionary.insert("The Companies Act", "companies-act");
        let annotator = Annotator::new(
            RecognizerSet {
                general: Arc::new(Fixed(vec![])),
                organizations: Arc::new(Fixed(vec![])),
                sections: Arc::new(Fixed(vec![
                    ent("section 5 of the Companies Act", EntityLabel::Section),
                    ent("section 5 of the Companies Act, 2013", EntityLabel::Section),
                ])),
            },
            Arc::new(dictionary),
            "https://www.quickcompany.in/acts/",
        );
        let out = annotator
            .annotate("see section 5 of the Companies Act, 2013 here")
            .unwrap();
        assert_eq!(out.html.matches("<a href=").count(), 1);
        assert!(out.html.contains("companies-act-2013#5\">section 5 of the Companies Act, 2013</a>"));
        assert_eq!(out.acts, vec!["companies-act", "companies-act-2013"]);
    }

    #[test]
    fn tags_inside_entity_text_are_ignored_for_lookup() {
        let annotator = fixed_annotator(
            vec![],
            vec![],
            vec![ent("section 9 of the <b>Arbitration and Conciliation Act, 1996</b>", EntityLabel::Section)],
        );
        let out = annotator.annotate("plain").unwrap();
        assert_eq!(out.acts, vec!["arbitration-and-conciliation-act-1996"]);
        assert_eq!(out.links[0].section, "9");
    }

    #[test]
    fn citations_and_organizations_are_filtered_and_deduplicated() {
        let annotator = fixed_annotator(
            vec![
                ent("Salomon v. Salomon", EntityLabel::Citation),
                ent("Salomon v. Salomon", EntityLabel::Citation),
                ent("Supreme Court", EntityLabel::Citation),
                ent("Delhi", EntityLabel::Other("GPE".into())),
                ent("State VS. Ram", EntityLabel::Citation),
            ],
            vec![
                ent("ACME LIMITED", EntityLabel::Organization),
                ent("Reserve Bank", EntityLabel::Organization),
                ent("Foo Ltd.", EntityLabel::Organization),
                ent("ACME LIMITED", EntityLabel::Organization),
            ],
            vec![],
        );
        let out = annotator.annotate("irrelevant").unwrap();
        assert_eq!(out.citations, vec!["Salomon v. Salomon", "State VS. Ram"]);
        assert_eq!(out.organizations, vec!["ACME LIMITED", "Foo Ltd."]);
        assert!(out.acts.is_empty());
    }

    #[test]
    fn pattern_pipeline_finds_all_three_kinds() {
        let input = "In the matter of Tata Motors LIMITED vs. Union of India, the court read \
                     section 10 of the Competition Act, 2002.";
        let out = pattern_annotator().annotate(input).unwrap();
        assert_eq!(out.acts, vec!["competition-act-2002"]);
        assert_eq!(out.organizations, vec!["Tata Motors LIMITED"]);
        assert_eq!(out.citations.len(), 1);
        assert!(out.citations[0].contains("vs. Union of India"));
    }

    #[test]
    fn statute_only_shape() {
        let out = pattern_annotator()
            .annotate_statutes("under section 3 of the Patents Act, 1970")
            .unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["Acts"], serde_json::json!(["patents-act-1970"]));
        assert!(json["html data"].as_str().unwrap().contains("patents-act-1970#3"));
    }

    #[test]
    fn full_shape_serializes_with_legacy_keys() {
        let out = pattern_annotator().annotate("nothing here").unwrap();
        let json = serde_json::to_value(&out).unwrap();
        for key in ["Acts", "Citations", "Organizations", "html_text"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json.get("links").is_none());
        assert_eq!(out.acts_only().html, "nothing here");
    }

    #[test]
    fn recognizer_failure_propagates() {
        let annotator = Annotator::new(
            RecognizerSet {
                general: Arc::new(Fixed(vec![])),
                organizations: Arc::new(Fixed(vec![])),
                sections: Arc::new(Failing),
            },
            Arc::new(ActDictionary::builtin()),
            "https://example.test/acts/",
        );
        assert!(matches!(
            annotator.annotate("text"),
            Err(NerError::Status { status: 503, .. })
        ));
    }

    #[test]
    fn dedup_keeps_first_seen_order() {
        let items = ["b", "a", "b", "c", "a"].map(String::from);
        assert_eq!(dedup_in_order(items), vec!["b", "a", "c"]);
    }
}
