//! Statute lookup table: act names → link slugs.
//!
//! Names are matched through [`normalize_act_name`], so `The Companies Act,
//! 2013`, `companies act 2013` and `the  Companies Act,2013` all resolve to the
//! same slug.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{DictionaryError, DictionaryResult};

/// Built-in statutes as `(name, slug)`.
const BUILTIN_ACTS: &[(&str, &str)] = &[
    ("The Companies Act, 2013", "companies-act-2013"),
    ("The Companies Act, 1956", "companies-act-1956"),
    ("The Indian Contract Act, 1872", "indian-contract-act-1872"),
    ("The Indian Evidence Act, 1872", "indian-evidence-act-1872"),
    ("The Limitation Act, 1963", "limitation-act-1963"),
    ("The Specific Relief Act, 1963", "specific-relief-act-1963"),
    ("The Transfer of Property Act, 1882", "transfer-of-property-act-1882"),
    ("The Negotiable Instruments Act, 1881", "negotiable-instruments-act-1881"),
    ("The Arbitration and Conciliation Act, 1996", "arbitration-and-conciliation-act-1996"),
    ("The Income Tax Act, 1961", "income-tax-act-1961"),
    ("The Central Goods and Services Tax Act, 2017", "central-goods-and-services-tax-act-2017"),
    ("The Integrated Goods and Services Tax Act, 2017", "integrated-goods-and-services-tax-act-2017"),
    ("The Customs Act, 1962", "customs-act-1962"),
    ("The Central Excise Act, 1944", "central-excise-act-1944"),
    ("The Finance Act, 1994", "finance-act-1994"),
    ("The Patents Act, 1970", "patents-act-1970"),
    ("The Trade Marks Act, 1999", "trade-marks-act-1999"),
    ("The Copyright Act, 1957", "copyright-act-1957"),
    ("The Designs Act, 2000", "designs-act-2000"),
    ("The Geographical Indications of Goods (Registration and Protection) Act, 1999", "geographical-indications-of-goods-registration-and-protection-act-1999"),
    ("The Information Technology Act, 2000", "information-technology-act-2000"),
    ("The Consumer Protection Act, 2019", "consumer-protection-act-2019"),
    ("The Consumer Protection Act, 1986", "consumer-protection-act-1986"),
    ("The Competition Act, 2002", "competition-act-2002"),
    ("The Securities and Exchange Board of India Act, 1992", "securities-and-exchange-board-of-india-act-1992"),
    ("The Securities Contracts (Regulation) Act, 1956", "securities-contracts-regulation-act-1956"),
    ("The Depositories Act, 1996", "depositories-act-1996"),
    ("The Foreign Exchange Management Act, 1999", "foreign-exchange-management-act-1999"),
    ("The Prevention of Money Laundering Act, 2002", "prevention-of-money-laundering-act-2002"),
    ("The Prevention of Corruption Act, 1988", "prevention-of-corruption-act-1988"),
    ("The Banking Regulation Act, 1949", "banking-regulation-act-1949"),
    ("The Reserve Bank of India Act, 1934", "reserve-bank-of-india-act-1934"),
    ("The Recovery of Debts and Bankruptcy Act, 1993", "recovery-of-debts-and-bankruptcy-act-1993"),
    ("The Securitisation and Reconstruction of Financial Assets and Enforcement of Security Interest Act, 2002", "sarfaesi-act-2002"),
    ("The Limited Liability Partnership Act, 2008", "limited-liability-partnership-act-2008"),
    ("The Indian Partnership Act, 1932", "indian-partnership-act-1932"),
    ("The Sale of Goods Act, 1930", "sale-of-goods-act-1930"),
    ("The Registration Act, 1908", "registration-act-1908"),
    ("The Indian Stamp Act, 1899", "indian-stamp-act-1899"),
    ("The Industrial Disputes Act, 1947", "industrial-disputes-act-1947"),
    ("The Payment of Gratuity Act, 1972", "payment-of-gratuity-act-1972"),
    ("The Employees' Provident Funds and Miscellaneous Provisions Act, 1952", "employees-provident-funds-and-miscellaneous-provisions-act-1952"),
    ("The Employees' State Insurance Act, 1948", "employees-state-insurance-act-1948"),
    ("The Minimum Wages Act, 1948", "minimum-wages-act-1948"),
    ("The Payment of Wages Act, 1936", "payment-of-wages-act-1936"),
    ("The Factories Act, 1948", "factories-act-1948"),
    ("The Motor Vehicles Act, 1988", "motor-vehicles-act-1988"),
    ("The Land Acquisition Act, 1894", "land-acquisition-act-1894"),
    ("The Right to Information Act, 2005", "right-to-information-act-2005"),
    ("The Environment (Protection) Act, 1986", "environment-protection-act-1986"),
    ("The Water (Prevention and Control of Pollution) Act, 1974", "water-prevention-and-control-of-pollution-act-1974"),
    ("The Air (Prevention and Control of Pollution) Act, 1981", "air-prevention-and-control-of-pollution-act-1981"),
    ("The Hindu Marriage Act, 1955", "hindu-marriage-act-1955"),
    ("The Hindu Succession Act, 1956", "hindu-succession-act-1956"),
    ("The Indian Succession Act, 1925", "indian-succession-act-1925"),
    ("The Protection of Women from Domestic Violence Act, 2005", "protection-of-women-from-domestic-violence-act-2005"),
    ("The Narcotic Drugs and Psychotropic Substances Act, 1985", "narcotic-drugs-and-psychotropic-substances-act-1985"),
    ("The Arms Act, 1959", "arms-act-1959"),
    ("The Electricity Act, 2003", "electricity-act-2003"),
    ("The Real Estate (Regulation and Development) Act, 2016", "real-estate-regulation-and-development-act-2016"),
    ("The Micro, Small and Medium Enterprises Development Act, 2006", "micro-small-and-medium-enterprises-development-act-2006"),
    ("The Commercial Courts Act, 2015", "commercial-courts-act-2015"),
    ("The General Clauses Act, 1897", "general-clauses-act-1897"),
];

/// Normalized lookup key for an act name.
///
/// Lowercases, drops a leading `the` and every standalone `of`, then keeps only
/// ASCII letters and digits.
pub fn normalize_act_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut words: Vec<&str> = lower.split_whitespace().collect();
    if words.first() == Some(&"the") {
        words.remove(0);
    }
    words
        .into_iter()
        .filter(|w| *w != "of")
        .flat_map(str::chars)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

#[derive(Debug, Clone)]
struct ActEntry {
    name: String,
    slug: String,
}

/// Act name → slug table.
#[derive(Debug, Clone, Default)]
pub struct ActDictionary {
    entries: BTreeMap<String, ActEntry>,
}

impl ActDictionary {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The statutes bundled with lexlink.
    pub fn builtin() -> Self {
        let mut dict = Self::new();
        for (name, slug) in BUILTIN_ACTS {
            dict.insert(name, slug);
        }
        dict
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: &str, slug: &str) {
        let key = normalize_act_name(name);
        if key.is_empty() {
            return;
        }
        self.entries.insert(
            key,
            ActEntry {
                name: name.to_string(),
                slug: slug.to_string(),
            },
        );
    }

    /// Slug for an act name, matched after normalization.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&normalize_act_name(name))
            .map(|e| e.slug.as_str())
    }

    /// Merge a JSON object `{ "Act name": "slug" }`; file entries win.
    pub fn extend_from_json(&mut self, path: &Path) -> DictionaryResult<usize> {
        let content = std::fs::read_to_string(path).map_err(|e| DictionaryError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let table: BTreeMap<String, String> =
            serde_json::from_str(&content).map_err(|e| DictionaryError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let count = table.len();
        for (name, slug) in &table {
            self.insert(name, slug);
        }
        tracing::info!(path = %path.display(), count, "merged act table");
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(name, slug)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|e| (e.name.as_str(), e.slug.as_str()))
    }
}
