use gadgetcache_core::Category;
use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound on words in a heuristic rewrite
pub const MAX_QUERY_WORDS: usize = 5;

/// Rewrites a raw query, optionally knowing the caller's budget ceiling
pub trait QueryRewriter: Send + Sync {
    fn rewrite(&self, query: &str, budget: Option<u32>) -> anyhow::Result<String>;
}

const BRANDS: &[(&str, &str)] = &[
    ("samsung", "samsung"),
    ("galaxy", "samsung"),
    ("apple", "iphone"),
    ("iphone", "iphone"),
    ("oneplus", "oneplus"),
    ("xiaomi", "xiaomi"),
    ("mi", "xiaomi"),
    ("redmi", "redmi"),
    ("poco", "poco"),
    ("realme", "realme"),
    ("oppo", "oppo"),
    ("vivo", "vivo"),
    ("iqoo", "iqoo"),
    ("motorola", "motorola"),
    ("moto", "motorola"),
    ("google", "pixel"),
    ("pixel", "pixel"),
    ("nothing", "nothing"),
    ("infinix", "infinix"),
    ("tecno", "tecno"),
    ("nokia", "nokia"),
    ("asus", "asus"),
    ("rog", "asus"),
    ("honor", "honor"),
    ("lava", "lava"),
];

const SERIES: &[&str] = &[
    "pro", "ultra", "max", "plus", "note", "lite", "neo", "fold", "flip", "mini", "fe", "edge",
    "narzo", "nord",
];

const INTENTS: &[(&str, &[&str])] = &[
    (
        "gaming",
        &["gaming", "game", "games", "gamer", "pubg", "bgmi", "cod", "freefire", "fps", "performance"],
    ),
    (
        "camera",
        &["camera", "cameras", "photography", "photo", "photos", "selfie", "selfies", "video", "vlog", "vlogging"],
    ),
    ("battery", &["battery", "backup", "mah", "charging"]),
];

const BUDGET_WORDS: &[&str] = &["cheap", "budget", "affordable", "lowcost"];
const FLAGSHIP_WORDS: &[&str] = &["flagship", "premium", "luxury", "highend"];

/// Numbers written as prices: "20000", "20k", "₹20,000"
static PRICE_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,3}(?:,\d{2,3})+|\d{4,7}|\d{1,3}\s*k)\b").unwrap());

static MODEL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]*\d+[a-z]*$").unwrap());

fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// A price mentioned in the query text itself, e.g. "under 20k"
fn budget_in_text(query: &str) -> Option<u32> {
    let m = PRICE_MENTION.find(query)?;
    let text: String = m.as_str().chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if let Some(thousands) = text.strip_suffix(['k', 'K']) {
        thousands.parse::<u32>().ok()?.checked_mul(1000)
    } else {
        text.parse().ok()
    }
}

fn is_price_token(token: &str) -> bool {
    let digits = token.trim_end_matches('k');
    digits.chars().all(|c| c.is_ascii_digit())
        && (token.ends_with('k') || digits.len() >= 4)
}

fn category_word(category: Category) -> &'static str {
    match category {
        Category::Budget => "budget",
        Category::MidRange => "midrange",
        Category::Flagship => "flagship",
    }
}

/// Keyword-driven rewriter.
///
/// Output is `[category] [brand] [model...] [intent] phone`, capped at
/// [`MAX_QUERY_WORDS`] words.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicRewriter;

impl HeuristicRewriter {
    pub fn rewrite_query(&self, query: &str, budget: Option<u32>) -> String {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return "smartphone".to_string();
        }

        let brand = tokens
            .iter()
            .find_map(|t| BRANDS.iter().find(|(k, _)| *k == t.as_str()).map(|(_, b)| *b));

        let without_prices = tokenize(&PRICE_MENTION.replace_all(query, " "));
        let mut models: Vec<&str> = Vec::new();
        for token in &without_prices {
            let is_model = (MODEL_TOKEN.is_match(token) && !is_price_token(token))
                || SERIES.contains(&token.as_str());
            if is_model && !models.contains(&token.as_str()) {
                models.push(token);
            }
        }
        models.truncate(2);

        let intent = INTENTS
            .iter()
            .find(|(_, words)| tokens.iter().any(|t| words.contains(&t.as_str())))
            .map(|(intent, _)| *intent);

        let category = match budget.filter(|b| *b > 0).or_else(|| budget_in_text(query)) {
            Some(ceiling) => Some(category_word(Category::from_price(ceiling))),
            None if tokens.iter().any(|t| BUDGET_WORDS.contains(&t.as_str())) => Some("budget"),
            None if tokens.iter().any(|t| FLAGSHIP_WORDS.contains(&t.as_str())) => Some("flagship"),
            None => None,
        };

        let mut words: Vec<&str> = Vec::new();
        words.extend(category);
        words.extend(brand);
        words.extend(models.iter().copied());
        words.extend(intent);
        words.push("phone");

        // brand + two models + intent + "phone" already fills the cap
        if words.len() > MAX_QUERY_WORDS && category.is_some() {
            words.remove(0);
        }
        words.join(" ")
    }
}

impl QueryRewriter for HeuristicRewriter {
    fn rewrite(&self, query: &str, budget: Option<u32>) -> anyhow::Result<String> {
        Ok(self.rewrite_query(query, budget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(query: &str, budget: Option<u32>) -> String {
        HeuristicRewriter.rewrite_query(query, budget)
    }

    #[test]
    fn test_gaming_intents_converge() {
        assert_eq!(rewrite("best phone for pubg", None), "gaming phone");
        assert_eq!(rewrite("gaming phone", None), "gaming phone");
        assert_eq!(rewrite("Phone for BGMI and COD", None), "gaming phone");
    }

    #[test]
    fn test_camera_intent_with_budget() {
        assert_eq!(rewrite("good camera phone", Some(30_000)), "midrange camera phone");
        assert_eq!(rewrite("phone for photography", Some(10_000)), "budget camera phone");
        assert_eq!(rewrite("selfie phone", Some(80_000)), "flagship camera phone");
    }

    #[test]
    fn test_budget_from_query_text() {
        assert_eq!(rewrite("gaming phone under 20k", None), "midrange gaming phone");
        assert_eq!(rewrite("best phone under 12,000", None), "budget phone");
        assert_eq!(rewrite("cheap phone", None), "budget phone");
    }

    #[test]
    fn test_brand_and_model_tokens() {
        assert_eq!(rewrite("Samsung Galaxy S24 Ultra", None), "samsung s24 ultra phone");
        assert_eq!(rewrite("iphone 15 pro", None), "iphone 15 pro phone");
        assert_eq!(rewrite("oneplus nord for gaming", None), "oneplus nord gaming phone");
    }

    #[test]
    fn test_word_cap() {
        let out = rewrite("samsung galaxy s24 ultra for gaming and photography", Some(90_000));
        assert!(out.split_whitespace().count() <= MAX_QUERY_WORDS, "{out}");
        assert!(out.ends_with("gaming phone"));
        assert!(out.starts_with("samsung s24"));
    }

    #[test]
    fn test_blank_query() {
        assert_eq!(rewrite("   ", None), "smartphone");
        assert_eq!(rewrite("?!", Some(20_000)), "smartphone");
    }

    #[test]
    fn test_price_tokens_are_not_models() {
        assert!(is_price_token("20000"));
        assert!(is_price_token("20k"));
        assert!(!is_price_token("s24"));
        assert!(!is_price_token("15"));
    }
}
