// src/services/normalize.rs

//! String normalization shared by every scraper and maintenance task.
//!
//! Covers the category keyword table, text cleanup, the dedup name key,
//! prefecture canonicalization, and the prefecture → region lookup.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::models::{Category, Region};

/// Maximum stored description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Keyword → category table. Order matters: exact matches are tried first,
/// then substring matches in this order, and the first hit wins.
const CATEGORY_KEYWORDS: &[(&str, Category)] = &[
    // multi-word entries go first so "theme park" never lands on "park"
    ("theme park", Category::Attraction),
    ("amusement park", Category::Attraction),
    ("national park", Category::Nature),
    ("hot spring", Category::Nature),
    ("fish market", Category::Food),
    ("morning market", Category::Food),
    ("local specialties", Category::Food),
    ("department store", Category::Shopping),
    ("art gallery", Category::Culture),
    // shopping
    ("shopping", Category::Shopping),
    ("souvenir", Category::Shopping),
    ("mall", Category::Shopping),
    ("market", Category::Shopping),
    ("craft", Category::Shopping),
    ("shop", Category::Shopping),
    // food
    ("restaurant", Category::Food),
    ("food", Category::Food),
    ("gourmet", Category::Food),
    ("cuisine", Category::Food),
    ("dining", Category::Food),
    ("cafe", Category::Food),
    ("sake", Category::Food),
    ("brewery", Category::Food),
    ("ramen", Category::Food),
    ("sushi", Category::Food),
    ("udon", Category::Food),
    // hotel
    ("hotel", Category::Hotel),
    ("ryokan", Category::Hotel),
    ("accommodation", Category::Hotel),
    ("lodging", Category::Hotel),
    ("guesthouse", Category::Hotel),
    ("hostel", Category::Hotel),
    // culture
    ("temple", Category::Culture),
    ("shrine", Category::Culture),
    ("castle", Category::Culture),
    ("museum", Category::Culture),
    ("history", Category::Culture),
    ("historic", Category::Culture),
    ("heritage", Category::Culture),
    ("culture", Category::Culture),
    ("cultural", Category::Culture),
    ("gallery", Category::Culture),
    ("arts", Category::Culture),
    ("festival", Category::Culture),
    ("tradition", Category::Culture),
    ("pilgrimage", Category::Culture),
    // nature
    ("onsen", Category::Nature),
    ("garden", Category::Nature),
    ("park", Category::Nature),
    ("nature", Category::Nature),
    ("mountain", Category::Nature),
    ("lake", Category::Nature),
    ("river", Category::Nature),
    ("beach", Category::Nature),
    ("island", Category::Nature),
    ("waterfall", Category::Nature),
    ("forest", Category::Nature),
    ("gorge", Category::Nature),
    ("valley", Category::Nature),
    ("coast", Category::Nature),
    ("volcano", Category::Nature),
    ("flower", Category::Nature),
    ("hiking", Category::Nature),
    ("outdoor", Category::Nature),
    // attraction
    ("aquarium", Category::Attraction),
    ("zoo", Category::Attraction),
    ("tower", Category::Attraction),
    ("observatory", Category::Attraction),
    ("experience", Category::Attraction),
    ("activity", Category::Attraction),
    ("entertainment", Category::Attraction),
    ("sightseeing", Category::Attraction),
    ("attraction", Category::Attraction),
];

/// Match text against the keyword table without falling back.
pub fn match_category(text: &str) -> Option<Category> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if let Some((_, category)) = CATEGORY_KEYWORDS.iter().find(|(kw, _)| *kw == lower) {
        return Some(*category);
    }

    CATEGORY_KEYWORDS
        .iter()
        .find(|(kw, _)| lower.contains(kw))
        .map(|(_, category)| *category)
}

/// Map free text onto the category vocabulary, defaulting to `attraction`.
pub fn normalize_category(text: &str) -> Category {
    match_category(text).unwrap_or_default()
}

/// Collapse all whitespace runs (including non-breaking spaces) and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean and cap a description. Returns `None` when nothing is left.
pub fn truncate_description(text: &str) -> Option<String> {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.chars().count() <= MAX_DESCRIPTION_CHARS {
        return Some(cleaned);
    }
    let mut cut: String = cleaned.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    Some(cut)
}

/// Dedup key for names: lowercase words joined by single spaces, with
/// punctuation dropped.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .unicode_words()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the text contains hiragana, katakana, or CJK ideographs.
pub fn contains_japanese(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{3040}'..='\u{309F}'   // hiragana
            | '\u{30A0}'..='\u{30FF}' // katakana
            | '\u{3400}'..='\u{4DBF}' // CJK extension A
            | '\u{4E00}'..='\u{9FFF}' // CJK unified
            | '\u{FF66}'..='\u{FF9F}' // half-width katakana
        )
    })
}

/// Replace Hepburn macrons with plain vowels ("Hyōgo" → "Hyogo").
pub fn fold_macrons(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ā' | 'â' => 'a',
            'ī' | 'î' => 'i',
            'ū' | 'û' => 'u',
            'ē' | 'ê' => 'e',
            'ō' | 'ô' => 'o',
            'Ā' | 'Â' => 'A',
            'Ī' | 'Î' => 'I',
            'Ū' | 'Û' => 'U',
            'Ē' | 'Ê' => 'E',
            'Ō' | 'Ô' => 'O',
            other => other,
        })
        .collect()
}

/// The 47 prefectures and the region each belongs to.
pub const PREFECTURES: [(&str, Region); 47] = [
    ("Hokkaido", Region::Hokkaido),
    ("Aomori", Region::Tohoku),
    ("Iwate", Region::Tohoku),
    ("Miyagi", Region::Tohoku),
    ("Akita", Region::Tohoku),
    ("Yamagata", Region::Tohoku),
    ("Fukushima", Region::Tohoku),
    ("Ibaraki", Region::Kanto),
    ("Tochigi", Region::Kanto),
    ("Gunma", Region::Kanto),
    ("Saitama", Region::Kanto),
    ("Chiba", Region::Kanto),
    ("Tokyo", Region::Kanto),
    ("Kanagawa", Region::Kanto),
    ("Niigata", Region::Chubu),
    ("Toyama", Region::Chubu),
    ("Ishikawa", Region::Chubu),
    ("Fukui", Region::Chubu),
    ("Yamanashi", Region::Chubu),
    ("Nagano", Region::Chubu),
    ("Gifu", Region::Chubu),
    ("Shizuoka", Region::Chubu),
    ("Aichi", Region::Chubu),
    ("Mie", Region::Kansai),
    ("Shiga", Region::Kansai),
    ("Kyoto", Region::Kansai),
    ("Osaka", Region::Kansai),
    ("Hyogo", Region::Kansai),
    ("Nara", Region::Kansai),
    ("Wakayama", Region::Kansai),
    ("Tottori", Region::Chugoku),
    ("Shimane", Region::Chugoku),
    ("Okayama", Region::Chugoku),
    ("Hiroshima", Region::Chugoku),
    ("Yamaguchi", Region::Chugoku),
    ("Tokushima", Region::Shikoku),
    ("Kagawa", Region::Shikoku),
    ("Ehime", Region::Shikoku),
    ("Kochi", Region::Shikoku),
    ("Fukuoka", Region::Kyushu),
    ("Saga", Region::Kyushu),
    ("Nagasaki", Region::Kyushu),
    ("Kumamoto", Region::Kyushu),
    ("Oita", Region::Kyushu),
    ("Miyazaki", Region::Kyushu),
    ("Kagoshima", Region::Kyushu),
    ("Okinawa", Region::Okinawa),
];

static PREFECTURE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let names: Vec<&str> = PREFECTURES.iter().map(|(name, _)| *name).collect();
    Regex::new(&format!(r"\b({})\b", names.join("|"))).expect("static prefecture pattern")
});

static ROMAJI_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\s-]+(?:prefecture|pref\.?|metropolis|ken|fu|to)$")
        .expect("static suffix pattern")
});

/// First prefecture name mentioned in the text, in canonical form.
pub fn prefecture_in_text(text: &str) -> Option<&'static str> {
    let folded = fold_macrons(text);
    let found = PREFECTURE_PATTERN.find(&folded)?;
    PREFECTURES
        .iter()
        .find(|(name, _)| *name == found.as_str())
        .map(|(name, _)| *name)
}

/// Region for a prefecture string in any of its spellings.
pub fn region_for_prefecture(prefecture: &str) -> Option<Region> {
    let canonical = normalize_prefecture(prefecture);
    PREFECTURES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(&canonical))
        .map(|(_, region)| *region)
}

/// Canonical prefecture spelling: administrative suffixes stripped
/// ("Aichi-ken", "Kyoto Prefecture", "Tokyo-to", "愛知県"), macrons folded,
/// ASCII words title-cased. Idempotent.
pub fn normalize_prefecture(raw: &str) -> String {
    let mut value = tidy_prefecture(&fold_macrons(raw));
    if value.is_empty() {
        return value;
    }

    // "Hokkaido" already ends in the -do circuit suffix; never cut it.
    if value.eq_ignore_ascii_case("hokkaido") || value == "北海道" {
        return if value == "北海道" { value } else { "Hokkaido".to_string() };
    }

    loop {
        let stripped = tidy_prefecture(&strip_suffix_once(&value));
        if stripped == value {
            break;
        }
        value = stripped;
    }

    if value.is_ascii() {
        title_case(&value)
    } else {
        value
    }
}

fn tidy_prefecture(value: &str) -> String {
    clean_text(value)
        .trim_matches(|c: char| c == ',' || c == '.' || c.is_whitespace())
        .to_string()
}

fn strip_suffix_once(value: &str) -> String {
    if let Some(found) = ROMAJI_SUFFIX.find(value) {
        if found.start() > 0 {
            return value[..found.start()].trim().to_string();
        }
    }
    if value.chars().count() > 1 {
        if let Some(rest) = value.strip_suffix('県').or_else(|| value.strip_suffix('府')) {
            return rest.to_string();
        }
        if value == "東京都" {
            return "東京".to_string();
        }
    }
    value.to_string()
}

fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_category_exact_and_substring() {
        assert_eq!(normalize_category("Temple"), Category::Culture);
        assert_eq!(normalize_category("  Buddhist temples  "), Category::Culture);
        assert_eq!(normalize_category("Theme Park"), Category::Attraction);
        assert_eq!(normalize_category("Kenroku-en Garden"), Category::Nature);
        assert_eq!(normalize_category("Ryokan & Hotels"), Category::Hotel);
    }

    #[test]
    fn test_normalize_category_defaults_to_attraction() {
        assert_eq!(normalize_category(""), Category::Attraction);
        assert_eq!(normalize_category("Something else entirely"), Category::Attraction);
        assert_eq!(match_category("xyz"), None);
    }

    #[test]
    fn test_normalize_category_always_in_vocabulary() {
        let inputs = [
            "", " ", "TEMPLE", "sushi bar", "Ski slopes", "東京", "!!!", "Aquarium",
            "local specialties and crafts", "mall of japan", "historic inn",
        ];
        for input in inputs {
            assert!(Category::ALL.contains(&normalize_category(input)), "{input}");
        }
    }

    #[test]
    fn test_first_match_wins_in_table_order() {
        // "shop" precedes "museum" in the table
        assert_eq!(normalize_category("museum shop"), Category::Shopping);
        // "fish market" precedes "market"
        assert_eq!(normalize_category("Karato fish market"), Category::Food);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Otaru\n\t Canal \u{a0} "), "Otaru Canal");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_truncate_description() {
        assert_eq!(truncate_description("   "), None);
        assert_eq!(truncate_description(" short "), Some("short".to_string()));

        let long = "a".repeat(800);
        let cut = truncate_description(&long).unwrap();
        assert_eq!(cut.chars().count(), MAX_DESCRIPTION_CHARS);
        assert!(cut.ends_with("..."));

        let japanese = "寺".repeat(600);
        assert!(truncate_description(&japanese).unwrap().chars().count() <= MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Kiyomizu-dera  Temple!"), "kiyomizu dera temple");
        assert_eq!(normalize_name("KIYOMIZU DERA temple"), "kiyomizu dera temple");
    }

    #[test]
    fn test_contains_japanese() {
        assert!(contains_japanese("札幌時計台"));
        assert!(contains_japanese("Sapporo テレビ塔"));
        assert!(contains_japanese("ひらがな"));
        assert!(!contains_japanese("Sapporo TV Tower"));
        assert!(!contains_japanese("Hyōgo"));
    }

    #[test]
    fn test_normalize_prefecture_examples() {
        assert_eq!(normalize_prefecture("Hokkaido"), "Hokkaido");
        assert_eq!(normalize_prefecture("HOKKAIDO"), "Hokkaido");
        assert_eq!(normalize_prefecture("Hokkaido Prefecture"), "Hokkaido");
        assert_eq!(normalize_prefecture("Aichi-ken"), "Aichi");
        assert_eq!(normalize_prefecture("Kyoto-fu"), "Kyoto");
        assert_eq!(normalize_prefecture("Kyoto"), "Kyoto");
        assert_eq!(normalize_prefecture("Tokyo-to"), "Tokyo");
        assert_eq!(normalize_prefecture("Osaka Prefecture"), "Osaka");
        assert_eq!(normalize_prefecture("hyōgo prefecture"), "Hyogo");
        assert_eq!(normalize_prefecture("Gifu"), "Gifu");
        assert_eq!(normalize_prefecture("愛知県"), "愛知");
        assert_eq!(normalize_prefecture("京都府"), "京都");
        assert_eq!(normalize_prefecture("東京都"), "東京");
        assert_eq!(normalize_prefecture("北海道"), "北海道");
        assert_eq!(normalize_prefecture(""), "");
    }

    #[test]
    fn test_normalize_prefecture_is_idempotent() {
        let inputs = [
            "Hokkaido", "Aichi-ken", "Aichi-ken Prefecture", "Tokyo-to-to", "kyoto fu",
            "  Nagano   Prefecture ", "Kōchi-ken", "京都", "京都府", "東京都", "北海道",
            "Okinawa", "Mie-ken", "some-town", "Osaka Pref.", "to", "-ken",
            "Foo. Prefecture", "Nagano, -ken", "Aichi 県",
        ];
        for input in inputs {
            let once = normalize_prefecture(input);
            let twice = normalize_prefecture(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_normalize_prefecture_trims_after_suffix() {
        assert_eq!(normalize_prefecture("Aichi 県"), "Aichi");
        assert_eq!(normalize_prefecture("Nagano, -ken"), "Nagano");
        assert_eq!(normalize_prefecture("Foo. Prefecture"), "Foo");
    }

    #[test]
    fn test_prefecture_in_text() {
        assert_eq!(
            prefecture_in_text("1-1 Marunouchi, Chiyoda-ku, Tokyo 100-0005"),
            Some("Tokyo")
        );
        assert_eq!(prefecture_in_text("Located in Kōchi city"), Some("Kochi"));
        assert_eq!(prefecture_in_text("Narita airport"), None);
    }

    #[test]
    fn test_region_for_prefecture() {
        assert_eq!(region_for_prefecture("Aichi-ken"), Some(Region::Chubu));
        assert_eq!(region_for_prefecture("Hyōgo Prefecture"), Some(Region::Kansai));
        assert_eq!(region_for_prefecture("hokkaido"), Some(Region::Hokkaido));
        assert_eq!(region_for_prefecture("Atlantis"), None);
    }
}
