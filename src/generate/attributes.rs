//! Per-user demographic draws. Every field is sampled independently through
//! the run's generator via the `rand` helpers.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::core::model::Profile;
use crate::core::rng::Lcg;

pub const COUNTRY: &str = "India";

/// City, state, regional language code.
pub const CITIES: [(&str, &str, &str); 12] = [
    ("Mumbai", "Maharashtra", "mr"),
    ("Pune", "Maharashtra", "mr"),
    ("Delhi", "Delhi", "hi"),
    ("Bengaluru", "Karnataka", "kn"),
    ("Chennai", "Tamil Nadu", "ta"),
    ("Hyderabad", "Telangana", "te"),
    ("Kolkata", "West Bengal", "bn"),
    ("Ahmedabad", "Gujarat", "gu"),
    ("Jaipur", "Rajasthan", "hi"),
    ("Lucknow", "Uttar Pradesh", "hi"),
    ("Kochi", "Kerala", "ml"),
    ("Chandigarh", "Punjab", "pa"),
];

const FIRST_NAMES: [&str; 16] = [
    "Aarav", "Vivaan", "Aditya", "Arjun", "Rohan", "Kabir", "Ishaan", "Rahul", "Ananya", "Diya",
    "Saanvi", "Priya", "Meera", "Kavya", "Riya", "Nisha",
];

const LAST_NAMES: [&str; 12] = [
    "Sharma", "Patel", "Iyer", "Reddy", "Nair", "Gupta", "Singh", "Das", "Joshi", "Khan", "Mehta",
    "Rao",
];

const GENDERS: [&str; 3] = ["male", "female", "other"];

const COMMON_LANGUAGES: [&str; 2] = ["en", "hi"];

const EDUCATION: [&str; 5] = ["high school", "diploma", "bachelor", "master", "doctorate"];

const PROFESSIONS: [&str; 10] = [
    "student",
    "engineer",
    "teacher",
    "doctor",
    "designer",
    "accountant",
    "entrepreneur",
    "artist",
    "researcher",
    "sales",
];

const INTERESTS: [&str; 12] = [
    "music", "cricket", "movies", "travel", "cooking", "reading", "gaming", "fitness",
    "photography", "technology", "fashion", "politics",
];

const PURPOSES: [&str; 4] = ["networking", "entertainment", "news", "career"];

pub fn city_name(city: usize) -> &'static str {
    CITIES.get(city).map(|(name, _, _)| *name).unwrap_or("Unknown")
}

pub fn sample_profile(
    rng: &mut Lcg,
    city: usize,
    base_time: DateTime<Utc>,
    window_secs: i64,
) -> Profile {
    let (_, state, regional) = CITIES.get(city).copied().unwrap_or(CITIES[0]);

    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("User");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("");

    let primary_lang = if rng.random_bool(0.6) {
        regional
    } else {
        COMMON_LANGUAGES.choose(rng).copied().unwrap_or("en")
    };
    let mut languages = vec![primary_lang.to_string()];
    for lang in [regional, "en", "hi"] {
        if !languages.iter().any(|l| l == lang) && rng.random_bool(0.5) {
            languages.push(lang.to_string());
        }
    }

    let interest_count = rng.random_range(1..=4);
    let interests = INTERESTS
        .choose_multiple(rng, interest_count)
        .map(|s| s.to_string())
        .collect();

    let joined_offset = rng.random_range(0..=window_secs.max(0));

    Profile {
        name: format!("{first} {last}").trim().to_string(),
        age: rng.random_range(16..=70),
        gender: GENDERS.choose(rng).copied().unwrap_or("other").to_string(),
        state: state.to_string(),
        country: COUNTRY.to_string(),
        primary_lang: primary_lang.to_string(),
        languages,
        education: EDUCATION.choose(rng).copied().unwrap_or("").to_string(),
        profession: PROFESSIONS.choose(rng).copied().unwrap_or("").to_string(),
        interests,
        purpose: PURPOSES.choose(rng).copied().unwrap_or("").to_string(),
        third_party: rng.random_bool(0.1),
        joined_at: base_time - Duration::seconds(joined_offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_profile_fields_in_range() {
        let mut rng = Lcg::new(9);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for city in 0..CITIES.len() {
            let p = sample_profile(&mut rng, city, base, 86_400);
            assert!((16..=70).contains(&p.age));
            assert_eq!(CITIES[city].1, p.state);
            assert_eq!(p.primary_lang, p.languages[0]);
            assert!(!p.interests.is_empty() && p.interests.len() <= 4);
            assert!(p.joined_at <= base);
            assert!(p.joined_at >= base - Duration::seconds(86_400));
        }
    }

    #[test]
    fn test_profile_is_reproducible() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let a = sample_profile(&mut Lcg::new(5), 3, base, 1000);
        let b = sample_profile(&mut Lcg::new(5), 3, base, 1000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_city_name() {
        assert_eq!("Unknown", city_name(CITIES.len()));
        assert_eq!("Mumbai", city_name(0));
    }
}
