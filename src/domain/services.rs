//! Request-assembly rules for the advisory client.
//!
//! These functions are pure: they take what the user has entered plus what
//! the device reported and produce the exact payloads sent to the backend.
//! All input correction (acreage fallback, blank author, location
//! precedence) happens here and nowhere else.

use super::models::{
    AdvisoryForm, Coordinates, LocationCandidate, NewTip, QaRequest, RecommendationRequest,
};

/// Acreage submitted when the form value is missing or unusable.
pub const DEFAULT_FARM_ACRES: f64 = 2.0;
/// Author recorded for a tip shared without a name.
pub const ANONYMOUS_AUTHOR: &str = "anonymous";
/// Locale used when the environment provides nothing usable.
pub const DEFAULT_LOCALE: &str = "en";

/// Picks the location to submit.
///
/// A device position always wins over a typed place name; a blank place name
/// yields an empty location. Evaluated when a request is built, so a position
/// that resolves after the user typed a city still takes over.
///
/// # Examples
///
/// ```
/// use agromind::domain::{resolve_location, Coordinates, LocationCandidate};
///
/// let here = Coordinates { lat: 12.9, lon: 79.1 };
/// assert_eq!(
///     resolve_location(Some(here), "Vellore"),
///     LocationCandidate::Coordinates(here)
/// );
/// assert_eq!(resolve_location(None, "  "), LocationCandidate::default());
/// ```
pub fn resolve_location(coords: Option<Coordinates>, city: &str) -> LocationCandidate {
    if let Some(coords) = coords {
        return LocationCandidate::Coordinates(coords);
    }
    let city = city.trim();
    if city.is_empty() {
        LocationCandidate::default()
    } else {
        LocationCandidate::City {
            city: city.to_string(),
        }
    }
}

/// Parses the acreage field, substituting [`DEFAULT_FARM_ACRES`] for
/// anything that is not a finite positive number.
///
/// # Examples
///
/// ```
/// use agromind::domain::parse_farm_acres;
///
/// assert_eq!(parse_farm_acres("3.5"), 3.5);
/// assert_eq!(parse_farm_acres("abc"), 2.0);
/// ```
pub fn parse_farm_acres(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(acres) if acres.is_finite() && acres > 0.0 => acres,
        _ => DEFAULT_FARM_ACRES,
    }
}

/// Assembles the body of a recommendation request.
///
/// The location is resolved with [`resolve_location`] and the acreage with
/// [`parse_farm_acres`], both at call time, so the request reflects the
/// session exactly as it stands when the user submits.
///
/// # Arguments
///
/// * `form` - Water access, goal and raw acreage text as edited
/// * `coords` - Device position, if geolocation succeeded
/// * `city` - Place name typed by the user, possibly blank
/// * `language` - Locale tag attached to the request
///
/// # Examples
///
/// ```
/// use agromind::domain::{build_recommendation_request, AdvisoryForm, LocationCandidate};
///
/// let form = AdvisoryForm { farm_acres: "-4".to_string(), ..AdvisoryForm::default() };
/// let request = build_recommendation_request(&form, None, " Salem ", "ta-IN");
/// assert_eq!(request.location, LocationCandidate::City { city: "Salem".to_string() });
/// assert_eq!(request.farm_acres, 2.0);
/// assert_eq!(request.language, "ta-IN");
/// ```
pub fn build_recommendation_request(
    form: &AdvisoryForm,
    coords: Option<Coordinates>,
    city: &str,
    language: &str,
) -> RecommendationRequest {
    RecommendationRequest {
        location: resolve_location(coords, city),
        water_access: form.water_access,
        goal: form.goal,
        farm_acres: parse_farm_acres(&form.farm_acres),
        language: language.to_string(),
    }
}

/// Assembles the body of a question.
///
/// Returns `None` for a blank question; the text is otherwise sent as typed,
/// surrounding whitespace included.
///
/// # Examples
///
/// ```
/// use agromind::domain::build_question_request;
///
/// assert!(build_question_request(" \t ", "en").is_none());
/// let request = build_question_request(" Why yellow leaves? ", "en").unwrap();
/// assert_eq!(request.question, " Why yellow leaves? ");
/// ```
pub fn build_question_request(question: &str, language: &str) -> Option<QaRequest> {
    if question.trim().is_empty() {
        return None;
    }
    Some(QaRequest {
        question: question.to_string(),
        language: language.to_string(),
    })
}

/// Assembles the body of a shared tip.
///
/// Returns `None` for a blank tip body. A blank author becomes [`ANONYMOUS_AUTHOR`].
///
/// # Arguments
///
/// * `text` - Tip body, sent as typed
/// * `author` - Optional name; trimmed before use
///
/// # Examples
///
/// ```
/// use agromind::domain::build_new_tip;
///
/// let tip = build_new_tip("Mulch after rain", "   ").unwrap();
/// assert_eq!(tip.author, "anonymous");
/// assert!(build_new_tip("", "Asha").is_none());
/// ```
pub fn build_new_tip(text: &str, author: &str) -> Option<NewTip> {
    if text.trim().is_empty() {
        return None;
    }
    let author = author.trim();
    Some(NewTip {
        tip: text.to_string(),
        author: if author.is_empty() {
            ANONYMOUS_AUTHOR.to_string()
        } else {
            author.to_string()
        },
    })
}

/// Turns a POSIX locale string (`en_IN.UTF-8`, `ta_IN@latin`) into a BCP 47
/// style tag (`en-IN`, `ta-IN`). `C`, `POSIX` and empty input map to
/// [`DEFAULT_LOCALE`].
///
/// # Examples
///
/// ```
/// use agromind::domain::normalize_locale;
///
/// assert_eq!(normalize_locale("en_IN.UTF-8"), "en-IN");
/// assert_eq!(normalize_locale("POSIX"), "en");
/// ```
pub fn normalize_locale(raw: &str) -> String {
    let base = raw
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base.eq_ignore_ascii_case("c") || base.eq_ignore_ascii_case("posix") {
        return DEFAULT_LOCALE.to_string();
    }
    base.replace('_', "-")
}

/// Chooses the locale tag from an explicit override or the first non-empty
/// candidate, in order. Nothing usable yields [`DEFAULT_LOCALE`].
///
/// # Arguments
///
/// * `explicit` - Locale from configuration or the command line
/// * `candidates` - Environment values in priority order (`LC_ALL`, `LC_MESSAGES`, `LANG`)
///
/// # Examples
///
/// ```
/// use agromind::domain::detect_locale;
///
/// assert_eq!(detect_locale(None, ["", "ta_IN.UTF-8"]), "ta-IN");
/// assert_eq!(detect_locale(Some("hi-IN"), ["en_US"]), "hi-IN");
/// assert_eq!(detect_locale(None, Vec::<String>::new()), "en");
/// ```
pub fn detect_locale<I, S>(explicit: Option<&str>, candidates: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if let Some(tag) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return normalize_locale(tag);
    }
    candidates
        .into_iter()
        .find(|c| !c.as_ref().trim().is_empty())
        .map(|c| normalize_locale(c.as_ref()))
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Goal, WaterAccess};

    const HERE: Coordinates = Coordinates { lat: 12.934, lon: 79.136 };

    #[test]
    fn test_coordinates_beat_city() {
        assert_eq!(resolve_location(Some(HERE), "Vellore"), LocationCandidate::Coordinates(HERE));
        assert_eq!(resolve_location(Some(HERE), ""), LocationCandidate::Coordinates(HERE));
    }

    #[test]
    fn test_city_used_without_coordinates() {
        assert_eq!(
            resolve_location(None, " Vellore "),
            LocationCandidate::City { city: "Vellore".to_string() }
        );
    }

    #[test]
    fn test_blank_city_without_coordinates_is_empty() {
        assert_eq!(resolve_location(None, ""), LocationCandidate::Unresolved {});
        assert_eq!(resolve_location(None, "   "), LocationCandidate::Unresolved {});
    }

    #[test]
    fn test_farm_acres_parsing() {
        assert_eq!(parse_farm_acres("3.5"), 3.5);
        assert_eq!(parse_farm_acres(" 10 "), 10.0);
        assert_eq!(parse_farm_acres("abc"), 2.0);
        assert_eq!(parse_farm_acres(""), 2.0);
        assert_eq!(parse_farm_acres("0"), 2.0);
        assert_eq!(parse_farm_acres("-4"), 2.0);
        assert_eq!(parse_farm_acres("NaN"), 2.0);
        assert_eq!(parse_farm_acres("inf"), 2.0);
    }

    #[test]
    fn test_build_recommendation_request() {
        let form = AdvisoryForm {
            water_access: WaterAccess::Low,
            goal: Goal::Profit,
            farm_acres: "abc".to_string(),
        };
        let request = build_recommendation_request(&form, None, "Madurai", "ta-IN");
        assert_eq!(request.location, LocationCandidate::City { city: "Madurai".to_string() });
        assert_eq!(request.water_access, WaterAccess::Low);
        assert_eq!(request.goal, Goal::Profit);
        assert_eq!(request.farm_acres, 2.0);
        assert_eq!(request.language, "ta-IN");
    }

    #[test]
    fn test_blank_question_is_rejected() {
        assert!(build_question_request("   ", "en").is_none());
        assert!(build_question_request("", "en").is_none());

        let request = build_question_request(" How to reduce soil acidity? ", "en").unwrap();
        assert_eq!(request.question, " How to reduce soil acidity? ");
        assert_eq!(request.language, "en");
    }

    #[test]
    fn test_new_tip_rules() {
        assert!(build_new_tip(" \n ", "asha").is_none());

        let tip = build_new_tip("Mulch after rain", "  ").unwrap();
        assert_eq!(tip.author, "anonymous");

        let tip = build_new_tip("Mulch after rain", "Asha").unwrap();
        assert_eq!(tip.author, "Asha");
        assert_eq!(tip.tip, "Mulch after rain");
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("en_IN.UTF-8"), "en-IN");
        assert_eq!(normalize_locale("ta_IN@latin"), "ta-IN");
        assert_eq!(normalize_locale("hi"), "hi");
        assert_eq!(normalize_locale("C"), "en");
        assert_eq!(normalize_locale("POSIX"), "en");
        assert_eq!(normalize_locale(""), "en");
    }

    #[test]
    fn test_detect_locale_precedence() {
        assert_eq!(detect_locale(Some("kn-IN"), ["en_US.UTF-8"]), "kn-IN");
        assert_eq!(detect_locale(Some("  "), ["", "te_IN.UTF-8"]), "te-IN");
        assert_eq!(detect_locale(None, Vec::<String>::new()), "en");
    }
}
