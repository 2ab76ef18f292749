//! Keyword-matching chat helper

use crate::models::WeatherSnapshot;

const ROUTE_REPLY: &str = "You can find the best route by entering your start and destination and clicking 'Find Route'. Alternative routes will also be displayed.";
const WEATHER_PENDING_REPLY: &str =
    "I can provide weather information for the starting location once a route is calculated.";
const CARBON_REPLY: &str = "I calculate a simulated carbon footprint for each route based on distance, vehicle type, and cargo weight.";
const VEHICLE_REPLY: &str = "You can select different vehicle types from the dropdown to see how they affect the route and carbon footprint.";
const GREETING_REPLY: &str = "Hello! How can I assist you with your route planning today?";
const HELP_REPLY: &str = "I can help you with questions about finding routes, weather conditions, carbon footprint calculation, and vehicle options.";
const FALLBACK_REPLY: &str =
    "I'm sorry, I don't understand that. Can you please rephrase your question?";

/// Reply to a user message, `None` for blank input.
///
/// Rules are checked in order and the first match wins.
#[must_use]
pub fn reply(message: &str, weather: Option<&WeatherSnapshot>) -> Option<String> {
    let message = message.trim().to_lowercase();
    if message.is_empty() {
        return None;
    }

    let words: Vec<&str> = message
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has_word = |word: &str| words.contains(&word);

    let reply = if message.contains("route") || message.contains("direction") {
        ROUTE_REPLY.to_string()
    } else if message.contains("weather") {
        match weather {
            Some(weather) => format!(
                "The current weather in the starting location is {} with a temperature of {}°C.",
                weather.description, weather.temperature
            ),
            None => WEATHER_PENDING_REPLY.to_string(),
        }
    } else if message.contains("carbon footprint") || message.contains("emission") {
        CARBON_REPLY.to_string()
    } else if message.contains("vehicle") {
        VEHICLE_REPLY.to_string()
    } else if has_word("hello") || has_word("hi") {
        GREETING_REPLY.to_string()
    } else if message.contains("help") {
        HELP_REPLY.to_string()
    } else {
        FALLBACK_REPLY.to_string()
    };

    Some(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    #[rstest]
    #[case("How do I find a ROUTE?", ROUTE_REPLY)]
    #[case("directions please", ROUTE_REPLY)]
    #[case("What about emissions?", CARBON_REPLY)]
    #[case("how is the carbon footprint computed", CARBON_REPLY)]
    #[case("Which vehicle should I use", VEHICLE_REPLY)]
    #[case("hello there", GREETING_REPLY)]
    #[case("Hi!", GREETING_REPLY)]
    #[case("help", HELP_REPLY)]
    #[case("what is the meaning of life", FALLBACK_REPLY)]
    // "hi" inside another word is not a greeting
    #[case("this is it", FALLBACK_REPLY)]
    fn test_rules(#[case] message: &str, #[case] expected: &str) {
        assert_eq!(reply(message, None).as_deref(), Some(expected));
    }

    #[test]
    fn test_first_rule_wins() {
        // mentions both route and weather
        assert_eq!(
            reply("weather along the route?", None).as_deref(),
            Some(ROUTE_REPLY)
        );
    }

    #[test]
    fn test_weather_with_snapshot() {
        let snapshot = WeatherSnapshot {
            timestamp: Utc::now(),
            temperature: 21.5,
            wind_speed: 3.0,
            visibility: 10_000.0,
            condition: "Clouds".to_string(),
            description: "scattered clouds".to_string(),
        };
        assert_eq!(
            reply("How's the weather?", Some(&snapshot)).as_deref(),
            Some("The current weather in the starting location is scattered clouds with a temperature of 21.5°C.")
        );
        assert_eq!(
            reply("weather", None).as_deref(),
            Some(WEATHER_PENDING_REPLY)
        );
    }

    #[rstest]
    #[case("")]
    #[case("   \t")]
    fn test_blank_input(#[case] message: &str) {
        assert_eq!(reply(message, None), None);
    }
}
