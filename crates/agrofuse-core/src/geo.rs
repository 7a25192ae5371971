//! State-to-city resolution for weather queries.
//!
//! Weather upstreams answer per city, not per state; each supported state
//! maps to one representative city. Unknown states fall back to Mumbai.

use crate::domain::StateName;
use crate::sources::CityQuery;

pub const DEFAULT_CITY: &str = "Mumbai";

const STATE_CITIES: &[(&str, &str)] = &[
    ("Kerala", "Kochi"),
    ("Tamil Nadu", "Chennai"),
    ("Karnataka", "Bangalore"),
    ("Andhra Pradesh", "Hyderabad"),
    ("Telangana", "Hyderabad"),
    ("Maharashtra", "Mumbai"),
    ("Gujarat", "Ahmedabad"),
    ("Rajasthan", "Jaipur"),
    ("Punjab", "Chandigarh"),
    ("Haryana", "Chandigarh"),
    ("Uttar Pradesh", "Lucknow"),
    ("Madhya Pradesh", "Bhopal"),
    ("West Bengal", "Kolkata"),
    ("Odisha", "Bhubaneswar"),
    ("Bihar", "Patna"),
];

/// Resolve the weather query target for a state.
pub fn representative_city(state: &StateName) -> CityQuery {
    let city = STATE_CITIES
        .iter()
        .find(|(name, _)| *name == state.as_str())
        .map(|(_, city)| *city)
        .unwrap_or(DEFAULT_CITY);

    CityQuery::india(city)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_states_resolve_to_their_city() {
        let state = StateName::parse("kerala").expect("valid state");
        assert_eq!(representative_city(&state).city, "Kochi");
    }

    #[test]
    fn unknown_states_fall_back_to_default() {
        let state = StateName::parse("Sikkim").expect("valid state");
        assert_eq!(representative_city(&state).city, DEFAULT_CITY);
    }
}
