use strsim::jaro_winkler;

/// Lowercase a team name and drop spaces/hyphens so provider spellings
/// ("Man City", "Manchester-City") collapse onto each other.
pub fn normalize_team_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Fuzzy match between our team name and a provider's. Containment handles
/// suffixes ("Arsenal FC" vs "Arsenal"), Jaro-Winkler handles spelling
/// drift ("Brighton & Hove Albion" vs "Brighton and Hove Albion").
pub fn teams_match(api_name: &str, our_name: &str) -> bool {
    let api = normalize_team_name(api_name);
    let ours = normalize_team_name(our_name);

    if api.is_empty() || ours.is_empty() {
        return false;
    }

    api.contains(&ours) || ours.contains(&api) || jaro_winkler(&api, &ours) >= 0.9
}

/// Convert probability to decimal odds
pub fn probability_to_odds(probability: f64) -> f64 {
    if probability <= 0.0 || probability >= 1.0 {
        return 1000.0; // Very high odds for impossible/certain events
    }
    1.0 / probability
}

/// Convert decimal odds to implied probability
pub fn odds_to_probability(odds: f64) -> f64 {
    if odds <= 1.0 {
        return 0.99; // Cap at 99%
    }
    (1.0 / odds).min(0.99)
}
