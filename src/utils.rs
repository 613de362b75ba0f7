/// Validate latitude and longitude coordinates
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("Invalid latitude: {}. Must be between -90 and 90", lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("Invalid longitude: {}. Must be between -180 and 180", lon));
    }
    Ok(())
}

/// Parse a coordinate pair from query-string values.
pub fn parse_coordinates(lat: &str, lon: &str) -> Result<(f64, f64), String> {
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("Invalid latitude: {}", lat))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("Invalid longitude: {}", lon))?;
    validate_coordinates(lat, lon)?;
    Ok((lat, lon))
}
