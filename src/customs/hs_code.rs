// ==========================================
// Plant operations - HS code lookup
// ==========================================
// Harmonized System codes for exported meat and fish products
// ==========================================

use std::sync::OnceLock;

use regex::Regex;

/// Code used when the meat type is unknown (fresh/chilled beef)
pub const DEFAULT_MEAT_HS_CODE: &str = "0201.10";

/// HS code by meat type (case-insensitive)
pub fn meat_hs_code(meat_type: &str) -> &'static str {
    match meat_type.to_ascii_uppercase().as_str() {
        "BEEF" => "0201.10",
        "LAMB" => "0204.10",
        "HORSE" => "0205.00",
        "POULTRY" => "0207.10",
        _ => DEFAULT_MEAT_HS_CODE,
    }
}

/// HS code for fish products, None when unknown
pub fn fish_hs_code(product_type: &str) -> Option<&'static str> {
    match product_type {
        "frozen_fish" => Some("0303.79"),
        "chilled_fish" => Some("0302.69"),
        "smoked_fish" => Some("0305.49"),
        _ => None,
    }
}

/// Four digits, optional dot, up to two more digits
pub fn is_valid_hs_code(code: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d{4}\.?\d{0,2}$").ok())
        .as_ref()
        .map(|re| re.is_match(code))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meat_codes() {
        assert_eq!(meat_hs_code("beef"), "0201.10");
        assert_eq!(meat_hs_code("HORSE"), "0205.00");
        assert_eq!(meat_hs_code("POULTRY"), "0207.10");
        assert_eq!(meat_hs_code("venison"), DEFAULT_MEAT_HS_CODE);
        assert_eq!(fish_hs_code("smoked_fish"), Some("0305.49"));
        assert_eq!(fish_hs_code("caviar"), None);
    }

    #[test]
    fn test_code_format() {
        assert!(is_valid_hs_code("0201.10"));
        assert!(is_valid_hs_code("020110"));
        assert!(is_valid_hs_code("0201"));
        assert!(!is_valid_hs_code("201.10"));
        assert!(!is_valid_hs_code("0201.100"));
        assert!(!is_valid_hs_code(""));
    }
}
