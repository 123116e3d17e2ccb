// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `ValidationResult`

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_ok_result_converts_to_corrected_value() {
        let result = ValidationResult::ok("www");
        assert!(result.valid);
        assert!(result.message.is_empty());
        assert_eq!(result.into_result("name").unwrap(), "www");
    }

    #[test]
    fn test_invalid_result_keeps_raw_input() {
        let result = ValidationResult::invalid("-www", "label must not start with a hyphen");
        assert!(!result.valid);
        assert_eq!(result.corrected, "-www");

        let err = result.into_result("name").unwrap_err();
        assert_eq!(
            err,
            ZoneError::validation("name", "-www", "label must not start with a hyphen")
        );
    }

    #[test]
    fn test_result_serializes_for_front_ends() {
        let json = serde_json::to_value(ValidationResult::ok("203.0.113.5")).unwrap();
        assert_eq!(json["valid"], true);
        assert_eq!(json["corrected"], "203.0.113.5");
        assert_eq!(json["message"], "");
    }
}
