// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for record input canonicalization and conflict rules

#[cfg(test)]
mod tests {
    use super::super::*;

    const ZONE: &str = "example.test";

    fn existing(id: i64, record_type: RecordType, name: &str, content: &str) -> Record {
        Record {
            id,
            ..new_record(1, record_type, name, content)
        }
    }

    #[test]
    fn test_canonical_input_qualifies_and_zeroes_priority() {
        let input = canonical_input(
            &RecordInput::new(RecordType::A, "WWW", " 203.0.113.6 ").with_priority(10),
            ZONE,
        )
        .unwrap();
        assert_eq!(input.name, "www");
        assert_eq!(input.content, "203.0.113.6");
        assert_eq!(input.priority, 0);

        let mx = canonical_input(
            &RecordInput::new(RecordType::Mx, "@", "mail").with_priority(10),
            ZONE,
        )
        .unwrap();
        assert_eq!(mx.content, "mail.example.test.");
        assert_eq!(mx.priority, 10);
    }

    #[test]
    fn test_canonical_input_ttl() {
        let zero = canonical_input(
            &RecordInput::new(RecordType::A, "www", "203.0.113.6").with_ttl(0),
            ZONE,
        )
        .unwrap();
        assert_eq!(zero.ttl, None);

        let kept = canonical_input(
            &RecordInput::new(RecordType::A, "www", "203.0.113.6").with_ttl(300),
            ZONE,
        )
        .unwrap();
        assert_eq!(kept.ttl, Some(300));

        let err = canonical_input(
            &RecordInput::new(RecordType::A, "www", "203.0.113.6").with_ttl(u32::MAX),
            ZONE,
        )
        .unwrap_err();
        assert!(matches!(err, ZoneError::Validation { ref field, .. } if field == "ttl"));
    }

    #[test]
    fn test_canonical_input_rejects_invalid_fields() {
        let err = canonical_input(&RecordInput::new(RecordType::A, "www", "300.1.1.1"), ZONE)
            .unwrap_err();
        assert!(matches!(err, ZoneError::Validation { ref field, .. } if field == "content"));

        let err = canonical_input(
            &RecordInput::new(RecordType::A, "bad_name!", "203.0.113.6"),
            ZONE,
        )
        .unwrap_err();
        assert!(matches!(err, ZoneError::Validation { ref field, .. } if field == "name"));
    }

    #[test]
    fn test_canonical_input_placement_rules() {
        let err = canonical_input(&RecordInput::new(RecordType::Cname, "@", "other.test."), ZONE)
            .unwrap_err();
        assert!(err.to_string().contains("apex"));

        let err = canonical_input(
            &RecordInput::new(RecordType::Soa, "www", "hostmaster@example.test"),
            ZONE,
        )
        .unwrap_err();
        assert!(err.to_string().contains("apex"));
    }

    #[test]
    fn test_cname_exclusivity() {
        let records = vec![existing(1, RecordType::A, "www", "203.0.113.6")];
        let cname = RecordInput::new(RecordType::Cname, "www", "web.example.test.");
        assert!(check_conflicts(&records, &cname, None).is_err());
        // Replacing the only record at that name is fine
        assert!(check_conflicts(&records, &cname, Some(1)).is_ok());

        let records = vec![existing(2, RecordType::Cname, "ftp", "www.example.test.")];
        let a = RecordInput::new(RecordType::A, "ftp", "203.0.113.7");
        assert!(check_conflicts(&records, &a, None).is_err());
        let other = RecordInput::new(RecordType::A, "mail", "203.0.113.7");
        assert!(check_conflicts(&records, &other, None).is_ok());
    }

    #[test]
    fn test_single_soa() {
        let records = vec![existing(1, RecordType::Soa, "@", "hostmaster.example.test.")];
        let soa = RecordInput::new(RecordType::Soa, "@", "admin.example.test.");
        assert!(check_conflicts(&records, &soa, None).is_err());
        assert!(check_conflicts(&records, &soa, Some(1)).is_ok());
    }

    #[test]
    fn test_identical_record_rejected() {
        let records = vec![existing(1, RecordType::Ns, "@", "ns1.example.test.")];
        let same = RecordInput::new(RecordType::Ns, "@", "ns1.example.test.");
        assert!(check_conflicts(&records, &same, None).is_err());
        assert!(check_conflicts(&records, &same, Some(1)).is_ok());

        let second = RecordInput::new(RecordType::Ns, "@", "ns2.example.test.");
        assert!(check_conflicts(&records, &second, None).is_ok());
    }

    #[test]
    fn test_count_ns_and_describe() {
        let records = vec![
            existing(1, RecordType::Ns, "@", "ns1.example.test."),
            existing(2, RecordType::A, "@", "203.0.113.5"),
            existing(3, RecordType::Ns, "@", "ns2.example.test."),
        ];
        assert_eq!(count_ns(&records), 2);
        assert_eq!(describe(&records[1]), "A @ -> 203.0.113.5");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" x ")), Some("x"));
    }
}
