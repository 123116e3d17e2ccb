// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for inventory parsing and canonicalization

#[cfg(test)]
mod tests {
    use super::super::*;

    const SAMPLE: &str = r#"
domains:
  - name: Example.Test.
    serial: 4
    soa_email: hostmaster@example.test
    records:
      - { type: NS, name: "@", content: ns1 }
      - { type: A, name: WWW, content: 203.0.113.6 }
      - { type: MX, name: "@", content: mail.example.test., priority: 10 }
      - { type: A, name: mail, content: 203.0.113.7, priority: 5, ttl: 300 }
"#;

    #[test]
    fn test_parse_applies_defaults() {
        let inventory = Inventory::from_yaml(SAMPLE).unwrap();
        let domain = &inventory.domains[0];
        assert_eq!(domain.serial, 4);
        assert_eq!(domain.default_ttl, 3600);
        assert_eq!(domain.soa, SoaTimers::default());
        assert!(domain.created_at.is_none());
        assert_eq!(domain.records.len(), 4);
        assert_eq!(domain.records[2].priority, 10);
    }

    #[test]
    fn test_empty_inventory() {
        assert!(Inventory::from_yaml("").unwrap().domains.is_empty());
        assert!(Inventory::from_yaml("domains: []").unwrap().domains.is_empty());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Inventory::from_yaml("zones: []").is_err());
        assert!(Inventory::from_yaml("domains:\n  - name: a.test\n    colour: red\n").is_err());
    }

    #[test]
    fn test_canonicalize() {
        let mut inventory = Inventory::from_yaml(SAMPLE).unwrap();
        inventory.canonicalize().unwrap();

        let domain = &inventory.domains[0];
        assert_eq!(domain.name, "example.test");
        assert_eq!(domain.soa_email, "hostmaster.example.test.");
        assert_eq!(domain.records[0].content, "ns1.example.test.");
        assert_eq!(domain.records[1].name, "www");
        // Priority is cleared on types without one
        assert_eq!(domain.records[3].priority, 0);
        assert_eq!(domain.records[3].ttl, Some(300));
    }

    #[test]
    fn test_canonicalize_rejects_bad_record() {
        let raw = "domains:\n  - name: a.test\n    records:\n      - { type: A, name: www, content: nope }\n";
        let mut inventory = Inventory::from_yaml(raw).unwrap();
        let err = inventory.canonicalize().unwrap_err();
        assert!(matches!(err, ZoneError::Validation { ref field, .. } if field == "content"));
    }

    #[test]
    fn test_canonicalize_rejects_duplicate_domains() {
        let raw = "domains:\n  - name: a.test\n  - name: A.TEST.\n";
        let mut inventory = Inventory::from_yaml(raw).unwrap();
        assert!(inventory.canonicalize().is_err());
    }

    #[test]
    fn test_yaml_round_trip_keeps_record_type_spelling() {
        let mut inventory = Inventory::from_yaml(SAMPLE).unwrap();
        inventory.canonicalize().unwrap();
        let yaml = inventory.to_yaml().unwrap();
        assert!(yaml.contains("type: MX"));
        assert_eq!(Inventory::from_yaml(&yaml).unwrap(), inventory);
    }
}
