// ABOUTME: Integration tests for type-safe identifiers and validated types.
// ABOUTME: Tests parsing, validation, and slot naming properties.

use hubstack::types::*;

mod service_name_tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["memos", "adguard", "unbound-1", "web_ui", "a.b", "9lives"] {
            assert!(ServiceName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(ServiceName::new(""), Err(ServiceNameError::Empty));
    }

    #[test]
    fn rejects_uppercase() {
        assert_eq!(ServiceName::new("Memos"), Err(ServiceNameError::NotLowercase));
    }

    #[test]
    fn rejects_bad_start() {
        assert_eq!(ServiceName::new("-memos"), Err(ServiceNameError::BadStart));
    }

    #[test]
    fn rejects_spaces() {
        assert_eq!(
            ServiceName::new("my service"),
            Err(ServiceNameError::InvalidChar(' '))
        );
    }

    #[test]
    fn rejects_too_long() {
        assert_eq!(
            ServiceName::new(&"a".repeat(64)),
            Err(ServiceNameError::TooLong)
        );
    }

    #[test]
    fn service_list_skips_blanks() {
        let list = parse_service_list(" memos, ,adguard ,").unwrap();
        let names: Vec<&str> = list.iter().map(ServiceName::as_str).collect();
        assert_eq!(names, vec!["memos", "adguard"]);
    }

    #[test]
    fn service_list_reports_first_bad_entry() {
        assert!(parse_service_list("memos,Bad").is_err());
    }
}

mod slot_tests {
    use super::*;

    #[test]
    fn default_slot_is_a() {
        assert_eq!(Slot::default(), Slot::A);
    }

    #[test]
    fn other_flips() {
        assert_eq!(Slot::A.other(), Slot::B);
        assert_eq!(Slot::B.other(), Slot::A);
    }

    #[test]
    fn parse_tolerates_case_and_whitespace() {
        assert_eq!(" B\n".parse::<Slot>().unwrap(), Slot::B);
        assert_eq!("a".parse::<Slot>().unwrap(), Slot::A);
        assert!("c".parse::<Slot>().is_err());
        assert!("".parse::<Slot>().is_err());
    }

    #[test]
    fn container_names_carry_the_slot_prefix() {
        let memos = ServiceName::new("memos").unwrap();
        assert_eq!(Slot::B.container_prefix("dhi"), "dhi-b-");
        assert_eq!(memos.slot_container("dhi", Slot::A).as_str(), "dhi-a-memos");
        assert_eq!(memos.bare_container().as_str(), "memos");
    }
}

mod name_tests {
    use super::*;

    #[test]
    fn names_compare_by_value() {
        let a = ContainerName::new("dhi-a-memos".to_string());
        let b = ContainerName::new("dhi-a-memos".to_string());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "dhi-a-memos");
        assert_eq!(b.into_inner(), "dhi-a-memos");
    }
}
