use proptest::prelude::*;
use xc_config::is_valid_port;

proptest! {
    #[test]
    fn port_valid_iff_in_range(n in -100_000i64..200_000) {
        prop_assert_eq!(is_valid_port(&n.to_string()), (1..=65535).contains(&n));
    }

    #[test]
    fn non_numeric_ports_rejected(s in "[a-zA-Z ._-]{0,8}") {
        prop_assert!(!is_valid_port(&s));
    }
}
