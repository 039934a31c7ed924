//! Parser edge case and error handling tests.
//!
//! These tests verify parser behavior with malformed, partial, or edge case inputs.

#[cfg(test)]
mod iinet_parser_edge_tests {
    use crate::iinet::parse_feed;
    use usagewatch_fetch::{ErrorCategory, FetchError};

    // ========================================================================
    // Structure
    // ========================================================================

    #[test]
    fn test_empty_document() {
        let err = parse_feed("").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_) | FetchError::Schema(_)));
    }

    #[test]
    fn test_missing_volume_usage() {
        let err = parse_feed("<ii_feed><account_info/></ii_feed>").unwrap_err();
        assert!(matches!(err, FetchError::Schema(_)));
    }

    #[test]
    fn test_no_quota_reset() {
        let xml = r#"<ii_feed><volume_usage>
            <expected_traffic_types>
              <type classification="anytime" used="1"><quota_allocation>5</quota_allocation></type>
            </expected_traffic_types>
        </volume_usage></ii_feed>"#;
        assert_eq!(parse_feed(xml).unwrap_err().category(), ErrorCategory::Schema);
    }

    #[test]
    fn test_no_traffic_types() {
        let xml = r"<ii_feed><volume_usage>
            <quota_reset><days_remaining>4</days_remaining></quota_reset>
            <expected_traffic_types/>
        </volume_usage></ii_feed>";
        assert_eq!(parse_feed(xml).unwrap_err().category(), ErrorCategory::Schema);
    }

    #[test]
    fn test_no_quota_allocation() {
        let xml = r#"<ii_feed><volume_usage>
            <quota_reset><days_remaining>4</days_remaining></quota_reset>
            <expected_traffic_types>
              <type classification="anytime" used="1"/>
            </expected_traffic_types>
        </volume_usage></ii_feed>"#;
        assert_eq!(parse_feed(xml).unwrap_err().category(), ErrorCategory::Schema);
    }

    // ========================================================================
    // Values
    // ========================================================================

    #[test]
    fn test_zero_quota() {
        let xml = r#"<ii_feed><volume_usage>
            <quota_reset><days_remaining>4</days_remaining></quota_reset>
            <expected_traffic_types>
              <type classification="anytime" used="0"><quota_allocation>0</quota_allocation></type>
            </expected_traffic_types>
        </volume_usage></ii_feed>"#;
        assert_eq!(parse_feed(xml).unwrap_err().category(), ErrorCategory::Schema);
    }

    #[test]
    fn test_quota_overflow() {
        let xml = r#"<ii_feed><volume_usage>
            <quota_reset><days_remaining>4</days_remaining></quota_reset>
            <expected_traffic_types>
              <type classification="anytime" used="0">
                <quota_allocation>18446744073709551615</quota_allocation>
              </type>
            </expected_traffic_types>
        </volume_usage></ii_feed>"#;
        assert!(matches!(parse_feed(xml).unwrap_err(), FetchError::Schema(_)));
    }

    #[test]
    fn test_negative_days() {
        let xml = r#"<ii_feed><volume_usage>
            <quota_reset><days_remaining>-1</days_remaining></quota_reset>
            <expected_traffic_types>
              <type classification="anytime" used="0"><quota_allocation>5</quota_allocation></type>
            </expected_traffic_types>
        </volume_usage></ii_feed>"#;
        assert!(matches!(parse_feed(xml).unwrap_err(), FetchError::Parse(_)));
    }

    #[test]
    fn test_first_entries_win() {
        let xml = r#"<ii_feed><volume_usage>
            <quota_reset><days_remaining>9</days_remaining></quota_reset>
            <expected_traffic_types>
              <type classification="anytime" used="100">
                <quota_allocation>1</quota_allocation>
                <quota_allocation>2</quota_allocation>
              </type>
              <type classification="freezone" used="999">
                <quota_allocation>50</quota_allocation>
              </type>
            </expected_traffic_types>
        </volume_usage></ii_feed>"#;
        let snapshot = parse_feed(xml).unwrap();
        assert_eq!(snapshot.quota, 1_000_000);
        assert_eq!(snapshot.used, 100);
        assert_eq!(snapshot.days_remaining, 9);
    }
}

#[cfg(test)]
mod vodafone_parser_edge_tests {
    use crate::vodafone::{parse_barchart, parse_period, parse_portal_usage};
    use usagewatch_fetch::{ErrorCategory, FetchError};

    // ========================================================================
    // Barchart
    // ========================================================================

    #[test]
    fn test_barchart_empty_object() {
        assert!(matches!(parse_barchart("{}"), Err(FetchError::Schema(_))));
    }

    #[test]
    fn test_barchart_null_values() {
        let result = parse_barchart(r#"{"unit_total":null,"unit_count":null}"#);
        assert!(matches!(result, Err(FetchError::Schema(_))));
    }

    #[test]
    fn test_barchart_not_an_object() {
        for raw in ["[1, 2]", r#""40""#, "40", "null"] {
            let err = parse_barchart(raw).unwrap_err();
            assert!(matches!(err, FetchError::Schema(_)), "{raw} gave {err:?}");
        }
    }

    #[test]
    fn test_barchart_blank_figure() {
        let result = parse_barchart(r#"{"unit_total":"","unit_count":"1"}"#);
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_barchart_extra_fields_ignored() {
        let usage = parse_barchart(
            r##"{"unit_total":"100","unit_count":"0","unit":"GB",
                 "colour":"#e60000","bars":[1,2,3]}"##,
        )
        .unwrap();
        assert_eq!(usage.quota, 100);
        assert_eq!(usage.used, 0);
    }

    // ========================================================================
    // Billing period
    // ========================================================================

    #[test]
    fn test_period_one_day_left() {
        let period = parse_period("1 days left. Inclusions refresh: 1 Jan").unwrap();
        assert_eq!(period.days_remaining, 1);
    }

    #[test]
    fn test_period_without_refresh_date() {
        assert!(matches!(parse_period("3 days left"), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_period_ends_today_wins() {
        let period = parse_period("Ends today. Inclusions refresh: 14 Jun").unwrap();
        assert_eq!(period.days_remaining, 0);
    }

    // ========================================================================
    // Combined
    // ========================================================================

    #[test]
    fn test_usage_exceeding_quota() {
        let err = parse_portal_usage(r#"{"unit_total":"10","unit_count":"11"}"#, "Ends today")
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Schema);
    }

    #[test]
    fn test_fully_used() {
        let snapshot =
            parse_portal_usage(r#"{"unit_total":"10","unit_count":"10.9"}"#, "Ends today").unwrap();
        assert_eq!(snapshot.remaining, 0);
        assert!((snapshot.percent_used - 100.0).abs() < 1e-9);
    }
}
