use super::*;
use crate::test_support::repository;

#[tokio::test]
async fn test_builtin_entry_is_excluded() {
    let filter = ExclusionListFilter::default();

    let reasons = filter
        .should_filter_repository(&repository("wmaintw/DependencyCheck"))
        .await
        .unwrap();

    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0].reason, FilterReason::Other);
    assert!(reasons[0].details.contains("jeremylong/DependencyCheck"));
}

#[tokio::test]
async fn test_each_reason_is_reported() {
    let filter = ExclusionListFilter::with_additional(BTreeMap::from([(
        "https://github.com/acme/widgets".to_string(),
        vec!["Archived".to_string(), "Maintainer asked".to_string()],
    )]));

    let reasons = filter
        .should_filter_repository(&repository("acme/widgets"))
        .await
        .unwrap();

    assert_eq!(
        reasons,
        vec![
            FilterDetailedReason::new(FilterReason::Other, "Archived"),
            FilterDetailedReason::new(FilterReason::Other, "Maintainer asked"),
        ]
    );
    assert!(filter
        .entries()
        .contains_key("https://github.com/wmaintw/DependencyCheck"));
}

#[tokio::test]
async fn test_additional_entry_replaces_builtin_reasons() {
    let filter = ExclusionListFilter::with_additional(BTreeMap::from([(
        "https://github.com/wmaintw/DependencyCheck".to_string(),
        vec!["Replaced".to_string()],
    )]));

    let reasons = filter
        .should_filter_repository(&repository("wmaintw/DependencyCheck"))
        .await
        .unwrap();

    assert_eq!(reasons, vec![FilterDetailedReason::new(FilterReason::Other, "Replaced")]);
}

#[tokio::test]
async fn test_unlisted_repository_passes() {
    let reasons = ExclusionListFilterFactory::new(BTreeMap::new())
        .create()
        .await
        .unwrap()
        .should_filter_repository(&repository("acme/widgets"))
        .await
        .unwrap();

    assert!(reasons.is_empty());
}
