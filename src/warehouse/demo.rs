//! Demo report catalog used to seed an empty warehouse.

use crate::models::{Operator, Property};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Filter,
    Segmentation,
    Metric,
}

impl ComponentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Filter => "filter",
            ComponentKind::Segmentation => "segmentation",
            ComponentKind::Metric => "metric",
        }
    }
}

/// One row of `report_components`.
#[derive(Debug, Clone)]
pub struct ComponentSeed {
    pub analysis_type: String,
    pub kind: ComponentKind,
    pub component_id: String,
    pub label: String,
    pub group_label: Option<String>,
    pub available_operators: Vec<Operator>,
    pub has_filters: bool,
    pub sort_order: i64,
}

/// One row of `metric_filter_properties`.
#[derive(Debug, Clone)]
pub struct MetricFilterSeed {
    pub metric_id: String,
    pub property: Property,
    pub sort_order: i64,
}

/// One row of `property_values_lookup`.
#[derive(Debug, Clone)]
pub struct ValueSeed {
    pub property_id: String,
    pub label: String,
    pub value: String,
    pub sort: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogSeed {
    pub components: Vec<ComponentSeed>,
    pub metric_filters: Vec<MetricFilterSeed>,
    pub values: Vec<ValueSeed>,
}

const SET_OPS: &[&str] = &["equals", "not_equals"];
const TEXT_OPS: &[&str] = &[
    "equals",
    "not_equals",
    "contains",
    "not_contains",
    "is_null",
    "is_not_null",
];
const NUMBER_OPS: &[&str] = &["greater_than", "less_than", "equals", "is_null"];

// (id, label, scope, operators)
type PropertyDef = (&'static str, &'static str, &'static str, &'static [&'static str]);

const PROPERTIES: &[PropertyDef] = &[
    ("1", "Source", "UTM", SET_OPS),
    ("2", "Medium", "UTM", SET_OPS),
    ("3", "Campaign", "UTM", TEXT_OPS),
    ("4", "Contact ID", "Identification", TEXT_OPS),
    ("5", "Company Name", "Company", TEXT_OPS),
    ("6", "Industry", "Company", SET_OPS),
    ("7", "Country", "Location", SET_OPS),
    ("8", "City", "Location", TEXT_OPS),
    ("9", "Device Type", "Technology", SET_OPS),
    ("10", "Browser", "Technology", TEXT_OPS),
    ("11", "Landing Page", "On-site Behavior", TEXT_OPS),
    ("12", "Form Submissions", "On-site Behavior", NUMBER_OPS),
    ("13", "Deal Stage", "Sales", SET_OPS),
    ("14", "Deal Amount", "Sales", NUMBER_OPS),
    ("15", "Ad Platform", "Paid", SET_OPS),
    ("16", "Account Tier", "Company", SET_OPS),
    ("17", "Touch Type", "Touch", SET_OPS),
    ("18", "Conversion Type", "Conversion", SET_OPS),
];

// (analysis type, filter ids, segmentation ids)
const TYPE_PROPERTIES: &[(&str, &[&str], &[&str])] = &[
    ("journeys", &["1", "2", "3", "4", "5", "6"], &["1", "2", "6"]),
    ("performance", &["7", "8", "9", "10", "5"], &["7", "9"]),
    ("attribution", &["1", "2", "11", "12"], &["1", "2", "11"]),
    ("revenue", &["13", "14", "6"], &["13", "6"]),
    ("spend_performance", &["1", "2", "15"], &["15", "1"]),
    ("session_activity_performance", &["7", "9", "11"], &["7", "9"]),
    ("audience_engagement", &["5", "6", "16"], &["16", "6"]),
];

// (analysis type, metric id, label, group, has filters)
const METRICS: &[(&str, &str, &str, &str, bool)] = &[
    ("journeys", "7", "Journeys", "Volume", true),
    ("journeys", "8", "Touches", "Volume", true),
    ("journeys", "9", "Average Journey Length", "Duration", false),
    ("performance", "10", "Sessions", "Traffic", true),
    ("performance", "11", "Conversions", "Outcomes", true),
    ("attribution", "12", "Attributed Revenue", "Revenue", true),
    ("attribution", "13", "Attributed Deals", "Revenue", false),
    ("revenue", "14", "Closed Won Revenue", "Revenue", true),
    ("revenue", "15", "Pipeline", "Revenue", false),
    ("spend_performance", "16", "Spend", "Cost", true),
    ("spend_performance", "17", "Cost per Lead", "Cost", false),
    ("spend_performance", "18", "Return on Ad Spend", "Return", false),
    ("session_activity_performance", "19", "Sessions", "Activity", true),
    ("session_activity_performance", "20", "Engaged Sessions", "Activity", true),
    ("audience_engagement", "21", "Engaged Accounts", "Engagement", true),
    ("audience_engagement", "22", "Active Contacts", "Engagement", false),
];

const METRIC_FILTERS: &[(&str, &[&str])] = &[
    ("7", &["1", "3"]),
    ("8", &["17"]),
    ("10", &["9", "10"]),
    ("11", &["18"]),
    ("12", &["1"]),
    ("14", &["13"]),
    ("16", &["15"]),
    ("19", &["11"]),
    ("20", &["11"]),
    ("21", &["16"]),
];

const VALUES: &[(&str, &[(&str, &str)])] = &[
    (
        "1",
        &[
            ("Google", "google"),
            ("LinkedIn", "linkedin"),
            ("Facebook", "facebook"),
            ("Direct", "direct"),
        ],
    ),
    (
        "2",
        &[("Paid Search", "cpc"), ("Organic", "organic"), ("Email", "email")],
    ),
    (
        "6",
        &[
            ("Software", "software"),
            ("Financial Services", "finance"),
            ("Healthcare", "healthcare"),
        ],
    ),
    ("7", &[("Denmark", "DK"), ("Germany", "DE"), ("United States", "US")]),
    (
        "9",
        &[("Desktop", "desktop"), ("Mobile", "mobile"), ("Tablet", "tablet")],
    ),
    (
        "13",
        &[
            ("Qualified", "qualified"),
            ("Proposal", "proposal"),
            ("Closed Won", "closed_won"),
            ("Closed Lost", "closed_lost"),
        ],
    ),
    (
        "15",
        &[
            ("Google Ads", "google_ads"),
            ("LinkedIn Ads", "linkedin_ads"),
            ("Meta Ads", "meta_ads"),
        ],
    ),
    (
        "16",
        &[("Enterprise", "enterprise"), ("Mid-Market", "mid_market"), ("SMB", "smb")],
    ),
    ("17", &[("First Touch", "first"), ("Last Touch", "last")]),
    ("18", &[("Demo Request", "demo"), ("Signup", "signup")]),
];

fn property(id: &str) -> Option<Property> {
    PROPERTIES
        .iter()
        .find(|(pid, ..)| *pid == id)
        .map(|(pid, label, scope, ops)| Property {
            property_id: pid.to_string(),
            property_label: label.to_string(),
            property_scope_label: Some(scope.to_string()),
            available_operators: ops.iter().map(|op| Operator::from(*op)).collect(),
        })
}

fn property_components(
    analysis_type: &str,
    kind: ComponentKind,
    ids: &[&str],
) -> Vec<ComponentSeed> {
    ids.iter()
        .filter_map(|id| property(id))
        .enumerate()
        .map(|(sort, p)| ComponentSeed {
            analysis_type: analysis_type.to_string(),
            kind,
            component_id: p.property_id,
            label: p.property_label,
            group_label: p.property_scope_label,
            available_operators: p.available_operators,
            has_filters: false,
            sort_order: sort as i64,
        })
        .collect()
}

/// The catalog served by a freshly seeded demo warehouse.
pub fn demo_catalog() -> CatalogSeed {
    let mut catalog = CatalogSeed::default();

    for (analysis_type, filters, segmentations) in TYPE_PROPERTIES {
        catalog
            .components
            .extend(property_components(analysis_type, ComponentKind::Filter, filters));
        catalog.components.extend(property_components(
            analysis_type,
            ComponentKind::Segmentation,
            segmentations,
        ));
    }

    for (sort, (analysis_type, id, label, group, has_filters)) in METRICS.iter().enumerate() {
        catalog.components.push(ComponentSeed {
            analysis_type: analysis_type.to_string(),
            kind: ComponentKind::Metric,
            component_id: id.to_string(),
            label: label.to_string(),
            group_label: Some(group.to_string()),
            available_operators: vec![],
            has_filters: *has_filters,
            sort_order: sort as i64,
        });
    }

    for (metric_id, property_ids) in METRIC_FILTERS {
        for (sort, p) in property_ids.iter().filter_map(|id| property(id)).enumerate() {
            catalog.metric_filters.push(MetricFilterSeed {
                metric_id: metric_id.to_string(),
                property: p,
                sort_order: sort as i64,
            });
        }
    }

    for (property_id, options) in VALUES {
        for (sort, (label, value)) in options.iter().enumerate() {
            catalog.values.push(ValueSeed {
                property_id: property_id.to_string(),
                label: label.to_string(),
                value: value.to_string(),
                sort: sort as i64,
            });
        }
    }

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_catalog_covers_every_analysis_type() {
        let catalog = demo_catalog();

        for (analysis_type, ..) in TYPE_PROPERTIES {
            for kind in [
                ComponentKind::Filter,
                ComponentKind::Segmentation,
                ComponentKind::Metric,
            ] {
                assert!(
                    catalog
                        .components
                        .iter()
                        .any(|c| c.analysis_type == *analysis_type && c.kind == kind),
                    "{analysis_type} has no {} components",
                    kind.as_str()
                );
            }
        }
    }

    #[test]
    fn test_demo_catalog_references_known_properties() {
        let catalog = demo_catalog();
        let expected: usize = METRIC_FILTERS.iter().map(|(_, ids)| ids.len()).sum();
        assert_eq!(catalog.metric_filters.len(), expected);

        let source = property("1").unwrap();
        assert_eq!(
            source.available_operators,
            vec![Operator::Equals, Operator::NotEquals]
        );
    }
}
