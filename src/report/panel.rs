//! Grouped pick-lists feeding the store.

use std::collections::HashSet;
use thiserror::Error;

use crate::models::{Metric, Property};
use crate::report::store::{SelectionStore, StoreError};

pub const DEFAULT_GROUP: &str = "General";

/// What a property picked from a panel becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyTarget {
    Filter,
    Segmentation,
    MetricFilter(String),
}

pub trait PanelItem: Clone {
    type Target;

    fn item_id(&self) -> &str;

    fn group_label(&self) -> Option<&str>;

    /// Apply a pick to the store, returning whether the panel stays open.
    fn apply(&self, target: &Self::Target, store: &mut SelectionStore) -> Result<bool, StoreError>;
}

impl PanelItem for Property {
    type Target = PropertyTarget;

    fn item_id(&self) -> &str {
        &self.property_id
    }

    fn group_label(&self) -> Option<&str> {
        self.property_scope_label.as_deref()
    }

    fn apply(&self, target: &PropertyTarget, store: &mut SelectionStore) -> Result<bool, StoreError> {
        match target {
            PropertyTarget::Filter => store.add_filter(self).map(|_| false),
            PropertyTarget::Segmentation => store.set_segmentation(Some(self.clone())).map(|_| false),
            PropertyTarget::MetricFilter(metric_id) => {
                store.add_metric_filter(metric_id, self).map(|_| false)
            }
        }
    }
}

impl PanelItem for Metric {
    type Target = ();

    fn item_id(&self) -> &str {
        &self.metric_id
    }

    fn group_label(&self) -> Option<&str> {
        self.metric_group_label.as_deref()
    }

    fn apply(&self, _target: &(), store: &mut SelectionStore) -> Result<bool, StoreError> {
        store.toggle_metric(self).map(|_| true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelGroup<T> {
    pub label: String,
    pub items: Vec<T>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PanelError {
    #[error("panel is closed")]
    Closed,
    #[error("item {0} is not offered by this panel")]
    UnknownItem(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Groups by scope/category label in order of first appearance.
pub fn group_items<T: PanelItem>(items: &[T]) -> Vec<PanelGroup<T>> {
    let mut groups: Vec<PanelGroup<T>> = Vec::new();

    for item in items {
        let label = item
            .group_label()
            .filter(|label| !label.is_empty())
            .unwrap_or(DEFAULT_GROUP);

        match groups.iter().position(|group| group.label == label) {
            Some(index) => groups[index].items.push(item.clone()),
            None => groups.push(PanelGroup {
                label: label.to_string(),
                items: vec![item.clone()],
            }),
        }
    }

    groups
}

pub struct SelectionPanel<T: PanelItem> {
    target: T::Target,
    groups: Vec<PanelGroup<T>>,
    collapsed: HashSet<String>,
    open: bool,
}

impl<T: PanelItem> SelectionPanel<T> {
    pub fn new(target: T::Target) -> Self {
        Self {
            target,
            groups: Vec::new(),
            collapsed: HashSet::new(),
            open: false,
        }
    }

    /// Open over `items`. With several groups every group starts collapsed.
    pub fn open(&mut self, items: &[T]) {
        self.groups = group_items(items);
        self.collapsed = if self.groups.len() > 1 {
            self.groups.iter().map(|g| g.label.clone()).collect()
        } else {
            HashSet::new()
        };
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn target(&self) -> &T::Target {
        &self.target
    }

    pub fn groups(&self) -> &[PanelGroup<T>] {
        &self.groups
    }

    pub fn is_collapsed(&self, label: &str) -> bool {
        self.collapsed.contains(label)
    }

    pub fn toggle_group(&mut self, label: &str) {
        if !self.collapsed.remove(label) {
            self.collapsed.insert(label.to_string());
        }
    }

    /// Hand the picked item to the store; single-select panels close afterwards.
    pub fn select(&mut self, store: &mut SelectionStore, item_id: &str) -> Result<(), PanelError> {
        if !self.open {
            return Err(PanelError::Closed);
        }

        let item = self
            .groups
            .iter()
            .flat_map(|group| group.items.iter())
            .find(|item| item.item_id() == item_id)
            .ok_or_else(|| PanelError::UnknownItem(item_id.to_string()))?;

        let stays_open = item.apply(&self.target, store)?;
        if !stays_open {
            self.open = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Operator;

    fn property(id: &str, scope: Option<&str>) -> Property {
        Property {
            property_id: id.to_string(),
            property_label: format!("Property {id}"),
            property_scope_label: scope.map(str::to_string),
            available_operators: vec![Operator::Equals],
        }
    }

    fn metric(id: &str, group: &str) -> Metric {
        Metric {
            metric_id: id.to_string(),
            metric_label: format!("Metric {id}"),
            metric_group_label: Some(group.to_string()),
            has_filters: true,
        }
    }

    #[test]
    fn test_group_items_preserves_first_appearance() {
        let items = vec![
            property("1", Some("UTM")),
            property("5", Some("Company")),
            property("2", Some("UTM")),
            property("9", None),
            property("10", Some("")),
        ];

        let groups = group_items(&items);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["UTM", "Company", DEFAULT_GROUP]);
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[2].items.len(), 2);
    }

    #[test]
    fn test_default_collapse_state() {
        let mut panel = SelectionPanel::<Property>::new(PropertyTarget::Filter);
        panel.open(&[property("1", Some("UTM")), property("5", Some("Company"))]);
        assert!(panel.is_collapsed("UTM"));
        assert!(panel.is_collapsed("Company"));

        panel.toggle_group("UTM");
        assert!(!panel.is_collapsed("UTM"));
        panel.toggle_group("UTM");
        assert!(panel.is_collapsed("UTM"));

        panel.open(&[property("1", Some("UTM")), property("2", Some("UTM"))]);
        assert!(!panel.is_collapsed("UTM"));
    }

    #[test]
    fn test_filter_pick_closes_panel() {
        let mut store = SelectionStore::new();
        store.select_analysis_type("journeys");

        let mut panel = SelectionPanel::<Property>::new(PropertyTarget::Filter);
        panel.open(&[property("1", Some("UTM"))]);
        panel.select(&mut store, "1").unwrap();

        assert!(!panel.is_open());
        assert_eq!(store.filters().len(), 1);

        assert_eq!(panel.select(&mut store, "1"), Err(PanelError::Closed));
        assert_eq!(store.filters().len(), 1);

        panel.open(&[property("1", Some("UTM"))]);
        panel.select(&mut store, "1").unwrap();
        assert_eq!(store.filters().len(), 2);
    }

    #[test]
    fn test_unopened_panel_rejects_picks() {
        let mut store = SelectionStore::new();
        store.select_analysis_type("journeys");

        let mut panel = SelectionPanel::<Metric>::new(());
        assert_eq!(panel.select(&mut store, "7"), Err(PanelError::Closed));

        panel.open(&[metric("7", "Volume")]);
        panel.close();
        assert_eq!(panel.select(&mut store, "7"), Err(PanelError::Closed));
        assert!(store.metrics().is_empty());
    }

    #[test]
    fn test_segmentation_and_metric_filter_targets() {
        let mut store = SelectionStore::new();
        store.select_analysis_type("journeys");
        store.toggle_metric(&metric("7", "Volume")).unwrap();

        let mut segmentation = SelectionPanel::<Property>::new(PropertyTarget::Segmentation);
        segmentation.open(&[property("6", Some("Company"))]);
        segmentation.select(&mut store, "6").unwrap();
        assert_eq!(store.segmentation().unwrap().property_id, "6");

        let mut scoped =
            SelectionPanel::<Property>::new(PropertyTarget::MetricFilter("7".to_string()));
        scoped.open(&[property("1", Some("UTM"))]);
        scoped.select(&mut store, "1").unwrap();
        assert_eq!(store.metric("7").unwrap().filters.len(), 1);
        assert!(store.filters().is_empty());
    }

    #[test]
    fn test_metric_panel_stays_open_for_toggling() {
        let mut store = SelectionStore::new();
        store.select_analysis_type("journeys");

        let mut panel = SelectionPanel::<Metric>::new(());
        panel.open(&[metric("7", "Volume"), metric("9", "Duration")]);

        panel.select(&mut store, "7").unwrap();
        panel.select(&mut store, "9").unwrap();
        assert!(panel.is_open());
        assert_eq!(store.metrics().len(), 2);

        panel.select(&mut store, "7").unwrap();
        assert_eq!(store.metrics().len(), 1);
    }

    #[test]
    fn test_select_errors() {
        let mut store = SelectionStore::new();
        let mut panel = SelectionPanel::<Property>::new(PropertyTarget::Filter);
        panel.open(&[property("1", Some("UTM"))]);

        assert_eq!(
            panel.select(&mut store, "42"),
            Err(PanelError::UnknownItem("42".to_string()))
        );
        assert_eq!(
            panel.select(&mut store, "1"),
            Err(PanelError::Store(StoreError::NoAnalysisType))
        );
        assert!(panel.is_open());
    }
}
