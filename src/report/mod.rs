pub mod filter;
pub mod panel;
pub mod projector;
pub mod session;
pub mod store;

pub use filter::{ActiveFilter, FilterId, FilterList, FilterPatch, FilterValue};
pub use panel::{group_items, PanelError, PanelGroup, PanelItem, PropertyTarget, SelectionPanel};
pub use projector::{project, ReportConfiguration, ReportSnapshot};
pub use session::{
    fetch_catalogs, fetch_values, CatalogBatch, CatalogRequest, CatalogSource, Catalogs,
    MetricFiltersRequest, ReportSession, ValuesRequest, ValuesResponse,
};
pub use store::{MandatorySelections, SelectedMetric, SelectionStore, StoreError};
