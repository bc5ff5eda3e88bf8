// Catalog reconciliation against the POS
pub mod catalog_sync;

// Derived metrics and read-side views
pub mod analytics;
