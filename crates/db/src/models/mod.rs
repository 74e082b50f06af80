pub mod report;

pub use report::StoredReport;
