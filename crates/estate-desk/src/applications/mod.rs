//! Job applications: submission form payloads and the admin applications table.

pub mod domain;
pub mod export;
pub mod table;

pub use domain::{ApplicationForm, JobApplicationRow, ResumeUpload, SubmissionReceipt};
pub use export::export_csv;
pub use table::{SortDirection, SortKey, TableError, TablePage, TableQuery};
