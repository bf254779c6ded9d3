pub mod contact;
pub mod report;
