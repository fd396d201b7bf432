pub mod case_matrix;
pub mod compare;
pub mod descriptor;
pub mod driver;
pub mod print_report;
pub mod suite;
pub mod tolerance;

pub use case_matrix::CaseMatrix;
pub use compare::{ComparisonReport, Mismatch, compare};
pub use descriptor::TestCaseDescriptor;
pub use driver::ExecutionDriver;
pub use suite::{CaseOutcome, SuiteConfig, SuiteReport, Verdict, run_suite};
pub use tolerance::ToleranceSpec;
