use std::collections::BTreeMap;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::{info, warn};

use crate::{
    compute::DeviceCache,
    harness::{
        compare::ComparisonReport, descriptor::TestCaseDescriptor, driver::ExecutionDriver,
        print_report::print_suite_summary, tolerance::ToleranceSpec,
    },
    tensor::NumericPrecision,
    utils::error::HarnessError,
};

#[derive(Clone, Debug, Default)]
pub struct SuiteConfig {
    // Replaces the built-in tolerance for a precision
    pub tolerances: BTreeMap<NumericPrecision, ToleranceSpec>,
    // None reports every mismatch
    pub max_reported_mismatches: Option<usize>,
    // Keep one backend per (target, options) alive for the whole suite
    pub reuse_backends: bool,
    pub shuffle: bool,
    pub shuffle_seed: Option<u64>,
}

impl SuiteConfig {
    /// Draws a seed when shuffling is requested without one, so every shuffled run can
    /// be replayed from the logged seed.
    pub fn build(mut self) -> Self {
        if self.shuffle && self.shuffle_seed.is_none() {
            self.shuffle_seed = Some(rand::rng().random());
        }
        self
    }

    pub fn device_cache(&self) -> DeviceCache {
        DeviceCache::with_cpu(self.reuse_backends)
    }

    pub fn driver<'a>(&self, cache: &'a DeviceCache) -> ExecutionDriver<'a> {
        self.tolerances
            .iter()
            .fold(ExecutionDriver::new(cache), |driver, (&precision, &tolerance)| {
                driver.with_tolerance(precision, tolerance)
            })
            .with_max_reported(self.max_reported_mismatches)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
    Error,
}

#[derive(Clone, Debug)]
pub struct CaseOutcome {
    pub name: String,
    pub descriptor: TestCaseDescriptor,
    pub result: Result<ComparisonReport, HarnessError>,
}

impl CaseOutcome {
    pub fn verdict(&self) -> Verdict {
        match &self.result {
            Ok(report) if report.passed() => Verdict::Pass,
            Ok(_) => Verdict::Fail,
            Err(_) => Verdict::Error,
        }
    }

    /// Tolerance violations folded into the error channel.
    pub fn as_result(&self) -> Result<&ComparisonReport, HarnessError> {
        match &self.result {
            Ok(report) => match report.violation() {
                Some(violation) => Err(violation),
                None => Ok(report),
            },
            Err(e) => Err(e.clone()),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SuiteReport {
    // In execution order
    pub outcomes: Vec<CaseOutcome>,
    pub shuffle_seed: Option<u64>,
}

impl SuiteReport {
    fn count(&self, verdict: Verdict) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.verdict() == verdict)
            .count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn passed(&self) -> usize {
        self.count(Verdict::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(Verdict::Fail)
    }

    pub fn errored(&self) -> usize {
        self.count(Verdict::Error)
    }

    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }

    pub fn outcome(&self, name: &str) -> Option<&CaseOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    pub fn print_summary(&self) {
        print_suite_summary(self);
    }
}

/// Runs every case, in order or shuffled by the configured seed. A failing or erroring
/// case never stops the suite.
pub fn run_suite(
    cases: &[TestCaseDescriptor],
    cache: &DeviceCache,
    config: &SuiteConfig,
) -> SuiteReport {
    let mut order: Vec<usize> = (0..cases.len()).collect();
    let shuffle_seed = if config.shuffle {
        let seed = config.shuffle_seed.unwrap_or_else(|| {
            warn!("shuffle requested on an unbuilt config, using seed 0");
            0
        });
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        info!(seed, "shuffled case order");
        Some(seed)
    } else {
        None
    };

    let driver = config.driver(cache);
    let mut outcomes = Vec::with_capacity(cases.len());

    for idx in order {
        let case = &cases[idx];
        let name = case.case_name();
        let result = driver.run_case(case);

        match &result {
            Ok(report) if report.passed() => info!(case = %name, "PASS"),
            Ok(report) => warn!(
                case = %name,
                violations = report.total_violations,
                max_deviation = report.max_deviation,
                "FAIL"
            ),
            Err(e) => warn!(case = %name, kind = e.kind(), error = %e, "ERROR"),
        }

        outcomes.push(CaseOutcome {
            name,
            descriptor: case.clone(),
            result,
        });
    }

    SuiteReport {
        outcomes,
        shuffle_seed,
    }
}
