use crate::harness::suite::{SuiteReport, Verdict};

pub fn print_suite_summary(report: &SuiteReport) {
    println!("\n=== CONVOLUTION HARNESS SUMMARY ===\n");

    if let Some(seed) = report.shuffle_seed {
        println!("Shuffle seed: {}", seed);
    }
    println!(
        "Cases: {} total, {} passed, {} failed, {} errors",
        report.total(),
        report.passed(),
        report.failed(),
        report.errored()
    );
    println!("{:-<100}", "");

    for outcome in &report.outcomes {
        let verdict = match outcome.verdict() {
            Verdict::Pass => "PASS ",
            Verdict::Fail => "FAIL ",
            Verdict::Error => "ERROR",
        };

        match &outcome.result {
            Ok(report) => {
                println!(
                    "{} {} (max deviation {:.3e})",
                    verdict, outcome.name, report.max_deviation
                );
                for m in &report.mismatches {
                    println!(
                        "        [{}] expected {} got {} (deviation {:.3e})",
                        m.index, m.expected, m.actual, m.deviation
                    );
                }
                if report.is_truncated() {
                    println!(
                        "        ... {} more",
                        report.total_violations - report.mismatches.len()
                    );
                }
            }
            Err(e) => println!("{} {}\n        {}: {}", verdict, outcome.name, e.kind(), e),
        }
    }

    println!("{:-<100}", "");
}
