//! Shading Self-Test Harness
//!
//! Runs property checks of the block shading stage without a host test
//! runner. Results are reported one line at a time as
//! `RESULT:<test_name>:<result>` so an external runner can scrape them.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod logger;
pub mod suites;

use alloc::vec::Vec;

/// Test result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    Pass,
    Fail,
    Skip,
}

impl TestResult {
    pub fn as_str(self) -> &'static str {
        match self {
            TestResult::Pass => "pass",
            TestResult::Fail => "fail",
            TestResult::Skip => "skip",
        }
    }

    /// `Pass` if the check held, `Fail` otherwise
    pub fn check(ok: bool) -> Self {
        if ok {
            TestResult::Pass
        } else {
            TestResult::Fail
        }
    }
}

/// Test case
pub struct TestCase {
    pub name: &'static str,
    pub category: &'static str,
    pub run: fn() -> TestResult,
}

/// Test suite
pub struct TestSuite {
    name: &'static str,
    tests: &'static [TestCase],
    current_index: usize,
    results: TestSuiteResults,
}

/// Test suite results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestSuiteResults {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl TestSuiteResults {
    fn record(&mut self, result: TestResult) {
        self.total += 1;
        match result {
            TestResult::Pass => self.passed += 1,
            TestResult::Fail => self.failed += 1,
            TestResult::Skip => self.skipped += 1,
        }
    }

    fn merge(&mut self, other: &TestSuiteResults) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

impl TestSuite {
    pub const fn new(name: &'static str, tests: &'static [TestCase]) -> Self {
        Self {
            name,
            tests,
            current_index: 0,
            results: TestSuiteResults {
                total: 0,
                passed: 0,
                failed: 0,
                skipped: 0,
            },
        }
    }

    /// Get suite name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get total test count
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// Run next test
    pub fn run_next(&mut self) -> Option<(&'static str, TestResult)> {
        let test = self.tests.get(self.current_index)?;
        self.current_index += 1;

        log::debug!("running {}/{}", test.category, test.name);
        let result = (test.run)();
        self.results.record(result);

        Some((test.name, result))
    }

    /// Check if all tests have run
    pub fn is_complete(&self) -> bool {
        self.current_index >= self.tests.len()
    }

    /// Get results
    pub fn results(&self) -> &TestSuiteResults {
        &self.results
    }

    /// Reset suite for re-running
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.results = TestSuiteResults::default();
    }
}

/// Test harness for running all suites
pub struct TestHarness {
    suites: Vec<TestSuite>,
    current_suite: usize,
    overall_results: TestSuiteResults,
}

impl TestHarness {
    pub fn new(suites: Vec<TestSuite>) -> Self {
        Self {
            suites,
            current_suite: 0,
            overall_results: TestSuiteResults::default(),
        }
    }

    /// Harness over every shading suite
    pub fn with_default_suites() -> Self {
        Self::new(suites::default_suites())
    }

    /// Get suite count
    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    /// Run the remaining suites, handing each formatted result line to `report`
    pub fn run_all(&mut self, mut report: impl FnMut(&[u8])) {
        while let Some(suite) = self.suites.get_mut(self.current_suite) {
            log::info!("suite {}: {} tests", suite.name(), suite.test_count());
            while let Some((name, result)) = suite.run_next() {
                let line = format_result(name, result);
                let end = line.iter().position(|&b| b == b'\n');
                report(&line[..end.map_or(line.len(), |i| i + 1)]);
            }
            self.overall_results.merge(suite.results());
            self.current_suite += 1;
        }
    }

    /// Check if all suites have run
    pub fn is_complete(&self) -> bool {
        self.current_suite >= self.suites.len()
    }

    /// Get overall results
    pub fn results(&self) -> &TestSuiteResults {
        &self.overall_results
    }

    /// Check if all tests passed
    pub fn all_passed(&self) -> bool {
        self.overall_results.failed == 0
    }
}

/// Format a test result as a report line
pub fn format_result(test_name: &str, result: TestResult) -> [u8; 64] {
    let mut buffer = [0u8; 64];

    // Format: "RESULT:<test_name>:<result>\n", truncated to the buffer
    let parts: [&[u8]; 5] = [
        b"RESULT:",
        test_name.as_bytes(),
        b":",
        result.as_str().as_bytes(),
        b"\n",
    ];
    let bytes = parts.iter().flat_map(|part| part.iter());
    for (slot, &b) in buffer.iter_mut().zip(bytes) {
        *slot = b;
    }

    buffer
}
