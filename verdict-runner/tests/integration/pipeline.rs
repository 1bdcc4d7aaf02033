// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::{Result, ensure};
use indoc::indoc;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;
use verdict_runner::{
    archive::ArchiveLocator,
    dedupe::{DedupPolicy, dedupe},
    extract::VerdictExtractor,
    fetch::CachedArtifacts,
    filter::{FilterSummary, filter_result},
    material::Material,
    pipeline::{DecorateSummary, PopulateSummary, TimestampSource, decorate, populate},
    report::ReportFormatter,
    tables::{NamingTable, PermutationTable},
};

const PERMUTATIONS: &str = r#"
<permutations>
  <testcase name="5.2.1">
    <ap name="AP-1"/>
  </testcase>
</permutations>
"#;

/// Builds a cache covering every way a record can fall out of the pipeline.
fn mixed_cache() -> Result<CacheFixture> {
    let mut cache = CacheFixture::new()?;

    let agent1 = execution_log("2024-03-05 10:00:00", "Acme", &["agent1"], &[], "PASS");
    cache.add_execution(1, 100, "5.2.1", "run-100.zip", &agent1)?;
    cache.add_execution(2, 200, "5.2.1", "run-200.zip", &agent1)?;
    // Declared as failed: never fetched.
    cache.add_record(3, "Fail", 300, "5.2.1", "run-300.zip");
    cache.write_archive("run-300.zip", &[(LOG_ENTRY, &agent1)])?;

    let failed = execution_log("2024-03-05 11:00:00", "Acme", &["agent2"], &[], "FAIL");
    cache.add_execution(4, 50, "4.1", "run-50.zip", &failed)?;
    // Not an archive.
    cache.add_record(5, "Pass", 60, "4.1", "run-60.zip");
    cache.write_raw_artifact("run-60.zip", b"plain text, not a zip file")?;
    // An archive without an execution log.
    cache.add_record(6, "Pass", 70, "4.1", "run-70.zip");
    cache.write_archive("run-70.zip", &[("logs/sniffer_1.0.log", "capture")])?;
    // Not in the cache.
    cache.add_record(7, "Pass", 80, "6.0", "run-80.zip");
    // Malformed.
    cache.add_raw_record(json!({ "id": 8, "result": "Pass" }));

    let mixed = execution_log(
        "2024-03-05 12:00:00",
        "Acme",
        &["agent2"],
        &["agentS"],
        "Pass",
    );
    cache.add_execution(9, 90, "4.1", "run-90.zip", &mixed)?;

    cache.write_records()?;
    Ok(cache)
}

#[test]
fn end_to_end_report() -> Result<()> {
    let cache = mixed_cache()?;

    let mut material = Material::new();
    let mut source = CachedArtifacts::new(cache.records_path(), cache.cache_dir());
    let populated = populate(
        &mut material,
        &mut source,
        Some("Pass"),
        TimestampSource::Record,
    )?;
    assert_eq!(
        populated,
        PopulateSummary {
            records: 9,
            malformed: 1,
            unwanted: 1,
            missing: 1,
            inserted: 6,
        }
    );

    let locator = ArchiveLocator::new(cache.scratch_dir());
    let decorated = decorate(
        &mut material,
        &locator,
        &VerdictExtractor::new(),
        TimestampSource::Record,
    );
    assert_eq!(
        decorated,
        DecorateSummary {
            decorated: 4,
            dropped: 2,
        }
    );
    for (test_case, bucket) in material.iter() {
        for candidate in bucket {
            ensure!(
                candidate.verdict.is_some() && candidate.timestamp.is_some(),
                "{test_case}: {} is not fully decorated",
                candidate.path
            );
        }
    }

    let filtered = filter_result(&mut material, "Pass");
    assert_eq!(filtered, FilterSummary { kept: 3, removed: 1 });

    let deduped = dedupe(&mut material, DedupPolicy::Last);
    assert_eq!(deduped, FilterSummary { kept: 2, removed: 1 });

    material.sort_test_cases();
    let naming = NamingTable::parse("agent1!AP-1!STA-1\n")?;
    let permutations = PermutationTable::parse(PERMUTATIONS)?;
    let report = ReportFormatter::new(&naming, &permutations, "Pass").format(&material);
    assert_eq!(
        report,
        "Pass; 4.1; 90; 00:01:00; Acme; [agent2]; [agentS]; \n\
         PASS; 5.2.1; 200; 00:01:00; Acme; [AP-1]; []; M"
    );

    // Executions sharing an inner log name are extracted side by side.
    for artifact in ["run-100.zip", "run-200.zip"] {
        let extracted = cache.scratch_dir().join(format!("{artifact}.run_10.3.0.log"));
        ensure!(extracted.is_file(), "{extracted} was extracted");
    }

    Ok(())
}

#[test_case(DedupPolicy::Last, "2024-03-05 12:00:00"; "last")]
#[test_case(DedupPolicy::First, "2024-03-05 10:00:00"; "first")]
fn log_timestamps(policy: DedupPolicy, expected_begin: &str) -> Result<()> {
    let mut cache = CacheFixture::new()?;
    // Record timestamps run the other way from the start times in the logs.
    for (id, begin) in [
        (1, "2024-03-05 11:00:00"),
        (2, "2024-03-05 12:00:00"),
        (3, "2024-03-05 10:00:00"),
    ] {
        let log = execution_log(begin, "Acme", &["agent1"], &[], "Pass");
        cache.add_execution(id, 1000 - id as i64, "tc", &format!("run-{id}.zip"), &log)?;
    }
    let no_start = execution_log("whenever", "Acme", &["agent1"], &[], "Pass");
    cache.add_execution(4, 0, "tc", "run-4.zip", &no_start)?;
    cache.write_records()?;

    let mut material = Material::new();
    let mut source = CachedArtifacts::new(cache.records_path(), cache.cache_dir());
    populate(&mut material, &mut source, Some("Pass"), TimestampSource::Log)?;
    let decorated = decorate(
        &mut material,
        &ArchiveLocator::new(cache.scratch_dir()),
        &VerdictExtractor::new(),
        TimestampSource::Log,
    );
    assert_eq!(decorated.dropped, 1, "unparseable start time is dropped");

    dedupe(&mut material, policy);
    let bucket = material.bucket("tc").expect("bucket exists");
    assert_eq!(bucket.len(), 1);
    let verdict = bucket[0].verdict.as_ref().expect("candidate is decorated");
    assert_eq!(verdict.begin.as_deref(), Some(expected_begin));

    Ok(())
}

#[test]
fn all_policy_keeps_everything() -> Result<()> {
    let cache = mixed_cache()?;
    let mut material = Material::new();
    let mut source = CachedArtifacts::new(cache.records_path(), cache.cache_dir());
    populate(&mut material, &mut source, None, TimestampSource::Record)?;
    assert_eq!(material.candidate_count(), 7, "no expected result: every cached artifact");

    decorate(
        &mut material,
        &ArchiveLocator::new(cache.scratch_dir()),
        &VerdictExtractor::new(),
        TimestampSource::Record,
    );
    let before = material.candidate_count();
    let summary = dedupe(&mut material, DedupPolicy::All);
    assert_eq!(summary.removed, 0);
    assert_eq!(material.candidate_count(), before);

    Ok(())
}

#[test]
fn record_dut_fills_missing_status_line() -> Result<()> {
    let mut cache = CacheFixture::new()?;
    let without_status = indoc! {"
        Test Start Time: 2024-03-05 10:00:00
        agent1 (10.0.0.2:9000) ---> ap_set_security,NAME,AP1
        FINAL TEST RESULT ---> Pass
    "};
    for (id, artifact, dut) in [(1, "run-1.zip", "Globex"), (2, "run-2.zip", "Initech")] {
        cache.add_raw_record(json!({
            "id": id,
            "result": "Pass",
            "timestamp": id * 10,
            "logFileName": format!("/results/tc/{artifact}"),
            "testCase": "tc",
            "dut": dut,
        }));
        cache.write_archive(artifact, &[(LOG_ENTRY, without_status)])?;
    }
    // The status line in the log wins over the record.
    cache.add_raw_record(json!({
        "id": 3,
        "result": "Pass",
        "timestamp": 30,
        "logFileName": "/results/tc/run-3.zip",
        "testCase": "tc",
        "dut": "Globex",
    }));
    let with_status = execution_log("2024-03-05 11:00:00", "Acme", &["agent1"], &[], "Pass");
    cache.write_archive("run-3.zip", &[(LOG_ENTRY, &with_status)])?;
    cache.write_records()?;

    let mut material = Material::new();
    let mut source = CachedArtifacts::new(cache.records_path(), cache.cache_dir());
    populate(&mut material, &mut source, Some("Pass"), TimestampSource::Record)?;
    decorate(
        &mut material,
        &ArchiveLocator::new(cache.scratch_dir()),
        &VerdictExtractor::new(),
        TimestampSource::Record,
    );

    let duts: Vec<_> = material
        .bucket("tc")
        .expect("bucket exists")
        .iter()
        .map(|candidate| candidate.verdict.as_ref().and_then(|v| v.dut.as_deref()))
        .collect();
    assert_eq!(duts, [Some("Globex"), Some("Initech"), Some("Acme")]);

    // Different devices are not equivalent, so nothing is deduplicated.
    let summary = dedupe(&mut material, DedupPolicy::Last);
    assert_eq!(summary, FilterSummary { kept: 3, removed: 0 });

    Ok(())
}
