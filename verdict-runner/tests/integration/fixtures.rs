// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::Result;
use serde_json::json;
use std::{fs, io::Write};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// The name every fixture archive gives its execution log.
pub(crate) const LOG_ENTRY: &str = "logs/run_10.3.0.log";

/// A temporary cache directory with a record dump and cached artifacts.
pub(crate) struct CacheFixture {
    dir: Utf8TempDir,
    records: Vec<serde_json::Value>,
}

impl CacheFixture {
    pub(crate) fn new() -> Result<Self> {
        let dir = Utf8TempDir::with_prefix("verdict-integration-")?;
        fs::create_dir(dir.path().join("cache"))?;
        Ok(Self {
            dir,
            records: Vec::new(),
        })
    }

    pub(crate) fn cache_dir(&self) -> Utf8PathBuf {
        self.dir.path().join("cache")
    }

    pub(crate) fn scratch_dir(&self) -> Utf8PathBuf {
        self.dir.path().join("scratch")
    }

    pub(crate) fn records_path(&self) -> Utf8PathBuf {
        self.dir.path().join("records.json")
    }

    /// Adds a record. The artifact is not cached.
    pub(crate) fn add_record(
        &mut self,
        id: u64,
        result: &str,
        timestamp: i64,
        test_case: &str,
        artifact: &str,
    ) {
        self.records.push(json!({
            "id": id,
            "result": result,
            "timestamp": timestamp,
            "logFileName": format!("/results/{test_case}/{artifact}"),
            "testCase": test_case,
        }));
    }

    pub(crate) fn add_raw_record(&mut self, value: serde_json::Value) {
        self.records.push(value);
    }

    /// Adds a record along with a cached archive holding `log` as its execution log.
    pub(crate) fn add_execution(
        &mut self,
        id: u64,
        timestamp: i64,
        test_case: &str,
        artifact: &str,
        log: &str,
    ) -> Result<()> {
        self.add_record(id, "Pass", timestamp, test_case, artifact);
        self.write_archive(artifact, &[("logs/sniffer_1.0.log", "capture"), (LOG_ENTRY, log)])
    }

    pub(crate) fn write_archive(&self, artifact: &str, entries: &[(&str, &str)]) -> Result<()> {
        let file = fs::File::create(self.cache_dir().join(artifact))?;
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, contents) in entries {
            writer.start_file(*name, options)?;
            writer.write_all(contents.as_bytes())?;
        }
        writer.finish()?;
        Ok(())
    }

    pub(crate) fn write_raw_artifact(&self, artifact: &str, contents: &[u8]) -> Result<()> {
        fs::write(self.cache_dir().join(artifact), contents)?;
        Ok(())
    }

    pub(crate) fn write_records(&self) -> Result<Utf8PathBuf> {
        let path = self.records_path();
        fs::write(&path, serde_json::to_string_pretty(&self.records)?)?;
        Ok(path)
    }
}

/// Builds an execution log in the format the test harness writes.
pub(crate) fn execution_log(
    begin: &str,
    dut: &str,
    ap: &[&str],
    sta: &[&str],
    result: &str,
) -> String {
    let mut lines = vec![
        "====== UCC Core Version [10.3.0] ======".to_owned(),
        format!("Test Start Time: {begin}"),
        format!("DUT (192.168.250.2:9000) <-- status,COMPLETE,vendor,{dut},model,X1,version,2.0"),
    ];
    for (index, agent) in ap.iter().enumerate() {
        lines.push(format!(
            "{agent} (192.168.250.{}:9000) ---> ap_set_security,NAME,AP{index},KEYMGNT,WPA2-PSK",
            10 + index
        ));
    }
    for (index, agent) in sta.iter().enumerate() {
        lines.push(format!(
            "[parallel-{index}] {agent} (192.168.250.{}:9000) ---> sta_set_security,type,PSK",
            20 + index
        ));
    }
    lines.push("====== Execution Time [00:01:00] ======".to_owned());
    lines.push(format!("FINAL TEST RESULT ---> {result}"));
    lines.join("\n")
}
