//! External conversion tools: execution and startup probing.

pub mod runner;

use imgshift_core::config::ToolsConfig;
use serde::Serialize;

pub use runner::{ArgVars, StdoutMode, ToolError, ToolInvocation, ToolOutcome, ToolRunner};

/// Availability of one configured tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    /// Logical name, e.g. `ghostscript`.
    pub name: &'static str,
    /// Configured command.
    pub command: String,
    /// Whether the command resolved.
    pub available: bool,
}

/// Probe every configured tool.
pub fn probe_tools(tools: &ToolsConfig, runner: &ToolRunner) -> Vec<ToolStatus> {
    tools
        .all()
        .into_iter()
        .map(|(name, tool)| ToolStatus {
            name,
            command: tool.command.clone(),
            available: runner.check_command_available(&tool.command),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_reports_every_tool() {
        let mut tools = ToolsConfig::default();
        tools.ghostscript.command = "sh".to_string();
        tools.dcraw.command = "imgshift-definitely-missing-tool".to_string();

        let report = probe_tools(&tools, &ToolRunner::new());
        assert_eq!(report.len(), 7);

        let find = |name: &str| report.iter().find(|s| s.name == name).expect("present");
        assert!(find("ghostscript").available);
        assert!(!find("dcraw").available);
    }
}
