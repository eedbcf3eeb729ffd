//! Types for locating external tools on the host.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// External tools the bot depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    /// The Python interpreter
    Interpreter,
    /// FFmpeg
    MediaTool,
}

impl Tool {
    /// Probe order
    pub fn all() -> &'static [Tool] {
        &[Tool::Interpreter, Tool::MediaTool]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Interpreter => "Python",
            Tool::MediaTool => "FFmpeg",
        }
    }

    /// Directory name used when installing the tool
    pub fn install_name(&self) -> &'static str {
        match self {
            Tool::Interpreter => "python",
            Tool::MediaTool => "ffmpeg",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Outcome of looking for one tool.
///
/// When `found` is false, `path` holds the reason instead of a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub tool: Tool,
    pub found: bool,
    pub path: String,
    pub version: String,
}

impl DetectionResult {
    pub fn found(tool: Tool, path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            tool,
            found: true,
            path: path.into(),
            version: version.into(),
        }
    }

    pub fn not_found(tool: Tool, reason: impl Into<String>) -> Self {
        Self {
            tool,
            found: false,
            path: reason.into(),
            version: String::new(),
        }
    }

    pub fn status_line(&self) -> String {
        if self.found {
            format!("✅ Detected ({})", self.version)
        } else {
            format!("❌ Detection failed ({})", self.path)
        }
    }
}

/// Why a user-chosen executable was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationFailure {
    #[error("File does not exist")]
    NotFound,

    #[error("File is not executable")]
    NotExecutable,

    #[error("Not a valid {0} executable")]
    Invalid(Tool),

    #[error("Timed out while running the file")]
    TimedOut,

    #[error("Detection failed: {0}")]
    Other(String),
}

/// Which tools a probe run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProbeSelection {
    #[default]
    Both,
    InterpreterOnly,
    MediaToolOnly,
}

impl ProbeSelection {
    pub fn only(tool: Tool) -> Self {
        match tool {
            Tool::Interpreter => ProbeSelection::InterpreterOnly,
            Tool::MediaTool => ProbeSelection::MediaToolOnly,
        }
    }

    /// Selected tools, interpreter first
    pub fn tools(&self) -> Vec<Tool> {
        match self {
            ProbeSelection::Both => Tool::all().to_vec(),
            ProbeSelection::InterpreterOnly => vec![Tool::Interpreter],
            ProbeSelection::MediaToolOnly => vec![Tool::MediaTool],
        }
    }

    pub fn includes(&self, tool: Tool) -> bool {
        self.tools().contains(&tool)
    }
}

/// Messages a probe worker sends to the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEvent {
    Detected(DetectionResult),
    Validated {
        tool: Tool,
        result: Result<DetectionResult, ValidationFailure>,
    },
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_order() {
        assert_eq!(
            ProbeSelection::Both.tools(),
            vec![Tool::Interpreter, Tool::MediaTool]
        );
        assert!(!ProbeSelection::MediaToolOnly.includes(Tool::Interpreter));
        assert_eq!(ProbeSelection::only(Tool::MediaTool), ProbeSelection::MediaToolOnly);
    }

    #[test]
    fn test_status_line() {
        let ok = DetectionResult::found(Tool::Interpreter, "/usr/bin/python3", "Python 3.11.4");
        assert_eq!(ok.status_line(), "✅ Detected (Python 3.11.4)");

        let missing = DetectionResult::not_found(Tool::MediaTool, "FFmpeg not found");
        assert_eq!(missing.status_line(), "❌ Detection failed (FFmpeg not found)");
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationFailure::Invalid(Tool::MediaTool).to_string(),
            "Not a valid FFmpeg executable"
        );
    }
}
