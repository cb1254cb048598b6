//! Parsers for aapt command output
//!
//! aapt output is loosely structured text that varies across build-tools
//! versions. Every parser here is line-oriented and tolerant: unknown lines
//! are skipped and absent tokens come back as empty values.

use super::traits::BadgingInfo;
use regex::Regex;
use std::sync::LazyLock;

/// Exit status of an external command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The command exited successfully (exit code 0)
    Success,
    /// The command exited with a non-zero exit code
    Failure,
}

impl ExitStatus {
    /// Returns `true` if the exit status represents success
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<bool> for ExitStatus {
    fn from(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

/// Resource names that conventionally hold the application name
pub const APP_NAME_RESOURCES: &[&str] = &["app_name", "application_name", "app_label"];

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"([A-Za-z][\w-]*)='([^']*)'").expect("valid attribute regex")
});

static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("valid quoted-string regex")
});

static MANIFEST_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"android:label(?:\(0x[0-9a-fA-F]+\))?="([^"]+)""#).expect("valid label regex")
});

/// Turn a failed invocation into an error message
fn failure_message(tool: &str, stdout: &[u8], stderr: &[u8]) -> crate::Error {
    let stderr = String::from_utf8_lossy(stderr);
    let stdout = String::from_utf8_lossy(stdout);
    let detail = stderr
        .lines()
        .chain(stdout.lines())
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no output");
    crate::Error::ExternalTool(format!("{} failed: {}", tool, detail))
}

/// Strip one layer of single or double quotes
fn strip_quotes(value: &str) -> &str {
    let v = value.trim();
    for q in ['\'', '"'] {
        if let Some(inner) = v.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner;
        }
    }
    v
}

/// Parse output from `aapt dump badging`
///
/// # Arguments
///
/// * `stdout` - Standard output from aapt
/// * `stderr` - Standard error from aapt
/// * `exit_status` - Whether the command exited successfully
///
/// # Returns
///
/// Package id, version, label and icon hint. Missing fields are empty.
pub fn parse_badging_output(
    stdout: &[u8],
    stderr: &[u8],
    exit_status: ExitStatus,
) -> crate::Result<BadgingInfo> {
    if !exit_status.is_success() {
        return Err(failure_message("aapt dump badging", stdout, stderr));
    }

    let output = String::from_utf8_lossy(stdout);
    let mut info = BadgingInfo::default();
    let mut localized_label = String::new();
    let mut best_icon: Option<(u32, String)> = None;
    let mut application_icon = String::new();

    for line in output.lines() {
        let line = line.trim_end();

        if let Some(rest) = line.strip_prefix("package:") {
            for cap in ATTRIBUTE.captures_iter(rest) {
                match &cap[1] {
                    "name" => info.package_id = cap[2].trim().to_string(),
                    "versionName" => info.version = cap[2].trim().to_string(),
                    _ => {}
                }
            }
        } else if let Some(rest) = line.strip_prefix("application-label:") {
            info.label = strip_quotes(rest).trim().to_string();
        } else if let Some(rest) = line.strip_prefix("application-label-")
            && let Some((_, value)) = rest.split_once(':')
            && localized_label.is_empty()
        {
            localized_label = strip_quotes(value).trim().to_string();
        } else if let Some(rest) = line.strip_prefix("application-icon-")
            && let Some((density, value)) = rest.split_once(':')
            && let Ok(density) = density.trim().parse::<u32>()
        {
            let path = strip_quotes(value).trim().to_string();
            if !path.is_empty() && best_icon.as_ref().is_none_or(|(d, _)| density > *d) {
                best_icon = Some((density, path));
            }
        } else if let Some(rest) = line.strip_prefix("application:") {
            for cap in ATTRIBUTE.captures_iter(rest) {
                if &cap[1] == "icon" {
                    application_icon = cap[2].trim().to_string();
                }
            }
        }
    }

    if info.label.is_empty() {
        info.label = localized_label;
    }
    info.icon_hint = best_icon
        .map(|(_, path)| path)
        .or_else(|| (!application_icon.is_empty()).then_some(application_icon));

    Ok(info)
}

/// Parse output from `aapt dump --values resources`
///
/// Looks for a `string/<name>` resource from [`APP_NAME_RESOURCES`] and
/// reads its quoted value from the same line or the value line that
/// follows. Names are tried in list order.
pub fn parse_resource_label(
    stdout: &[u8],
    stderr: &[u8],
    exit_status: ExitStatus,
) -> crate::Result<Option<String>> {
    if !exit_status.is_success() {
        return Err(failure_message("aapt dump resources", stdout, stderr));
    }

    let output = String::from_utf8_lossy(stdout);
    let lines: Vec<&str> = output.lines().collect();

    for name in APP_NAME_RESOURCES {
        let marker = format!("string/{}", name);
        for (index, line) in lines.iter().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("spec ") || !names_resource(trimmed, &marker) {
                continue;
            }

            let same_line = quoted_value(trimmed);
            let next_line = lines
                .get(index + 1)
                .map(|l| l.trim_start())
                .filter(|l| l.starts_with('('))
                .and_then(quoted_value);

            if let Some(value) = same_line.or(next_line) {
                return Ok(Some(value));
            }
        }
    }

    Ok(None)
}

/// `marker` ends at `:` (aapt) or at whitespace or line end (aapt2)
fn names_resource(line: &str, marker: &str) -> bool {
    line.match_indices(marker).any(|(at, _)| {
        line[at + marker.len()..]
            .chars()
            .next()
            .is_none_or(|c| c == ':' || c.is_whitespace())
    })
}

fn quoted_value(line: &str) -> Option<String> {
    QUOTED
        .captures_iter(line)
        .map(|c| c[1].trim().to_string())
        .find(|v| !v.is_empty())
}

/// Parse output from `aapt dump xmltree <pkg> AndroidManifest.xml`
///
/// Only literal `android:label` strings count; resource references
/// (`=@0x7f...`) are ignored. A label on the `application` element wins over
/// labels on activities.
pub fn parse_manifest_label(
    stdout: &[u8],
    stderr: &[u8],
    exit_status: ExitStatus,
) -> crate::Result<Option<String>> {
    if !exit_status.is_success() {
        return Err(failure_message("aapt dump xmltree", stdout, stderr));
    }

    let output = String::from_utf8_lossy(stdout);
    let mut in_application = false;
    let mut first_label: Option<String> = None;

    for line in output.lines() {
        let trimmed = line.trim_start();
        if let Some(element) = trimmed.strip_prefix("E: ") {
            in_application = element.split_whitespace().next() == Some("application");
            continue;
        }

        let Some(cap) = MANIFEST_LABEL.captures(trimmed) else {
            continue;
        };
        let label = cap[1].trim().to_string();
        if label.is_empty() {
            continue;
        }
        if in_application {
            return Ok(Some(label));
        }
        if first_label.is_none() {
            first_label = Some(label);
        }
    }

    Ok(first_label)
}
