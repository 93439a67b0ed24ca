// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages shown in the alert raised by a failed
// export.
//
// Every technical error is mapped to plain English with a suggestion. The
// severity drives how the host presents the notification.

use crate::error::BiodataError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying the Download control again may work.
    Transient,
    /// The user must change something (config, profile, permissions).
    ActionRequired,
    /// Retrying will not help.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary, used as the alert text.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether re-triggering the export may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Alert text for a region selector that matched nothing.
pub const CONTENT_NOT_FOUND: &str = "Could not find content to download";

/// Alert text for any failure after the region was resolved.
pub const GENERATION_FAILED: &str = "Error generating PDF. Please try again.";

/// Convert a `BiodataError` into a `HumanError`.
pub fn humanize_error(err: &BiodataError) -> HumanError {
    match err {
        BiodataError::RegionNotFound(_) => HumanError {
            message: CONTENT_NOT_FOUND.into(),
            suggestion: "Reload the profile page and press Download again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BiodataError::Capture(_) | BiodataError::PdfError(_) => HumanError {
            message: GENERATION_FAILED.into(),
            suggestion: "Some photos may be unreadable. Check the gallery images and try again."
                .into(),
            retriable: true,
            severity: Severity::Transient,
        },

        BiodataError::UnknownNode(_)
        | BiodataError::InvalidTree(_)
        | BiodataError::InvalidSelector(_) => HumanError {
            message: GENERATION_FAILED.into(),
            suggestion: "The page changed while it was being exported. Try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        BiodataError::InvalidProfile(detail) => HumanError {
            message: "The profile could not be shown.".into(),
            suggestion: format!("Fix the profile file and reload. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BiodataError::Config(detail) => HumanError {
            message: "The settings file has a problem.".into(),
            suggestion: format!("Correct the setting and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BiodataError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: GENERATION_FAILED.into(),
                suggestion: "The download folder is not writable. Choose another folder.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: GENERATION_FAILED.into(),
                suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        BiodataError::Serialization(_) => HumanError {
            message: "A data file could not be read.".into(),
            suggestion: "Check that the profile and settings files are valid JSON.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BiodataError::Bridge(_) => HumanError {
            message: GENERATION_FAILED.into(),
            suggestion: "The file could not be handed to the system. Try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        BiodataError::HostUnavailable => HumanError {
            message: "Saving files isn't available here.".into(),
            suggestion: "Run the export on a desktop or pick an output folder.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// The one-line alert shown when an export fails.
///
/// A region that cannot be found gets its own message; every failure after
/// the region was resolved is reported as a generation failure.
pub fn export_alert(err: &BiodataError) -> &'static str {
    match err {
        BiodataError::RegionNotFound(_) => CONTENT_NOT_FOUND,
        _ => GENERATION_FAILED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_region_uses_not_found_alert() {
        let human = humanize_error(&BiodataError::RegionNotFound(".w-full".into()));
        assert_eq!(human.message, CONTENT_NOT_FOUND);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn capture_failure_uses_generic_alert() {
        let human = humanize_error(&BiodataError::Capture("tainted".into()));
        assert_eq!(human.message, GENERATION_FAILED);
        assert!(human.retriable);
    }

    #[test]
    fn permission_denied_is_action_required() {
        let err = BiodataError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn config_error_carries_detail() {
        let human = humanize_error(&BiodataError::Config("capture_scale".into()));
        assert!(human.suggestion.contains("capture_scale"));
    }

    #[test]
    fn export_alerts_collapse_to_two_messages() {
        assert_eq!(
            export_alert(&BiodataError::RegionNotFound("#x".into())),
            CONTENT_NOT_FOUND
        );
        assert_eq!(export_alert(&BiodataError::HostUnavailable), GENERATION_FAILED);
        assert_eq!(
            export_alert(&BiodataError::Capture("zero height".into())),
            GENERATION_FAILED
        );
    }
}
