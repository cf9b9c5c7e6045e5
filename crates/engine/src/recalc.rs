//! Edit propagation reporting.
//!
//! Every edit returns one `EditReport` summarizing what the propagation
//! touched. The engine also logs the compact form at debug level. Both
//! formats are stable; tests assert them.

/// Outcome summary of a single edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditReport {
    /// Location label of the edited cell.
    pub location: String,

    /// Registered dependents (and spill targets) recomputed before the
    /// edited cell itself.
    pub dependents: usize,

    /// Cells whose computed value changed, the edited cell included.
    pub changed: usize,

    /// Spill writes applied by ARRAY calls during this edit.
    pub spills: usize,
}

impl EditReport {
    /// Format as a concise one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "edit {}: {} dependents recomputed, {} cells changed, {} spill writes",
            self.location, self.dependents, self.changed, self.spills
        )
    }

    /// Format as a one-line log entry.
    ///
    /// Format: `[edit/A1] deps=2  changed=3  spills=0`
    pub fn log_line(&self) -> String {
        format!(
            "[edit/{}] deps={}  changed={}  spills={}",
            self.location, self.dependents, self.changed, self.spills
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_report_default() {
        let report = EditReport::default();
        assert_eq!(report.location, "");
        assert_eq!(report.dependents, 0);
        assert_eq!(report.changed, 0);
        assert_eq!(report.spills, 0);
    }

    #[test]
    fn test_edit_report_summary() {
        let report = EditReport {
            location: "B2".to_string(),
            dependents: 2,
            changed: 3,
            spills: 1,
        };
        assert_eq!(
            report.summary(),
            "edit B2: 2 dependents recomputed, 3 cells changed, 1 spill writes"
        );
    }

    #[test]
    fn test_edit_report_log_line() {
        let report = EditReport {
            location: "A1".to_string(),
            dependents: 2,
            changed: 3,
            spills: 0,
        };
        assert_eq!(report.log_line(), "[edit/A1] deps=2  changed=3  spills=0");
    }
}
