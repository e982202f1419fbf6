//! Event codes emitted for every committed traversal step.
//!
//! A code combines exactly one structural kind with optional marker bits, so
//! consumers can filter with a single mask test.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventCode: u32 {
        const REPORT_STARTED = 0x0001;
        const REPORT_FINISHED = 0x0002;
        const GROUP_STARTED = 0x0004;
        const GROUP_FINISHED = 0x0008;
        const ITEMS_STARTED = 0x0010;
        const ITEMS_ADVANCED = 0x0020;
        const ITEMS_FINISHED = 0x0040;
        const GROUP_BODY_FINISHED = 0x0080;
        const NO_DATA = 0x0100;
        const PAGE_STARTED = 0x0200;
        const PAGE_FINISHED = 0x0400;
        const SUBREPORT_ENTERED = 0x0800;
        const SUBREPORT_EXITED = 0x1000;

        /// Synthetic event produced by a join step; carries no band of its own.
        const ARTIFICIAL = 0x4000_0000;
        /// The event belongs to a crosstab axis or cell.
        const CROSSTABBING = 0x2000_0000;
    }
}

const KIND_NAMES: [(EventCode, &str); 13] = [
    (EventCode::REPORT_STARTED, "report-started"),
    (EventCode::REPORT_FINISHED, "report-finished"),
    (EventCode::GROUP_STARTED, "group-started"),
    (EventCode::GROUP_FINISHED, "group-finished"),
    (EventCode::ITEMS_STARTED, "items-started"),
    (EventCode::ITEMS_ADVANCED, "items-advanced"),
    (EventCode::ITEMS_FINISHED, "items-finished"),
    (EventCode::GROUP_BODY_FINISHED, "group-body-finished"),
    (EventCode::NO_DATA, "no-data"),
    (EventCode::PAGE_STARTED, "page-started"),
    (EventCode::PAGE_FINISHED, "page-finished"),
    (EventCode::SUBREPORT_ENTERED, "subreport-entered"),
    (EventCode::SUBREPORT_EXITED, "subreport-exited"),
];

impl EventCode {
    /// Mask of all marker bits.
    pub const MARKERS: EventCode = EventCode::ARTIFICIAL.union(EventCode::CROSSTABBING);

    /// Returns the code with all marker bits removed.
    pub fn structural(self) -> EventCode {
        self.difference(Self::MARKERS)
    }

    pub fn is_artificial(self) -> bool {
        self.contains(EventCode::ARTIFICIAL)
    }

    pub fn is_crosstab(self) -> bool {
        self.contains(EventCode::CROSSTABBING)
    }

    /// Returns `true` if the structural kind of this code is `kind`.
    pub fn is(self, kind: EventCode) -> bool {
        self.structural() == kind.structural()
    }

    /// A stable, human-readable name of the structural kind.
    pub fn kind_name(self) -> &'static str {
        let structural = self.structural();
        KIND_NAMES
            .iter()
            .find(|(code, _)| *code == structural)
            .map(|(_, name)| *name)
            .unwrap_or("none")
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())?;
        if self.is_crosstab() {
            f.write_str("+crosstab")?;
        }
        if self.is_artificial() {
            f.write_str("+artificial")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_strips_markers() {
        let code = EventCode::GROUP_FINISHED | EventCode::ARTIFICIAL | EventCode::CROSSTABBING;
        assert_eq!(code.structural(), EventCode::GROUP_FINISHED);
        assert!(code.is_artificial());
        assert!(code.is_crosstab());
        assert!(code.is(EventCode::GROUP_FINISHED));
        assert!(!code.is(EventCode::GROUP_STARTED));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(EventCode::ITEMS_ADVANCED.to_string(), "items-advanced");
        let code = EventCode::GROUP_FINISHED | EventCode::ARTIFICIAL | EventCode::CROSSTABBING;
        assert_eq!(code.to_string(), "group-finished+crosstab+artificial");
        assert_eq!(EventCode::empty().kind_name(), "none");
    }
}
