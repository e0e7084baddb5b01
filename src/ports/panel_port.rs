//! Panel input and output port traits.

use crate::domain::analysis::AnnotatedPanel;
use crate::domain::error::FwdScanError;
use crate::domain::panel::TextTable;

/// Supplies the raw panel as a header row plus text cells.
pub trait PanelSource {
    fn load_table(&self) -> Result<TextTable, FwdScanError>;
}

/// Receives the annotated panel: input columns first, derived columns after.
pub trait PanelSink {
    fn write(&self, panel: &AnnotatedPanel) -> Result<(), FwdScanError>;
}
